//! Band Splitter: four-band polyphonic crossover with send/return summing
//!
//! Each band runs `(band + all) × gain` through a 2-stage Butterworth cascade
//! and out of its send. The mix sums the four returns; an unplugged return
//! normals to its band's filtered signal, unless that band's send is patched,
//! in which case it contributes nothing.
//!
//! Up to 16 channels are processed as four groups of four lanes, each group
//! with its own filter state.

use bl_core::{LANES, Lanes, Module, ModuleIo, ParamConfig, ProcessArgs, group_count, port_ids};
use bl_dsp::biquad::{FilterBank, FilterType};
use bl_dsp::control::ClockDivider;
use bl_dsp::saturation::Saturator;
use bl_dsp::smoothing::ClipHold;
use bl_state::BandSplitterState;
use serde_json::Value;

use crate::cv_gain;

/// LEDs are refreshed once per this many frames
pub const LED_UPDATE_RATE: u32 = 64;

/// How long the clip LED stays lit after an overload, in seconds
pub const CLIP_HOLD_TIME: f32 = 0.25;

/// Mix level above which the clip LED lights, in volts
pub const CLIP_THRESHOLD: f32 = 10.0;

/// Full-scale level of the mix LED, in volts
const LED_FULL_SCALE: f32 = 5.0;

port_ids! {
    pub enum BandSplitterParam { LowGain, LowMidGain, HighMidGain, HighGain }
}

port_ids! {
    pub enum BandSplitterInput {
        Low, LowMid, HighMid, High,
        LowReturn, LowMidReturn, HighMidReturn, HighReturn,
        LowCv, LowMidCv, HighMidCv, HighCv,
        All, AllCv,
    }
}

port_ids! {
    pub enum BandSplitterOutput { Low, LowMid, HighMid, High, Mix }
}

port_ids! {
    /// RGB triples: `MixClip` then `Mix`
    pub enum BandSplitterLight {
        MixClipRed, MixClipGreen, MixClipBlue,
        MixRed, MixGreen, MixBlue,
    }
}

/// One of the four crossover bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    LowMid,
    HighMid,
    High,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::Low, Band::LowMid, Band::HighMid, Band::High];

    pub fn cutoff_hz(self) -> f32 {
        match self {
            Band::Low => 300.0,
            Band::LowMid => 750.0,
            Band::HighMid => 1500.0,
            Band::High => 3800.0,
        }
    }

    pub fn filter_type(self) -> FilterType {
        match self {
            Band::Low => FilterType::Lowpass,
            Band::LowMid | Band::HighMid => FilterType::Bandpass,
            Band::High => FilterType::Highpass,
        }
    }

    /// Output makeup gain; the shelving bands sit a little lower
    pub fn makeup(self) -> f32 {
        match self {
            Band::Low | Band::High => 0.7 * 2.0,
            Band::LowMid | Band::HighMid => 2.0,
        }
    }

    pub fn gain_param(self) -> BandSplitterParam {
        match self {
            Band::Low => BandSplitterParam::LowGain,
            Band::LowMid => BandSplitterParam::LowMidGain,
            Band::HighMid => BandSplitterParam::HighMidGain,
            Band::High => BandSplitterParam::HighGain,
        }
    }

    pub fn input(self) -> BandSplitterInput {
        match self {
            Band::Low => BandSplitterInput::Low,
            Band::LowMid => BandSplitterInput::LowMid,
            Band::HighMid => BandSplitterInput::HighMid,
            Band::High => BandSplitterInput::High,
        }
    }

    pub fn return_input(self) -> BandSplitterInput {
        match self {
            Band::Low => BandSplitterInput::LowReturn,
            Band::LowMid => BandSplitterInput::LowMidReturn,
            Band::HighMid => BandSplitterInput::HighMidReturn,
            Band::High => BandSplitterInput::HighReturn,
        }
    }

    pub fn cv_input(self) -> BandSplitterInput {
        match self {
            Band::Low => BandSplitterInput::LowCv,
            Band::LowMid => BandSplitterInput::LowMidCv,
            Band::HighMid => BandSplitterInput::HighMidCv,
            Band::High => BandSplitterInput::HighCv,
        }
    }

    pub fn output(self) -> BandSplitterOutput {
        match self {
            Band::Low => BandSplitterOutput::Low,
            Band::LowMid => BandSplitterOutput::LowMid,
            Band::HighMid => BandSplitterOutput::HighMid,
            Band::High => BandSplitterOutput::High,
        }
    }
}

/// Four-band crossover with per-band send/return and a summed mix
#[derive(Debug, Clone)]
pub struct BandSplitter {
    io: ModuleIo,
    /// Indexed in `Band::ALL` order
    banks: [FilterBank; 4],
    led_clock: ClockDivider,
    clip: ClipHold,
    state: BandSplitterState,
}

impl Default for BandSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BandSplitter {
    pub const MODEL: &'static str = "BandSplitter";

    pub fn new() -> Self {
        let mut io = ModuleIo::for_ids::<
            BandSplitterParam,
            BandSplitterInput,
            BandSplitterOutput,
            BandSplitterLight,
        >();

        let gains = [
            ("Low gain", "Lowpass <300 Hz"),
            ("Low mid gain", "Bandpass ~750 Hz"),
            ("High mid gain", "Bandpass ~1.5 kHz"),
            ("High gain", "Highpass >3 kHz"),
        ];
        for (band, (name, description)) in Band::ALL.into_iter().zip(gains) {
            io.config_param(
                band.gain_param(),
                ParamConfig::continuous(name, 0.0, 1.0, 0.75).with_description(description),
            );
        }

        let names = ["Low", "Low mid", "High mid", "High"];
        for (band, name) in Band::ALL.into_iter().zip(names) {
            io.config_input(band.input(), name, "");
            io.config_input(band.return_input(), &format!("{name} return"), "");
            io.config_input(band.cv_input(), &format!("{name} CV"), "");
            io.config_output(
                band.output(),
                name,
                &format!("Normalled to {name} band return"),
            );
        }
        io.config_input(BandSplitterInput::All, "All", "");
        io.config_input(BandSplitterInput::AllCv, "All CV", "Mix VCA, 10V to fully open");
        io.config_output(BandSplitterOutput::Mix, "Mix", "");

        for (light, name) in BandSplitterLight::ALL.into_iter().zip([
            "Mix clip (red)",
            "Mix clip (green)",
            "Mix clip (blue)",
            "Mix (red)",
            "Mix (green)",
            "Mix (blue)",
        ]) {
            io.config_light(light, name);
        }

        let mut splitter = Self {
            io,
            banks: Band::ALL.map(|band| FilterBank::new(band.filter_type())),
            led_clock: ClockDivider::new(LED_UPDATE_RATE),
            clip: ClipHold::new(CLIP_THRESHOLD, CLIP_HOLD_TIME),
            state: BandSplitterState::default(),
        };
        splitter.on_sample_rate_change(ProcessArgs::default().sample_rate);
        splitter
    }

    /// Normalized cutoff of each band, in `Band::ALL` order
    pub fn cutoffs(&self) -> [f32; 4] {
        self.banks.each_ref().map(FilterBank::normalized_cutoff)
    }

    pub fn state(&self) -> BandSplitterState {
        self.state
    }

    pub fn set_apply_saturation(&mut self, apply: bool) {
        self.state.apply_saturation = apply;
    }

    /// Polyphony: widest of the band inputs and `All`, at least 1
    fn active_channels(&self) -> usize {
        Band::ALL
            .iter()
            .map(|band| self.io.input(band.input()).channels())
            .chain([self.io.input(BandSplitterInput::All).channels()])
            .fold(1, usize::max)
    }

    fn update_leds(&mut self, delta_time: f32) {
        use BandSplitterLight::*;

        let mix = self.io.output(BandSplitterOutput::Mix);
        let (level, lit, dark) = if mix.channels() == 1 {
            (mix.voltage(0).abs(), MixGreen, MixBlue)
        } else {
            let peak = mix.voltages().iter().fold(0.0_f32, |m, v| m.max(v.abs()));
            (peak, MixBlue, MixGreen)
        };

        self.io.light_mut(MixRed).set_brightness(0.0);
        self.io.light_mut(dark).set_brightness(0.0);
        self.io
            .light_mut(lit)
            .set_brightness_smooth(level / LED_FULL_SCALE, delta_time);

        let clip = self.clip.process(level, delta_time);
        self.io
            .light_mut(MixClipRed)
            .set_brightness_smooth(if clip { 1.0 } else { 0.0 }, delta_time);
        self.io.light_mut(MixClipGreen).set_brightness(0.0);
        self.io.light_mut(MixClipBlue).set_brightness(0.0);
    }
}

impl Module for BandSplitter {
    fn model(&self) -> &'static str {
        Self::MODEL
    }

    fn io(&self) -> &ModuleIo {
        &self.io
    }

    fn io_mut(&mut self) -> &mut ModuleIo {
        &mut self.io
    }

    fn on_sample_rate_change(&mut self, sample_rate: f32) {
        for (bank, band) in self.banks.iter_mut().zip(Band::ALL) {
            bank.set_cutoff(band.cutoff_hz() / sample_rate);
        }
        log::debug!("BandSplitter retuned for {sample_rate} Hz");
    }

    fn process(&mut self, args: &ProcessArgs) {
        let active = self.active_channels();
        // Checked on the return inputs alone, before any normalling
        let mono_returns = Band::ALL
            .iter()
            .all(|band| self.io.input(band.return_input()).is_monophonic());
        let saturate = self.state.apply_saturation;
        let zero = Lanes::splat(0.0);

        let Self { io, banks, .. } = &mut *self;
        for group in 0..group_count(active) {
            let c = group * LANES;
            let all = io.input(BandSplitterInput::All).poly_lanes(c);

            let mut mix = zero;
            for (band, bank) in Band::ALL.into_iter().zip(banks.iter_mut()) {
                let gain = Lanes::splat(io.value(band.gain_param()))
                    * cv_gain(io.input(band.cv_input()), c);
                let send = (io.input(band.input()).poly_lanes(c) + all) * gain;
                let filtered = Lanes::splat(band.makeup()) * bank.process(group, send);
                io.output_mut(band.output()).set_lanes(c, filtered);

                let normal = if io.output(band.output()).is_connected() {
                    zero
                } else {
                    filtered
                };
                mix = mix + io.input(band.return_input()).normal_poly_lanes(normal, c);
            }

            mix = mix * cv_gain(io.input(BandSplitterInput::AllCv), c);
            if saturate {
                mix = Saturator::saturate_lanes(mix);
            }
            io.output_mut(BandSplitterOutput::Mix).set_lanes(c, mix);
        }

        for band in Band::ALL {
            io.output_mut(band.output()).set_channels(active);
        }
        io.output_mut(BandSplitterOutput::Mix)
            .set_channels(if mono_returns { 1 } else { active });

        if self.led_clock.process() {
            self.update_leds(args.sample_time * LED_UPDATE_RATE as f32);
        }
    }

    fn process_bypass(&mut self, _args: &ProcessArgs) {
        let active = self.active_channels();
        let io = &mut self.io;
        for c in 0..active {
            let sum = Band::ALL
                .iter()
                .map(|band| io.input(band.input()).poly_voltage(c))
                .sum::<f32>()
                + io.input(BandSplitterInput::All).poly_voltage(c);
            io.output_mut(BandSplitterOutput::Mix).set_voltage(c, sum);
        }
        io.output_mut(BandSplitterOutput::Mix).set_channels(active);
    }

    fn data_to_json(&self) -> Value {
        self.state.to_json()
    }

    fn data_from_json(&mut self, root: &Value) {
        self.state = BandSplitterState::from_json(root);
    }
}
