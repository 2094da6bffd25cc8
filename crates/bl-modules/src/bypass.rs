//! Bypass Switcher: click-free send/return loop with a launch latch
//!
//! The launch CV (Schmitt trigger) and the launch button either toggle a
//! persisted `active` flag (latch mode) or gate the loop directly while held
//! (gate mode). The resulting 0/1 target is slewed into `send_active`, which
//! fades the sends in and out and crossfades the outputs between dry and
//! return.

use bl_core::{
    Decibels, LANES, Lanes, Module, ModuleIo, ParamConfig, ProcessArgs, group_count, port_ids,
};
use bl_dsp::control::{BooleanTrigger, SchmittTrigger};
use bl_dsp::saturation::Saturator;
use bl_dsp::smoothing::SlewLimiter;
use bl_state::BypassState;
use serde_json::Value;

/// Default click-filter time, in seconds
pub const DEFAULT_SLEW_TIME: f32 = 0.01;

port_ids! {
    pub enum BypassParam { Mode, FxGain, LaunchMode, LaunchButton, SlewTime }
}

port_ids! {
    pub enum BypassInput { InL, InR, FromFxL, FromFxR, Launch }
}

port_ids! {
    pub enum BypassOutput { ToFxL, ToFxR, OutL, OutR }
}

port_ids! {
    pub enum BypassLight { Launch }
}

/// How the FX return is blended while the loop is engaged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMode {
    /// Crossfade: the return is cut along with the send
    Hard,
    /// The return is always mixed in, so tails ring out after disengaging
    Soft,
}

impl ReturnMode {
    pub fn from_param(value: f32) -> Self {
        if value >= 0.5 { Self::Soft } else { Self::Hard }
    }
}

/// How launch events drive the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Each rising edge flips the persisted `active` flag
    Latch,
    /// Engaged only while the CV is high or the button is held
    Gate,
}

impl LaunchMode {
    pub fn from_param(value: f32) -> Self {
        if value >= 0.5 { Self::Gate } else { Self::Latch }
    }
}

/// FX return gain for a knob position in [-1, 1]: -30 dB to +12 dB, 0 dB at centre
#[inline]
pub fn fx_return_gain(position: f32) -> f32 {
    Decibels(fx_return_db(position)).to_gain()
}

#[inline]
fn fx_return_db(position: f32) -> f32 {
    if position < 0.0 {
        30.0 * position
    } else {
        12.0 * position
    }
}

fn format_fx_gain(position: f32) -> String {
    let db = fx_return_db(position);
    // Whole numbers without a trailing ".0"
    if db.fract() == 0.0 {
        format!("{db:.0} dB")
    } else {
        format!("{db:.2} dB")
    }
}

/// Stereo send/return switcher
#[derive(Debug, Clone)]
pub struct Bypass {
    io: ModuleIo,
    launch_cv: SchmittTrigger,
    launch_button: BooleanTrigger,
    click_filter: SlewLimiter,
    state: BypassState,
}

impl Default for Bypass {
    fn default() -> Self {
        Self::new()
    }
}

impl Bypass {
    pub const MODEL: &'static str = "Bypass";

    pub fn new() -> Self {
        let mut io = ModuleIo::for_ids::<BypassParam, BypassInput, BypassOutput, BypassLight>();

        io.config_param(
            BypassParam::Mode,
            ParamConfig::switch("Return mode", 0.0, 1.0, 0.0, &["Hard", "Soft"]).with_description(
                "In hard mode, the loop cuts off any sound coming from the FX return.\n\
                 In soft mode, the return stays active for reverb tails and decaying delay taps.",
            ),
        );
        io.config_param(
            BypassParam::FxGain,
            ParamConfig::continuous("FX return gain", -1.0, 1.0, 0.0).with_formatter(format_fx_gain),
        );
        io.config_switch(
            BypassParam::LaunchMode,
            "Launch mode",
            0.0,
            &["Latch (Toggle)", "Gate (Momentary)"],
        );
        io.config_button(BypassParam::LaunchButton, "Launch");
        io.config_param(
            BypassParam::SlewTime,
            ParamConfig::continuous("Slew time", 0.005, 0.05, DEFAULT_SLEW_TIME).with_unit("s"),
        );

        io.config_input(BypassInput::InL, "Left", "");
        io.config_input(BypassInput::InR, "Right", "Normalled to Left");
        io.config_input(BypassInput::FromFxL, "From FX L", "");
        io.config_input(BypassInput::FromFxR, "From FX R", "");
        io.config_input(BypassInput::Launch, "Launch", "");

        io.config_output(BypassOutput::ToFxL, "To FX L", "");
        io.config_output(BypassOutput::ToFxR, "To FX R", "");
        io.config_output(BypassOutput::OutL, "Left", "");
        io.config_output(BypassOutput::OutR, "Right", "");

        io.config_light(BypassLight::Launch, "Launch");

        let mut click_filter = SlewLimiter::default();
        click_filter.set_slew_time(DEFAULT_SLEW_TIME);

        Self {
            io,
            launch_cv: SchmittTrigger::new(),
            launch_button: BooleanTrigger::new(),
            click_filter,
            state: BypassState::default(),
        }
    }

    /// Current slewed engage level in [0, 1]
    #[inline]
    pub fn send_active(&self) -> f32 {
        self.click_filter.value()
    }

    /// Latched loop state (meaningful in latch mode)
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn state(&self) -> BypassState {
        self.state
    }

    pub fn set_apply_saturation(&mut self, apply: bool) {
        self.state.apply_saturation = apply;
    }

    pub fn return_mode(&self) -> ReturnMode {
        ReturnMode::from_param(self.io.value(BypassParam::Mode))
    }

    pub fn launch_mode(&self) -> LaunchMode {
        LaunchMode::from_param(self.io.value(BypassParam::LaunchMode))
    }

    /// Run the launch triggers and return the unslewed engage target
    fn launch_target(&mut self) -> f32 {
        let cv_edge = self
            .launch_cv
            .process(self.io.input(BypassInput::Launch).voltage(0));
        let held = self.io.value(BypassParam::LaunchButton) > 0.5;
        let button_edge = self.launch_button.process(held);

        match self.launch_mode() {
            LaunchMode::Latch => {
                if cv_edge || button_edge {
                    self.state.active = !self.state.active;
                }
                if self.state.active { 1.0 } else { 0.0 }
            }
            LaunchMode::Gate => {
                if self.launch_cv.is_high() || self.launch_button.is_high() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Module for Bypass {
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
        // Slew rates are per second; only the per-frame step changes
        log::debug!("Bypass running at {sample_rate} Hz");
    }

    fn process(&mut self, args: &ProcessArgs) {
        self.click_filter
            .set_slew_time(self.io.value(BypassParam::SlewTime));

        let target = self.launch_target();
        let send_active = self.click_filter.process(args.sample_time, target);
        let return_mode = self.return_mode();
        let saturate = self.state.apply_saturation;
        let io = &mut self.io;

        // ─── FX send ──────────────────────────────────────────────────────
        let in_l = io.input(BypassInput::InL);
        let in_r = io.input(BypassInput::InR);
        let input_channels = in_l.channels().max(in_r.channels()).max(1);
        let s = Lanes::splat(send_active);
        for group in 0..group_count(input_channels) {
            let c = group * LANES;
            let left = io.input(BypassInput::InL).poly_lanes(c);
            let right = io.input(BypassInput::InR).normal_poly_lanes(left, c);
            io.output_mut(BypassOutput::ToFxL).set_lanes(c, left * s);
            io.output_mut(BypassOutput::ToFxR).set_lanes(c, right * s);
        }
        io.output_mut(BypassOutput::ToFxL).set_channels(input_channels);
        io.output_mut(BypassOutput::ToFxR).set_channels(input_channels);

        // ─── FX return ────────────────────────────────────────────────────
        let return_channels = io
            .input(BypassInput::FromFxL)
            .channels()
            .max(io.input(BypassInput::FromFxR).channels())
            .max(1);
        let gain = Lanes::splat(fx_return_gain(io.value(BypassParam::FxGain)));
        let dry_fade = Lanes::splat(1.0 - send_active);

        // A mono dry side is mixed down so it lines up with every return lane
        let mono_dry = (input_channels == 1).then(|| {
            let in_l = io.input(BypassInput::InL);
            let in_r = io.input(BypassInput::InR);
            let left = in_l.voltage_sum();
            let right = if in_r.is_connected() { in_r.voltage_sum() } else { left };
            (Lanes::splat(left), Lanes::splat(right))
        });

        for group in 0..group_count(return_channels) {
            let c = group * LANES;
            let (dry_l, dry_r) = mono_dry.unwrap_or_else(|| {
                let left = io.input(BypassInput::InL).poly_lanes(c);
                (left, io.input(BypassInput::InR).normal_poly_lanes(left, c))
            });
            let ret_l = gain * io.input(BypassInput::FromFxL).poly_lanes(c);
            let ret_r = gain * io.input(BypassInput::FromFxR).poly_lanes(c);

            let (mut out_l, mut out_r) = match return_mode {
                ReturnMode::Hard => (dry_l * dry_fade + s * ret_l, dry_r * dry_fade + s * ret_r),
                ReturnMode::Soft => (dry_l * dry_fade + ret_l, dry_r * dry_fade + ret_r),
            };
            if saturate {
                out_l = Saturator::saturate_lanes(out_l);
                out_r = Saturator::saturate_lanes(out_r);
            }
            io.output_mut(BypassOutput::OutL).set_lanes(c, out_l);
            io.output_mut(BypassOutput::OutR).set_lanes(c, out_r);
        }
        io.output_mut(BypassOutput::OutL).set_channels(return_channels);
        io.output_mut(BypassOutput::OutR).set_channels(return_channels);

        io.light_mut(BypassLight::Launch)
            .set_brightness_smooth(send_active, args.sample_time);
    }

    fn process_bypass(&mut self, _args: &ProcessArgs) {
        let io = &mut self.io;
        // Straight wires: no normalling, an unplugged side reads silence
        for (input, output) in [
            (BypassInput::InL, BypassOutput::OutL),
            (BypassInput::InR, BypassOutput::OutR),
        ] {
            let channels = io.input(input).channels();
            for c in 0..channels.max(1) {
                let v = io.input(input).voltage(c);
                io.output_mut(output).set_voltage(c, v);
            }
            io.output_mut(output).set_channels(channels);
        }
        for send in [BypassOutput::ToFxL, BypassOutput::ToFxR] {
            let out = io.output_mut(send);
            out.set_channels(1);
            out.set_voltage(0, 0.0);
        }
    }

    fn data_to_json(&self) -> Value {
        self.state.to_json()
    }

    fn data_from_json(&mut self, root: &Value) {
        self.state = BypassState::from_json(root);
    }
}
