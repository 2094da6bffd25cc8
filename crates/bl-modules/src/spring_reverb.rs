//! Spring Reverb: the module shell around a block convolution engine
//!
//! The dry send (two level-scaled inputs, high-passed) is queued into fixed
//! blocks for a [`BlockConvolver`]. The wet signal is read back one frame at a
//! time, so the wet path carries one block of latency.

use bl_core::{Module, ModuleIo, ParamConfig, ProcessArgs, REFERENCE_VOLTAGE, port_ids};
use bl_dsp::convolution::BlockConvolver;
use bl_dsp::onepole::RcFilter;
use bl_dsp::smoothing::PeakFilter;

/// Peak level factor applied to the level sliders
pub const LEVEL_SCALE: f32 = 0.03;

/// Base of the exponential level taper
pub const LEVEL_BASE: f32 = 25.0;

/// Send highpass cutoff at `Hpf = 0`, in Hz; the knob spans ×1 to ×20
pub const HPF_BASE_HZ: f32 = 200.0;

/// Number of VU segments
pub const VU_SEGMENTS: usize = 7;

/// Per-segment sensitivity step of the VU meter (≈ +3 dB)
const VU_STEP: f32 = 1.413;

/// Meter release rate, in 1/s
const LIGHT_RATE: f32 = 5.0;

port_ids! {
    pub enum SpringReverbParam { Wet, Level1, Level2, Hpf }
}

port_ids! {
    pub enum SpringReverbInput { Cv1, Cv2, In1, In2, MixCv }
}

port_ids! {
    pub enum SpringReverbOutput { Mix, Wet }
}

port_ids! {
    pub enum SpringReverbLight { Peak, Vu1, Vu2, Vu3, Vu4, Vu5, Vu6, Vu7 }
}

/// Odd exponential taper on [-1, 1] with `f(±1) = ±1`
#[inline]
pub fn exp_bipolar(base: f32, x: f32) -> f32 {
    (base.powf(x) - base.powf(-x)) / (base - 1.0 / base)
}

/// Convolution reverb shell
pub struct SpringReverb {
    io: ModuleIo,
    convolver: Box<dyn BlockConvolver>,
    dry_filter: RcFilter,
    vu_filter: PeakFilter,
    light_filter: PeakFilter,
    /// Filtered dry samples waiting for the next block
    input_block: Vec<f32>,
    input_len: usize,
    /// Wet samples from the last block, read from `output_pos`
    output_block: Vec<f32>,
    output_pos: usize,
}

impl SpringReverb {
    pub const MODEL: &'static str = "SpringReverb";

    /// Block buffers are sized from `convolver.block_size()` here, so the
    /// audio path never allocates.
    pub fn new(convolver: Box<dyn BlockConvolver>) -> Self {
        let mut io = ModuleIo::for_ids::<
            SpringReverbParam,
            SpringReverbInput,
            SpringReverbOutput,
            SpringReverbLight,
        >();

        io.config_param(SpringReverbParam::Wet, ParamConfig::continuous("Dry/wet", 0.0, 1.0, 0.5));
        io.config_param(SpringReverbParam::Level1, ParamConfig::continuous("In 1 level", 0.0, 1.0, 0.0));
        io.config_param(SpringReverbParam::Level2, ParamConfig::continuous("In 2 level", 0.0, 1.0, 0.0));
        io.config_param(
            SpringReverbParam::Hpf,
            ParamConfig::continuous("High pass filter cutoff", 0.0, 1.0, 0.5),
        );

        io.config_input(SpringReverbInput::Cv1, "Level 1 CV", "");
        io.config_input(SpringReverbInput::Cv2, "Level 2 CV", "");
        io.config_input(SpringReverbInput::In1, "In 1", "");
        io.config_input(SpringReverbInput::In2, "In 2", "");
        io.config_input(SpringReverbInput::MixCv, "Mix CV", "");

        io.config_output(SpringReverbOutput::Mix, "Mix", "");
        io.config_output(SpringReverbOutput::Wet, "Wet", "");

        io.config_light(SpringReverbLight::Peak, "Peak");
        for (i, light) in SpringReverbLight::ALL[1..].iter().enumerate() {
            io.config_light(*light, &format!("VU {}", i + 1));
        }

        let block_size = convolver.block_size();
        Self {
            io,
            convolver,
            dry_filter: RcFilter::default(),
            vu_filter: PeakFilter::new(),
            light_filter: PeakFilter::new(),
            input_block: vec![0.0; block_size],
            input_len: 0,
            output_block: vec![0.0; block_size],
            // Start drained so the first frame runs a block
            output_pos: block_size,
        }
    }

    pub fn block_size(&self) -> usize {
        self.input_block.len()
    }

    /// Wet samples still queued from the last block
    pub fn queued_wet(&self) -> usize {
        self.output_block.len() - self.output_pos
    }

    fn level(&self, param: SpringReverbParam, cv: SpringReverbInput) -> f32 {
        LEVEL_SCALE
            * exp_bipolar(LEVEL_BASE, self.io.value(param))
            * self.io.input(cv).normal_voltage(REFERENCE_VOLTAGE, 0)
            / REFERENCE_VOLTAGE
    }

    /// Hand the queued dry samples (zero-padded) to the convolver
    fn run_block(&mut self) {
        self.input_block[self.input_len..].fill(0.0);
        self.convolver
            .process_block(&self.input_block, &mut self.output_block);
        self.input_len = 0;
        self.output_pos = 0;
    }
}

impl Module for SpringReverb {
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
        self.convolver.set_sample_rate(sample_rate);
        log::debug!("SpringReverb running at {sample_rate} Hz, block {}", self.block_size());
    }

    fn process(&mut self, args: &ProcessArgs) {
        let in1 = self.io.input(SpringReverbInput::In1).voltage(0);
        let in2 = self.io.input(SpringReverbInput::In2).voltage(0);
        let level1 = self.level(SpringReverbParam::Level1, SpringReverbInput::Cv1);
        let level2 = self.level(SpringReverbParam::Level2, SpringReverbInput::Cv2);
        let dry = in1 * level1 + in2 * level2;

        let cutoff = HPF_BASE_HZ * 20.0_f32.powf(self.io.value(SpringReverbParam::Hpf));
        self.dry_filter.set_cutoff(cutoff * args.sample_time);
        self.dry_filter.process(dry);

        if self.input_len < self.input_block.len() {
            self.input_block[self.input_len] = self.dry_filter.highpass();
            self.input_len += 1;
        }

        if self.queued_wet() == 0 {
            self.run_block();
        }
        // Only a zero-length block leaves nothing to play
        let Some(&wet) = self.output_block.get(self.output_pos) else {
            return;
        };
        self.output_pos += 1;

        let balance = (self.io.value(SpringReverbParam::Wet)
            + self.io.input(SpringReverbInput::MixCv).voltage(0) / REFERENCE_VOLTAGE)
            .clamp(0.0, 1.0);
        let mix = in1 + (wet - in1) * balance;

        let io = &mut self.io;
        io.output_mut(SpringReverbOutput::Wet)
            .set_voltage(0, wet.clamp(-REFERENCE_VOLTAGE, REFERENCE_VOLTAGE));
        io.output_mut(SpringReverbOutput::Mix)
            .set_voltage(0, mix.clamp(-REFERENCE_VOLTAGE, REFERENCE_VOLTAGE));

        let rate = LIGHT_RATE * args.sample_time;
        self.vu_filter.set_rate(rate);
        self.vu_filter.process(wet.abs());
        self.light_filter.set_rate(rate);
        self.light_filter.process((dry * 50.0).abs());

        let vu = self.vu_filter.peak();
        for (i, light) in SpringReverbLight::ALL[1..].iter().enumerate() {
            let brightness = VU_STEP.powi(i as i32) * vu / REFERENCE_VOLTAGE - 1.0;
            io.light_mut(*light).set_brightness(brightness);
        }
        io.light_mut(SpringReverbLight::Peak)
            .set_brightness(self.light_filter.peak());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_dsp::convolution::FirConvolver;

    #[test]
    fn test_exp_bipolar() {
        assert_eq!(exp_bipolar(LEVEL_BASE, 0.0), 0.0);
        assert!((exp_bipolar(LEVEL_BASE, 1.0) - 1.0).abs() < 1e-6);
        assert!((exp_bipolar(LEVEL_BASE, -0.3) + exp_bipolar(LEVEL_BASE, 0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_ports() {
        let reverb = SpringReverb::new(Box::new(FirConvolver::new(&[1.0], 1024).unwrap()));
        assert_eq!(reverb.io().params().len(), 4);
        assert_eq!(reverb.io().inputs().len(), 5);
        assert_eq!(reverb.io().outputs().len(), 2);
        assert_eq!(reverb.io().lights().len(), 1 + VU_SEGMENTS);
        assert_eq!(reverb.io().value(SpringReverbParam::Wet), 0.5);
        assert_eq!(reverb.block_size(), 1024);
    }
}
