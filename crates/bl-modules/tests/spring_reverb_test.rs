//! Spring Reverb shell: block queueing, mixing, and metering

use bl_core::{Module, ProcessArgs};
use bl_dsp::convolution::{BlockConvolver, FirConvolver};
use bl_modules::SpringReverb;
use bl_modules::spring_reverb::{SpringReverbInput, SpringReverbLight, SpringReverbOutput, SpringReverbParam};

/// Records every block it is handed and echoes it back scaled
struct Recorder {
    block_size: usize,
    scale: f32,
    blocks: std::sync::Arc<std::sync::Mutex<Vec<Vec<f32>>>>,
}

impl BlockConvolver for Recorder {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.blocks.lock().unwrap().push(input.to_vec());
        for (y, x) in output.iter_mut().zip(input) {
            *y = x * self.scale;
        }
    }

    fn reset(&mut self) {}
}

fn run(reverb: &mut SpringReverb, frames: usize) {
    let mut args = ProcessArgs::default();
    for _ in 0..frames {
        reverb.process(&args);
        args.advance();
    }
}

fn identity_reverb() -> SpringReverb {
    SpringReverb::new(Box::new(FirConvolver::new(&[1.0], 1024).unwrap()))
}

#[test]
fn test_blocks_are_handed_over_when_queue_drains() {
    let blocks = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut reverb = SpringReverb::new(Box::new(Recorder {
        block_size: 4,
        scale: 1.0,
        blocks: blocks.clone(),
    }));
    reverb.io_mut().set_value(SpringReverbParam::Level1, 1.0);
    reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(1.0);

    run(&mut reverb, 1);
    assert_eq!(blocks.lock().unwrap().len(), 1);
    assert_eq!(reverb.queued_wet(), 3);

    run(&mut reverb, 3);
    assert_eq!(blocks.lock().unwrap().len(), 1);
    assert_eq!(reverb.queued_wet(), 0);

    run(&mut reverb, 1);
    let blocks = blocks.lock().unwrap();
    assert_eq!(blocks.len(), 2);
    // First block: one sample then zero padding; second block is full
    assert_eq!(&blocks[0][1..], &[0.0; 3]);
    assert!(blocks[1].iter().all(|x| *x != 0.0));
}

#[test]
fn test_silent_levels_give_dry_crossfade() {
    let mut reverb = identity_reverb();
    reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(4.0);
    run(&mut reverb, 10);
    let io = reverb.io();
    assert_eq!(io.output(SpringReverbOutput::Wet).voltage(0), 0.0);
    // Wet = 0.5 by default: halfway between 4 V dry and 0 V wet
    assert_eq!(io.output(SpringReverbOutput::Mix).voltage(0), 2.0);
}

#[test]
fn test_mix_cv_moves_balance() {
    let mut reverb = identity_reverb();
    reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(4.0);
    reverb.io_mut().input_mut(SpringReverbInput::MixCv).set_mono(5.0);
    run(&mut reverb, 1);
    assert_eq!(reverb.io().output(SpringReverbOutput::Mix).voltage(0), 0.0);

    reverb.io_mut().input_mut(SpringReverbInput::MixCv).set_mono(-5.0);
    run(&mut reverb, 1);
    assert_eq!(reverb.io().output(SpringReverbOutput::Mix).voltage(0), 4.0);
}

#[test]
fn test_outputs_hard_clamped() {
    let mut reverb = SpringReverb::new(Box::new(Recorder {
        block_size: 8,
        scale: 1e6,
        blocks: Default::default(),
    }));
    reverb.io_mut().set_value(SpringReverbParam::Level1, 1.0);
    reverb.io_mut().set_value(SpringReverbParam::Wet, 0.0);
    reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(30.0);
    run(&mut reverb, 1);
    let io = reverb.io();
    assert_eq!(io.output(SpringReverbOutput::Mix).voltage(0), 10.0);
    assert_eq!(io.output(SpringReverbOutput::Wet).voltage(0), 10.0);
}

#[test]
fn test_level_cv_closes_send() {
    let blocks = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut reverb = SpringReverb::new(Box::new(Recorder {
        block_size: 4,
        scale: 1.0,
        blocks: blocks.clone(),
    }));
    reverb.io_mut().set_value(SpringReverbParam::Level1, 1.0);
    reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(5.0);
    reverb.io_mut().input_mut(SpringReverbInput::Cv1).set_mono(0.0);
    run(&mut reverb, 9);
    assert!(blocks.lock().unwrap().iter().flatten().all(|x| *x == 0.0));
    assert_eq!(reverb.io().light(SpringReverbLight::Peak).brightness(), 0.0);
}

#[test]
fn test_meters_light_with_signal() {
    let mut reverb = SpringReverb::new(Box::new(Recorder {
        block_size: 16,
        scale: 400.0,
        blocks: Default::default(),
    }));
    reverb.io_mut().set_value(SpringReverbParam::Level1, 1.0);
    reverb.io_mut().set_value(SpringReverbParam::Hpf, 0.0);
    let mut args = ProcessArgs::default();
    for i in 0..4800 {
        let x = if (i / 24) % 2 == 0 { 5.0 } else { -5.0 };
        reverb.io_mut().input_mut(SpringReverbInput::In1).set_mono(x);
        reverb.process(&args);
        args.advance();
    }
    let io = reverb.io();
    assert!(io.light(SpringReverbLight::Peak).brightness() > 0.5);
    assert!(io.light(SpringReverbLight::Vu7).brightness() > 0.0);
    for light in io.lights() {
        assert!((0.0..=1.0).contains(&light.brightness()));
    }
}

#[test]
fn test_sample_rate_reaches_convolver() {
    let mut reverb = identity_reverb();
    reverb.on_sample_rate_change(96000.0);
    let mut args = ProcessArgs::new(96000.0).unwrap();
    for _ in 0..2048 {
        reverb.process(&args);
        args.advance();
    }
    assert!(reverb.io().output(SpringReverbOutput::Mix).voltage(0).is_finite());
}
