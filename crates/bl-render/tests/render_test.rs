//! End-to-end renders through each module

use approx::assert_abs_diff_eq;
use bl_render::{AudioBuffer, ModuleKind, RenderConfig, RenderJob, read_wav, render, write_wav};
use bl_state::PatchDocument;

const SAMPLE_RATE: u32 = 48000;

fn sine(frames: usize, freq: f32, amplitude: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0, |m, x| m.max(x.abs()))
}

#[test]
fn test_band_splitter_host_bypass_is_identity() {
    let input = AudioBuffer::new(SAMPLE_RATE, vec![sine(4800, 440.0, 0.5)]);
    let job = RenderJob {
        host_bypass: true,
        ..Default::default()
    };
    let output = render(ModuleKind::BandSplitter, &input, &job).unwrap();
    assert_eq!(output.audio.channel_count(), 1);
    for (a, b) in output.audio.channels[0].iter().zip(&input.channels[0]) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_band_splitter_passes_midrange() {
    let input = AudioBuffer::new(SAMPLE_RATE, vec![sine(24000, 1000.0, 0.2)]);
    let output = render(ModuleKind::BandSplitter, &input, &RenderJob::default()).unwrap();
    let out = &output.audio.channels[0];
    assert_eq!(out.len(), 24000);
    assert!(out.iter().all(|x| x.is_finite()));
    // Bands overlap around 1 kHz; the mix must carry real signal
    assert!(peak(&out[12000..]) > 0.05);
}

#[test]
fn test_param_overrides_by_id_name() {
    let input = AudioBuffer::new(SAMPLE_RATE, vec![sine(9600, 100.0, 0.2)]);
    let mut config = RenderConfig::default();
    for name in ["LowGain", "LowMidGain", "HighMidGain", "HighGain"] {
        config.params.insert(name.into(), 0.0);
    }
    let job = RenderJob {
        config,
        ..Default::default()
    };
    let output = render(ModuleKind::BandSplitter, &input, &job).unwrap();
    assert_eq!(peak(&output.audio.channels[0]), 0.0);
}

#[test]
fn test_unknown_param_is_error() {
    let input = AudioBuffer::new(SAMPLE_RATE, vec![vec![0.0; 16]]);
    let mut config = RenderConfig::default();
    config.params.insert("Gain".into(), 1.0);
    let job = RenderJob {
        config,
        ..Default::default()
    };
    assert!(render(ModuleKind::BandSplitter, &input, &job).is_err());
}

#[test]
fn test_bypass_loop_engages_at_configured_time() {
    let frames = 9600;
    let input = AudioBuffer::new(
        SAMPLE_RATE,
        vec![sine(frames, 220.0, 0.4), sine(frames, 330.0, 0.4)],
    );
    let mut config = RenderConfig::default();
    config.engage_at_seconds = Some(0.05);
    config.params.insert("FxGain".into(), 1.0);
    config.apply_saturation = Some(false);
    let job = RenderJob {
        config,
        ..Default::default()
    };
    let output = render(ModuleKind::Bypass, &input, &job).unwrap();
    let left = &output.audio.channels[0];

    // Before the press the output is the dry input
    for i in 0..2400 {
        assert!((left[i] - input.channels[0][i]).abs() < 1e-6, "frame {i}");
    }
    // Fully engaged: the looped send comes back +12 dB (one frame late)
    let gain = 10.0_f32.powf(12.0 / 20.0);
    for i in 4000..frames {
        assert_abs_diff_eq!(left[i], gain * input.channels[0][i - 1], epsilon = 1e-4);
    }
    assert_eq!(output.patch.modules[0].data["active"], true);
}

#[test]
fn test_spring_reverb_needs_kernel() {
    let input = AudioBuffer::new(SAMPLE_RATE, vec![vec![0.0; 16]]);
    assert!(render(ModuleKind::SpringReverb, &input, &RenderJob::default()).is_err());

    let kernel = AudioBuffer::new(SAMPLE_RATE, vec![vec![1.0, 0.5, 0.25]]);
    let job = RenderJob {
        kernel: Some(&kernel),
        ..Default::default()
    };
    let output = render(ModuleKind::SpringReverb, &input, &job).unwrap();
    assert_eq!(output.audio.channel_count(), 2);
    assert_eq!(output.audio.frames(), 16);
}

#[test]
fn test_patch_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("in.wav");
    let patch_path = dir.path().join("bypass.json");

    let input = AudioBuffer::new(SAMPLE_RATE, vec![sine(4800, 440.0, 0.3)]);
    write_wav(&wav, &input, 32).unwrap();
    let input = read_wav(&wav).unwrap();

    let mut config = RenderConfig::default();
    config.engage_at_seconds = Some(0.0);
    config.tail_seconds = 0.01;
    let job = RenderJob {
        config,
        ..Default::default()
    };
    let first = render(ModuleKind::Bypass, &input, &job).unwrap();
    assert_eq!(first.audio.frames(), 4800 + 480);
    first.patch.save_to(&patch_path).unwrap();

    // The restored latch is still engaged without a new press
    let patch = PatchDocument::load_from(&patch_path).unwrap();
    let job = RenderJob {
        patch: Some(&patch),
        ..Default::default()
    };
    let second = render(ModuleKind::Bypass, &input, &job).unwrap();
    assert_eq!(second.patch.modules[0].data["active"], true);

    // A patch for another module is rejected
    assert!(render(ModuleKind::BandSplitter, &input, &job).is_err());
}
