//! Offline host transport: drives one module over a whole buffer
//!
//! The renderer plays the host role: it sets input voltages, output patch
//! flags, and the launch button each frame, then calls `process` (or
//! `process_bypass`) and reads the outputs back.

use anyhow::{Context, Result, bail};
use bl_core::{MAX_CHANNELS, Module, PortId, ProcessArgs};
use bl_dsp::convolution::{DEFAULT_BLOCK_SIZE, FirConvolver};
use bl_modules::band_splitter::{BandSplitterInput, BandSplitterOutput, BandSplitterParam};
use bl_modules::bypass::{BypassInput, BypassOutput, BypassParam};
use bl_modules::spring_reverb::{SpringReverbInput, SpringReverbOutput, SpringReverbParam};
use bl_modules::{BandSplitter, Bypass, SpringReverb};
use bl_state::PatchDocument;
use clap::ValueEnum;

use crate::audio::AudioBuffer;
use crate::config::RenderConfig;

/// Which unit to render through
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModuleKind {
    /// Input channel 0 into `All`, `Mix` out (mono)
    BandSplitter,
    /// Stereo in, sends looped straight into the returns, stereo out
    Bypass,
    /// Input into `In1`/`In2`, `Mix` and `Wet` out; needs an IR kernel
    SpringReverb,
}

/// Everything one render needs besides the input audio
#[derive(Debug, Clone, Default)]
pub struct RenderJob<'a> {
    pub config: RenderConfig,
    /// Call the host-bypass entry point instead of `process`
    pub host_bypass: bool,
    /// Impulse response for the spring reverb (channel 0 is used)
    pub kernel: Option<&'a AudioBuffer>,
    /// Module state to restore before rendering
    pub patch: Option<&'a PatchDocument>,
}

/// Rendered audio plus the module state at the end of the render
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub audio: AudioBuffer,
    pub patch: PatchDocument,
}

pub fn build_module(kind: ModuleKind, kernel: Option<&AudioBuffer>) -> Result<Box<dyn Module>> {
    Ok(match kind {
        ModuleKind::BandSplitter => Box::new(BandSplitter::new()),
        ModuleKind::Bypass => Box::new(Bypass::new()),
        ModuleKind::SpringReverb => {
            let Some(kernel) = kernel else {
                bail!("the spring reverb needs an impulse response (--kernel)");
            };
            let Some(taps) = kernel.channels.first() else {
                bail!("impulse response has no channels");
            };
            let convolver =
                FirConvolver::new(taps, DEFAULT_BLOCK_SIZE).context("loading impulse response")?;
            Box::new(SpringReverb::new(Box::new(convolver)))
        }
    })
}

/// Id names of a module's params, in slot order
fn param_names(kind: ModuleKind) -> Vec<String> {
    fn names<P: PortId + std::fmt::Debug, const N: usize>(all: [P; N]) -> Vec<String> {
        all.iter().map(|p| format!("{p:?}")).collect()
    }
    match kind {
        ModuleKind::BandSplitter => names(BandSplitterParam::ALL),
        ModuleKind::Bypass => names(BypassParam::ALL),
        ModuleKind::SpringReverb => names(SpringReverbParam::ALL),
    }
}

/// Apply param overrides and the soft-clip override from the config
fn configure(module: &mut dyn Module, kind: ModuleKind, config: &RenderConfig) -> Result<()> {
    let names = param_names(kind);
    for (name, value) in &config.params {
        let Some(index) = names.iter().position(|n| n == name) else {
            bail!("{kind:?} has no param '{name}' (expected one of {names:?})");
        };
        let param = &mut module.io_mut().params_mut()[index];
        param.set_value(*value);
        log::info!("{name} = {}", param.display_value());
    }

    if let Some(apply) = config.apply_saturation {
        let mut data = module.data_to_json();
        match data.as_object_mut() {
            Some(map) => {
                map.insert("applySaturation".into(), apply.into());
                module.data_from_json(&data);
            }
            None => log::warn!("{kind:?} has no soft-clip setting; ignoring apply_saturation"),
        }
    }
    Ok(())
}

/// Copy the active channels of an output into an input, like a patch cable
fn patch_cable(module: &mut dyn Module, from: BypassOutput, to: BypassInput) {
    let mut buffer = [0.0; MAX_CHANNELS];
    let output = module.io().output(from);
    let channels = output.channels();
    buffer[..channels].copy_from_slice(output.voltages());
    module.io_mut().input_mut(to).set_voltages(&buffer[..channels]);
}

pub fn render(kind: ModuleKind, input: &AudioBuffer, job: &RenderJob<'_>) -> Result<RenderOutput> {
    let config = &job.config;
    config.validate()?;
    if input.channel_count() == 0 {
        bail!("input has no channels");
    }

    let mut module = build_module(kind, job.kernel)?;
    if let Some(patch) = job.patch {
        patch
            .restore(&mut [module.as_mut()])
            .context("restoring patch")?;
    }
    configure(module.as_mut(), kind, config)?;

    let sample_rate = input.sample_rate as f32;
    let mut args = ProcessArgs::new(sample_rate)?;
    module.on_sample_rate_change(sample_rate);

    let volts = config.volts_per_unit;
    let stereo_in = input.channel_count() > 1;
    let frames = input.frames() + (config.tail_seconds * sample_rate).round() as usize;
    let engage_frame = config
        .engage_at_seconds
        .map(|t| (t * sample_rate).round() as usize);
    let out_channels = match kind {
        ModuleKind::BandSplitter => 1,
        ModuleKind::Bypass | ModuleKind::SpringReverb => 2,
    };
    let mut out = vec![Vec::with_capacity(frames); out_channels];

    log::info!(
        "Rendering {frames} frames at {sample_rate} Hz through {kind:?}{}",
        if job.host_bypass { " (host bypass)" } else { "" }
    );

    for frame in 0..frames {
        let left = input.sample(0, frame) * volts;
        let right = input.sample(1, frame) * volts;

        match kind {
            ModuleKind::BandSplitter => {
                let io = module.io_mut();
                io.input_mut(BandSplitterInput::All).set_mono(left);
            }
            ModuleKind::Bypass => {
                patch_cable(module.as_mut(), BypassOutput::ToFxL, BypassInput::FromFxL);
                patch_cable(module.as_mut(), BypassOutput::ToFxR, BypassInput::FromFxR);
                let io = module.io_mut();
                io.input_mut(BypassInput::InL).set_mono(left);
                if stereo_in {
                    io.input_mut(BypassInput::InR).set_mono(right);
                }
                io.output_mut(BypassOutput::ToFxL).set_patched(true);
                io.output_mut(BypassOutput::ToFxR).set_patched(true);
                let pressed = engage_frame == Some(frame);
                io.set_value(BypassParam::LaunchButton, if pressed { 1.0 } else { 0.0 });
            }
            ModuleKind::SpringReverb => {
                let io = module.io_mut();
                io.input_mut(SpringReverbInput::In1).set_mono(left);
                if stereo_in {
                    io.input_mut(SpringReverbInput::In2).set_mono(right);
                }
            }
        }

        if job.host_bypass {
            module.process_bypass(&args);
        } else {
            module.process(&args);
        }
        args.advance();

        let io = module.io();
        match kind {
            ModuleKind::BandSplitter => {
                out[0].push(io.output(BandSplitterOutput::Mix).voltage(0) / volts);
            }
            ModuleKind::Bypass => {
                out[0].push(io.output(BypassOutput::OutL).voltage(0) / volts);
                out[1].push(io.output(BypassOutput::OutR).voltage(0) / volts);
            }
            ModuleKind::SpringReverb => {
                out[0].push(io.output(SpringReverbOutput::Mix).voltage(0) / volts);
                out[1].push(io.output(SpringReverbOutput::Wet).voltage(0) / volts);
            }
        }
    }

    Ok(RenderOutput {
        audio: AudioBuffer::new(input.sample_rate, out),
        patch: PatchDocument::capture(&[module.as_ref()]),
    })
}
