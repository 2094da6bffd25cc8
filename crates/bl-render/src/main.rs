//! Bandloop offline renderer
//!
//! Usage:
//!   bl-render in.wav out.wav --module band-splitter
//!   bl-render in.wav out.wav --module bypass --engage-at 1.5
//!   bl-render in.wav out.wav --module spring-reverb --kernel ir.wav
//!   bl-render in.wav out.wav --config render.json --host-bypass

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use bl_render::{ModuleKind, RenderConfig, RenderJob, read_wav, render, write_wav};
use bl_state::PatchDocument;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bl-render", about = "Render a WAV file through a Bandloop module")]
struct Cli {
    /// Input WAV file
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Module to render through
    #[arg(short, long, value_enum, default_value_t = ModuleKind::BandSplitter)]
    module: ModuleKind,

    /// JSON render config; any subset of keys
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the host-bypass path instead of normal processing
    #[arg(long)]
    host_bypass: bool,

    /// Impulse response WAV for the spring reverb
    #[arg(long)]
    kernel: Option<PathBuf>,

    /// Patch file to restore module state from before rendering
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Write the module state after rendering to this patch file
    #[arg(long)]
    save_patch: Option<PathBuf>,

    /// Bypass only: press launch at this time in seconds (overrides the config)
    #[arg(long)]
    engage_at: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RenderConfig::load_from(path)?,
        None => RenderConfig::default(),
    };
    if cli.engage_at.is_some() {
        config.engage_at_seconds = cli.engage_at;
    }

    let input = read_wav(&cli.input)?;
    log::info!(
        "Loaded {} ({} ch, {} Hz, {:.2} s)",
        cli.input.display(),
        input.channel_count(),
        input.sample_rate,
        input.duration_seconds()
    );

    let kernel = cli.kernel.as_ref().map(read_wav).transpose()?;
    let patch = cli
        .patch
        .as_ref()
        .map(PatchDocument::load_from)
        .transpose()
        .context("loading patch")?;

    let job = RenderJob {
        config,
        host_bypass: cli.host_bypass,
        kernel: kernel.as_ref(),
        patch: patch.as_ref(),
    };

    let start = Instant::now();
    let output = render(cli.module, &input, &job)?;
    log::info!(
        "Rendered {:.2} s of audio in {:.2} s",
        output.audio.duration_seconds(),
        start.elapsed().as_secs_f64()
    );

    write_wav(&cli.output, &output.audio, job.config.bit_depth)?;
    log::info!("Wrote {}", cli.output.display());

    if let Some(path) = &cli.save_patch {
        output.patch.save_to(path).context("saving patch")?;
        log::info!("Saved module state to {}", path.display());
    }
    Ok(())
}
