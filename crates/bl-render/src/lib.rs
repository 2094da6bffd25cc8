//! bl-render: offline host for Bandloop modules
//!
//! Reads a WAV file, drives one module frame by frame the way a live host
//! would, and writes the result back out.

pub mod audio;
pub mod config;
pub mod render;

pub use audio::{AudioBuffer, read_wav, write_wav};
pub use config::RenderConfig;
pub use render::{ModuleKind, RenderJob, RenderOutput, render};
