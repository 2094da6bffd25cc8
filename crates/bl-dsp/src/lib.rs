//! bl-dsp: DSP building blocks for Bandloop modules
//!
//! ## Modules
//! - `biquad` - TDF-II biquad coefficients, 4-lane biquads, cascaded filter banks
//! - `saturation` - Stateless soft clipper for ±10 V signals
//! - `smoothing` - Slew limiter, peak filter, clip-hold timer
//! - `control` - Schmitt/boolean triggers and the clock divider
//! - `onepole` - RC one-pole filter
//! - `convolution` - Block convolver contract and a direct-form FIR engine

pub mod biquad;
pub mod control;
pub mod convolution;
pub mod onepole;
pub mod saturation;
pub mod smoothing;

use bl_core::Voltage;

/// Trait for all DSP processors
pub trait Processor {
    /// Reset processor state
    fn reset(&mut self);
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Voltage) -> Voltage;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Voltage]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
