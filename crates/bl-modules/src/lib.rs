//! bl-modules: The Bandloop processing units
//!
//! ## Modules
//! - `band_splitter` - Four-band polyphonic crossover with send/return mix
//! - `bypass` - Stereo send/return switcher with click-free launch
//! - `spring_reverb` - Convolution reverb shell around a block convolver
//!
//! Every unit is a plain constructible type implementing [`bl_core::Module`];
//! units share no state.

pub mod band_splitter;
pub mod bypass;
pub mod spring_reverb;

pub use band_splitter::BandSplitter;
pub use bypass::Bypass;
pub use spring_reverb::SpringReverb;

use bl_core::{Input, Lanes, REFERENCE_VOLTAGE};

/// Gain from a CV input: `clamp(cv / 10 V, 0, 1)`, fully open when unplugged
#[inline]
pub(crate) fn cv_gain(input: &Input, channel: usize) -> Lanes {
    let reference = Lanes::splat(REFERENCE_VOLTAGE);
    (input.normal_poly_lanes(reference, channel) / reference)
        .max(Lanes::splat(0.0))
        .min(Lanes::splat(1.0))
}
