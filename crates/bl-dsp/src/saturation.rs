//! Soft clipping for signals that may leave the nominal ±10 V range
//!
//! The curve is a Padé approximant of `x / (1 + x^12)^(1/12)`: linear for
//! small inputs, flattening to ±1 near the clamp point. It is odd-symmetric
//! and stateless, so the same shaper serves every lane and channel.

use bl_core::{Lanes, REFERENCE_VOLTAGE, Voltage};

use crate::{MonoProcessor, Processor};

/// Input magnitude where the approximant reaches its maximum (≈ 0.99)
pub const SATURATION_LIMIT: f32 = 1.166_918_5;

const P1: f32 = 1.458_33;
const P2: f32 = 0.559_028;
const P3: f32 = 0.042_703_5;
const Q1: f32 = 1.541_67;
const Q2: f32 = 0.642_361;
const Q3: f32 = 0.057_990_9;

/// Stateless soft clipper on a normalized (±1) signal
#[derive(Debug, Clone, Copy, Default)]
pub struct Saturator;

impl Saturator {
    /// Shape one normalized sample
    #[inline]
    pub fn process(x: f32) -> f32 {
        let x = x.clamp(-SATURATION_LIMIT, SATURATION_LIMIT);
        let x2 = x * x;
        let x4 = x2 * x2;
        let x12 = x4 * x4 * x4;
        let x24 = x12 * x12;
        let x36 = x24 * x12;
        x * (1.0 + P1 * x12 + P2 * x24 + P3 * x36) / (1.0 + Q1 * x12 + Q2 * x24 + Q3 * x36)
    }

    /// Shape four normalized lanes
    #[inline]
    pub fn process_lanes(x: Lanes) -> Lanes {
        let limit = Lanes::splat(SATURATION_LIMIT);
        let x = x.max(-limit).min(limit);
        let x2 = x * x;
        let x4 = x2 * x2;
        let x12 = x4 * x4 * x4;
        let x24 = x12 * x12;
        let x36 = x24 * x12;
        let one = Lanes::splat(1.0);
        let num = one + Lanes::splat(P1) * x12 + Lanes::splat(P2) * x24 + Lanes::splat(P3) * x36;
        let den = one + Lanes::splat(Q1) * x12 + Lanes::splat(Q2) * x24 + Lanes::splat(Q3) * x36;
        x * num / den
    }

    /// Soft clip a voltage relative to the ±10 V reference
    #[inline]
    pub fn saturate_voltage(v: Voltage) -> Voltage {
        Self::process(v / REFERENCE_VOLTAGE) * REFERENCE_VOLTAGE
    }

    /// Soft clip four voltage lanes relative to the ±10 V reference
    #[inline]
    pub fn saturate_lanes(v: Lanes) -> Lanes {
        let reference = Lanes::splat(REFERENCE_VOLTAGE);
        Self::process_lanes(v / reference) * reference
    }
}

impl Processor for Saturator {
    fn reset(&mut self) {}
}

impl MonoProcessor for Saturator {
    #[inline]
    fn process_sample(&mut self, input: Voltage) -> Voltage {
        Self::saturate_voltage(input)
    }
}
