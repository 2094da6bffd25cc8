//! Biquad filters using Transposed Direct Form II
//!
//! Coefficients are designed in f64 and shared by every lane of a group, so a
//! channel's result never depends on which lane or group it lands in.

use bl_core::{Lanes, MAX_GROUPS};
use std::f64::consts::PI;

/// Per-stage Q values of a 2-stage cascade forming a 4th-order Butterworth
/// response (poles at 22.5° and 67.5°).
pub const BUTTERWORTH_Q4: [f64; 2] = [0.541_196_10, 1.306_563_0];

/// Number of cascaded stages in a [`FilterBank`]
pub const CASCADE_STAGES: usize = 2;

/// Biquad filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Biquad coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Design from a normalized frequency (cutoff / sample rate)
    pub fn design(filter_type: FilterType, normalized_freq: f64, q: f64) -> Self {
        match filter_type {
            FilterType::Lowpass => Self::lowpass(normalized_freq, q),
            FilterType::Highpass => Self::highpass(normalized_freq, q),
            FilterType::Bandpass => Self::bandpass(normalized_freq, q),
        }
    }

    /// Lowpass at a normalized cutoff
    pub fn lowpass(normalized_freq: f64, q: f64) -> Self {
        let omega = 2.0 * PI * normalized_freq;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Highpass at a normalized cutoff
    pub fn highpass(normalized_freq: f64, q: f64) -> Self {
        let omega = 2.0 * PI * normalized_freq;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Bandpass at a normalized centre (constant 0 dB peak gain)
    pub fn bandpass(normalized_freq: f64, q: f64) -> Self {
        let omega = 2.0 * PI * normalized_freq;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Bypass (unity gain, no filtering)
    pub fn bypass() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Magnitude response at a normalized frequency
    pub fn magnitude(&self, normalized_freq: f64) -> f64 {
        let w = 2.0 * PI * normalized_freq;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// TDF-II biquad running four independent lanes with shared coefficients
#[derive(Debug, Clone)]
pub struct BiquadLanes {
    // Coefficients as lane vectors
    b0: Lanes,
    b1: Lanes,
    b2: Lanes,
    a1: Lanes,
    a2: Lanes,
    // State for 4 parallel filters
    z1: Lanes,
    z2: Lanes,
}

impl Default for BiquadLanes {
    fn default() -> Self {
        Self::new()
    }
}

impl BiquadLanes {
    pub fn new() -> Self {
        let mut filter = Self {
            b0: Lanes::splat(0.0),
            b1: Lanes::splat(0.0),
            b2: Lanes::splat(0.0),
            a1: Lanes::splat(0.0),
            a2: Lanes::splat(0.0),
            z1: Lanes::splat(0.0),
            z2: Lanes::splat(0.0),
        };
        filter.set_coeffs(BiquadCoeffs::bypass());
        filter
    }

    /// Swap coefficients; filter state is kept so a retune does not click
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.b0 = Lanes::splat(coeffs.b0 as f32);
        self.b1 = Lanes::splat(coeffs.b1 as f32);
        self.b2 = Lanes::splat(coeffs.b2 as f32);
        self.a1 = Lanes::splat(coeffs.a1 as f32);
        self.a2 = Lanes::splat(coeffs.a2 as f32);
    }

    /// Process one sample on each of the 4 lanes
    #[inline(always)]
    pub fn process(&mut self, input: Lanes) -> Lanes {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = Lanes::splat(0.0);
        self.z2 = Lanes::splat(0.0);
    }
}

/// Cascaded biquads for every channel group, indexed `[group][stage]`
#[derive(Debug, Clone)]
pub struct FilterBank {
    filter_type: FilterType,
    normalized_cutoff: f32,
    stages: [[BiquadLanes; CASCADE_STAGES]; MAX_GROUPS],
}

impl FilterBank {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            normalized_cutoff: 0.0,
            stages: std::array::from_fn(|_| std::array::from_fn(|_| BiquadLanes::new())),
        }
    }

    /// Retune every group and stage to `normalized_cutoff` with the Butterworth Q pair
    pub fn set_cutoff(&mut self, normalized_cutoff: f32) {
        let coeffs = BUTTERWORTH_Q4.map(|q| {
            BiquadCoeffs::design(self.filter_type, normalized_cutoff as f64, q)
        });
        for group in self.stages.iter_mut() {
            for (stage, coeffs) in group.iter_mut().zip(coeffs) {
                stage.set_coeffs(coeffs);
            }
        }
        self.normalized_cutoff = normalized_cutoff;
    }

    #[inline]
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    #[inline]
    pub fn normalized_cutoff(&self) -> f32 {
        self.normalized_cutoff
    }

    /// Run one group's lanes through both stages
    #[inline]
    pub fn process(&mut self, group: usize, input: Lanes) -> Lanes {
        let [first, second] = &mut self.stages[group];
        second.process(first.process(input))
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut().flatten() {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settle(bank: &mut FilterBank, input: f32, frames: usize) -> f32 {
        let mut out = Lanes::splat(0.0);
        for _ in 0..frames {
            out = bank.process(0, Lanes::splat(input));
        }
        out.to_array()[0]
    }

    #[test]
    fn test_bypass() {
        let mut filter = BiquadLanes::new();
        let input = Lanes::from([0.5, -1.0, 2.0, 0.0]);
        assert_eq!(filter.process(input).to_array(), input.to_array());
    }

    #[test]
    fn test_lowpass_dc() {
        let mut bank = FilterBank::new(FilterType::Lowpass);
        bank.set_cutoff(300.0 / 48000.0);
        let output = settle(&mut bank, 1.0, 20000);
        assert!((output - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_highpass_dc() {
        let mut bank = FilterBank::new(FilterType::Highpass);
        bank.set_cutoff(3800.0 / 48000.0);
        let output = settle(&mut bank, 1.0, 5000);
        assert!(output.abs() < 1e-3);
    }

    #[test]
    fn test_butterworth_cascade_is_3db_down_at_cutoff() {
        let fc = 1000.0 / 48000.0;
        let response: f64 = BUTTERWORTH_Q4
            .iter()
            .map(|&q| BiquadCoeffs::design(FilterType::Lowpass, fc, q).magnitude(fc))
            .product();
        assert_relative_eq!(response, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);

        // Flat passband: no resonant bump below cutoff
        for f in [0.1, 0.3, 0.5, 0.8] {
            let m: f64 = BUTTERWORTH_Q4
                .iter()
                .map(|&q| BiquadCoeffs::design(FilterType::Lowpass, fc * f, q).magnitude(fc * f))
                .product();
            assert!(m <= 1.0 + 1e-9, "bump at {f}: {m}");
        }
    }

    #[test]
    fn test_single_stage_responses() {
        let fc = 0.05;
        let q = std::f64::consts::FRAC_1_SQRT_2;
        let lp = BiquadCoeffs::lowpass(fc, q);
        assert_relative_eq!(lp.magnitude(1e-6), 1.0, epsilon = 1e-6);
        assert_relative_eq!(lp.magnitude(fc), q, epsilon = 1e-6);

        let hp = BiquadCoeffs::highpass(fc, q);
        assert!(hp.magnitude(1e-6) < 1e-6);
        assert_relative_eq!(hp.magnitude(0.5), 1.0, epsilon = 1e-6);

        let bp = BiquadCoeffs::bandpass(fc, 2.0);
        assert_relative_eq!(bp.magnitude(fc), 1.0, epsilon = 1e-6);
        assert_eq!(BiquadCoeffs::design(FilterType::Bandpass, fc, 2.0), bp);
    }

    #[test]
    fn test_lanes_are_independent() {
        let mut bank = FilterBank::new(FilterType::Bandpass);
        bank.set_cutoff(750.0 / 48000.0);
        let mut reference = FilterBank::new(FilterType::Bandpass);
        reference.set_cutoff(750.0 / 48000.0);

        for i in 0..256 {
            let x = (i as f32 * 0.07).sin();
            let out = bank.process(2, Lanes::from([x, 0.0, -x, 0.0])).to_array();
            let solo = reference.process(3, Lanes::splat(x)).to_array()[0];
            assert_eq!(out[0], solo);
            assert_eq!(out[2], -solo);
            assert_eq!(out[1], 0.0);
        }
    }

    #[test]
    fn test_retune_records_cutoff() {
        let mut bank = FilterBank::new(FilterType::Lowpass);
        bank.set_cutoff(0.01);
        assert_eq!(bank.normalized_cutoff(), 0.01);
        assert_eq!(bank.filter_type(), FilterType::Lowpass);
    }

    #[test]
    fn test_reset() {
        let mut bank = FilterBank::new(FilterType::Lowpass);
        bank.set_cutoff(0.01);
        settle(&mut bank, 1.0, 100);
        bank.reset();
        assert_eq!(bank.process(0, Lanes::splat(0.0)).to_array(), [0.0; 4]);
    }
}
