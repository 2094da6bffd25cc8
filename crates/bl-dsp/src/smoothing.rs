//! Rate limiting and envelope helpers
//!
//! - [`SlewLimiter`]: linear rise/fall limiting, used as a click filter on gates
//! - [`PeakFilter`]: instant attack, exponential release, for meters
//! - [`ClipHold`]: keeps a clip indicator lit for a fixed time after an overload

// ============ Slew Limiter ============

/// Linear slew limiter; `rise` and `fall` are in units per second
#[derive(Debug, Clone, Copy, Default)]
pub struct SlewLimiter {
    rise: f32,
    fall: f32,
    out: f32,
}

impl SlewLimiter {
    pub fn new(rise: f32, fall: f32) -> Self {
        Self {
            rise,
            fall,
            out: 0.0,
        }
    }

    pub fn set_rise_fall(&mut self, rise: f32, fall: f32) {
        self.rise = rise;
        self.fall = fall;
    }

    /// Rise and fall set so a full 0 → 1 swing takes `seconds`
    pub fn set_slew_time(&mut self, seconds: f32) {
        let rate = 1.0 / seconds;
        self.set_rise_fall(rate, rate);
    }

    /// Step towards `input` by at most `rate × delta_time`.
    /// A NaN input holds the current value.
    #[inline]
    pub fn process(&mut self, delta_time: f32, input: f32) -> f32 {
        let lo = self.out - self.fall * delta_time;
        let hi = self.out + self.rise * delta_time;
        // max/min rather than clamp: NaN falls through to the bound
        self.out = input.max(lo).min(hi);
        self.out
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.out
    }

    pub fn reset(&mut self) {
        self.out = 0.0;
    }
}

// ============ Peak Filter ============

/// Peak follower: jumps to any larger input, then decays by `rate` per step
#[derive(Debug, Clone, Copy)]
pub struct PeakFilter {
    state: f32,
    keep: f32,
}

impl Default for PeakFilter {
    fn default() -> Self {
        Self {
            state: 0.0,
            keep: 1.0,
        }
    }
}

impl PeakFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of the peak lost each step (typically `k × sample_time`)
    pub fn set_rate(&mut self, rate: f32) {
        self.keep = 1.0 - rate.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if input > self.state {
            self.state = input;
        }
        self.state *= self.keep;
        self.state
    }

    #[inline]
    pub fn peak(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

// ============ Clip Hold ============

/// Hold timer for a clip indicator
#[derive(Debug, Clone, Copy)]
pub struct ClipHold {
    threshold: f32,
    hold_time: f32,
    timer: f32,
}

impl ClipHold {
    pub fn new(threshold: f32, hold_time: f32) -> Self {
        Self {
            threshold,
            hold_time,
            timer: 0.0,
        }
    }

    /// Reload the timer when `level` exceeds the threshold, then report
    /// whether the indicator is lit. While lit, the timer runs down by
    /// `delta_time`.
    #[inline]
    pub fn process(&mut self, level: f32, delta_time: f32) -> bool {
        if level > self.threshold {
            self.timer = self.hold_time;
        }
        let clip = self.timer > 0.0;
        if clip {
            self.timer -= delta_time;
        }
        clip
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.timer.max(0.0)
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slew_full_swing_takes_slew_time() {
        let dt = 1.0 / 48000.0;
        let mut slew = SlewLimiter::default();
        slew.set_slew_time(0.01);

        // 0.01 s at 48 kHz is 480 frames
        for _ in 0..479 {
            let v = slew.process(dt, 1.0);
            assert!(v < 1.0);
        }
        let v = slew.process(dt, 1.0);
        assert!((v - 1.0).abs() < 1e-3);
        assert_eq!(slew.process(dt, 1.0), 1.0);

        for _ in 0..481 {
            slew.process(dt, 0.0);
        }
        assert_eq!(slew.value(), 0.0);
    }

    #[test]
    fn test_slew_holds_on_nan() {
        let mut slew = SlewLimiter::new(100.0, 100.0);
        slew.process(0.001, 1.0);
        let before = slew.value();
        let after = slew.process(0.001, f32::NAN);
        assert!(after.is_finite());
        assert!(after >= before - 0.1 - 1e-6);
    }

    #[test]
    fn test_peak_filter_attack_and_release() {
        let mut peak = PeakFilter::new();
        peak.set_rate(0.5);
        assert_eq!(peak.process(8.0), 4.0);
        assert_eq!(peak.process(0.0), 2.0);
        assert_eq!(peak.process(1.0), 1.0);
        assert_eq!(peak.process(6.0), 3.0);
    }

    #[test]
    fn test_clip_hold() {
        let dt = 64.0 / 48000.0;
        let mut hold = ClipHold::new(10.0, 0.25);
        assert!(!hold.process(9.9, dt));
        assert!(hold.process(10.5, dt));

        // Hold lasts 0.25 s worth of updates after the overload
        let mut lit = 0;
        while hold.process(0.0, dt) {
            lit += 1;
            assert!(lit < 1000);
        }
        let expected = (0.25 / dt) as i32;
        assert!((lit - expected).abs() <= 1, "{lit} vs {expected}");
        assert_eq!(hold.remaining(), 0.0);
    }
}
