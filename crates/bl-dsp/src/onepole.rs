//! One-pole RC filter (bilinear), with both lowpass and highpass taps

use bl_core::Voltage;

use crate::{MonoProcessor, Processor};

/// Bilinear one-pole filter; `process` updates state, the taps read it
#[derive(Debug, Clone, Copy)]
pub struct RcFilter {
    c: f32,
    x_state: f32,
    y_state: f32,
}

impl Default for RcFilter {
    fn default() -> Self {
        Self {
            c: 0.0,
            x_state: 0.0,
            y_state: 0.0,
        }
    }
}

impl RcFilter {
    pub fn new(normalized_cutoff: f32) -> Self {
        let mut filter = Self::default();
        filter.set_cutoff(normalized_cutoff);
        filter
    }

    /// Cutoff as a fraction of the sample rate
    pub fn set_cutoff(&mut self, normalized_cutoff: f32) {
        self.c = 2.0 / normalized_cutoff;
    }

    #[inline]
    pub fn process(&mut self, x: f32) {
        let y = (x + self.x_state - self.y_state * (1.0 - self.c)) / (1.0 + self.c);
        self.x_state = x;
        self.y_state = y;
    }

    #[inline]
    pub fn lowpass(&self) -> f32 {
        self.y_state
    }

    #[inline]
    pub fn highpass(&self) -> f32 {
        self.x_state - self.y_state
    }
}

impl Processor for RcFilter {
    fn reset(&mut self) {
        self.x_state = 0.0;
        self.y_state = 0.0;
    }
}

/// Runs as a highpass, the tap the reverb send uses
impl MonoProcessor for RcFilter {
    #[inline]
    fn process_sample(&mut self, input: Voltage) -> Voltage {
        self.process(input);
        self.highpass()
    }
}
