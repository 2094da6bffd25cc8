//! Gate and clock helpers for control-rate logic
//!
//! Edge detectors report a rising edge exactly once per transition and keep a
//! readable "high" state, so momentary and latching behaviour can be built on
//! the same trigger.

/// Lower threshold of [`SchmittTrigger`] in volts
pub const SCHMITT_LOW: f32 = 0.0;

/// Upper threshold of [`SchmittTrigger`] in volts
pub const SCHMITT_HIGH: f32 = 1.0;

// ============ Schmitt Trigger ============

/// Hysteresis trigger on a CV: goes high at ≥ 1 V, low again at ≤ 0 V
#[derive(Debug, Clone, Copy, Default)]
pub struct SchmittTrigger {
    high: bool,
}

impl SchmittTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one voltage; returns true on the low → high transition.
    /// NaN leaves the state unchanged.
    #[inline]
    pub fn process(&mut self, input: f32) -> bool {
        if self.high {
            if input <= SCHMITT_LOW {
                self.high = false;
            }
            false
        } else if input >= SCHMITT_HIGH {
            self.high = true;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

// ============ Boolean Trigger ============

/// Rising-edge detector on a boolean gate
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTrigger {
    state: bool,
}

impl BooleanTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&mut self, gate: bool) -> bool {
        let triggered = gate && !self.state;
        self.state = gate;
        triggered
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = false;
    }
}

// ============ Clock Divider ============

/// Fires on every `division`-th call
#[derive(Debug, Clone, Copy)]
pub struct ClockDivider {
    clock: u32,
    division: u32,
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self {
            clock: 0,
            division: 1,
        }
    }
}

impl ClockDivider {
    pub fn new(division: u32) -> Self {
        let mut divider = Self::default();
        divider.set_division(division);
        divider
    }

    /// Division of 0 is treated as 1
    pub fn set_division(&mut self, division: u32) {
        self.division = division.max(1);
        self.clock = 0;
    }

    #[inline]
    pub fn division(&self) -> u32 {
        self.division
    }

    #[inline]
    pub fn process(&mut self) -> bool {
        self.clock += 1;
        if self.clock >= self.division {
            self.clock = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.clock = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schmitt_hysteresis() {
        let mut trigger = SchmittTrigger::new();
        assert!(!trigger.process(0.5));
        assert!(trigger.process(1.0));
        assert!(trigger.is_high());
        // Stays high inside the hysteresis band
        assert!(!trigger.process(0.5));
        assert!(trigger.is_high());
        assert!(!trigger.process(5.0));
        assert!(!trigger.process(0.0));
        assert!(!trigger.is_high());
        assert!(trigger.process(2.0));
    }

    #[test]
    fn test_schmitt_ignores_nan() {
        let mut trigger = SchmittTrigger::new();
        assert!(!trigger.process(f32::NAN));
        assert!(!trigger.is_high());
        trigger.process(10.0);
        trigger.process(f32::NAN);
        assert!(trigger.is_high());
    }

    #[test]
    fn test_boolean_trigger_edges() {
        let mut trigger = BooleanTrigger::new();
        let edges: Vec<bool> = [false, true, true, false, true]
            .into_iter()
            .map(|gate| trigger.process(gate))
            .collect();
        assert_eq!(edges, [false, true, false, false, true]);
        assert!(trigger.is_high());
    }

    #[test]
    fn test_clock_divider() {
        let mut divider = ClockDivider::new(64);
        let fired: Vec<usize> = (1..=256).filter(|_| divider.process()).collect();
        assert_eq!(fired.len(), 4);

        let mut divider = ClockDivider::new(64);
        for _ in 0..63 {
            assert!(!divider.process());
        }
        assert!(divider.process());
    }

    #[test]
    fn test_zero_division_fires_every_call() {
        let mut divider = ClockDivider::new(0);
        assert_eq!(divider.division(), 1);
        assert!(divider.process());
        assert!(divider.process());
    }
}
