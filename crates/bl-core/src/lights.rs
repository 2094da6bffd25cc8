//! Display lights written by modules and read by the host

/// Fall-off rate for smoothed lights, in 1/s
pub const LIGHT_LAMBDA: f32 = 30.0;

/// One light channel; brightness always stays in [0, 1]
#[derive(Debug, Clone, Default)]
pub struct Light {
    name: String,
    brightness: f32,
}

impl Light {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            brightness: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    #[inline]
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = clamp_unit(brightness);
    }

    /// Rise instantly, fall off exponentially over `delta_time` seconds
    #[inline]
    pub fn set_brightness_smooth(&mut self, brightness: f32, delta_time: f32) {
        let target = clamp_unit(brightness);
        if target < self.brightness {
            self.brightness += (target - self.brightness) * (LIGHT_LAMBDA * delta_time).min(1.0);
        } else {
            self.brightness = target;
        }
    }
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
