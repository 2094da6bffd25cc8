//! Polyphonic input and output ports
//!
//! Inputs follow the patch-cable convention: zero channels means nothing is
//! plugged in. A monophonic input (exactly one channel) is broadcast to every
//! lane when read polyphonically, so a mono CV can drive a polyphonic voice.
//!
//! Outputs carry a channel count set by the module and a `patched` flag set by
//! the host, which modules use for normalling decisions.

use crate::{LANES, Lanes, MAX_CHANNELS, Voltage};

/// Display metadata shared by inputs and outputs
#[derive(Debug, Clone, Default)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Polyphonic input port
#[derive(Debug, Clone, Default)]
pub struct Input {
    info: PortInfo,
    voltages: [Voltage; MAX_CHANNELS],
    channels: usize,
}

impl Input {
    pub fn new(info: PortInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn info(&self) -> &PortInfo {
        &self.info
    }

    /// Set the channel count written by the upstream cable (0 disconnects).
    /// Channels above the new count are zeroed.
    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.min(MAX_CHANNELS);
        self.voltages[channels..].fill(0.0);
        self.channels = channels;
    }

    pub fn disconnect(&mut self) {
        self.set_channels(0);
    }

    /// Connect with `values.len()` channels and copy the voltages in
    pub fn set_voltages(&mut self, values: &[Voltage]) {
        let channels = values.len().min(MAX_CHANNELS);
        self.voltages[..channels].copy_from_slice(&values[..channels]);
        self.set_channels(channels);
    }

    /// Convenience for a monophonic cable
    pub fn set_mono(&mut self, value: Voltage) {
        self.set_voltages(&[value]);
    }

    #[inline]
    pub fn set_voltage(&mut self, channel: usize, value: Voltage) {
        if channel < MAX_CHANNELS {
            self.voltages[channel] = value;
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channels > 0
    }

    #[inline]
    pub fn is_monophonic(&self) -> bool {
        self.channels == 1
    }

    #[inline]
    pub fn is_polyphonic(&self) -> bool {
        self.channels > 1
    }

    /// Raw voltage of one channel (0 above the channel count)
    #[inline]
    pub fn voltage(&self, channel: usize) -> Voltage {
        self.voltages.get(channel).copied().unwrap_or(0.0)
    }

    /// Voltage of `channel`, broadcasting a monophonic input
    #[inline]
    pub fn poly_voltage(&self, channel: usize) -> Voltage {
        if self.is_monophonic() {
            self.voltages[0]
        } else {
            self.voltage(channel)
        }
    }

    /// Four lanes starting at `channel`, broadcasting a monophonic input
    #[inline]
    pub fn poly_lanes(&self, channel: usize) -> Lanes {
        if self.is_monophonic() {
            return Lanes::splat(self.voltages[0]);
        }
        let mut lanes = [0.0; LANES];
        for (i, lane) in lanes.iter_mut().enumerate() {
            *lane = self.voltage(channel + i);
        }
        Lanes::from(lanes)
    }

    /// `poly_lanes` when connected, `normal` otherwise
    #[inline]
    pub fn normal_poly_lanes(&self, normal: Lanes, channel: usize) -> Lanes {
        if self.is_connected() {
            self.poly_lanes(channel)
        } else {
            normal
        }
    }

    /// `poly_voltage` when connected, `normal` otherwise
    #[inline]
    pub fn normal_voltage(&self, normal: Voltage, channel: usize) -> Voltage {
        if self.is_connected() {
            self.poly_voltage(channel)
        } else {
            normal
        }
    }

    /// Sum of all active channels
    #[inline]
    pub fn voltage_sum(&self) -> Voltage {
        self.voltages[..self.channels].iter().sum()
    }
}

/// Polyphonic output port
#[derive(Debug, Clone)]
pub struct Output {
    info: PortInfo,
    voltages: [Voltage; MAX_CHANNELS],
    channels: usize,
    patched: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            info: PortInfo::default(),
            voltages: [0.0; MAX_CHANNELS],
            channels: 1,
            patched: false,
        }
    }
}

impl Output {
    pub fn new(info: PortInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn info(&self) -> &PortInfo {
        &self.info
    }

    /// Host-side: mark whether a cable leaves this output
    pub fn set_patched(&mut self, patched: bool) {
        self.patched = patched;
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.patched
    }

    /// Set the output polyphony (clamped to 1..=16); channels above it are zeroed
    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.clamp(1, MAX_CHANNELS);
        self.voltages[channels..].fill(0.0);
        self.channels = channels;
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn set_voltage(&mut self, channel: usize, value: Voltage) {
        if channel < MAX_CHANNELS {
            self.voltages[channel] = value;
        }
    }

    /// Write four lanes starting at `channel`; lanes past 16 channels are dropped
    #[inline]
    pub fn set_lanes(&mut self, channel: usize, lanes: Lanes) {
        for (i, value) in lanes.to_array().into_iter().enumerate() {
            self.set_voltage(channel + i, value);
        }
    }

    #[inline]
    pub fn voltage(&self, channel: usize) -> Voltage {
        self.voltages.get(channel).copied().unwrap_or(0.0)
    }

    /// The active channels
    pub fn voltages(&self) -> &[Voltage] {
        &self.voltages[..self.channels]
    }
}
