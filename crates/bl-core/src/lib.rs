//! bl-core: Shared types, traits, and utilities for Bandloop
//!
//! This crate provides the port model every Bandloop module is built on:
//! polyphonic inputs and outputs, parameters, lights, and the `Module` trait
//! the host transport drives once per audio frame.

mod error;
mod lights;
mod module;
mod params;
mod ports;

pub use error::*;
pub use lights::*;
pub use module::*;
pub use params::*;
pub use ports::*;

/// A single port voltage (nominally ±10 V)
pub type Voltage = f32;

/// Four channel lanes processed together
pub type Lanes = wide::f32x4;

/// Maximum polyphony carried by a single port
pub const MAX_CHANNELS: usize = 16;

/// Width of one channel group
pub const LANES: usize = 4;

/// Number of channel groups needed to cover `MAX_CHANNELS`
pub const MAX_GROUPS: usize = MAX_CHANNELS / LANES;

/// Nominal full-scale voltage; CV normals and saturation are relative to it
pub const REFERENCE_VOLTAGE: Voltage = 10.0;

/// Number of channel groups needed to cover `channels`
#[inline]
pub fn group_count(channels: usize) -> usize {
    channels.min(MAX_CHANNELS).div_ceil(LANES)
}

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f32);

impl Decibels {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn to_gain(self) -> f32 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f32.powf(self.0 / 20.0)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Typed identifier for a param, input, output, or light slot
pub trait PortId: Copy {
    /// Number of slots of this kind
    const COUNT: usize;

    fn index(self) -> usize;
}

/// Declares a `#[repr(usize)]` id enum and implements [`PortId`] for it.
///
/// ```
/// bl_core::port_ids! {
///     /// Inputs of a toy module
///     pub enum ToyInput { Left, Right }
/// }
/// use bl_core::PortId;
/// assert_eq!(ToyInput::COUNT, 2);
/// assert_eq!(ToyInput::Right.index(), 1);
/// ```
#[macro_export]
macro_rules! port_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(usize)]
        $vis enum $name { $($variant),+ }

        impl $name {
            pub const ALL: [$name; [$(stringify!($variant)),+].len()] = [$($name::$variant),+];
        }

        impl $crate::PortId for $name {
            const COUNT: usize = [$(stringify!($variant)),+].len();

            #[inline]
            fn index(self) -> usize {
                self as usize
            }
        }
    };
}
