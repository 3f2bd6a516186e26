//! RGB pixel values

use serde::{Deserialize, Serialize};

/// One 8-bit-per-channel pixel, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Warm white at roughly half brightness, used to identify runs at power-up.
    pub const WARM_WHITE: Rgb = Rgb::new(128, 100, 64);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Read a pixel from the first three bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [r, g, b, ..] => Some(Self::new(r, g, b)),
            _ => None,
        }
    }
}
