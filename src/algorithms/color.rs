//! Signal strength to heatmap color bands

use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit RGB color as consumed by the renderer (`0xRRGGBB`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorCode(pub u32);

impl ColorCode {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    /// Normalized components for GPU color attributes
    pub fn to_unit_rgb(&self) -> [f32; 3] {
        let (r, g, b) = self.rgb();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

/// Presentation bands partitioning the [0, 100] signal scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalBand {
    Excellent,
    VeryStrong,
    Strong,
    Good,
    Fair,
    Weak,
    VeryWeak,
    NoService,
}

impl SignalBand {
    pub const ALL: [SignalBand; 8] = [
        SignalBand::Excellent,
        SignalBand::VeryStrong,
        SignalBand::Strong,
        SignalBand::Good,
        SignalBand::Fair,
        SignalBand::Weak,
        SignalBand::VeryWeak,
        SignalBand::NoService,
    ];

    pub fn from_signal(signal: u8) -> Self {
        match signal {
            80..=u8::MAX => SignalBand::Excellent,
            65..=79 => SignalBand::VeryStrong,
            50..=64 => SignalBand::Strong,
            35..=49 => SignalBand::Good,
            25..=34 => SignalBand::Fair,
            15..=24 => SignalBand::Weak,
            8..=14 => SignalBand::VeryWeak,
            _ => SignalBand::NoService,
        }
    }

    /// Lowest signal value that falls in this band
    pub fn lower_bound(&self) -> u8 {
        match self {
            SignalBand::Excellent => 80,
            SignalBand::VeryStrong => 65,
            SignalBand::Strong => 50,
            SignalBand::Good => 35,
            SignalBand::Fair => 25,
            SignalBand::Weak => 15,
            SignalBand::VeryWeak => 8,
            SignalBand::NoService => 0,
        }
    }

    pub fn color(&self) -> ColorCode {
        match self {
            SignalBand::Excellent => ColorCode(0xFF0000),
            SignalBand::VeryStrong => ColorCode(0xFF4500),
            SignalBand::Strong => ColorCode(0xFF8C00),
            SignalBand::Good => ColorCode(0xFFBF00),
            SignalBand::Fair => ColorCode(0xFFFF00),
            SignalBand::Weak => ColorCode(0x00FF00),
            SignalBand::VeryWeak => ColorCode(0x008080),
            SignalBand::NoService => ColorCode(0x0000FF),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalBand::Excellent => "red",
            SignalBand::VeryStrong => "orange-red",
            SignalBand::Strong => "orange",
            SignalBand::Good => "amber",
            SignalBand::Fair => "yellow",
            SignalBand::Weak => "green",
            SignalBand::VeryWeak => "teal",
            SignalBand::NoService => "blue",
        }
    }
}

pub fn color_for_signal(signal: u8) -> ColorCode {
    SignalBand::from_signal(signal).color()
}
