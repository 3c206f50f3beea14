//! Signal field and coordinate algorithms

pub mod signal_field;
pub mod color;
pub mod coordinates;
pub mod geodesy;

pub use signal_field::{default_emitters, EmitterDistance, SignalFieldModel};
pub use color::{color_for_signal, ColorCode, SignalBand};
pub use coordinates::{CoordinateMapper, FrameScale, OriginMode};
pub use geodesy::initial_bearing_deg;
