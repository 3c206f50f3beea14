//! Core types and constants for the signal grid

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
