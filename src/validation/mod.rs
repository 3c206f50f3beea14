//! Input validation and error types

pub mod data;
pub mod error;

pub use data::{ensure_finite, ensure_finite_local, ensure_keyable, validate_fix};
pub use error::{GridError, GridResult};
