//! Location provider error types and fallback handling

use thiserror::Error;

/// Failures reported by a location provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// The user refused access to the positioning sensor
    #[error("Location permission denied")]
    PermissionDenied,
    /// No positioning sensor, or it stopped producing fixes
    #[error("Location unavailable: {reason}")]
    Unavailable { reason: String },
    /// No fix arrived within the provider's timeout
    #[error("Location timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u32 },
    /// A fix or manual entry could not be turned into a coordinate
    #[error("Invalid fix: {details}")]
    InvalidFix { details: String },
}

/// Result type for location operations
pub type LocationResult<T> = Result<T, LocationError>;

/// What the session does when a provider fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    /// Start from the configured default location if nothing better is known
    UseDefaultLocation,
    /// Keep the last good fix and wait for the next one
    KeepLastFix,
    /// Drop the sample, state is unchanged
    DiscardSample,
}

impl LocationError {
    pub fn fallback_action(&self) -> FallbackAction {
        match self {
            LocationError::PermissionDenied => FallbackAction::UseDefaultLocation,
            LocationError::Unavailable { .. } => FallbackAction::UseDefaultLocation,
            LocationError::Timeout { .. } => FallbackAction::KeepLastFix,
            LocationError::InvalidFix { .. } => FallbackAction::DiscardSample,
        }
    }

    /// Later fixes may still arrive from the same provider
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LocationError::Timeout { .. } | LocationError::InvalidFix { .. }
        )
    }
}
