//! Session-level types shared by the API surface

use serde::{Deserialize, Serialize};

use crate::location::{LocationError, LocationSource};

/// Where the session's reference position currently comes from
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// No fix received yet, frame sits on the default location
    AwaitingFix,
    /// Following fixes from a provider
    Tracking { source: LocationSource },
    /// Provider failed before the first fix, running on the default location
    Fallback { reason: LocationError },
    /// Was tracking, the provider has since reported an error
    Degraded { last_error: LocationError },
}

impl SessionStatus {
    pub fn is_tracking(&self) -> bool {
        matches!(self, SessionStatus::Tracking { .. } | SessionStatus::Degraded { .. })
    }

    /// Short label for status overlays
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::AwaitingFix => "awaiting-fix",
            SessionStatus::Tracking { source: LocationSource::Device } => "gps",
            SessionStatus::Tracking { source: LocationSource::Simulated } => "simulated",
            SessionStatus::Fallback { .. } => "default-location",
            SessionStatus::Degraded { .. } => "degraded",
        }
    }
}

/// What one event did to the visible window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// The visible list was rebuilt
    pub recomputed: bool,
    pub visible_cells: usize,
    pub cached_cells: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(SessionStatus::AwaitingFix.label(), "awaiting-fix");
        assert_eq!(
            SessionStatus::Tracking { source: LocationSource::Simulated }.label(),
            "simulated"
        );
        let degraded = SessionStatus::Degraded {
            last_error: LocationError::Timeout { timeout_ms: 5000 },
        };
        assert!(degraded.is_tracking());
        assert!(!SessionStatus::Fallback { reason: LocationError::PermissionDenied }.is_tracking());
    }
}
