//! Error types for the grid engine

use thiserror::Error;

use crate::location::LocationError;
use crate::utils::config::ConfigError;

/// Errors raised at the grid engine boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Latitude or longitude is NaN or infinite
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Local-frame position is NaN or infinite
    #[error("Invalid local position: ({x}, {z})")]
    InvalidLocalPosition { x: f64, z: f64 },

    /// Latitude/longitude outside the WGS84 range
    #[error("Coordinate out of range: ({latitude}, {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },

    /// Location sample rejected before it reached the engine
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Engine or session could not be built from the configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for grid operations
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// Errors caused by a bad input sample rather than a bad setup
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GridError::InvalidCoordinate { .. }
                | GridError::InvalidLocalPosition { .. }
                | GridError::OutOfRange { .. }
                | GridError::Location(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::InvalidCoordinate { latitude: f64::NAN, longitude: 121.5 };
        assert_eq!(err.to_string(), "Invalid coordinate: (NaN, 121.5)");

        let err = GridError::OutOfRange { latitude: 95.0, longitude: 0.0 };
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(GridError::InvalidLocalPosition { x: f64::NAN, z: 0.0 }.is_input_error());
        let config = GridError::from(ConfigError::InvalidParameter {
            parameter: "grid.cell_size_deg".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(!config.is_input_error());

        let sample = GridError::from(LocationError::InvalidFix {
            details: "accuracy -1 m".to_string(),
        });
        assert!(sample.is_input_error());
        assert_eq!(sample.to_string(), "Invalid fix: accuracy -1 m");
    }
}
