//! Location provider interface and sample types

use serde::{Deserialize, Serialize};

use crate::core::GeoPoint;
use crate::location::error::{LocationError, LocationResult};
use crate::validation::validate_fix;

/// Where a sample came from. The core treats both the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    /// Device positioning sensor
    Device,
    /// Manually entered or scripted position
    Simulated,
}

/// One position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub point: GeoPoint,
    /// Horizontal accuracy radius in meters, 0 when unknown
    pub accuracy_m: f64,
    pub timestamp_ms: u64,
    pub source: LocationSource,
}

impl LocationSample {
    pub fn new(point: GeoPoint, accuracy_m: f64, timestamp_ms: u64, source: LocationSource) -> Self {
        Self {
            point,
            accuracy_m,
            timestamp_ms,
            source,
        }
    }

    pub fn simulated(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self::new(
            GeoPoint::new(latitude, longitude),
            0.0,
            timestamp_ms,
            LocationSource::Simulated,
        )
    }

    /// Reject samples the core must never see
    pub fn validate(&self) -> LocationResult<()> {
        validate_fix(&self.point).map_err(|e| LocationError::InvalidFix {
            details: e.to_string(),
        })?;
        if !self.accuracy_m.is_finite() || self.accuracy_m < 0.0 {
            return Err(LocationError::InvalidFix {
                details: format!("accuracy {} m", self.accuracy_m),
            });
        }
        Ok(())
    }
}

/// Provider health as last observed
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    pub source: LocationSource,
    pub available: bool,
    pub fixes_delivered: u32,
    pub error_count: u32,
    pub last_error: Option<LocationError>,
}

impl ProviderStatus {
    pub fn new(source: LocationSource) -> Self {
        Self {
            source,
            available: true,
            fixes_delivered: 0,
            error_count: 0,
            last_error: None,
        }
    }
}

/// Push-style location source polled by the update loop
pub trait LocationProvider {
    /// Next pending fix.
    /// Returns Ok(None) when nothing new arrived since the last poll.
    fn poll(&mut self) -> LocationResult<Option<LocationSample>>;

    fn status(&self) -> ProviderStatus;

    fn source(&self) -> LocationSource;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sample() {
        let sample = LocationSample::new(GeoPoint::new(25.03, 121.56), 12.5, 1_000, LocationSource::Device);
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_invalid_samples() {
        let nan = LocationSample::simulated(f64::NAN, 121.5, 0);
        assert!(matches!(nan.validate(), Err(LocationError::InvalidFix { .. })));

        let out_of_range = LocationSample::simulated(120.0, 121.5, 0);
        assert!(out_of_range.validate().is_err());

        let negative_accuracy = LocationSample::new(GeoPoint::new(25.0, 121.5), -1.0, 0, LocationSource::Device);
        assert!(negative_accuracy.validate().is_err());
    }
}
