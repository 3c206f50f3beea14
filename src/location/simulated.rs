//! Manually entered position overrides

use crate::location::error::{LocationError, LocationResult};
use crate::location::provider::{LocationProvider, LocationSample, LocationSource, ProviderStatus};

fn parse_degrees(field: &str, text: &str) -> LocationResult<f64> {
    let value: f64 = text.trim().parse().map_err(|_| LocationError::InvalidFix {
        details: format!("{} '{}' is not a number", field, text.trim()),
    })?;
    if !value.is_finite() {
        return Err(LocationError::InvalidFix {
            details: format!("{} must be finite", field),
        });
    }
    Ok(value)
}

/// Turn the two text fields of the manual override form into a sample
pub fn parse_simulated_fix(latitude: &str, longitude: &str, timestamp_ms: u64) -> LocationResult<LocationSample> {
    let sample = LocationSample::simulated(
        parse_degrees("latitude", latitude)?,
        parse_degrees("longitude", longitude)?,
        timestamp_ms,
    );
    sample.validate()?;
    Ok(sample)
}

/// Provider fed by on-demand manual entries
pub struct ManualOverrideProvider {
    pending: Option<LocationSample>,
    status: ProviderStatus,
}

impl Default for ManualOverrideProvider {
    fn default() -> Self {
        Self {
            pending: None,
            status: ProviderStatus::new(LocationSource::Simulated),
        }
    }
}

impl ManualOverrideProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit the form. A rejected entry leaves any pending fix in place.
    pub fn submit(&mut self, latitude: &str, longitude: &str, timestamp_ms: u64) -> LocationResult<()> {
        match parse_simulated_fix(latitude, longitude, timestamp_ms) {
            Ok(sample) => {
                self.pending = Some(sample);
                Ok(())
            }
            Err(error) => {
                self.status.error_count += 1;
                self.status.last_error = Some(error.clone());
                Err(error)
            }
        }
    }
}

impl LocationProvider for ManualOverrideProvider {
    fn poll(&mut self) -> LocationResult<Option<LocationSample>> {
        let sample = self.pending.take();
        if sample.is_some() {
            self.status.fixes_delivered += 1;
        }
        Ok(sample)
    }

    fn status(&self) -> ProviderStatus {
        self.status.clone()
    }

    fn source(&self) -> LocationSource {
        LocationSource::Simulated
    }
}
