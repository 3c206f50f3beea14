//! Scripted location provider for tests and replays

use std::collections::VecDeque;

use crate::location::error::{LocationError, LocationResult};
use crate::location::provider::{LocationProvider, LocationSample, LocationSource, ProviderStatus};

/// Replays a fixed sequence of fixes and failures
pub struct ScriptedLocationProvider {
    script: VecDeque<LocationResult<LocationSample>>,
    status: ProviderStatus,
}

impl ScriptedLocationProvider {
    pub fn new(source: LocationSource) -> Self {
        Self {
            script: VecDeque::new(),
            status: ProviderStatus::new(source),
        }
    }

    /// Queue a straight walk of `steps` fixes from `start` by a per-step offset
    pub fn with_walk(
        source: LocationSource,
        start: (f64, f64),
        step: (f64, f64),
        steps: usize,
        interval_ms: u64,
    ) -> Self {
        let mut provider = Self::new(source);
        for i in 0..steps {
            let latitude = start.0 + step.0 * i as f64;
            let longitude = start.1 + step.1 * i as f64;
            let mut sample = LocationSample::simulated(latitude, longitude, interval_ms * i as u64);
            sample.source = source;
            provider.push_fix(sample);
        }
        provider
    }

    pub fn push_fix(&mut self, sample: LocationSample) {
        self.script.push_back(Ok(sample));
    }

    pub fn push_error(&mut self, error: LocationError) {
        self.script.push_back(Err(error));
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LocationProvider for ScriptedLocationProvider {
    fn poll(&mut self) -> LocationResult<Option<LocationSample>> {
        match self.script.pop_front() {
            None => Ok(None),
            Some(Ok(sample)) => {
                self.status.available = true;
                self.status.fixes_delivered += 1;
                Ok(Some(sample))
            }
            Some(Err(error)) => {
                self.status.error_count += 1;
                self.status.available = error.is_transient();
                self.status.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn status(&self) -> ProviderStatus {
        self.status.clone()
    }

    fn source(&self) -> LocationSource {
        self.status.source
    }
}
