//! Location providers feeding the session
//!
//! Device sensors and manual overrides both produce `LocationSample`s;
//! the core does not distinguish between them beyond the recorded source.

pub mod error;
pub mod provider;
pub mod mock;
pub mod simulated;

pub use error::{FallbackAction, LocationError, LocationResult};
pub use provider::{LocationProvider, LocationSample, LocationSource, ProviderStatus};
pub use mock::ScriptedLocationProvider;
pub use simulated::{parse_simulated_fix, ManualOverrideProvider};
