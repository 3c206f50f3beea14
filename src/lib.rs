//! Cellular Signal Heatmap Grid
//!
//! The geospatial core of an AR signal-coverage overlay: a synthetic
//! signal field over a fixed set of emitters, a cache of fixed-size grid
//! cells sampled from that field, and the mapping between geographic
//! coordinates and the renderer's local frame.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod location;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{Emitter, GeoPoint, LocalPoint};
pub use algorithms::{
    color_for_signal, default_emitters, ColorCode, CoordinateMapper, FrameScale, OriginMode,
    SignalBand, SignalFieldModel,
};
pub use processing::{
    CellKey, CellQuery, DeviceProfile, GridCache, GridCell, GridEngine, GridWindow, PolicyConfig,
    RecomputePolicy,
};
pub use location::{LocationError, LocationProvider, LocationSample, LocationSource};
pub use validation::{GridError, GridResult};
pub use utils::{init_logging, ConfigurationManager, HeatmapConfig, LogConfig};
pub use api::{HeatmapSession, SessionStatus, UpdateOutcome, WindowSnapshot};
