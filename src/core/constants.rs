//! Frame scale, grid and signal-model constants

/// Degrees of latitude covered by one kilometer (flat-earth approximation)
pub const DEGREES_PER_KM: f64 = 0.009;

/// Local rendering units per kilometer
pub const UNITS_PER_KM: f64 = 100.0;

/// Approximate meters per degree, used only for human-readable distances
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Decimal places kept when normalizing a coordinate into a cache key
pub const COORD_DECIMALS: u32 = 7;

/// Fixed-point scale matching `COORD_DECIMALS` (10^7)
pub const COORD_FIXED_POINT_SCALE: f64 = 10_000_000.0;

/// Largest coordinate magnitude (degrees) whose fixed-point key fits in an `i64`
pub const MAX_KEYABLE_DEGREES: f64 = 9.0e11;

/// Distance (degrees) at which an emitter's contribution reaches zero
pub const DEFAULT_MAX_DISTANCE_DEG: f64 = 0.02;

/// Weight applied to every contribution before it enters the diffuse sum
pub const DIFFUSE_FACTOR: f64 = 0.4;

/// Share of the final value taken from the strongest emitter
pub const BEST_SIGNAL_WEIGHT: f64 = 0.8;

/// Share of the final value taken from the diffuse sum
pub const TOTAL_SIGNAL_WEIGHT: f64 = 0.2;

/// Upper bound of the signal scale
pub const MAX_SIGNAL: f64 = 100.0;

/// Cell edge on handheld devices (~100 m)
pub const MOBILE_CELL_SIZE_DEG: f64 = 0.0010;

/// Cell edge on desktop (~50 m)
pub const DESKTOP_CELL_SIZE_DEG: f64 = 0.0005;

/// Visible window radius on handheld devices (7x7 cells)
pub const MOBILE_VISIBLE_RADIUS: u32 = 3;

/// Visible window radius on desktop (9x9 cells)
pub const DESKTOP_VISIBLE_RADIUS: u32 = 4;

/// Path length (local units) walked before the visible window is rebuilt
pub const DEFAULT_MOVE_THRESHOLD_UNITS: f64 = 3.0;

/// Minimum wall-clock gap between window rebuilds (milliseconds)
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 300;

/// Radius within which emitter markers are reported as visible (km)
pub const DEFAULT_EMITTER_VISIBLE_RADIUS_KM: f64 = 3.0;

/// Fallback position when no fix is available (Taipei 101)
pub const DEFAULT_LATITUDE: f64 = 25.0330;
pub const DEFAULT_LONGITUDE: f64 = 121.5654;
