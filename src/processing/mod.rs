//! Cell cache, visible window and update throttling

pub mod cache;
pub mod window;
pub mod throttle;
pub mod engine;

pub use cache::{CacheStats, CellKey, CellQuery, GridCache, GridCell};
pub use window::{DeviceProfile, GridIndex, GridWindow};
pub use throttle::{
    AccumulatedDistancePolicy, AlwaysRecompute, AnyOf, DisplacementPolicy, IntervalPolicy,
    PolicyConfig, RecomputeMark, RecomputePolicy,
};
pub use engine::GridEngine;
