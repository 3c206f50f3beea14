//! Geographic <-> local rendering frame conversion
//!
//! The local frame is a flat ground plane scaled by a fixed number of
//! degrees per kilometer and rendering units per kilometer. East is +X and
//! north is -Z. Both directions share one origin and one scale, so a
//! round trip through the mapper is exact up to floating point error.
//!
//! Which geographic point acts as the origin is an explicit choice made
//! when the mapper is built:
//! - `OriginMode::UserFollowing` re-centers on every user fix, so the user
//!   always stands near the local origin.
//! - `OriginMode::FixedAnchor` keeps the first origin for the lifetime of
//!   the mapper and lets the user's local position move instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{GeoPoint, LocalPoint, DEGREES_PER_KM, UNITS_PER_KM};

/// Policy deciding which point is the local frame's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginMode {
    /// Origin tracks the latest user position
    UserFollowing,
    /// Origin is set once and held fixed
    FixedAnchor,
}

impl Default for OriginMode {
    fn default() -> Self {
        OriginMode::FixedAnchor
    }
}

/// Scale between degree offsets and local units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameScale {
    pub degrees_per_km: f64,
    pub units_per_km: f64,
}

impl Default for FrameScale {
    fn default() -> Self {
        Self {
            degrees_per_km: DEGREES_PER_KM,
            units_per_km: UNITS_PER_KM,
        }
    }
}

impl FrameScale {
    pub fn new(degrees_per_km: f64, units_per_km: f64) -> Self {
        Self {
            degrees_per_km,
            units_per_km,
        }
    }

    /// Convert a (lat, lng) degree offset into local units
    pub fn offset_to_local(&self, d_lat: f64, d_lng: f64) -> LocalPoint {
        LocalPoint {
            x: (d_lng / self.degrees_per_km) * self.units_per_km,
            z: -(d_lat / self.degrees_per_km) * self.units_per_km,
        }
    }

    /// Inverse of `offset_to_local`, returns (d_lat, d_lng)
    pub fn local_to_offset(&self, local: &LocalPoint) -> (f64, f64) {
        let d_lat = -(local.z / self.units_per_km) * self.degrees_per_km;
        let d_lng = (local.x / self.units_per_km) * self.degrees_per_km;
        (d_lat, d_lng)
    }

    /// Local units spanned by `km` kilometers
    pub fn km_to_units(&self, km: f64) -> f64 {
        km * self.units_per_km
    }

    pub fn km_to_degrees(&self, km: f64) -> f64 {
        km * self.degrees_per_km
    }
}

/// Converts between geographic coordinates and the local frame
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    mode: OriginMode,
    origin: GeoPoint,
    scale: FrameScale,
}

impl CoordinateMapper {
    pub fn new(mode: OriginMode, origin: GeoPoint, scale: FrameScale) -> Self {
        info!(
            ?mode,
            latitude = origin.latitude,
            longitude = origin.longitude,
            "local frame origin set"
        );
        Self { mode, origin, scale }
    }

    pub fn mode(&self) -> OriginMode {
        self.mode
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn scale(&self) -> FrameScale {
        self.scale
    }

    /// Feed the latest user position to the mapper.
    ///
    /// Returns `true` when the origin moved, which only happens in
    /// `UserFollowing` mode.
    pub fn observe_user_position(&mut self, position: GeoPoint) -> bool {
        match self.mode {
            OriginMode::UserFollowing => {
                let moved = position != self.origin;
                self.origin = position;
                moved
            }
            OriginMode::FixedAnchor => false,
        }
    }

    /// Explicitly move the origin, e.g. when a new tracking session starts
    pub fn reanchor(&mut self, origin: GeoPoint) {
        debug!(
            latitude = origin.latitude,
            longitude = origin.longitude,
            "local frame re-anchored"
        );
        self.origin = origin;
    }

    pub fn geo_to_local(&self, latitude: f64, longitude: f64) -> LocalPoint {
        self.scale
            .offset_to_local(latitude - self.origin.latitude, longitude - self.origin.longitude)
    }

    pub fn geo_point_to_local(&self, point: &GeoPoint) -> LocalPoint {
        self.geo_to_local(point.latitude, point.longitude)
    }

    /// Exact inverse of `geo_to_local`.
    ///
    /// The result is not rounded; normalize it (or let the cache do so)
    /// before using it as a key.
    pub fn local_to_geo(&self, local: &LocalPoint) -> GeoPoint {
        let (d_lat, d_lng) = self.scale.local_to_offset(local);
        GeoPoint {
            latitude: self.origin.latitude + d_lat,
            longitude: self.origin.longitude + d_lng,
        }
    }
}
