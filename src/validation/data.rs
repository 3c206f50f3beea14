//! Boundary validation of coordinates entering the core

use crate::core::{GeoPoint, LocalPoint, MAX_KEYABLE_DEGREES};
use crate::validation::error::{GridError, GridResult};

/// Reject non-finite coordinates before they reach the cache
pub fn ensure_finite(point: &GeoPoint) -> GridResult<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(GridError::InvalidCoordinate {
            latitude: point.latitude,
            longitude: point.longitude,
        })
    }
}

pub fn ensure_finite_local(point: &LocalPoint) -> GridResult<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(GridError::InvalidLocalPosition { x: point.x, z: point.z })
    }
}

/// Finite and small enough to be turned into a fixed-point cell key
pub fn ensure_keyable(point: &GeoPoint) -> GridResult<()> {
    ensure_finite(point)?;
    if point.latitude.abs() > MAX_KEYABLE_DEGREES || point.longitude.abs() > MAX_KEYABLE_DEGREES {
        return Err(GridError::InvalidCoordinate {
            latitude: point.latitude,
            longitude: point.longitude,
        });
    }
    Ok(())
}

/// Stricter check applied to fixes from a location provider
pub fn validate_fix(point: &GeoPoint) -> GridResult<()> {
    ensure_finite(point)?;
    if !(-90.0..=90.0).contains(&point.latitude) || !(-180.0..=180.0).contains(&point.longitude) {
        return Err(GridError::OutOfRange {
            latitude: point.latitude,
            longitude: point.longitude,
        });
    }
    Ok(())
}
