//! Spherical helpers used outside the flat local frame

use crate::core::GeoPoint;

/// Initial great-circle bearing from `from` to `to`.
///
/// Degrees in [0, 360), north is 0 and angles grow clockwise.
pub fn initial_bearing_deg(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}
