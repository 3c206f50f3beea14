//! Core data types for the signal grid

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::constants::COORD_FIXED_POINT_SCALE;

/// Round a coordinate to the cache resolution (7 decimal places)
pub fn round_coordinate(value: f64) -> f64 {
    (value * COORD_FIXED_POINT_SCALE).round() / COORD_FIXED_POINT_SCALE
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Same point rounded to 7 decimal places
    pub fn normalized(&self) -> Self {
        Self {
            latitude: round_coordinate(self.latitude),
            longitude: round_coordinate(self.longitude),
        }
    }

    /// Planar distance in degrees, treating lat/lng as a flat grid
    pub fn planar_distance_deg(&self, other: &GeoPoint) -> f64 {
        let d_lat = self.latitude - other.latitude;
        let d_lng = self.longitude - other.longitude;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }
}

/// Position on the local rendering ground plane.
///
/// `x` grows to the east and `z` grows to the south (north is -Z).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub z: f64,
}

impl LocalPoint {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    /// Project a renderer position onto the ground plane, dropping height
    pub fn from_vector3(position: &Vector3<f64>) -> Self {
        Self {
            x: position.x,
            z: position.z,
        }
    }

    /// Lift back into renderer space at the given height
    pub fn to_vector3(&self, height: f64) -> Vector3<f64> {
        Vector3::new(self.x, height, self.z)
    }

    pub fn to_vector2(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.z)
    }

    pub fn distance_to(&self, other: &LocalPoint) -> f64 {
        (self.to_vector2() - other.to_vector2()).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Synthetic signal source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub id: u16,
    pub name: String,
    pub position: GeoPoint,
    /// Signal strength at the emitter itself, 0-100
    pub power: f64,
}

impl Emitter {
    pub fn new(id: u16, name: impl Into<String>, latitude: f64, longitude: f64, power: f64) -> Self {
        Self {
            id,
            name: name.into(),
            position: GeoPoint::new(latitude, longitude),
            power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_sub_resolution_noise() {
        let a = GeoPoint::new(25.00000001, 121.50000002).normalized();
        let b = GeoPoint::new(25.0, 121.5).normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalized_keeps_seven_decimals() {
        let p = GeoPoint::new(25.12345674, -121.98765436).normalized();
        assert!((p.latitude - 25.1234567).abs() < 1e-12);
        assert!((p.longitude + 121.9876544).abs() < 1e-12);
    }

    #[test]
    fn test_planar_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.003, 0.004);
        assert!((a.planar_distance_deg(&b) - 0.005).abs() < 1e-15);
    }

    #[test]
    fn test_local_point_vector_conversion() {
        let camera = Vector3::new(12.5, 1.7, -40.0);
        let ground = LocalPoint::from_vector3(&camera);
        assert_eq!(ground, LocalPoint::new(12.5, -40.0));
        assert_eq!(ground.to_vector3(1.7), camera);
        assert!((LocalPoint::origin().distance_to(&LocalPoint::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_finite());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_finite());
        assert!(GeoPoint::new(25.0, 121.5).is_finite());
        assert!(!LocalPoint::new(f64::NAN, 0.0).is_finite());
    }
}
