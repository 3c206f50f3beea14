//! Synthetic signal field over geographic coordinates
//!
//! Every emitter radiates with a quadratic falloff that reaches zero at
//! `max_distance_deg`. The reported strength is dominated by the strongest
//! emitter and lightly boosted by overlapping coverage. Distances are planar
//! in degrees, which is only meaningful over a few kilometers.

use crate::core::{
    Emitter, GeoPoint, BEST_SIGNAL_WEIGHT, DEFAULT_MAX_DISTANCE_DEG, DIFFUSE_FACTOR, MAX_SIGNAL,
    METERS_PER_DEGREE, TOTAL_SIGNAL_WEIGHT,
};

/// The built-in emitter catalog around central Taipei
pub fn default_emitters() -> Vec<Emitter> {
    vec![
        Emitter::new(1, "Taipei 101", 25.0330, 121.5654, 100.0),
        Emitter::new(2, "Taipei Main Station", 25.0478, 121.5318, 95.0),
        Emitter::new(3, "Yuanshan", 25.0855, 121.5606, 90.0),
        Emitter::new(4, "Xinyi", 24.9968, 121.5417, 95.0),
        Emitter::new(5, "Da'an", 25.0194, 121.5419, 85.0),
        Emitter::new(6, "Zhongzheng", 25.0100, 121.5300, 100.0),
        Emitter::new(7, "Neihu", 25.0600, 121.5800, 85.0),
        Emitter::new(8, "Nangang", 25.0250, 121.5750, 90.0),
        Emitter::new(9, "Songshan", 25.0050, 121.5550, 95.0),
        Emitter::new(10, "Zhongshan", 25.0400, 121.5500, 90.0),
        Emitter::new(11, "Local", 25.0322, 121.5471, 100.0),
    ]
}

/// An emitter together with its distance from a query point
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterDistance<'a> {
    pub emitter: &'a Emitter,
    pub distance_deg: f64,
}

impl EmitterDistance<'_> {
    /// Rough ground distance for display
    pub fn distance_m(&self) -> f64 {
        (self.distance_deg * METERS_PER_DEGREE).round()
    }
}

/// Stateless mapping from a coordinate to an integer strength in [0, 100]
#[derive(Debug, Clone)]
pub struct SignalFieldModel {
    emitters: Vec<Emitter>,
    max_distance_deg: f64,
}

impl Default for SignalFieldModel {
    fn default() -> Self {
        Self::new(default_emitters(), DEFAULT_MAX_DISTANCE_DEG)
    }
}

impl SignalFieldModel {
    pub fn new(emitters: Vec<Emitter>, max_distance_deg: f64) -> Self {
        Self {
            emitters,
            max_distance_deg,
        }
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn max_distance_deg(&self) -> f64 {
        self.max_distance_deg
    }

    /// Contribution of a single emitter at `point`.
    ///
    /// Equals `power` on top of the emitter and is exactly zero from
    /// `max_distance_deg` outward.
    pub fn contribution(&self, emitter: &Emitter, point: &GeoPoint) -> f64 {
        let distance = point.planar_distance_deg(&emitter.position);
        if distance < self.max_distance_deg {
            let falloff = 1.0 - distance / self.max_distance_deg;
            emitter.power * falloff * falloff
        } else {
            0.0
        }
    }

    /// Unclamped, unrounded field value
    pub fn raw_signal(&self, point: &GeoPoint) -> f64 {
        let mut total = 0.0;
        let mut best: f64 = 0.0;

        for emitter in &self.emitters {
            let contribution = self.contribution(emitter, point);
            if contribution > 0.0 {
                total += contribution * DIFFUSE_FACTOR;
                best = best.max(contribution);
            }
        }

        best * BEST_SIGNAL_WEIGHT + total * TOTAL_SIGNAL_WEIGHT
    }

    /// Signal strength at `point`, clamped to [0, 100] and rounded
    pub fn signal_at(&self, point: &GeoPoint) -> u8 {
        let raw = self.raw_signal(point);
        raw.clamp(0.0, MAX_SIGNAL).round() as u8
    }

    pub fn signal_strength(&self, latitude: f64, longitude: f64) -> u8 {
        self.signal_at(&GeoPoint::new(latitude, longitude))
    }

    /// Emitters within `radius_deg` of `point` (inclusive), in catalog order
    pub fn emitters_within(&self, point: &GeoPoint, radius_deg: f64) -> Vec<EmitterDistance<'_>> {
        self.emitters
            .iter()
            .map(|emitter| EmitterDistance {
                emitter,
                distance_deg: point.planar_distance_deg(&emitter.position),
            })
            .filter(|entry| entry.distance_deg <= radius_deg)
            .collect()
    }

    /// Closest emitter to `point`, if the catalog is not empty
    pub fn nearest_emitter(&self, point: &GeoPoint) -> Option<EmitterDistance<'_>> {
        self.emitters
            .iter()
            .map(|emitter| EmitterDistance {
                emitter,
                distance_deg: point.planar_distance_deg(&emitter.position),
            })
            .min_by(|a, b| a.distance_deg.total_cmp(&b.distance_deg))
    }
}
