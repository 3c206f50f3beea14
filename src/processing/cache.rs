use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

use crate::algorithms::{color_for_signal, ColorCode, SignalBand, SignalFieldModel};
use crate::core::{GeoPoint, COORD_FIXED_POINT_SCALE};
use crate::validation::{ensure_keyable, GridResult};

/// Cache key: a coordinate pair in fixed point, 10^-7 degree resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub lat_e7: i64,
    pub lng_e7: i64,
}

impl CellKey {
    /// Normalize a raw coordinate into a key.
    ///
    /// Non-finite input is rejected so that no NaN cell can ever be stored,
    /// and so is anything whose fixed-point value would not fit in an `i64`.
    pub fn from_coords(latitude: f64, longitude: f64) -> GridResult<Self> {
        ensure_keyable(&GeoPoint::new(latitude, longitude))?;
        Ok(Self {
            lat_e7: (latitude * COORD_FIXED_POINT_SCALE).round() as i64,
            lng_e7: (longitude * COORD_FIXED_POINT_SCALE).round() as i64,
        })
    }

    pub fn from_point(point: &GeoPoint) -> GridResult<Self> {
        Self::from_coords(point.latitude, point.longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.lat_e7 as f64 / COORD_FIXED_POINT_SCALE
    }

    pub fn longitude(&self) -> f64 {
        self.lng_e7 as f64 / COORD_FIXED_POINT_SCALE
    }

    pub fn to_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude(), self.longitude())
    }
}

/// One materialized sample of the signal field. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub key: CellKey,
    /// Latitude rounded to 7 decimal places
    pub latitude: f64,
    /// Longitude rounded to 7 decimal places
    pub longitude: f64,
    pub signal: u8,
    pub color: ColorCode,
}

impl GridCell {
    fn sample(key: CellKey, model: &SignalFieldModel) -> Self {
        let point = key.to_point();
        let signal = model.signal_at(&point);
        Self {
            key,
            latitude: point.latitude,
            longitude: point.longitude,
            signal,
            color: color_for_signal(signal),
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn band(&self) -> SignalBand {
        SignalBand::from_signal(self.signal)
    }
}

/// Result of a diagnostic lookup
#[derive(Debug, Clone)]
pub struct CellQuery {
    pub cell: Rc<GridCell>,
    /// The cell existed before this lookup
    pub cache_hit: bool,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cells: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Append-only store of every cell visited during a session.
///
/// There is no eviction: dropping a cell would let a revisited coordinate
/// be sampled again, and the store grows with the area explored.
#[derive(Debug, Default)]
pub struct GridCache {
    cells: HashMap<CellKey, Rc<GridCell>>,
    hit_count: u64,
    miss_count: u64,
}

impl GridCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cell for a coordinate, sampling and storing it on a miss
    pub fn lookup_or_create(
        &mut self,
        model: &SignalFieldModel,
        latitude: f64,
        longitude: f64,
    ) -> GridResult<CellQuery> {
        let key = CellKey::from_coords(latitude, longitude)?;

        if let Some(cell) = self.cells.get(&key) {
            self.hit_count += 1;
            return Ok(CellQuery {
                cell: Rc::clone(cell),
                cache_hit: true,
            });
        }

        self.miss_count += 1;
        let cell = Rc::new(GridCell::sample(key, model));
        trace!(
            lat_e7 = key.lat_e7,
            lng_e7 = key.lng_e7,
            signal = cell.signal,
            "grid cell created"
        );
        self.cells.insert(key, Rc::clone(&cell));

        Ok(CellQuery {
            cell,
            cache_hit: false,
        })
    }

    pub fn get_or_create_cell(
        &mut self,
        model: &SignalFieldModel,
        latitude: f64,
        longitude: f64,
    ) -> GridResult<Rc<GridCell>> {
        self.lookup_or_create(model, latitude, longitude)
            .map(|query| query.cell)
    }

    /// Read-only lookup that neither creates cells nor touches the counters
    pub fn peek(&self, latitude: f64, longitude: f64) -> Option<Rc<GridCell>> {
        let key = CellKey::from_coords(latitude, longitude).ok()?;
        self.cells.get(&key).cloned()
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.cells.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn statistics(&self) -> CacheStats {
        CacheStats {
            cells: self.cells.len(),
            hits: self.hit_count,
            misses: self.miss_count,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<GridCell>> {
        self.cells.values()
    }
}
