//! Grid cache and coordinate mapper behind one owner
//!
//! `GridEngine` is the only component that mutates the cell cache. Callers
//! receive `Rc<GridCell>` handles they can hold across frames; cells are
//! never changed after creation, so every holder sees the same values.

use std::rc::Rc;
use tracing::{debug, info};

use crate::algorithms::{CoordinateMapper, SignalFieldModel};
use crate::core::{GeoPoint, LocalPoint};
use crate::processing::cache::{CacheStats, CellQuery, GridCache, GridCell};
use crate::processing::window::{GridIndex, GridWindow};
use crate::validation::{ensure_finite_local, ensure_keyable, GridError, GridResult};

pub struct GridEngine {
    model: SignalFieldModel,
    cache: GridCache,
    mapper: CoordinateMapper,
    window: GridWindow,
    /// Geographic alignment point of the cell lattice
    grid_center: GeoPoint,
}

impl GridEngine {
    /// Build an engine whose lattice is aligned on the mapper's current origin
    pub fn new(model: SignalFieldModel, mapper: CoordinateMapper, window: GridWindow) -> Self {
        let grid_center = mapper.origin();
        Self {
            model,
            cache: GridCache::new(),
            mapper,
            window,
            grid_center,
        }
    }

    pub fn model(&self) -> &SignalFieldModel {
        &self.model
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn window(&self) -> &GridWindow {
        &self.window
    }

    pub fn grid_center(&self) -> GeoPoint {
        self.grid_center
    }

    /// Move both the local origin and the lattice alignment to `origin`.
    ///
    /// Used when tracking starts. The cache is left untouched, so any
    /// coordinate visited before still resolves to the same cell.
    pub fn reset_frame(&mut self, origin: GeoPoint) -> GridResult<()> {
        ensure_keyable(&origin)?;
        info!(
            latitude = origin.latitude,
            longitude = origin.longitude,
            cached_cells = self.cache.len(),
            "grid frame reset"
        );
        self.mapper.reanchor(origin);
        self.grid_center = origin;
        Ok(())
    }

    /// Forward a user fix to the mapper; returns whether the origin moved
    pub fn observe_user_position(&mut self, position: GeoPoint) -> GridResult<bool> {
        ensure_keyable(&position)?;
        Ok(self.mapper.observe_user_position(position))
    }

    pub fn get_or_create_cell(&mut self, latitude: f64, longitude: f64) -> GridResult<Rc<GridCell>> {
        self.cache.get_or_create_cell(&self.model, latitude, longitude)
    }

    /// Diagnostic lookup that also reports whether the cell was cached
    pub fn query_cell(&mut self, latitude: f64, longitude: f64) -> GridResult<CellQuery> {
        let query = self.cache.lookup_or_create(&self.model, latitude, longitude)?;
        debug!(
            latitude = query.cell.latitude,
            longitude = query.cell.longitude,
            signal = query.cell.signal,
            color = %query.cell.color,
            cache_hit = query.cache_hit,
            "cell queried"
        );
        Ok(query)
    }

    pub fn peek_cell(&self, latitude: f64, longitude: f64) -> Option<Rc<GridCell>> {
        self.cache.peek(latitude, longitude)
    }

    pub fn geo_to_local(&self, latitude: f64, longitude: f64) -> LocalPoint {
        self.mapper.geo_to_local(latitude, longitude)
    }

    pub fn local_to_geo(&self, local: &LocalPoint) -> GeoPoint {
        self.mapper.local_to_geo(local)
    }

    /// User position relative to the lattice center, in local units.
    ///
    /// Independent of the origin mode, so throttling sees real movement
    /// even while a following origin keeps the user at the local origin.
    pub fn grid_frame_position(&self, point: &GeoPoint) -> LocalPoint {
        self.mapper.scale().offset_to_local(
            point.latitude - self.grid_center.latitude,
            point.longitude - self.grid_center.longitude,
        )
    }

    /// Lattice index the user currently stands on
    pub fn user_grid_index(&self, user_local: &LocalPoint) -> GridResult<GridIndex> {
        let user = self.user_geo(user_local)?;
        Ok(self.window.grid_index(&self.grid_center, &user))
    }

    /// Geographic user position, rejected when it lies outside the keyable range
    fn user_geo(&self, user_local: &LocalPoint) -> GridResult<GeoPoint> {
        ensure_finite_local(user_local)?;
        let user = self.mapper.local_to_geo(user_local).normalized();
        ensure_keyable(&user).map_err(|_| GridError::InvalidLocalPosition {
            x: user_local.x,
            z: user_local.z,
        })?;
        Ok(user)
    }

    /// Cells of the visible window around the user's local position.
    ///
    /// Returns exactly `window.cell_count()` cells in lattice order,
    /// creating the ones never visited before.
    pub fn compute_visible_cells(&mut self, user_local: &LocalPoint) -> GridResult<Vec<Rc<GridCell>>> {
        let user = self.user_geo(user_local)?;
        let before = self.cache.len();

        let indices = self.window.indices_around(&self.grid_center, &user);
        let mut cells = Vec::with_capacity(indices.len());
        for index in indices {
            let coordinate = self.window.cell_coordinate(&self.grid_center, index);
            cells.push(self.cache.get_or_create_cell(
                &self.model,
                coordinate.latitude,
                coordinate.longitude,
            )?);
        }

        debug!(
            visible = cells.len(),
            created = self.cache.len() - before,
            cached = self.cache.len(),
            user_latitude = user.latitude,
            user_longitude = user.longitude,
            "visible window computed"
        );
        Ok(cells)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.statistics()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
