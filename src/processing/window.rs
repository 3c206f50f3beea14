//! Visible window geometry over the cell lattice

use serde::{Deserialize, Serialize};

use crate::core::{
    GeoPoint, DESKTOP_CELL_SIZE_DEG, DESKTOP_VISIBLE_RADIUS, MOBILE_CELL_SIZE_DEG,
    MOBILE_VISIBLE_RADIUS,
};

/// Display class, selects lattice density and window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceProfile {
    /// Handheld: ~100 m cells, 7x7 window
    Mobile,
    /// Desktop: ~50 m cells, 9x9 window
    Desktop,
}

impl DeviceProfile {
    pub fn cell_size_deg(&self) -> f64 {
        match self {
            DeviceProfile::Mobile => MOBILE_CELL_SIZE_DEG,
            DeviceProfile::Desktop => DESKTOP_CELL_SIZE_DEG,
        }
    }

    pub fn visible_radius(&self) -> u32 {
        match self {
            DeviceProfile::Mobile => MOBILE_VISIBLE_RADIUS,
            DeviceProfile::Desktop => DESKTOP_VISIBLE_RADIUS,
        }
    }
}

/// Integer lattice index relative to the grid center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    /// Steps east
    pub x: i64,
    /// Steps north
    pub z: i64,
}

/// Square window of `(2 * radius + 1)^2` lattice points around the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridWindow {
    pub cell_size_deg: f64,
    pub radius: u32,
}

impl GridWindow {
    pub fn new(cell_size_deg: f64, radius: u32) -> Self {
        Self {
            cell_size_deg,
            radius,
        }
    }

    pub fn for_profile(profile: DeviceProfile) -> Self {
        Self::new(profile.cell_size_deg(), profile.visible_radius())
    }

    /// Edge length of the window in cells
    pub fn side(&self) -> usize {
        2 * self.radius as usize + 1
    }

    pub fn cell_count(&self) -> usize {
        self.side() * self.side()
    }

    /// Lattice index nearest to `user`
    pub fn grid_index(&self, center: &GeoPoint, user: &GeoPoint) -> GridIndex {
        GridIndex {
            x: ((user.longitude - center.longitude) / self.cell_size_deg).round() as i64,
            z: ((user.latitude - center.latitude) / self.cell_size_deg).round() as i64,
        }
    }

    /// Geographic position of a lattice point (not yet normalized)
    pub fn cell_coordinate(&self, center: &GeoPoint, index: GridIndex) -> GeoPoint {
        GeoPoint {
            latitude: center.latitude + index.z as f64 * self.cell_size_deg,
            longitude: center.longitude + index.x as f64 * self.cell_size_deg,
        }
    }

    /// Lattice indices of the window around `user`.
    ///
    /// Ordered x-outer, z-inner, west to east and south to north.
    pub fn indices_around(&self, center: &GeoPoint, user: &GeoPoint) -> Vec<GridIndex> {
        let origin = self.grid_index(center, user);
        let radius = self.radius as i64;
        let mut indices = Vec::with_capacity(self.cell_count());

        for x in (origin.x - radius)..=(origin.x + radius) {
            for z in (origin.z - radius)..=(origin.z + radius) {
                indices.push(GridIndex { x, z });
            }
        }

        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let mobile = GridWindow::for_profile(DeviceProfile::Mobile);
        assert_eq!(mobile.cell_count(), 49);
        assert_eq!(mobile.cell_size_deg, 0.0010);

        let desktop = GridWindow::for_profile(DeviceProfile::Desktop);
        assert_eq!(desktop.cell_count(), 81);
        assert_eq!(desktop.cell_size_deg, 0.0005);
    }

    #[test]
    fn test_grid_index_rounds_to_nearest() {
        let window = GridWindow::new(0.001, 3);
        let center = GeoPoint::new(25.0, 121.5);
        assert_eq!(
            window.grid_index(&center, &GeoPoint::new(25.0014, 121.5026)),
            GridIndex { x: 3, z: 1 }
        );
        assert_eq!(
            window.grid_index(&center, &GeoPoint::new(24.9984, 121.4994)),
            GridIndex { x: -1, z: -2 }
        );
    }

    #[test]
    fn test_indices_order_and_size() {
        let window = GridWindow::new(0.001, 1);
        let center = GeoPoint::new(25.0, 121.5);
        let indices = window.indices_around(&center, &center);
        assert_eq!(indices.len(), 9);
        assert_eq!(indices[0], GridIndex { x: -1, z: -1 });
        assert_eq!(indices[1], GridIndex { x: -1, z: 0 });
        assert_eq!(indices[3], GridIndex { x: 0, z: -1 });
        assert_eq!(indices[8], GridIndex { x: 1, z: 1 });
    }

    #[test]
    fn test_zero_radius_is_single_cell() {
        let window = GridWindow::new(0.0005, 0);
        let center = GeoPoint::new(25.0, 121.5);
        let user = GeoPoint::new(25.0011, 121.5);
        let indices = window.indices_around(&center, &user);
        assert_eq!(indices, vec![GridIndex { x: 0, z: 2 }]);
        let coordinate = window.cell_coordinate(&center, indices[0]);
        assert!((coordinate.latitude - 25.001).abs() < 1e-12);
    }
}
