use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::algorithms::{default_emitters, CoordinateMapper, FrameScale, OriginMode, SignalFieldModel};
use crate::core::{
    Emitter, GeoPoint, DEFAULT_EMITTER_VISIBLE_RADIUS_KM, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    DEFAULT_MAX_DISTANCE_DEG, MAX_SIGNAL,
};
use crate::processing::{DeviceProfile, GridEngine, GridWindow, PolicyConfig};
use crate::utils::logging::LogConfig;
use crate::validation::validate_fix;

/// Smallest cell edge that still maps distinct lattice points to distinct keys
pub const MIN_CELL_SIZE_DEG: f64 = 1e-6;

/// Largest accepted window radius
pub const MAX_VISIBLE_RADIUS: u32 = 50;

/// Signal field parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Falloff radius of every emitter (degrees)
    pub max_distance_deg: f64,
    pub emitters: Vec<Emitter>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            max_distance_deg: DEFAULT_MAX_DISTANCE_DEG,
            emitters: default_emitters(),
        }
    }
}

/// Local rendering frame parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FrameConfig {
    pub origin_mode: OriginMode,
    pub scale: FrameScale,
}

/// Cell lattice parameters. Explicit values override the profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub profile: DeviceProfile,
    pub cell_size_deg: Option<f64>,
    pub visible_radius: Option<u32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            profile: DeviceProfile::Mobile,
            cell_size_deg: None,
            visible_radius: None,
        }
    }
}

impl GridConfig {
    pub fn window(&self) -> GridWindow {
        GridWindow::new(
            self.cell_size_deg.unwrap_or_else(|| self.profile.cell_size_deg()),
            self.visible_radius.unwrap_or_else(|| self.profile.visible_radius()),
        )
    }
}

/// Location handling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Used when no fix can be obtained
    pub default_location: GeoPoint,
    /// Emitters closer than this are reported as visible (km)
    pub emitter_visible_radius_km: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_location: GeoPoint::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE),
            emitter_visible_radius_km: DEFAULT_EMITTER_VISIBLE_RADIUS_KM,
        }
    }
}

/// Complete configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeatmapConfig {
    pub signal: SignalConfig,
    pub frame: FrameConfig,
    pub grid: GridConfig,
    pub update: PolicyConfig,
    pub location: LocationConfig,
    pub logging: LogConfig,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Two emitters share an identifier
    #[error("Duplicate emitter id {emitter_id}")]
    DuplicateEmitter { emitter_id: u16 },
    /// Configuration file I/O error
    #[error("I/O error: {message}")]
    IoError { message: String },
    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

/// Outcome of validating a configuration
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn invalid(&mut self, parameter: &str, value: impl ToString, reason: &str) {
        self.errors.push(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    /// First error, if the configuration was rejected
    pub fn into_result(self) -> Result<Vec<String>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

fn positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl HeatmapConfig {
    /// Check every parameter; warnings do not make the config invalid
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !positive_finite(self.signal.max_distance_deg) {
            result.invalid(
                "signal.max_distance_deg",
                self.signal.max_distance_deg,
                "falloff distance must be positive",
            );
        }

        let mut seen = HashSet::new();
        for emitter in &self.signal.emitters {
            if !seen.insert(emitter.id) {
                result.errors.push(ConfigError::DuplicateEmitter { emitter_id: emitter.id });
            }
            if !emitter.power.is_finite() || !(0.0..=MAX_SIGNAL).contains(&emitter.power) {
                result.invalid(
                    &format!("signal.emitters[{}].power", emitter.id),
                    emitter.power,
                    "power must be within 0-100",
                );
            }
            if !emitter.position.is_finite() {
                result.invalid(
                    &format!("signal.emitters[{}].position", emitter.id),
                    format!("({}, {})", emitter.position.latitude, emitter.position.longitude),
                    "emitter position must be finite",
                );
            }
        }
        if self.signal.emitters.is_empty() {
            result.warnings.push("No emitters configured, every cell will read 0".to_string());
        }

        let scale = self.frame.scale;
        if !positive_finite(scale.degrees_per_km) {
            result.invalid("frame.scale.degrees_per_km", scale.degrees_per_km, "must be positive");
        }
        if !positive_finite(scale.units_per_km) {
            result.invalid("frame.scale.units_per_km", scale.units_per_km, "must be positive");
        }

        let window = self.grid.window();
        if !window.cell_size_deg.is_finite() || window.cell_size_deg < MIN_CELL_SIZE_DEG {
            result.invalid(
                "grid.cell_size_deg",
                window.cell_size_deg,
                "cell size below key resolution would merge neighboring cells",
            );
        } else if window.cell_size_deg > self.signal.max_distance_deg {
            result.warnings.push(format!(
                "Cell size {} exceeds emitter falloff {}, the heatmap will be very coarse",
                window.cell_size_deg, self.signal.max_distance_deg
            ));
        }
        if window.radius > MAX_VISIBLE_RADIUS {
            result.invalid("grid.visible_radius", window.radius, "window too large to render per frame");
        }

        if let Some((parameter, value)) = self.update.invalid_parameter() {
            result.invalid(parameter, value, "threshold must be a non-negative number");
        }

        if validate_fix(&self.location.default_location).is_err() {
            let point = self.location.default_location;
            result.invalid(
                "location.default_location",
                format!("({}, {})", point.latitude, point.longitude),
                "default location must be a valid coordinate",
            );
        }
        if !self.location.emitter_visible_radius_km.is_finite() || self.location.emitter_visible_radius_km < 0.0 {
            result.invalid(
                "location.emitter_visible_radius_km",
                self.location.emitter_visible_radius_km,
                "radius must be non-negative",
            );
        }

        result.is_valid = result.errors.is_empty();
        result
    }

    pub fn signal_model(&self) -> SignalFieldModel {
        SignalFieldModel::new(self.signal.emitters.clone(), self.signal.max_distance_deg)
    }

    /// Build an engine whose frame and lattice start at `origin`
    pub fn build_engine(&self, origin: GeoPoint) -> Result<GridEngine, ConfigError> {
        let warnings = self.validate().into_result()?;
        for warning in warnings {
            warn!(%warning, "configuration warning");
        }
        let mapper = CoordinateMapper::new(self.frame.origin_mode, origin, self.frame.scale);
        Ok(GridEngine::new(self.signal_model(), mapper, self.grid.window()))
    }
}

/// Holds the active configuration and its backing file
pub struct ConfigurationManager {
    config: HeatmapConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self {
            config: HeatmapConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn update_config(&mut self, config: HeatmapConfig) -> Result<(), ConfigError> {
        config.validate().into_result()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn set_origin_mode(&mut self, mode: OriginMode) {
        self.config.frame.origin_mode = mode;
        self.is_modified = true;
    }

    /// Switch device profile, dropping explicit lattice overrides
    pub fn set_profile(&mut self, profile: DeviceProfile) {
        self.config.grid = GridConfig {
            profile,
            cell_size_deg: None,
            visible_radius: None,
        };
        self.is_modified = true;
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: HeatmapConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        config.validate().into_result()?;
        info!(path = %path_str, emitters = config.signal.emitters.len(), "configuration loaded");

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let result = HeatmapConfig::default().validate();
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_defaults_match_mobile_profile() {
        let config = HeatmapConfig::default();
        assert_eq!(config.grid.window(), GridWindow::new(0.0010, 3));
        assert_eq!(config.frame.origin_mode, OriginMode::FixedAnchor);
        assert_eq!(config.signal.emitters.len(), 11);
    }

    #[test]
    fn test_grid_overrides() {
        let grid = GridConfig {
            profile: DeviceProfile::Desktop,
            cell_size_deg: Some(0.0002),
            visible_radius: None,
        };
        assert_eq!(grid.window(), GridWindow::new(0.0002, 4));
    }

    #[test]
    fn test_rejects_bad_power_and_duplicates() {
        let mut config = HeatmapConfig::default();
        config.signal.emitters.push(Emitter::new(1, "dup", 25.0, 121.5, 150.0));
        let result = config.validate();
        assert!(!result.is_valid);
        assert!(result.errors.contains(&ConfigError::DuplicateEmitter { emitter_id: 1 }));
        assert!(result.errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidParameter { parameter, .. } if parameter == "signal.emitters[1].power"
        )));
    }

    #[test]
    fn test_rejects_tiny_cells() {
        let mut config = HeatmapConfig::default();
        config.grid.cell_size_deg = Some(1e-8);
        let err = config.validate().into_result().unwrap_err();
        assert!(err.to_string().contains("grid.cell_size_deg"));
    }

    #[test]
    fn test_rejects_bad_scale_and_location() {
        let mut config = HeatmapConfig::default();
        config.frame.scale.units_per_km = 0.0;
        config.location.default_location = GeoPoint::new(f64::NAN, 0.0);
        let result = config.validate();
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_warns_on_empty_catalog() {
        let mut config = HeatmapConfig::default();
        config.signal.emitters.clear();
        let result = config.validate();
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HeatmapConfig = serde_json::from_str(
            r#"{ "frame": { "origin_mode": "UserFollowing" }, "grid": { "profile": "Desktop" } }"#,
        )
        .unwrap();
        assert_eq!(config.frame.origin_mode, OriginMode::UserFollowing);
        assert_eq!(config.frame.scale, FrameScale::default());
        assert_eq!(config.grid.window().cell_count(), 81);
        assert_eq!(config.signal.emitters.len(), 11);
    }

    #[test]
    fn test_build_engine_rejects_invalid() {
        let mut config = HeatmapConfig::default();
        config.signal.max_distance_deg = -1.0;
        assert!(config.build_engine(GeoPoint::new(25.0, 121.5)).is_err());

        let engine = HeatmapConfig::default().build_engine(GeoPoint::new(25.0, 121.5)).unwrap();
        assert_eq!(engine.grid_center(), GeoPoint::new(25.0, 121.5));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.json");

        let mut manager = ConfigurationManager::new();
        manager.set_origin_mode(OriginMode::UserFollowing);
        manager.set_profile(DeviceProfile::Desktop);
        assert!(manager.is_modified());
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config(), manager.config());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ConfigurationManager::from_file(&missing),
            Err(ConfigError::IoError { .. })
        ));

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(
            ConfigurationManager::from_file(&garbage),
            Err(ConfigError::SerializationError { .. })
        ));

        let mut manager = ConfigurationManager::new();
        assert!(manager.save().is_err());
    }

    #[test]
    fn test_update_config_validates() {
        let mut manager = ConfigurationManager::new();
        let mut bad = HeatmapConfig::default();
        bad.grid.visible_radius = Some(500);
        assert!(manager.update_config(bad).is_err());
        assert!(!manager.is_modified());
    }
}
