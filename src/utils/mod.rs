//! Configuration and logging utilities

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigurationManager, HeatmapConfig, ValidationResult};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
