//! Diagnostic output for cells and window snapshots
//!
//! Used by debug overlays and the CLI. Three renderings are provided:
//! human-readable text, JSON and CSV.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::algorithms::EmitterDistance;
use crate::core::{GeoPoint, LocalPoint};
use crate::processing::{CacheStats, CellQuery, GridCell};

/// Flattened view of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    pub latitude: f64,
    pub longitude: f64,
    pub signal: u8,
    pub color: String,
    pub band: String,
    /// Present only for diagnostic lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}

impl CellReport {
    pub fn from_cell(cell: &GridCell) -> Self {
        Self {
            latitude: cell.latitude,
            longitude: cell.longitude,
            signal: cell.signal,
            color: cell.color.to_string(),
            band: cell.band().label().to_string(),
            cache_hit: None,
        }
    }

    pub fn from_query(query: &CellQuery) -> Self {
        Self {
            cache_hit: Some(query.cache_hit),
            ..Self::from_cell(&query.cell)
        }
    }
}

/// Nearest-emitter line of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterReport {
    pub id: u16,
    pub name: String,
    pub power: f64,
    pub distance_m: f64,
}

impl EmitterReport {
    pub fn from_distance(entry: &EmitterDistance<'_>) -> Self {
        Self {
            id: entry.emitter.id,
            name: entry.emitter.name.clone(),
            power: entry.emitter.power,
            distance_m: entry.distance_m(),
        }
    }
}

/// Everything a debug overlay shows for the current frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub timestamp_ms: u64,
    pub status: String,
    pub user: GeoPoint,
    pub user_local: LocalPoint,
    pub heading_deg: Option<f64>,
    pub cells: Vec<CellReport>,
    pub cache: CacheStats,
    pub nearest_emitter: Option<EmitterReport>,
    pub visible_emitters: Vec<EmitterReport>,
}

/// Plain-text formatter
#[derive(Debug, Clone)]
pub struct TextFormatter {
    /// Decimal places for coordinates
    pub precision: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { precision: 5 }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(precision: usize) -> Self {
        Self { precision }
    }

    pub fn format_cell(&self, report: &CellReport) -> String {
        let mut line = format!(
            "({:.p$}, {:.p$}) signal {:>3}% {} {}",
            report.latitude,
            report.longitude,
            report.signal,
            report.color,
            report.band,
            p = self.precision
        );
        match report.cache_hit {
            Some(true) => line.push_str(" [cached]"),
            Some(false) => line.push_str(" [new]"),
            None => {}
        }
        line
    }

    pub fn format_window(&self, snapshot: &WindowSnapshot) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "user ({:.p$}, {:.p$}) local ({:.2}, {:.2}) status {}",
            snapshot.user.latitude,
            snapshot.user.longitude,
            snapshot.user_local.x,
            snapshot.user_local.z,
            snapshot.status,
            p = self.precision
        );
        if let Some(heading) = snapshot.heading_deg {
            let _ = writeln!(out, "heading {:.1} deg", heading);
        }
        let _ = writeln!(
            out,
            "visible {} | cached {} | hit rate {:.1}%",
            snapshot.cells.len(),
            snapshot.cache.cells,
            snapshot.cache.hit_rate() * 100.0
        );
        if let Some(nearest) = &snapshot.nearest_emitter {
            let _ = writeln!(
                out,
                "nearest emitter #{} {} ({}%) at {} m",
                nearest.id, nearest.name, nearest.power, nearest.distance_m
            );
        }
        for cell in &snapshot.cells {
            let _ = writeln!(out, "  {}", self.format_cell(cell));
        }
        out
    }
}

/// JSON formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    pub fn format_cell(&self, report: &CellReport) -> Result<String, serde_json::Error> {
        self.render(report)
    }

    pub fn format_window(&self, snapshot: &WindowSnapshot) -> Result<String, serde_json::Error> {
        self.render(snapshot)
    }
}

/// CSV formatter, one row per cell
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    pub delimiter: char,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> String {
        ["latitude", "longitude", "signal", "color", "band"].join(&self.delimiter.to_string())
    }

    pub fn format_cell(&self, report: &CellReport) -> String {
        let d = self.delimiter;
        format!(
            "{:.7}{d}{:.7}{d}{}{d}{}{d}{}",
            report.latitude, report.longitude, report.signal, report.color, report.band
        )
    }

    pub fn format_cells(&self, cells: &[CellReport]) -> String {
        let mut out = self.header();
        out.push('\n');
        for cell in cells {
            out.push_str(&self.format_cell(cell));
            out.push('\n');
        }
        out
    }
}
