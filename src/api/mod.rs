//! Session API and diagnostic output
//!
//! `HeatmapSession` is the entry point for an AR client: it receives
//! location events and camera moves and keeps the visible cell list that
//! the renderer draws.

pub mod session;
pub mod types;
pub mod formatting;

pub use session::HeatmapSession;
pub use types::{SessionStatus, UpdateOutcome};
pub use formatting::{
    CellReport, CsvFormatter, EmitterReport, JsonFormatter, TextFormatter, WindowSnapshot,
};
