use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use signal_grid::api::{CellReport, CsvFormatter, JsonFormatter, TextFormatter, WindowSnapshot};
use signal_grid::location::{LocationSource, ManualOverrideProvider};
use signal_grid::utils::LogLevel;
use signal_grid::{
    init_logging, ConfigurationManager, GeoPoint, HeatmapSession, LocalPoint, LocationSample,
    LogConfig,
};

#[derive(Parser)]
#[command(name = "signal-grid", about = "Cellular signal heatmap grid")]
struct ClArgs {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Signal and color of the cell containing a coordinate
    Query {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Visible window after a manual position override
    Window {
        /// Latitude as typed into the override form
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        /// Longitude as typed into the override form
        #[arg(long, allow_hyphen_values = true)]
        lng: String,
        /// Camera offset east of the fix, local units
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,
        /// Camera offset south of the fix, local units
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        z: f64,
    },
    /// Replay a straight walk and report every window rebuild
    Walk {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Latitude step per fix, degrees
        #[arg(long, default_value_t = 0.0001, allow_hyphen_values = true)]
        step_lat: f64,
        /// Longitude step per fix, degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        step_lng: f64,
        #[arg(long, default_value_t = 20)]
        steps: usize,
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn render_cell(format: OutputFormat, report: &CellReport) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => TextFormatter::new().format_cell(report),
        OutputFormat::Json => JsonFormatter::pretty().format_cell(report)?,
        OutputFormat::Csv => CsvFormatter::new().format_cells(std::slice::from_ref(report)),
    })
}

fn render_window(format: OutputFormat, snapshot: &WindowSnapshot) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => TextFormatter::new().format_window(snapshot),
        OutputFormat::Json => JsonFormatter::pretty().format_window(snapshot)?,
        OutputFormat::Csv => CsvFormatter::new().format_cells(&snapshot.cells),
    })
}

fn main() -> Result<()> {
    let args = ClArgs::parse();

    let mut manager = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigurationManager::new(),
    };

    let mut logging: LogConfig = manager.config().logging.clone();
    if args.verbosity > 0 {
        logging.level = LogLevel::from_verbosity(args.verbosity);
    }
    init_logging(&logging);

    let config = manager.config().clone();
    match args.command {
        Command::Query { lat, lng } => {
            let mut engine = config.build_engine(config.location.default_location)?;
            let query = engine.query_cell(lat, lng)?;
            println!("{}", render_cell(args.format, &CellReport::from_query(&query))?);
        }
        Command::Window { lat, lng, x, z } => {
            let mut provider = ManualOverrideProvider::new();
            provider.submit(&lat, &lng, 0)?;

            let mut session = HeatmapSession::new(config)?;
            session.pump(&mut provider, 0)?;
            if x != 0.0 || z != 0.0 {
                let user = session.user_local();
                session.on_camera_moved(LocalPoint::new(user.x + x, user.z + z), 0)?;
                session.force_refresh(0)?;
            }
            print!("{}", render_window(args.format, &session.snapshot())?);
        }
        Command::Walk {
            lat,
            lng,
            step_lat,
            step_lng,
            steps,
            interval_ms,
        } => {
            if steps == 0 {
                bail!("walk needs at least one step");
            }
            let mut session = HeatmapSession::new(config)?;
            let mut rebuilds = 0usize;
            for i in 0..steps {
                let now_ms = interval_ms * i as u64;
                let sample = LocationSample::new(
                    GeoPoint::new(lat + step_lat * i as f64, lng + step_lng * i as f64),
                    5.0,
                    now_ms,
                    LocationSource::Simulated,
                );
                let outcome = session.on_location(&sample, now_ms)?;
                if outcome.recomputed {
                    rebuilds += 1;
                    if args.format == OutputFormat::Text {
                        println!(
                            "t={}ms rebuilt window: {} visible, {} cached",
                            now_ms, outcome.visible_cells, outcome.cached_cells
                        );
                    }
                }
            }
            info!(steps, rebuilds, "walk finished");
            print!("{}", render_window(args.format, &session.snapshot())?);
        }
        Command::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if let Some(path) = write {
                manager
                    .save_to_file(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "configuration written");
            }
        }
    }

    Ok(())
}
