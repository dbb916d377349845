//! roadhopper: CLI for turning a routed path into an annotated road model.
//!
//! Reads the routed edges of a path (JSON), runs the road model
//! pipeline, and writes the resulting route as GeoJSON. Useful for:
//!
//! - Inspecting how a simplification tolerance changes a route
//! - Checking which bends and road signs a route contains
//! - Measuring per-stage durations
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin roadhopper -- [OPTIONS] <EDGES_PATH>
//! ```
//!
//! Log output goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use env_logger::Env;
use log::info;
use roadhopper_pipeline::diagnostics::Clock;
use roadhopper_pipeline::{PipelineConfig, PipelineError, RoutedEdge, SignTable};
use serde::de::DeserializeOwned;

/// Exit code for input or configuration the pipeline rejects.
const EXIT_PIPELINE_ERROR: u8 = 2;

/// Turn routed edges into a simplified road model with bends and road signs.
///
/// Writes a GeoJSON `FeatureCollection` with one `LineString` per road
/// segment and `Point` features for road signs and bends.
#[derive(Parser)]
#[command(name = "roadhopper", version)]
struct Cli {
    /// Path to the routed edges (JSON array).
    edges_path: PathBuf,

    /// RDP simplification tolerance in metres.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    tolerance: f64,

    /// Keep every segment instead of simplifying.
    #[arg(long)]
    no_simplify: bool,

    /// Skip bend detection.
    #[arg(long)]
    no_bends: bool,

    /// Minimum total turning angle of a bend, in degrees.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_BEND_ANGLE)]
    min_bend_angle: f64,

    /// Heading change in degrees below which a bend delta counts as straight.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_STRAIGHT_DELTA)]
    straight_delta: f64,

    /// Road sign table (JSON with `trafficLights`, `stopSigns`, `other`).
    #[arg(long)]
    signs: Option<PathBuf>,

    /// Write GeoJSON to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the GeoJSON.
    #[arg(long)]
    pretty: bool,

    /// Print a per-stage diagnostics report to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json_diagnostics: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        simplify: !cli.no_simplify,
        simplify_tolerance: cli.tolerance,
        find_bends: !cli.no_bends,
        min_bend_angle: cli.min_bend_angle,
        straight_delta: cli.straight_delta,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let edges: Vec<RoutedEdge> = match read_json(&cli.edges_path) {
        Ok(edges) => edges,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let signs: SignTable = match cli.signs {
        Some(ref path) => match read_json(path) {
            Ok(table) => table,
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        },
        None => SignTable::new(),
    };

    info!(
        "{}: {} edges, {} sign entries",
        cli.edges_path.display(),
        edges.len(),
        signs.len()
    );

    let (route, diagnostics) =
        match roadhopper_pipeline::process_with_diagnostics(edges, &config, &signs, &StdClock) {
            Ok(result) => result,
            Err(e) => return pipeline_failure(&e),
        };

    if cli.json_diagnostics {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else if cli.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    let geojson = match roadhopper_export::to_geojson_string(&route, cli.pretty) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error encoding GeoJSON: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.output {
        Some(ref path) => {
            if let Err(e) = std::fs::write(path, &geojson) {
                eprintln!("Error writing GeoJSON to {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
            info!(
                "route {} written to {} ({} bytes)",
                route.id(),
                path.display(),
                geojson.len()
            );
        }
        None => println!("{geojson}"),
    }

    ExitCode::SUCCESS
}

fn pipeline_failure(error: &PipelineError) -> ExitCode {
    eprintln!("Pipeline error: {error}");
    ExitCode::from(EXIT_PIPELINE_ERROR)
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
