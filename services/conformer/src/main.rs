//! LiDAR raster conformance service.
//!
//! Mosaics per-tile raster fragments, validates every variable against
//! a conformance schema, corrects geometry where possible, and moves
//! the accepted set into the final variable directory.

mod run;
mod staging;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use run::RunConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "conformer")]
#[command(about = "Schema conformance for LiDAR raster working sets")]
struct Args {
    /// Directory of raster fragments; repeat for multiple tile directories
    #[arg(short, long = "fragment-dir", required = true)]
    fragment_dir: Vec<PathBuf>,

    /// Directory of pre-existing single-variable rasters
    #[arg(short, long)]
    raster_dir: PathBuf,

    /// Conformance schema JSON file
    #[arg(short, long)]
    schema: PathBuf,

    /// Destination for the accepted set (default: final_variable next to the raster dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Absolute per-axis tolerance for resolution comparison
    #[arg(long, default_value_t = 0.0)]
    resolution_tolerance: f64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting raster conformance run");

    run::execute(&RunConfig {
        fragment_dirs: args.fragment_dir,
        raster_dir: args.raster_dir,
        schema_path: args.schema,
        output_dir: args.output_dir,
        resolution_tolerance: args.resolution_tolerance,
    })
}
