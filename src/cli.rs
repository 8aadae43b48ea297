use crate::config::load_config;
use crate::layout::compute_placements;
use crate::layout_dump::write_placement_dump;
use crate::parser::parse_scene;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "curvelabels",
    version,
    about = "Place labels for points on a chart curve"
)]
pub struct Args {
    /// Scene file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output JSON file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Placement config (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Override chart width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Override chart height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Single-line JSON output
    #[arg(long = "compact")]
    pub compact: bool,

    /// Debug logging to stderr (RUST_LOG wins when set)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    let input = read_input(args.input.as_deref())?;
    let mut scene = parse_scene(&input)?;
    if let Some(width) = args.width {
        scene.chart.width = width;
    }
    if let Some(height) = args.height {
        scene.chart.height = height;
    }
    crate::parser::validate_scene(&scene)?;

    let layout = compute_placements(&scene, &config);
    tracing::info!(
        points = scene.points.len(),
        visible = layout.stats.visible,
        converged = layout.stats.converged,
        "placed labels"
    );
    write_placement_dump(args.output.as_deref(), &layout, &scene, !args.compact)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
