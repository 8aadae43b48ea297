#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{PlacementConfig, load_config, parse_config};
pub use ir::{ChartBounds, CurveSpec, LabelSide, Point, Scene};
pub use layout::{Placement, PlacementLayout, compute_placements, compute_placements_with};
pub use parser::{SceneError, parse_scene};
pub use text_metrics::{HeuristicMeasure, TextMeasure};

/// Parse a scene document and place its labels.
pub fn place_scene(input: &str, config: &PlacementConfig) -> Result<PlacementLayout, SceneError> {
    let scene = parse_scene(input)?;
    Ok(compute_placements(&scene, config))
}
