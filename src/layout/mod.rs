mod candidates;
pub mod curve;
mod geometry;
mod output;
pub mod relax;
mod sides;
mod text;
pub(crate) mod types;
pub mod visibility;

pub use candidates::place_candidates;
pub use curve::{Curve, CurveSample, CurveSampleCache, DEGENERATE_CURVE_DISTANCE};
pub use output::assemble_placements;
pub use relax::{Force, RelaxReport, relax_labels};
pub use sides::assign_sides;
pub use types::*;
pub use visibility::{composite_importance, select_visible, visible_count};

use crate::config::PlacementConfig;
use crate::ir::Scene;
use crate::text_metrics::{HeuristicMeasure, TextMeasure};
use text::measure_label;

/// Run one full placement cycle with the measurer the config asks for.
pub fn compute_placements(scene: &Scene, config: &PlacementConfig) -> PlacementLayout {
    compute_placements_with(scene, config, default_measurer(config))
}

#[cfg(feature = "font-metrics")]
fn default_measurer(config: &PlacementConfig) -> &'static dyn TextMeasure {
    if config.text.fast_text_metrics {
        &HeuristicMeasure
    } else {
        &crate::text_metrics::SystemFontMeasure
    }
}

#[cfg(not(feature = "font-metrics"))]
fn default_measurer(_config: &PlacementConfig) -> &'static dyn TextMeasure {
    &HeuristicMeasure
}

/// Select, orient, seed, relax and assemble labels for every scene point.
/// Output placements are indexed exactly like `scene.points`.
pub fn compute_placements_with(
    scene: &Scene,
    config: &PlacementConfig,
    measurer: &dyn TextMeasure,
) -> PlacementLayout {
    let config = config.clone().sanitized();
    let cache = CurveSampleCache::from_spec(&scene.curve, &config.curve);
    let curve_samples: Vec<(f32, f32)> = cache.samples().iter().map(|s| s.position).collect();
    let points = &scene.points;
    if points.is_empty() {
        return PlacementLayout {
            placements: Vec::new(),
            stats: LayoutStats {
                converged: true,
                ..LayoutStats::default()
            },
            curve_samples,
        };
    }
    if cache.is_degenerate() {
        tracing::debug!(
            samples = cache.samples().len(),
            "degenerate curve, curve clearance disabled"
        );
    }

    let plot = PlotArea::from_chart(&scene.chart);
    let visible = select_visible(points, &config.visibility);
    let sides = assign_sides(points, &visible, config.visibility.zigzag_min_visible);
    let importance: Vec<f32> = points
        .iter()
        .map(|p| composite_importance(p, config.visibility.importance_weights))
        .collect();

    let mut boxes: Vec<LabelBox> = points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            let anchor = cache.position_at_x(scene.chart.domain_to_x(point.curve_param));
            let label = if point.label_text.trim().is_empty() {
                point.id.as_str()
            } else {
                point.label_text.as_str()
            };
            let text = measure_label(label, measurer, &config.text);
            LabelBox {
                owner: idx,
                width: text.width + config.text.padding_x * 2.0,
                height: text.height + config.text.padding_y * 2.0,
                side: sides[idx],
                visible: visible[idx],
                anchor,
                position: anchor,
                preferred_position: anchor,
                text,
            }
        })
        .collect();

    place_candidates(&mut boxes, &importance, &cache, &plot, &config);
    let report = relax_labels(&mut boxes, &cache, &plot, &config);
    let placements = assemble_placements(points, &boxes, &plot, &config.leader);

    let shown = visible.iter().filter(|v| **v).count();
    let stats = LayoutStats {
        visible: shown,
        hidden: points.len() - shown,
        ticks: report.ticks,
        converged: report.converged,
        initial_overlap: report.initial_overlap,
        final_overlap: report.final_overlap,
        reverted: report.reverted,
    };
    tracing::debug!(
        points = points.len(),
        visible = stats.visible,
        ticks = stats.ticks,
        "placement cycle finished"
    );
    PlacementLayout {
        placements,
        stats,
        curve_samples,
    }
}
