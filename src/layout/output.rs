use crate::config::LeaderConfig;
use crate::ir::Point;

use super::geometry::{distance, nearest_point_on_rect_boundary, rect_around};
use super::types::{LabelBox, LeaderLine, Placement, PlotArea};

/// Turn relaxed boxes into render-ready placements, one per input point.
pub fn assemble_placements(
    points: &[Point],
    boxes: &[LabelBox],
    plot: &PlotArea,
    config: &LeaderConfig,
) -> Vec<Placement> {
    points
        .iter()
        .zip(boxes)
        .map(|(point, label)| {
            if !label.visible {
                let (x, y) = plot.clamp_point(label.anchor);
                return Placement {
                    id: point.id.clone(),
                    visible: false,
                    x,
                    y,
                    leader_line: None,
                    wrapped_lines: label.text.lines.clone(),
                    width: label.width,
                    height: label.height,
                    side: label.side,
                };
            }
            let (x, y) = plot.clamp_center(label.position, label.width, label.height);
            let leader_line = leader_line(label.anchor, (x, y), label.width, label.height, config);
            Placement {
                id: point.id.clone(),
                visible: true,
                x,
                y,
                leader_line,
                wrapped_lines: label.text.lines.clone(),
                width: label.width,
                height: label.height,
                side: label.side,
            }
        })
        .collect()
}

/// Connector from the marker edge to the closest point of the label box,
/// drawn only once the label has drifted past the threshold.
pub(crate) fn leader_line(
    anchor: (f32, f32),
    center: (f32, f32),
    width: f32,
    height: f32,
    config: &LeaderConfig,
) -> Option<LeaderLine> {
    if distance(anchor, center) <= config.leader_line_threshold {
        return None;
    }
    let rect = rect_around(center, width, height);
    let target = nearest_point_on_rect_boundary(anchor, &rect);
    let toward = if distance(anchor, target) > 1e-4 {
        target
    } else {
        center
    };
    let len = distance(anchor, toward);
    if len <= 1e-4 {
        return None;
    }
    let reach = config.anchor_radius.min(len);
    let ux = (toward.0 - anchor.0) / len;
    let uy = (toward.1 - anchor.1) / len;
    Some(LeaderLine {
        x1: anchor.0 + ux * reach,
        y1: anchor.1 + uy * reach,
        x2: target.0,
        y2: target.1,
    })
}
