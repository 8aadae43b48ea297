//! Force relaxation of label positions.
//!
//! Each tick folds the fixed force list over the visible labels. A force is a
//! pure function from the current nodes to per-node position deltas; deltas
//! are applied before the next force runs. A cooling factor `alpha` scales
//! every force except the boundary clamp, so the system settles even when
//! overlaps cannot be fully resolved.

use crate::config::PlacementConfig;
use crate::ir::LabelSide;

use super::curve::CurveSampleCache;
use super::geometry::{
    ObstacleGrid, PointIndex, Rect, distance, inflate_rect, overlap_area, point_rect_distance,
    rect_around,
};
use super::types::{LabelBox, PlotArea};

const CLEARANCE_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Force {
    Collision,
    CurveRepulsion,
    AnchorRepulsion,
    SpringToPreferred,
    BoundaryClamp,
}

pub const FORCES: [Force; 5] = [
    Force::Collision,
    Force::CurveRepulsion,
    Force::AnchorRepulsion,
    Force::SpringToPreferred,
    Force::BoundaryClamp,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub preferred: (f32, f32),
    pub side: LabelSide,
}

impl Node {
    fn rect(&self) -> Rect {
        rect_around(self.center, self.width, self.height)
    }

    fn half_diagonal(&self) -> f32 {
        0.5 * (self.width * self.width + self.height * self.height).sqrt()
    }

    /// Fallback push direction when geometry gives none.
    fn escape_sign(&self) -> f32 {
        match self.side {
            LabelSide::Below => 1.0,
            _ => -1.0,
        }
    }
}

pub struct ForceContext<'a> {
    pub cache: &'a CurveSampleCache,
    pub(crate) markers: &'a PointIndex,
    pub plot: &'a PlotArea,
    pub config: &'a PlacementConfig,
    pub alpha: f32,
}

impl Force {
    pub fn apply(self, nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
        match self {
            Force::Collision => collision(nodes, ctx),
            Force::CurveRepulsion => curve_repulsion(nodes, ctx),
            Force::AnchorRepulsion => anchor_repulsion(nodes, ctx),
            Force::SpringToPreferred => spring_to_preferred(nodes, ctx),
            Force::BoundaryClamp => boundary_clamp(nodes, ctx),
        }
    }
}

/// Pairwise separation of overlapping boxes, run for several sub-iterations
/// against provisional positions. Each push moves the pair apart along the
/// line between centers by the distance that would separate them, bounded
/// by the sum of their half-diagonals and split so larger boxes move less.
fn collision(nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
    let cfg = &ctx.config.relaxation;
    let pad = cfg.collision_padding * 0.5;
    let mut centers: Vec<(f32, f32)> = nodes.iter().map(|n| n.center).collect();
    for _ in 0..cfg.collision_iterations {
        let rects: Vec<Rect> = nodes
            .iter()
            .zip(&centers)
            .map(|(node, center)| inflate_rect(rect_around(*center, node.width, node.height), pad))
            .collect();
        let grid = ObstacleGrid::new(ctx.config.candidates.grid_cell, &rects);
        let mut moves = vec![(0.0f32, 0.0f32); nodes.len()];
        let mut any = false;
        for i in 0..nodes.len() {
            for j in grid.query(&rects[i]) {
                if j <= i || overlap_area(&rects[i], &rects[j]) <= 0.0 {
                    continue;
                }
                let dx = centers[j].0 - centers[i].0;
                let dy = centers[j].1 - centers[i].1;
                let len = (dx * dx + dy * dy).sqrt();
                let reach_x = (rects[i].2 + rects[j].2) * 0.5;
                let reach_y = (rects[i].3 + rects[j].3) * 0.5;
                let (ux, uy, needed) = if len <= 1e-4 {
                    (0.0, -nodes[i].escape_sign(), reach_y)
                } else {
                    let ux = dx / len;
                    let uy = dy / len;
                    let tx = if ux.abs() > 1e-6 {
                        (reach_x - dx.abs()) / ux.abs()
                    } else {
                        f32::INFINITY
                    };
                    let ty = if uy.abs() > 1e-6 {
                        (reach_y - dy.abs()) / uy.abs()
                    } else {
                        f32::INFINITY
                    };
                    (ux, uy, tx.min(ty).max(0.0))
                };
                let bound = nodes[i].half_diagonal() + nodes[j].half_diagonal() + pad * 2.0;
                let push = needed.min(bound) * cfg.collision_strength * ctx.alpha;
                let area_i = nodes[i].width * nodes[i].height;
                let area_j = nodes[j].width * nodes[j].height;
                let total = (area_i + area_j).max(1e-6);
                let share_i = area_j / total;
                let share_j = area_i / total;
                moves[i].0 -= ux * push * share_i;
                moves[i].1 -= uy * push * share_i;
                moves[j].0 += ux * push * share_j;
                moves[j].1 += uy * push * share_j;
                any = true;
            }
        }
        if !any {
            break;
        }
        for (center, delta) in centers.iter_mut().zip(&moves) {
            center.0 += delta.0;
            center.1 += delta.1;
        }
    }
    nodes
        .iter()
        .zip(&centers)
        .map(|(node, center)| (center.0 - node.center.0, center.1 - node.center.1))
        .collect()
}

fn curve_repulsion(nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
    let margin = ctx.config.curve_clearance_margin;
    let strength = ctx.config.relaxation.curve_repulsion_strength * ctx.alpha;
    nodes
        .iter()
        .map(|node| {
            let gap = ctx.cache.rect_distance(&node.rect());
            if gap >= margin - CLEARANCE_EPS {
                return (0.0, 0.0);
            }
            let (ux, uy) = ctx
                .cache
                .nearest_point(node.center)
                .and_then(|nearest| unit(node.center.0 - nearest.0, node.center.1 - nearest.1))
                .unwrap_or((0.0, node.escape_sign()));
            let push = (margin - gap) * strength;
            (ux * push, uy * push)
        })
        .collect()
}

fn anchor_repulsion(nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
    let radius = ctx.config.anchor_clearance_radius;
    let strength = ctx.config.relaxation.anchor_repulsion_strength * ctx.alpha;
    if radius <= 0.0 || strength <= 0.0 {
        return vec![(0.0, 0.0); nodes.len()];
    }
    nodes
        .iter()
        .map(|node| {
            let rect = node.rect();
            let mut delta = (0.0f32, 0.0f32);
            for anchor in ctx.markers.near(&rect, radius - CLEARANCE_EPS) {
                let gap = point_rect_distance(anchor, &rect);
                let dx = node.center.0 - anchor.0;
                let dy = node.center.1 - anchor.1;
                let ((ux, uy), depth) = if gap > 0.0 {
                    (unit(dx, dy).unwrap_or((0.0, node.escape_sign())), radius - gap)
                } else {
                    // Marker under the box: leave through the nearest side.
                    let room_x = node.width * 0.5 - dx.abs();
                    let room_y = node.height * 0.5 - dy.abs();
                    if room_y <= room_x {
                        let sy = if dy.abs() > 1e-4 { dy.signum() } else { node.escape_sign() };
                        ((0.0, sy), room_y + radius)
                    } else {
                        ((dx.signum(), 0.0), room_x + radius)
                    }
                };
                delta.0 += ux * depth * strength;
                delta.1 += uy * depth * strength;
            }
            delta
        })
        .collect()
}

fn spring_to_preferred(nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
    let k = ctx.config.relaxation.spring_strength * ctx.alpha;
    nodes
        .iter()
        .map(|node| {
            (
                (node.preferred.0 - node.center.0) * k,
                (node.preferred.1 - node.center.1) * k,
            )
        })
        .collect()
}

fn boundary_clamp(nodes: &[Node], ctx: &ForceContext<'_>) -> Vec<(f32, f32)> {
    nodes
        .iter()
        .map(|node| {
            let clamped = ctx.plot.clamp_center(node.center, node.width, node.height);
            (clamped.0 - node.center.0, clamped.1 - node.center.1)
        })
        .collect()
}

fn unit(dx: f32, dy: f32) -> Option<(f32, f32)> {
    let len = (dx * dx + dy * dy).sqrt();
    (len > 1e-4 && len.is_finite()).then(|| (dx / len, dy / len))
}

/// Sum of pairwise overlap areas between label boxes.
pub fn total_overlap(nodes: &[Node], cell: f32) -> f32 {
    let rects: Vec<Rect> = nodes.iter().map(Node::rect).collect();
    let grid = ObstacleGrid::new(cell, &rects);
    let mut total = 0.0f32;
    for (i, rect) in rects.iter().enumerate() {
        for j in grid.query(rect) {
            if j > i {
                total += overlap_area(rect, &rects[j]);
            }
        }
    }
    total
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelaxReport {
    pub ticks: usize,
    pub converged: bool,
    pub initial_overlap: f32,
    pub final_overlap: f32,
    /// Relaxation ended with more overlap than it started with, so the
    /// starting positions were kept.
    pub reverted: bool,
}

/// Relax the visible boxes' `position`s, starting from their current
/// positions and pulling towards `preferred_position`.
pub fn relax_labels(
    boxes: &mut [LabelBox],
    cache: &CurveSampleCache,
    plot: &PlotArea,
    config: &PlacementConfig,
) -> RelaxReport {
    let members: Vec<usize> = (0..boxes.len()).filter(|&i| boxes[i].visible).collect();
    if members.is_empty() {
        return RelaxReport {
            converged: true,
            ..RelaxReport::default()
        };
    }
    let markers = PointIndex::new(
        boxes.iter().map(|b| b.anchor).collect(),
        config.candidates.grid_cell,
    );
    let mut nodes: Vec<Node> = members
        .iter()
        .map(|&idx| {
            let label = &boxes[idx];
            Node {
                center: label.position,
                width: label.width,
                height: label.height,
                preferred: label.preferred_position,
                side: label.side,
            }
        })
        .collect();
    let start: Vec<(f32, f32)> = nodes.iter().map(|n| n.center).collect();
    let cell = config.candidates.grid_cell;
    let initial_overlap = total_overlap(&nodes, cell);

    let cfg = &config.relaxation;
    let mut alpha = 1.0f32;
    let mut ticks = 0usize;
    let mut converged = false;
    while ticks < cfg.max_ticks {
        let before: Vec<(f32, f32)> = nodes.iter().map(|n| n.center).collect();
        let ctx = ForceContext {
            cache,
            markers: &markers,
            plot,
            config,
            alpha,
        };
        for force in FORCES {
            let deltas = force.apply(&nodes, &ctx);
            for (node, delta) in nodes.iter_mut().zip(deltas) {
                node.center.0 += delta.0;
                node.center.1 += delta.1;
            }
        }
        ticks += 1;
        alpha *= 1.0 - cfg.alpha_decay;
        let max_speed = nodes
            .iter()
            .zip(&before)
            .map(|(node, prev)| distance(node.center, *prev))
            .fold(0.0f32, f32::max);
        if ticks >= cfg.warmup_ticks && max_speed < cfg.convergence_velocity {
            converged = true;
            break;
        }
    }

    let mut final_overlap = total_overlap(&nodes, cell);
    let mut reverted = false;
    if final_overlap > initial_overlap + 1e-3 {
        for (node, origin) in nodes.iter_mut().zip(&start) {
            node.center = *origin;
        }
        final_overlap = initial_overlap;
        reverted = true;
    }
    for (node, &idx) in nodes.iter().zip(&members) {
        boxes[idx].position = plot.clamp_center(node.center, node.width, node.height);
    }

    tracing::debug!(
        labels = members.len(),
        ticks,
        converged,
        initial_overlap,
        final_overlap,
        reverted,
        "relaxation finished"
    );
    RelaxReport {
        ticks,
        converged,
        initial_overlap,
        final_overlap,
        reverted,
    }
}
