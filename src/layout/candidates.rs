//! Single-pass candidate search for each visible label's preferred position.
//!
//! Labels are handled in descending importance. Every label scores a fixed
//! fan of offsets around its anchor (both half-planes, several heights, a few
//! horizontal shifts) against the curve, the labels placed so far, the data
//! markers and the plot bounds. The winner becomes the label's spring target
//! for relaxation; it does not by itself guarantee a globally overlap-free
//! layout.

use crate::config::PlacementConfig;
use crate::ir::LabelSide;

use super::curve::CurveSampleCache;
use super::geometry::{
    ObstacleGrid, PointIndex, Rect, distance, inflate_rect, overlap_area, rect_around,
};
use super::types::{LabelBox, PlotArea};

/// Extra gap beyond the clearance margin so the first candidate band does not
/// sit exactly on the margin.
const CANDIDATE_CLEARANCE_SLACK: f32 = 1.0;
const SCORE_EPS: f32 = 1e-6;

/// Labels already committed during the pass.
pub(crate) struct PlacedLabels {
    rects: Vec<Rect>,
    grid: ObstacleGrid,
}

impl PlacedLabels {
    pub(crate) fn new(cell: f32) -> Self {
        Self {
            rects: Vec::new(),
            grid: ObstacleGrid::new(cell, &[]),
        }
    }

    pub(crate) fn insert(&mut self, rect: Rect) {
        self.grid.insert(self.rects.len(), &rect);
        self.rects.push(rect);
    }

    pub(crate) fn overlap(&self, rect: &Rect) -> f32 {
        self.grid
            .query(rect)
            .map(|idx| overlap_area(rect, &self.rects[idx]))
            .sum()
    }
}

pub(crate) struct CandidateContext<'a> {
    pub cache: &'a CurveSampleCache,
    pub markers: &'a PointIndex,
    pub plot: &'a PlotArea,
    pub config: &'a PlacementConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CandidateChoice {
    pub center: (f32, f32),
    /// Overlap plus out-of-bounds area; zero for a clean placement.
    pub violation: f32,
    pub score: f32,
}

/// Seed `preferred_position` (and `position`) for every box. Visible boxes
/// are processed by descending `importance`, ties by index; hidden boxes sit
/// on their clamped anchor. Returns how many labels had no clean candidate.
pub fn place_candidates(
    boxes: &mut [LabelBox],
    importance: &[f32],
    cache: &CurveSampleCache,
    plot: &PlotArea,
    config: &PlacementConfig,
) -> usize {
    let markers = PointIndex::new(
        boxes.iter().map(|b| b.anchor).collect(),
        config.candidates.grid_cell,
    );
    let ctx = CandidateContext {
        cache,
        markers: &markers,
        plot,
        config,
    };

    let mut order: Vec<usize> = (0..boxes.len()).filter(|&i| boxes[i].visible).collect();
    order.sort_by(|&a, &b| {
        let ia = importance.get(a).copied().unwrap_or(0.0);
        let ib = importance.get(b).copied().unwrap_or(0.0);
        ib.total_cmp(&ia).then(a.cmp(&b))
    });

    let mut placed = PlacedLabels::new(config.candidates.grid_cell);
    let mut fallbacks = 0usize;
    for idx in order {
        let label = &boxes[idx];
        let choice = find_candidate(label.anchor, label.width, label.height, label.side, &placed, &ctx);
        if choice.violation > 0.0 {
            fallbacks += 1;
        }
        let center = plot.clamp_center(choice.center, label.width, label.height);
        placed.insert(rect_around(center, label.width, label.height));
        let label = &mut boxes[idx];
        label.preferred_position = center;
        label.position = center;
    }
    for label in boxes.iter_mut().filter(|b| !b.visible) {
        let center = plot.clamp_point(label.anchor);
        label.preferred_position = center;
        label.position = center;
    }
    if fallbacks > 0 {
        tracing::debug!(fallbacks, "labels placed without a clean candidate");
    }
    fallbacks
}

/// Best offset around `anchor`. Clean candidates (no overlap with placed
/// labels, fully inside the plot) always beat violating ones; among violating
/// candidates the smallest violation wins.
pub(crate) fn find_candidate(
    anchor: (f32, f32),
    width: f32,
    height: f32,
    side: LabelSide,
    placed: &PlacedLabels,
    ctx: &CandidateContext<'_>,
) -> CandidateChoice {
    let cfg = &ctx.config.candidates;
    let base = height * 0.5 + ctx.config.curve_clearance_margin + CANDIDATE_CLEARANCE_SLACK;
    let signs: [f32; 2] = if side == LabelSide::Below {
        [1.0, -1.0]
    } else {
        [-1.0, 1.0]
    };

    let mut best: Option<CandidateChoice> = None;
    for sign in signs {
        for step in &cfg.normal_steps {
            let dy = sign * (base + step.max(0.0) * height);
            for shift in &cfg.tangent_steps {
                let center = (anchor.0 + shift * width, anchor.1 + dy);
                let choice = score_candidate(center, anchor, width, height, side, sign, placed, ctx);
                if best.is_none_or(|current| candidate_better(&choice, &current)) {
                    best = Some(choice);
                }
            }
        }
    }
    best.unwrap_or(CandidateChoice {
        center: anchor,
        violation: f32::INFINITY,
        score: f32::NEG_INFINITY,
    })
}

#[allow(clippy::too_many_arguments)]
fn score_candidate(
    center: (f32, f32),
    anchor: (f32, f32),
    width: f32,
    height: f32,
    side: LabelSide,
    sign: f32,
    placed: &PlacedLabels,
    ctx: &CandidateContext<'_>,
) -> CandidateChoice {
    let cfg = &ctx.config.candidates;
    let margin = ctx.config.curve_clearance_margin;
    let rect = rect_around(center, width, height);
    let violation = ctx.plot.outside_area(&rect) + placed.overlap(&rect);

    let mut score = 0.0f32;

    let clearance = ctx.cache.rect_distance(&rect);
    if clearance < margin {
        let shortfall = (margin - clearance) / margin.max(1.0);
        score -= cfg.curve_penalty_weight * (1.0 + shortfall);
    } else {
        let spare = (clearance - margin) / height.max(1.0);
        score += cfg.clearance_reward_weight * spare.min(1.0);
    }

    let covered = ctx
        .markers
        .near(&rect, ctx.config.anchor_clearance_radius)
        .count();
    score -= cfg.marker_penalty_weight * covered as f32;

    let neighborhood = inflate_rect(rect, cfg.neighborhood_pad);
    let neighborhood_area = (neighborhood.2 * neighborhood.3).max(1.0);
    let crowding = (placed.overlap(&neighborhood) / neighborhood_area).min(1.0);
    score += cfg.neighborhood_weight * (1.0 - crowding);

    let reach = distance(center, anchor).min(cfg.anchor_distance_cap);
    score += cfg.anchor_distance_weight * (1.0 - reach / cfg.anchor_distance_cap);

    if side != LabelSide::Auto && sign == side.sign() {
        score += cfg.side_bonus;
    }

    CandidateChoice {
        center,
        violation,
        score,
    }
}

fn candidate_better(candidate: &CandidateChoice, best: &CandidateChoice) -> bool {
    if candidate.violation + SCORE_EPS < best.violation {
        return true;
    }
    (candidate.violation - best.violation).abs() <= SCORE_EPS
        && candidate.score > best.score + SCORE_EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveConfig;
    use crate::ir::CurveSpec;
    use crate::layout::types::TextBlock;

    fn flat_cache() -> CurveSampleCache {
        let spec = CurveSpec::Polyline {
            points: vec![[0.0, 200.0], [800.0, 200.0]],
        };
        CurveSampleCache::from_spec(&spec, &CurveConfig::default())
    }

    fn plot() -> PlotArea {
        PlotArea {
            min_x: 0.0,
            max_x: 800.0,
            min_y: 0.0,
            max_y: 400.0,
        }
    }

    fn label(anchor: (f32, f32), side: LabelSide) -> LabelBox {
        LabelBox {
            owner: 0,
            width: 40.0,
            height: 14.0,
            side,
            visible: true,
            anchor,
            position: anchor,
            preferred_position: anchor,
            text: TextBlock::default(),
        }
    }

    fn choose(anchor: (f32, f32), side: LabelSide, placed: &PlacedLabels) -> CandidateChoice {
        let cache = flat_cache();
        let config = PlacementConfig::default();
        let markers = PointIndex::new(vec![anchor], 48.0);
        let plot = plot();
        let ctx = CandidateContext {
            cache: &cache,
            markers: &markers,
            plot: &plot,
            config: &config,
        };
        find_candidate(anchor, 40.0, 14.0, side, placed, &ctx)
    }

    #[test]
    fn candidate_clears_curve_and_stays_close() {
        let choice = choose((400.0, 200.0), LabelSide::Auto, &PlacedLabels::new(48.0));
        assert_eq!(choice.violation, 0.0);
        let gap = (choice.center.1 - 200.0).abs() - 7.0;
        assert!(gap >= 6.0, "label too close to curve: gap {gap}");
        assert!(gap < 20.0, "label drifted too far: gap {gap}");
    }

    #[test]
    fn side_hint_picks_half_plane() {
        let above = choose((400.0, 200.0), LabelSide::Above, &PlacedLabels::new(48.0));
        let below = choose((400.0, 200.0), LabelSide::Below, &PlacedLabels::new(48.0));
        assert!(above.center.1 < 200.0);
        assert!(below.center.1 > 200.0);
    }

    #[test]
    fn occupied_spot_is_avoided() {
        let free = choose((400.0, 200.0), LabelSide::Above, &PlacedLabels::new(48.0));
        let mut placed = PlacedLabels::new(48.0);
        placed.insert(rect_around(free.center, 40.0, 14.0));
        let next = choose((400.0, 200.0), LabelSide::Above, &placed);
        assert_eq!(next.violation, 0.0);
        assert_ne!(next.center, free.center);
        assert_eq!(placed.overlap(&rect_around(next.center, 40.0, 14.0)), 0.0);
    }

    #[test]
    fn anchor_near_top_edge_goes_below() {
        let choice = choose((400.0, 12.0), LabelSide::Above, &PlacedLabels::new(48.0));
        assert_eq!(choice.violation, 0.0);
        assert!(choice.center.1 > 12.0);
    }

    #[test]
    fn place_candidates_seeds_every_box() {
        let cache = flat_cache();
        let config = PlacementConfig::default();
        let mut boxes = vec![
            label((100.0, 200.0), LabelSide::Auto),
            label((105.0, 200.0), LabelSide::Auto),
            label((600.0, 200.0), LabelSide::Auto),
        ];
        boxes[2].visible = false;
        let fallbacks = place_candidates(&mut boxes, &[0.2, 0.9, 0.5], &cache, &plot(), &config);
        assert_eq!(fallbacks, 0);
        let a = rect_around(boxes[0].preferred_position, 40.0, 14.0);
        let b = rect_around(boxes[1].preferred_position, 40.0, 14.0);
        assert_eq!(overlap_area(&a, &b), 0.0);
        assert_eq!(boxes[2].preferred_position, (600.0, 200.0));
        assert!(boxes.iter().all(|b| b.position == b.preferred_position));
    }
}
