//! Density-adaptive culling: which points get a visible label.
//!
//! Each category shows a fraction of its points chosen from the fraction
//! table by category size. The subset is picked greedily so it is both
//! important and spread out along the curve; plain top-k by importance tends
//! to pile labels onto one stretch of the curve.

use std::collections::BTreeMap;

use crate::config::VisibilityConfig;
use crate::ir::Point;

pub fn composite_importance(point: &Point, weights: [f32; 2]) -> f32 {
    weights[0] * unit(point.importance_a) + weights[1] * unit(point.importance_b)
}

fn unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `max(1, ceil(size * fraction(size)))`, never more than `size`.
pub fn visible_count(size: usize, config: &VisibilityConfig) -> usize {
    if size == 0 {
        return 0;
    }
    // f32 product, so 200 * 0.4 stays 80 after ceil.
    let product = size as f32 * config.fraction_for(size);
    let wanted = (product - product.abs() * 1e-6).ceil().max(1.0) as usize;
    wanted.min(size)
}

/// Per-point visibility flags, indexed like `points`.
pub fn select_visible(points: &[Point], config: &VisibilityConfig) -> Vec<bool> {
    let mut visible = vec![false; points.len()];
    for (category, members) in group_by_category(points) {
        let count = visible_count(members.len(), config);
        if count >= members.len() {
            for &idx in &members {
                visible[idx] = true;
            }
        } else {
            let params: Vec<f32> = members.iter().map(|&i| points[i].curve_param).collect();
            let importance: Vec<f32> = members
                .iter()
                .map(|&i| composite_importance(&points[i], config.importance_weights))
                .collect();
            for local in greedy_spread_selection(&params, &importance, count, config.spread_weight)
            {
                visible[members[local]] = true;
            }
        }
        tracing::debug!(
            category = %category,
            size = members.len(),
            visible = count,
            "category visibility"
        );
    }
    visible
}

pub(crate) fn group_by_category(points: &[Point]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, point) in points.iter().enumerate() {
        groups.entry(point.category.as_str()).or_default().push(idx);
    }
    groups
}

/// Pick `count` indices maximising `importance * (1 + spread * gap)`, where
/// `gap` is the distance to the nearest pick normalised by the category's
/// parameter range and capped at 1. Equal scores prefer the larger gap, then
/// the lower index.
pub(crate) fn greedy_spread_selection(
    params: &[f32],
    importance: &[f32],
    count: usize,
    spread_weight: f32,
) -> Vec<usize> {
    let n = params.len();
    let count = count.min(n);
    let (lo, hi) = params
        .iter()
        .filter(|p| p.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    let width = if hi > lo { hi - lo } else { 0.0 };

    let mut chosen = vec![false; n];
    let mut min_gap = vec![f32::INFINITY; n];
    let mut selected = Vec::with_capacity(count);
    while selected.len() < count {
        let mut best: Option<(usize, f32, f32)> = None;
        for i in 0..n {
            if chosen[i] {
                continue;
            }
            let norm_gap = if selected.is_empty() || width <= f32::EPSILON {
                0.0
            } else {
                (min_gap[i] / width).min(1.0)
            };
            let norm_gap = if norm_gap.is_finite() { norm_gap } else { 0.0 };
            let score = importance[i] * (1.0 + spread_weight * norm_gap);
            let better = match best {
                None => true,
                Some((_, best_score, best_gap)) => {
                    score > best_score || (score == best_score && norm_gap > best_gap)
                }
            };
            if better {
                best = Some((i, score, norm_gap));
            }
        }
        let Some((pick, _, _)) = best else {
            break;
        };
        chosen[pick] = true;
        selected.push(pick);
        for i in 0..n {
            let gap = (params[i] - params[pick]).abs();
            if gap < min_gap[i] {
                min_gap[i] = gap;
            }
        }
    }
    selected
}
