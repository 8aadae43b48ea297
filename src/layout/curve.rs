//! Parametric curve sources and the arc-length sample cache.
//!
//! Every distance query issued while placing labels goes through
//! [`CurveSampleCache`], which flattens the curve once per cycle and keeps
//! samples at a fixed arc-length spacing. Queries are linear scans over those
//! samples, so their precision is bounded by the spacing.

use crate::config::CurveConfig;
use crate::ir::{BezierSegment, CurveSpec};

use super::geometry::{Rect, closest_on_segment, distance, segment_rect_distance};

/// Returned by distance queries on a curve with no usable length, large
/// enough that every clearance check passes.
pub const DEGENERATE_CURVE_DISTANCE: f32 = 1.0e6;

/// A curve in chart pixel space, parameterised over `t ∈ [0, 1]`.
pub trait Curve {
    fn point_at(&self, t: f32) -> (f32, f32);
}

impl<F> Curve for F
where
    F: Fn(f32) -> (f32, f32),
{
    fn point_at(&self, t: f32) -> (f32, f32) {
        self(t)
    }
}

/// Straight segments through the given points, parameterised by arc length.
#[derive(Debug, Clone)]
pub struct PolylineCurve {
    points: Vec<(f32, f32)>,
    cumulative: Vec<f32>,
}

impl PolylineCurve {
    pub fn new(points: Vec<(f32, f32)>) -> Self {
        let cumulative = cumulative_lengths(&points);
        Self { points, cumulative }
    }
}

impl Curve for PolylineCurve {
    fn point_at(&self, t: f32) -> (f32, f32) {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        interpolate_at_length(&self.points, &self.cumulative, t.clamp(0.0, 1.0) * total)
    }
}

/// Piecewise cubic Bézier; each segment covers an equal share of `t`.
#[derive(Debug, Clone)]
pub struct BezierCurve {
    start: (f32, f32),
    segments: Vec<BezierSegment>,
}

impl BezierCurve {
    pub fn new(start: [f32; 2], segments: Vec<BezierSegment>) -> Self {
        Self {
            start: (start[0], start[1]),
            segments,
        }
    }
}

impl Curve for BezierCurve {
    fn point_at(&self, t: f32) -> (f32, f32) {
        if self.segments.is_empty() {
            return self.start;
        }
        let count = self.segments.len();
        let scaled = t.clamp(0.0, 1.0) * count as f32;
        let idx = (scaled.floor() as usize).min(count - 1);
        let local = scaled - idx as f32;
        let p0 = if idx == 0 {
            self.start
        } else {
            let prev = self.segments[idx - 1].end;
            (prev[0], prev[1])
        };
        let seg = &self.segments[idx];
        cubic_point(
            p0,
            (seg.control1[0], seg.control1[1]),
            (seg.control2[0], seg.control2[1]),
            (seg.end[0], seg.end[1]),
            local,
        )
    }
}

fn cubic_point(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

impl CurveSpec {
    pub fn to_curve(&self) -> Box<dyn Curve> {
        match self {
            CurveSpec::Polyline { points } => Box::new(PolylineCurve::new(
                points.iter().map(|p| (p[0], p[1])).collect(),
            )),
            CurveSpec::Bezier { start, segments } => {
                Box::new(BezierCurve::new(*start, segments.clone()))
            }
        }
    }
}

fn cumulative_lengths(points: &[(f32, f32)]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0f32;
    for (idx, point) in points.iter().enumerate() {
        if idx > 0 {
            total += distance(points[idx - 1], *point);
        }
        out.push(total);
    }
    out
}

fn interpolate_at_length(points: &[(f32, f32)], cumulative: &[f32], length: f32) -> (f32, f32) {
    match points.len() {
        0 => (0.0, 0.0),
        1 => points[0],
        n => {
            let idx = cumulative.partition_point(|s| *s < length).clamp(1, n - 1);
            let (s0, s1) = (cumulative[idx - 1], cumulative[idx]);
            let (a, b) = (points[idx - 1], points[idx]);
            let span = s1 - s0;
            if span <= f32::EPSILON {
                return b;
            }
            let f = ((length - s0) / span).clamp(0.0, 1.0);
            (a.0 + (b.0 - a.0) * f, a.1 + (b.1 - a.1) * f)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub arc_length: f32,
    pub position: (f32, f32),
}

/// Arc-length samples of one curve. Immutable once built.
#[derive(Debug, Clone)]
pub struct CurveSampleCache {
    samples: Vec<CurveSample>,
    positions: Vec<(f32, f32)>,
    lengths: Vec<f32>,
    total_length: f32,
    search_iterations: usize,
}

impl CurveSampleCache {
    pub fn build(curve: &dyn Curve, config: &CurveConfig) -> Self {
        let steps = config.flatten_steps.max(2);
        let flat: Vec<(f32, f32)> = (0..=steps)
            .map(|i| curve.point_at(i as f32 / steps as f32))
            .filter(|p| p.0.is_finite() && p.1.is_finite())
            .collect();
        Self::from_flattened(flat, config)
    }

    fn from_flattened(flat: Vec<(f32, f32)>, config: &CurveConfig) -> Self {
        let flat_lengths = cumulative_lengths(&flat);
        let total_length = flat_lengths.last().copied().unwrap_or(0.0);
        let spacing = config.sample_spacing.max(0.5);

        let mut samples = Vec::new();
        if flat.len() < 2 || total_length <= 1e-3 {
            if let Some(first) = flat.first() {
                samples.push(CurveSample {
                    arc_length: 0.0,
                    position: *first,
                });
            }
        } else {
            let count = (total_length / spacing - 1e-3).ceil().max(1.0) as usize;
            for k in 0..=count {
                let arc_length = (k as f32 * spacing).min(total_length);
                samples.push(CurveSample {
                    arc_length,
                    position: interpolate_at_length(&flat, &flat_lengths, arc_length),
                });
            }
        }

        let positions = samples.iter().map(|s| s.position).collect();
        let lengths = samples.iter().map(|s| s.arc_length).collect();
        Self {
            samples,
            positions,
            lengths,
            total_length: if flat.len() < 2 { 0.0 } else { total_length },
            search_iterations: config.search_iterations.max(1),
        }
    }

    /// An empty polyline yields an empty cache rather than a sample at the
    /// origin.
    pub fn from_spec(spec: &CurveSpec, config: &CurveConfig) -> Self {
        if matches!(spec, CurveSpec::Polyline { points } if points.is_empty()) {
            return Self::from_flattened(Vec::new(), config);
        }
        Self::build(spec.to_curve().as_ref(), config)
    }

    pub fn samples(&self) -> &[CurveSample] {
        &self.samples
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_degenerate(&self) -> bool {
        self.samples.len() < 2 || self.total_length <= 1e-3
    }

    pub fn position_at_length(&self, length: f32) -> (f32, f32) {
        interpolate_at_length(&self.positions, &self.lengths, length)
    }

    /// Curve point whose x matches `target_x`, found by bisecting arc length.
    /// Assumes x is monotonic along the curve; either direction works.
    pub fn position_at_x(&self, target_x: f32) -> (f32, f32) {
        let Some(first) = self.samples.first() else {
            return (target_x, 0.0);
        };
        if self.is_degenerate() {
            return (target_x, first.position.1);
        }
        let last = self.samples[self.samples.len() - 1].position;
        let increasing = last.0 >= first.position.0;
        let mut lo = 0.0f32;
        let mut hi = self.total_length;
        for _ in 0..self.search_iterations {
            let mid = (lo + hi) * 0.5;
            let p = self.position_at_length(mid);
            if (p.0 < target_x) == increasing {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.position_at_length((lo + hi) * 0.5)
    }

    /// Closest point on the sampled polyline, refined on the two segments
    /// around the nearest sample.
    pub fn nearest_point(&self, point: (f32, f32)) -> Option<(f32, f32)> {
        if self.is_degenerate() {
            return None;
        }
        let mut nearest = 0usize;
        let mut best = f32::INFINITY;
        for (idx, sample) in self.positions.iter().enumerate() {
            let dx = sample.0 - point.0;
            let dy = sample.1 - point.1;
            let d2 = dx * dx + dy * dy;
            if d2 < best {
                best = d2;
                nearest = idx;
            }
        }
        let mut out = self.positions[nearest];
        let mut out_dist = best.sqrt();
        let lo = nearest.saturating_sub(1);
        let hi = (nearest + 1).min(self.positions.len() - 1);
        for idx in lo..hi {
            let candidate = closest_on_segment(point, self.positions[idx], self.positions[idx + 1]);
            let d = distance(point, candidate);
            if d < out_dist {
                out = candidate;
                out_dist = d;
            }
        }
        Some(out)
    }

    pub fn distance_to_curve(&self, point: (f32, f32)) -> f32 {
        match self.nearest_point(point) {
            Some(nearest) => distance(point, nearest),
            None => DEGENERATE_CURVE_DISTANCE,
        }
    }

    /// Gap between a rectangle and the sampled curve; zero when they touch.
    pub(crate) fn rect_distance(&self, rect: &Rect) -> f32 {
        if self.is_degenerate() {
            return DEGENERATE_CURVE_DISTANCE;
        }
        let mut best = f32::INFINITY;
        for seg in self.positions.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let gap_x = (rect.0 - a.0.max(b.0))
                .max(a.0.min(b.0) - (rect.0 + rect.2))
                .max(0.0);
            let gap_y = (rect.1 - a.1.max(b.1))
                .max(a.1.min(b.1) - (rect.1 + rect.3))
                .max(0.0);
            if gap_x * gap_x + gap_y * gap_y >= best * best {
                continue;
            }
            best = best.min(segment_rect_distance(a, b, rect));
            if best <= 0.0 {
                return 0.0;
            }
        }
        best
    }
}
