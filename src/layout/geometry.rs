// Plain f32 geometry shared by the candidate finder, the force solver and
// the output assembler. Rects are `(x, y, w, h)` with y growing downwards.

use std::collections::{HashMap, HashSet};

pub(crate) type Rect = (f32, f32, f32, f32);

pub(crate) fn rect_around(center: (f32, f32), width: f32, height: f32) -> Rect {
    (
        center.0 - width * 0.5,
        center.1 - height * 0.5,
        width,
        height,
    )
}

pub(crate) fn overlap_area(a: &Rect, b: &Rect) -> f32 {
    let x0 = a.0.max(b.0);
    let y0 = a.1.max(b.1);
    let x1 = (a.0 + a.2).min(b.0 + b.2);
    let y1 = (a.1 + a.3).min(b.1 + b.3);
    (x1 - x0).max(0.0) * (y1 - y0).max(0.0)
}

pub(crate) fn inflate_rect(rect: Rect, pad: f32) -> Rect {
    if pad <= 0.0 {
        return rect;
    }
    (
        rect.0 - pad,
        rect.1 - pad,
        rect.2 + pad * 2.0,
        rect.3 + pad * 2.0,
    )
}

pub(crate) fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

pub(crate) fn point_segment_distance(point: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    distance(point, closest_on_segment(point, a, b))
}

pub(crate) fn closest_on_segment(point: (f32, f32), a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    let vx = b.0 - a.0;
    let vy = b.1 - a.1;
    let len2 = vx * vx + vy * vy;
    if len2 <= 1e-6 {
        return a;
    }
    let t = (((point.0 - a.0) * vx + (point.1 - a.1) * vy) / len2).clamp(0.0, 1.0);
    (a.0 + vx * t, a.1 + vy * t)
}

pub(crate) fn point_rect_distance(point: (f32, f32), rect: &Rect) -> f32 {
    let dx = if point.0 < rect.0 {
        rect.0 - point.0
    } else if point.0 > rect.0 + rect.2 {
        point.0 - (rect.0 + rect.2)
    } else {
        0.0
    };
    let dy = if point.1 < rect.1 {
        rect.1 - point.1
    } else if point.1 > rect.1 + rect.3 {
        point.1 - (rect.1 + rect.3)
    } else {
        0.0
    };
    (dx * dx + dy * dy).sqrt()
}

fn point_inside_rect(point: (f32, f32), rect: &Rect) -> bool {
    point.0 >= rect.0
        && point.0 <= rect.0 + rect.2
        && point.1 >= rect.1
        && point.1 <= rect.1 + rect.3
}

/// Closest point on the rectangle's outline. Points inside the rectangle are
/// projected onto the nearest side.
pub(crate) fn nearest_point_on_rect_boundary(point: (f32, f32), rect: &Rect) -> (f32, f32) {
    let (x0, y0) = (rect.0, rect.1);
    let (x1, y1) = (rect.0 + rect.2, rect.1 + rect.3);
    if !point_inside_rect(point, rect) {
        return (point.0.clamp(x0, x1), point.1.clamp(y0, y1));
    }
    let to_left = point.0 - x0;
    let to_right = x1 - point.0;
    let to_top = point.1 - y0;
    let to_bottom = y1 - point.1;
    let min = to_left.min(to_right).min(to_top).min(to_bottom);
    if min == to_top {
        (point.0, y0)
    } else if min == to_bottom {
        (point.0, y1)
    } else if min == to_left {
        (x0, point.1)
    } else {
        (x1, point.1)
    }
}

fn orientation(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn point_on_segment(point: (f32, f32), a: (f32, f32), b: (f32, f32), eps: f32) -> bool {
    point.0 >= a.0.min(b.0) - eps
        && point.0 <= a.0.max(b.0) + eps
        && point.1 >= a.1.min(b.1) - eps
        && point.1 <= a.1.max(b.1) + eps
}

fn segments_intersect(a: (f32, f32), b: (f32, f32), c: (f32, f32), d: (f32, f32)) -> bool {
    let eps = 1e-6;
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    if o1.abs() <= eps && point_on_segment(c, a, b, eps) {
        return true;
    }
    if o2.abs() <= eps && point_on_segment(d, a, b, eps) {
        return true;
    }
    if o3.abs() <= eps && point_on_segment(a, c, d, eps) {
        return true;
    }
    if o4.abs() <= eps && point_on_segment(b, c, d, eps) {
        return true;
    }
    (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0)
}

fn segment_intersects_rect(a: (f32, f32), b: (f32, f32), rect: &Rect) -> bool {
    if point_inside_rect(a, rect) || point_inside_rect(b, rect) {
        return true;
    }
    let (x0, y0) = (rect.0, rect.1);
    let (x1, y1) = (rect.0 + rect.2, rect.1 + rect.3);
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
}

pub(crate) fn segment_rect_distance(a: (f32, f32), b: (f32, f32), rect: &Rect) -> f32 {
    if segment_intersects_rect(a, b, rect) {
        return 0.0;
    }
    let (x0, y0) = (rect.0, rect.1);
    let (x1, y1) = (rect.0 + rect.2, rect.1 + rect.3);
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    let mut best = point_rect_distance(a, rect).min(point_rect_distance(b, rect));
    for corner in corners {
        best = best.min(point_segment_distance(corner, a, b));
    }
    best
}

/// Uniform grid over rectangles for fast "what could touch this" queries.
pub(crate) struct ObstacleGrid {
    cell: f32,
    /// Maps grid cell (ix, iy) to indices into the caller's rect list.
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl ObstacleGrid {
    pub(crate) fn new(cell: f32, rects: &[Rect]) -> Self {
        let mut grid = Self {
            cell: cell.max(16.0),
            cells: HashMap::new(),
        };
        for (idx, rect) in rects.iter().enumerate() {
            grid.insert(idx, rect);
        }
        grid
    }

    fn cell_span(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            (rect.0 / self.cell).floor() as i32,
            (rect.1 / self.cell).floor() as i32,
            ((rect.0 + rect.2) / self.cell).floor() as i32,
            ((rect.1 + rect.3) / self.cell).floor() as i32,
        )
    }

    pub(crate) fn insert(&mut self, idx: usize, rect: &Rect) {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                self.cells.entry((ix, iy)).or_default().push(idx);
            }
        }
    }

    /// Indices of rects whose cells intersect `rect`, each reported once, in
    /// a deterministic order.
    pub(crate) fn query<'a>(&'a self, rect: &Rect) -> impl Iterator<Item = usize> + use<'a> {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        let mut seen = HashSet::new();
        (x0..=x1)
            .flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
            .flat_map(move |key| {
                self.cells
                    .get(&key)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[])
                    .iter()
                    .copied()
            })
            .filter(move |idx| seen.insert(*idx))
    }
}

/// Data-marker positions indexed for "which markers are near this box".
pub(crate) struct PointIndex {
    points: Vec<(f32, f32)>,
    grid: ObstacleGrid,
}

impl PointIndex {
    pub(crate) fn new(points: Vec<(f32, f32)>, cell: f32) -> Self {
        let rects: Vec<Rect> = points.iter().map(|p| (p.0, p.1, 0.0, 0.0)).collect();
        let grid = ObstacleGrid::new(cell, &rects);
        Self { points, grid }
    }

    /// Points closer than `radius` to `rect`.
    pub(crate) fn near<'a>(
        &'a self,
        rect: &Rect,
        radius: f32,
    ) -> impl Iterator<Item = (f32, f32)> + use<'a> {
        let rect = *rect;
        self.grid
            .query(&inflate_rect(rect, radius))
            .map(move |idx| self.points[idx])
            .filter(move |p| point_rect_distance(*p, &rect) < radius)
    }
}
