use serde::Serialize;

use crate::ir::{ChartBounds, LabelSide};

use super::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// Inner plot rectangle every label must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl PlotArea {
    pub fn from_chart(chart: &ChartBounds) -> Self {
        let min_x = chart.insets.left.max(0.0);
        let min_y = chart.insets.top.max(0.0);
        let max_x = (chart.width - chart.insets.right).max(min_x);
        let max_y = (chart.height - chart.insets.bottom).max(min_y);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn contains_rect(&self, rect: &Rect) -> bool {
        rect.0 >= self.min_x - 1e-3
            && rect.1 >= self.min_y - 1e-3
            && rect.0 + rect.2 <= self.max_x + 1e-3
            && rect.1 + rect.3 <= self.max_y + 1e-3
    }

    /// Area of `rect` that falls outside the plot.
    pub(crate) fn outside_area(&self, rect: &Rect) -> f32 {
        let rect_area = rect.2.max(0.0) * rect.3.max(0.0);
        if rect_area <= 0.0 {
            return 0.0;
        }
        let x0 = rect.0.max(self.min_x);
        let y0 = rect.1.max(self.min_y);
        let x1 = (rect.0 + rect.2).min(self.max_x);
        let y1 = (rect.1 + rect.3).min(self.max_y);
        rect_area - (x1 - x0).max(0.0) * (y1 - y0).max(0.0)
    }

    /// Clamp a box center so the whole box fits; boxes larger than the plot
    /// are centered on it.
    pub fn clamp_center(&self, center: (f32, f32), width: f32, height: f32) -> (f32, f32) {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        let x = if self.max_x - self.min_x < width {
            (self.min_x + self.max_x) * 0.5
        } else {
            center.0.clamp(self.min_x + half_w, self.max_x - half_w)
        };
        let y = if self.max_y - self.min_y < height {
            (self.min_y + self.max_y) * 0.5
        } else {
            center.1.clamp(self.min_y + half_h, self.max_y - half_h)
        };
        (finite_or(x, self.min_x), finite_or(y, self.min_y))
    }

    pub fn clamp_point(&self, point: (f32, f32)) -> (f32, f32) {
        (
            finite_or(point.0, self.min_x).clamp(self.min_x, self.max_x),
            finite_or(point.1, self.min_y).clamp(self.min_y, self.max_y),
        )
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Footprint of one wrapped label. Boxes live in a `Vec` indexed exactly
/// like the input points, so `owner` always equals the box's own index.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBox {
    pub owner: usize,
    /// Box size including padding.
    pub width: f32,
    pub height: f32,
    pub side: LabelSide,
    pub visible: bool,
    pub anchor: (f32, f32),
    pub position: (f32, f32),
    pub preferred_position: (f32, f32),
    pub text: TextBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeaderLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Final, render-ready result for one input point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub leader_line: Option<LeaderLine>,
    pub wrapped_lines: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub side: LabelSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutStats {
    pub visible: usize,
    pub hidden: usize,
    pub ticks: usize,
    pub converged: bool,
    pub initial_overlap: f32,
    pub final_overlap: f32,
    pub reverted: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacementLayout {
    pub placements: Vec<Placement>,
    pub stats: LayoutStats,
    /// Cached curve samples, handy for drawing the curve itself.
    pub curve_samples: Vec<(f32, f32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot() -> PlotArea {
        PlotArea {
            min_x: 0.0,
            max_x: 100.0,
            min_y: 10.0,
            max_y: 90.0,
        }
    }

    #[test]
    fn clamp_center_keeps_box_inside() {
        let (x, y) = plot().clamp_center((2.0, 5.0), 20.0, 10.0);
        assert_eq!((x, y), (10.0, 15.0));
        let (x, y) = plot().clamp_center((50.0, 50.0), 20.0, 10.0);
        assert_eq!((x, y), (50.0, 50.0));
    }

    #[test]
    fn oversized_box_is_centered() {
        let (_, y) = plot().clamp_center((50.0, 0.0), 20.0, 500.0);
        assert_eq!(y, 50.0);
    }

    #[test]
    fn outside_area_counts_overhang() {
        assert_eq!(plot().outside_area(&(90.0, 20.0, 20.0, 10.0)), 100.0);
        assert_eq!(plot().outside_area(&(20.0, 20.0, 20.0, 10.0)), 0.0);
    }
}
