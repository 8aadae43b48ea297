use serde::{Deserialize, Serialize};

/// One scored data point plotted on the curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    /// Position along the chart's domain axis.
    pub curve_param: f32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub importance_a: f32,
    #[serde(default)]
    pub importance_b: f32,
    #[serde(default)]
    pub label_text: String,
}

impl Point {
    pub fn new(id: impl Into<String>, curve_param: f32, category: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label_text: id.clone(),
            id,
            curve_param,
            category: category.into(),
            importance_a: 0.0,
            importance_b: 0.0,
        }
    }

    pub fn with_importance(mut self, a: f32, b: f32) -> Self {
        self.importance_a = a;
        self.importance_b = b;
        self
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        self.label_text = text.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSide {
    Above,
    Below,
    #[default]
    Auto,
}

impl LabelSide {
    /// Screen-space vertical sign: above is towards smaller y.
    pub fn sign(self) -> f32 {
        match self {
            LabelSide::Above => -1.0,
            LabelSide::Below => 1.0,
            LabelSide::Auto => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BezierSegment {
    pub control1: [f32; 2],
    pub control2: [f32; 2],
    pub end: [f32; 2],
}

/// Curve geometry in chart pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CurveSpec {
    Polyline { points: Vec<[f32; 2]> },
    Bezier {
        start: [f32; 2],
        segments: Vec<BezierSegment>,
    },
}

impl Default for CurveSpec {
    fn default() -> Self {
        CurveSpec::Polyline { points: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Insets {
    fn default() -> Self {
        Self {
            top: 16.0,
            right: 16.0,
            bottom: 16.0,
            left: 16.0,
        }
    }
}

/// Chart pixel dimensions plus the mapping from `curve_param` to x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartBounds {
    pub width: f32,
    pub height: f32,
    pub insets: Insets,
    /// `[min, max]` of `curve_param`, mapped onto the plot's horizontal extent.
    pub domain: [f32; 2],
}

impl Default for ChartBounds {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            insets: Insets::default(),
            domain: [0.0, 1.0],
        }
    }
}

impl ChartBounds {
    pub fn new(width: f32, height: f32, domain: [f32; 2]) -> Self {
        Self {
            width,
            height,
            domain,
            ..Self::default()
        }
    }

    /// Map a domain value onto the plot's horizontal pixel range.
    pub fn domain_to_x(&self, value: f32) -> f32 {
        let left = self.insets.left;
        let right = (self.width - self.insets.right).max(left);
        let span = self.domain[1] - self.domain[0];
        if span.abs() <= f32::EPSILON {
            return (left + right) * 0.5;
        }
        left + (value - self.domain[0]) / span * (right - left)
    }
}

/// Everything a single placement cycle consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub chart: ChartBounds,
    pub curve: CurveSpec,
    pub points: Vec<Point>,
}
