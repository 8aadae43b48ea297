use std::collections::HashSet;

use thiserror::Error;

use crate::ir::{CurveSpec, Scene};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene document: {0}")]
    Syntax(#[from] json5::Error),
    #[error("duplicate point id `{0}`")]
    DuplicateId(String),
    #[error("non-finite value in {0}")]
    NonFinite(String),
    #[error("curve domain [{min}, {max}] is empty or inverted")]
    InvalidDomain { min: f32, max: f32 },
    #[error("chart dimensions must be positive, got {width}x{height}")]
    InvalidChartSize { width: f32, height: f32 },
}

/// Parse a JSON5 scene document and validate it.
pub fn parse_scene(input: &str) -> Result<Scene, SceneError> {
    let mut scene: Scene = json5::from_str(input)?;
    for point in &mut scene.points {
        if point.label_text.trim().is_empty() {
            point.label_text = point.id.clone();
        }
    }
    validate_scene(&scene)?;
    Ok(scene)
}

pub fn validate_scene(scene: &Scene) -> Result<(), SceneError> {
    let chart = &scene.chart;
    if !chart.width.is_finite() || !chart.height.is_finite() {
        return Err(SceneError::NonFinite("chart size".to_string()));
    }
    if chart.width <= 0.0 || chart.height <= 0.0 {
        return Err(SceneError::InvalidChartSize {
            width: chart.width,
            height: chart.height,
        });
    }
    let insets = &chart.insets;
    if [insets.top, insets.right, insets.bottom, insets.left]
        .iter()
        .any(|v| !v.is_finite())
    {
        return Err(SceneError::NonFinite("chart insets".to_string()));
    }
    let [min, max] = chart.domain;
    if !min.is_finite() || !max.is_finite() {
        return Err(SceneError::NonFinite("chart domain".to_string()));
    }
    if max <= min {
        return Err(SceneError::InvalidDomain { min, max });
    }

    let curve_finite = match &scene.curve {
        CurveSpec::Polyline { points } => points.iter().flatten().all(|v| v.is_finite()),
        CurveSpec::Bezier { start, segments } => {
            start.iter().all(|v| v.is_finite())
                && segments.iter().all(|seg| {
                    seg.control1
                        .iter()
                        .chain(&seg.control2)
                        .chain(&seg.end)
                        .all(|v| v.is_finite())
                })
        }
    };
    if !curve_finite {
        return Err(SceneError::NonFinite("curve".to_string()));
    }

    let mut seen = HashSet::new();
    for point in &scene.points {
        if !seen.insert(point.id.as_str()) {
            return Err(SceneError::DuplicateId(point.id.clone()));
        }
        if !point.curve_param.is_finite()
            || !point.importance_a.is_finite()
            || !point.importance_b.is_finite()
        {
            return Err(SceneError::NonFinite(format!("point `{}`", point.id)));
        }
    }
    Ok(())
}
