use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    pub max_label_width_chars: usize,
    /// Skip system font lookup and use the per-character width table.
    pub fast_text_metrics: bool,
    pub padding_x: f32,
    pub padding_y: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "Inter, Helvetica, Arial, sans-serif".to_string(),
            font_size: 11.0,
            line_height: 1.25,
            max_label_width_chars: 18,
            fast_text_metrics: true,
            padding_x: 2.0,
            padding_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurveConfig {
    /// Arc-length distance between cached samples, in render units.
    pub sample_spacing: f32,
    /// Uniform parameter steps used to flatten the curve before resampling.
    pub flatten_steps: usize,
    pub search_iterations: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            sample_spacing: 10.0,
            flatten_steps: 512,
            search_iterations: 24,
        }
    }
}

/// One row of the visibility fraction table: categories with at least
/// `min_size` points show `fraction` of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractionStep {
    pub min_size: usize,
    pub fraction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisibilityConfig {
    pub importance_weights: [f32; 2],
    pub visibility_fraction_table: Vec<FractionStep>,
    /// Fraction used when no table row matches.
    pub default_fraction: f32,
    pub spread_weight: f32,
    /// Visible labels needed before the zig-zag side pattern kicks in.
    pub zigzag_min_visible: usize,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            importance_weights: [0.6, 0.4],
            visibility_fraction_table: vec![
                FractionStep {
                    min_size: 13,
                    fraction: 0.4,
                },
                FractionStep {
                    min_size: 9,
                    fraction: 0.5,
                },
                FractionStep {
                    min_size: 6,
                    fraction: 0.7,
                },
            ],
            default_fraction: 1.0,
            spread_weight: 0.5,
            zigzag_min_visible: 5,
        }
    }
}

impl VisibilityConfig {
    pub fn fraction_for(&self, size: usize) -> f32 {
        self.visibility_fraction_table
            .iter()
            .find(|step| size >= step.min_size)
            .map(|step| step.fraction)
            .unwrap_or(self.default_fraction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandidateConfig {
    /// Extra vertical offsets, in multiples of label height, beyond the
    /// minimum curve clearance.
    pub normal_steps: Vec<f32>,
    /// Horizontal shifts in multiples of label width.
    pub tangent_steps: Vec<f32>,
    pub curve_penalty_weight: f32,
    pub clearance_reward_weight: f32,
    pub anchor_distance_cap: f32,
    pub anchor_distance_weight: f32,
    pub side_bonus: f32,
    pub marker_penalty_weight: f32,
    pub neighborhood_pad: f32,
    pub neighborhood_weight: f32,
    pub grid_cell: f32,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            normal_steps: vec![0.0, 0.5, 1.0, 1.6, 2.4, 3.4, 4.6],
            tangent_steps: vec![0.0, -0.35, 0.35, -0.7, 0.7],
            curve_penalty_weight: 2.0,
            clearance_reward_weight: 0.1,
            anchor_distance_cap: 90.0,
            anchor_distance_weight: 1.0,
            side_bonus: 0.6,
            marker_penalty_weight: 1.2,
            neighborhood_pad: 10.0,
            neighborhood_weight: 0.4,
            grid_cell: 48.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelaxationConfig {
    pub collision_strength: f32,
    pub collision_iterations: usize,
    /// Gap kept between label boxes by the collision force.
    pub collision_padding: f32,
    pub curve_repulsion_strength: f32,
    pub anchor_repulsion_strength: f32,
    pub spring_strength: f32,
    pub max_ticks: usize,
    pub warmup_ticks: usize,
    pub convergence_velocity: f32,
    pub alpha_decay: f32,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            collision_strength: 0.7,
            collision_iterations: 3,
            collision_padding: 1.0,
            curve_repulsion_strength: 0.5,
            anchor_repulsion_strength: 0.5,
            spring_strength: 0.08,
            max_ticks: 150,
            warmup_ticks: 50,
            convergence_velocity: 0.05,
            alpha_decay: 0.0228,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeaderConfig {
    pub leader_line_threshold: f32,
    /// Visual radius of the data marker; leader lines start on its edge.
    pub anchor_radius: f32,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            leader_line_threshold: 24.0,
            anchor_radius: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    pub text: TextConfig,
    pub curve: CurveConfig,
    pub visibility: VisibilityConfig,
    pub candidates: CandidateConfig,
    pub relaxation: RelaxationConfig,
    pub leader: LeaderConfig,
    /// Minimum gap between a label box and the curve.
    pub curve_clearance_margin: f32,
    /// Minimum gap between a label box and any data marker.
    pub anchor_clearance_radius: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            text: TextConfig::default(),
            curve: CurveConfig::default(),
            visibility: VisibilityConfig::default(),
            candidates: CandidateConfig::default(),
            relaxation: RelaxationConfig::default(),
            leader: LeaderConfig::default(),
            curve_clearance_margin: 6.0,
            anchor_clearance_radius: 6.0,
        }
    }
}

impl PlacementConfig {
    /// Clamp out-of-range values so every stage can trust the numbers.
    pub fn sanitized(mut self) -> Self {
        let vis = &mut self.visibility;
        for weight in &mut vis.importance_weights {
            *weight = finite_or(*weight, 0.0).max(0.0);
        }
        for step in &mut vis.visibility_fraction_table {
            step.fraction = clamp_fraction(step.fraction);
        }
        vis.visibility_fraction_table
            .sort_by(|a, b| b.min_size.cmp(&a.min_size));
        vis.default_fraction = clamp_fraction(vis.default_fraction);
        vis.spread_weight = finite_or(vis.spread_weight, 0.0).max(0.0);

        self.curve.sample_spacing = finite_or(self.curve.sample_spacing, 10.0).max(0.5);
        self.curve.flatten_steps = self.curve.flatten_steps.max(2);
        self.curve.search_iterations = self.curve.search_iterations.max(1);

        let text = &mut self.text;
        text.font_size = finite_or(text.font_size, 11.0).max(1.0);
        text.line_height = finite_or(text.line_height, 1.25).max(0.5);
        text.max_label_width_chars = text.max_label_width_chars.max(1);
        text.padding_x = finite_or(text.padding_x, 0.0).max(0.0);
        text.padding_y = finite_or(text.padding_y, 0.0).max(0.0);

        let cand = &mut self.candidates;
        if cand.normal_steps.is_empty() {
            cand.normal_steps.push(0.0);
        }
        if cand.tangent_steps.is_empty() {
            cand.tangent_steps.push(0.0);
        }
        cand.anchor_distance_cap = finite_or(cand.anchor_distance_cap, 90.0).max(1.0);
        cand.grid_cell = finite_or(cand.grid_cell, 48.0).max(16.0);

        let relax = &mut self.relaxation;
        relax.collision_strength = finite_or(relax.collision_strength, 0.0).max(0.0);
        relax.collision_iterations = relax.collision_iterations.max(1);
        relax.collision_padding = finite_or(relax.collision_padding, 0.0).max(0.0);
        relax.curve_repulsion_strength = finite_or(relax.curve_repulsion_strength, 0.0).max(0.0);
        relax.anchor_repulsion_strength =
            finite_or(relax.anchor_repulsion_strength, 0.0).max(0.0);
        relax.spring_strength = finite_or(relax.spring_strength, 0.0).clamp(0.0, 1.0);
        relax.warmup_ticks = relax.warmup_ticks.min(relax.max_ticks);
        relax.convergence_velocity = finite_or(relax.convergence_velocity, 0.05).max(0.0);
        relax.alpha_decay = finite_or(relax.alpha_decay, 0.0228).clamp(0.0, 1.0);

        self.leader.leader_line_threshold =
            finite_or(self.leader.leader_line_threshold, 24.0).max(0.0);
        self.leader.anchor_radius = finite_or(self.leader.anchor_radius, 4.0).max(0.0);
        self.curve_clearance_margin = finite_or(self.curve_clearance_margin, 6.0).max(0.0);
        self.anchor_clearance_radius = finite_or(self.anchor_clearance_radius, 6.0).max(0.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn clamp_fraction(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        1.0
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<PlacementConfig> {
    let Some(path) = path else {
        return Ok(PlacementConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<PlacementConfig> {
    let parsed: PlacementConfig = json5::from_str(contents)?;
    Ok(parsed.sanitized())
}
