use crate::config::TextConfig;
use crate::text_metrics::{FontSpec, TextMeasure};

use super::TextBlock;

/// Wrap and measure one label. The returned block size excludes padding.
pub(crate) fn measure_label(
    text: &str,
    measurer: &dyn TextMeasure,
    config: &TextConfig,
) -> TextBlock {
    let font = FontSpec::new(config.font_family.as_str(), config.font_size);
    let max_width = max_label_width_px(measurer, &font, config.max_label_width_chars);
    let mut lines: Vec<String> = split_lines(text)
        .iter()
        .flat_map(|line| wrap_line(line, max_width, measurer, &font))
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| measurer.measure(line, &font).width)
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font.size * config.line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    text.replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

/// Greedy word wrap. A single word wider than `max_width` keeps its own line.
pub(super) fn wrap_line(
    line: &str,
    max_width: f32,
    measurer: &dyn TextMeasure,
    font: &FontSpec,
) -> Vec<String> {
    if measurer.measure(line, font).width <= max_width {
        return vec![line.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measurer.measure(&candidate, font).width > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn max_label_width_px(measurer: &dyn TextMeasure, font: &FontSpec, max_chars: usize) -> f32 {
    max_chars.max(1) as f32 * measurer.average_char_width(font)
}
