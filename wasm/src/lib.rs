use curve_labels::layout_dump::dump_to_string;
use curve_labels::{PlacementConfig, compute_placements, parse_config, parse_scene};
use wasm_bindgen::prelude::*;

fn place(scene_json: &str, config_json: Option<String>) -> Result<String, String> {
    let config = match config_json.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_config(raw).map_err(|error| error.to_string())?,
        _ => PlacementConfig::default(),
    };
    let scene = parse_scene(scene_json).map_err(|error| error.to_string())?;
    let layout = compute_placements(&scene, &config);
    dump_to_string(&layout, &scene, false).map_err(|error| error.to_string())
}

/// Place labels for a JSON5 scene; returns the placement dump as JSON.
#[wasm_bindgen]
pub fn place_labels(scene_json: &str, config_json: Option<String>) -> Result<String, JsValue> {
    place(scene_json, config_json).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::place;

    #[test]
    fn places_scene_with_partial_config() {
        let scene = r#"{
            chart: { width: 600, height: 300, domain: [0, 10] },
            curve: { type: "polyline", points: [[0, 250], [600, 50]] },
            points: [
                { id: "a", curveParam: 2, category: "x", importanceA: 0.8 },
                { id: "b", curveParam: 7, category: "x", importanceB: 0.3 },
            ],
        }"#;
        let json = place(scene, Some("{ leader: { leaderLineThreshold: 40 } }".to_string()))
            .expect("scene should place");
        assert!(json.contains("\"placements\""));
        assert!(json.contains("\"a\""));
    }

    #[test]
    fn surfaces_parse_errors() {
        let err = place("{ points: [{ id: \"a\", curveParam: 0 }, { id: \"a\", curveParam: 1 }] }", None)
            .unwrap_err();
        assert!(err.contains("duplicate"));
    }
}
