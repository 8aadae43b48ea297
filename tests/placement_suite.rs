use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use curve_labels::config::{PlacementConfig, load_config};
use curve_labels::ir::{ChartBounds, CurveSpec, Insets, LabelSide, Point, Scene};
use curve_labels::layout::{CurveSampleCache, PlacementLayout, PlotArea, compute_placements};
use curve_labels::layout_dump::dump_to_string;
use curve_labels::parser::{SceneError, parse_scene};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_scene(name: &str) -> Scene {
    let input = std::fs::read_to_string(fixture_path(name)).expect("fixture read failed");
    parse_scene(&input).expect("fixture parse failed")
}

fn anchors(scene: &Scene, config: &PlacementConfig) -> Vec<(f32, f32)> {
    let cache = CurveSampleCache::from_spec(&scene.curve, &config.curve);
    scene
        .points
        .iter()
        .map(|p| cache.position_at_x(scene.chart.domain_to_x(p.curve_param)))
        .collect()
}

fn assert_in_bounds(scene: &Scene, layout: &PlacementLayout, fixture: &str) {
    let plot = PlotArea::from_chart(&scene.chart);
    for placement in &layout.placements {
        assert!(
            placement.y >= plot.min_y - 1e-3 && placement.y <= plot.max_y + 1e-3,
            "{fixture}: {} y={} outside [{}, {}]",
            placement.id,
            placement.y,
            plot.min_y,
            plot.max_y
        );
        if placement.visible {
            let rect = (
                placement.x - placement.width * 0.5,
                placement.y - placement.height * 0.5,
                placement.width,
                placement.height,
            );
            assert!(
                plot.contains_rect(&rect),
                "{fixture}: label {} leaves the plot: {rect:?}",
                placement.id
            );
        }
    }
}

#[test]
fn all_fixtures_place_inside_bounds() {
    // Keep this list explicit so new fixtures must be added intentionally.
    for name in [
        "dense_categories.json5",
        "sparse.json5",
        "bezier.json5",
        "degenerate.json5",
    ] {
        let scene = load_scene(name);
        let layout = compute_placements(&scene, &PlacementConfig::default());
        assert_eq!(layout.placements.len(), scene.points.len(), "{name}");
        for (placement, point) in layout.placements.iter().zip(&scene.points) {
            assert_eq!(placement.id, point.id, "{name}: output order");
            assert!(placement.x.is_finite() && placement.y.is_finite());
        }
        assert_in_bounds(&scene, &layout, name);
    }
}

#[test]
fn visible_count_per_category_follows_table() {
    let scene = load_scene("dense_categories.json5");
    let layout = compute_placements(&scene, &PlacementConfig::default());
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (point, placement) in scene.points.iter().zip(&layout.placements) {
        let entry = counts.entry(point.category.as_str()).or_default();
        entry.0 += 1;
        if placement.visible {
            entry.1 += 1;
        }
    }
    let expected = [
        ("alpha", 3, 3),
        ("beta", 7, 5),
        ("gamma", 10, 5),
        ("delta", 20, 8),
        ("epsilon", 40, 16),
    ];
    for (category, size, visible) in expected {
        assert_eq!(counts[category], (size, visible), "category {category}");
    }
    assert_eq!(layout.stats.visible, 37);
    assert_eq!(layout.stats.hidden, 43);
}

#[test]
fn crowded_categories_alternate_sides() {
    let scene = load_scene("dense_categories.json5");
    let layout = compute_placements(&scene, &PlacementConfig::default());
    let mut by_category: BTreeMap<&str, Vec<(f32, LabelSide)>> = BTreeMap::new();
    for (point, placement) in scene.points.iter().zip(&layout.placements) {
        if placement.visible {
            by_category
                .entry(point.category.as_str())
                .or_default()
                .push((point.curve_param, placement.side));
        }
    }
    for (category, mut members) in by_category {
        members.sort_by(|a, b| a.0.total_cmp(&b.0));
        if members.len() >= 5 {
            for (rank, (_, side)) in members.iter().enumerate() {
                let want = if rank % 2 == 0 {
                    LabelSide::Above
                } else {
                    LabelSide::Below
                };
                assert_eq!(*side, want, "{category} rank {rank}");
            }
        } else {
            assert!(members.iter().all(|(_, side)| *side == LabelSide::Auto));
        }
    }
}

#[test]
fn output_is_deterministic() {
    let scene = load_scene("dense_categories.json5");
    let config = PlacementConfig::default();
    let first = compute_placements(&scene, &config);
    let second = compute_placements(&scene, &config);
    assert_eq!(first, second);
    let a = dump_to_string(&first, &scene, false).expect("dump");
    let b = dump_to_string(&second, &scene, false).expect("dump");
    assert_eq!(a, b);
}

#[test]
fn sparse_scene_keeps_preferred_positions() {
    let scene = load_scene("sparse.json5");
    let relaxed = compute_placements(&scene, &PlacementConfig::default());
    let mut frozen = PlacementConfig::default();
    frozen.relaxation.max_ticks = 0;
    let preferred = compute_placements(&scene, &frozen);
    for (a, b) in relaxed.placements.iter().zip(&preferred.placements) {
        assert!((a.x - b.x).abs() < 1e-3, "{}: x moved", a.id);
        assert!((a.y - b.y).abs() < 1e-3, "{}: y moved", a.id);
    }
    assert!(relaxed.stats.converged);
    assert!(!relaxed.stats.reverted);
}

#[test]
fn leader_lines_follow_threshold() {
    let scene = load_scene("sparse.json5");
    let config = PlacementConfig::default();
    let layout = compute_placements(&scene, &config);
    // Sparse labels sit right next to their markers.
    assert!(layout.placements.iter().all(|p| p.leader_line.is_none()));

    let mut tight = PlacementConfig::default();
    tight.leader.leader_line_threshold = 5.0;
    let layout = compute_placements(&scene, &tight);
    let anchors = anchors(&scene, &tight);
    for (placement, anchor) in layout.placements.iter().zip(anchors) {
        let line = placement
            .leader_line
            .expect("offset beyond 5px should draw a leader");
        let start = ((line.x1 - anchor.0).powi(2) + (line.y1 - anchor.1).powi(2)).sqrt();
        assert!((start - tight.leader.anchor_radius).abs() < 1e-3);
        let half_w = placement.width * 0.5 + 1e-3;
        let half_h = placement.height * 0.5 + 1e-3;
        assert!((line.x2 - placement.x).abs() <= half_w);
        assert!((line.y2 - placement.y).abs() <= half_h);
    }
}

#[test]
fn leader_presence_matches_displacement() {
    let scene = load_scene("dense_categories.json5");
    let config = PlacementConfig::default();
    let layout = compute_placements(&scene, &config);
    for (placement, anchor) in layout.placements.iter().zip(anchors(&scene, &config)) {
        if !placement.visible {
            assert!(placement.leader_line.is_none());
            continue;
        }
        let dist = ((placement.x - anchor.0).powi(2) + (placement.y - anchor.1).powi(2)).sqrt();
        assert_eq!(
            placement.leader_line.is_some(),
            dist > config.leader.leader_line_threshold,
            "{} displaced {dist}",
            placement.id
        );
    }
}

fn flat_scene(points: Vec<Point>) -> Scene {
    Scene {
        chart: ChartBounds::new(1000.0, 600.0, [0.0, 100.0]),
        curve: CurveSpec::Polyline {
            points: vec![[16.0, 300.0], [984.0, 300.0]],
        },
        points,
    }
}

#[test]
fn colocated_anchors_terminate_without_extra_overlap() {
    let points: Vec<Point> = (0..50)
        .map(|i| Point::new(format!("p{i}"), 50.0, format!("c{i}")).with_importance(0.5, 0.5))
        .collect();
    let scene = flat_scene(points);
    let config = PlacementConfig::default();
    let layout = compute_placements(&scene, &config);
    assert_eq!(layout.stats.visible, 50);
    assert!(layout.stats.ticks <= config.relaxation.max_ticks);
    assert!(
        layout.stats.final_overlap <= layout.stats.initial_overlap + 1e-3,
        "overlap grew: {:?}",
        layout.stats
    );
    assert_in_bounds(&scene, &layout, "colocated");
}

#[test]
fn uniform_importance_spreads_visible_labels() {
    let points: Vec<Point> = (0..20)
        .map(|i| Point::new(format!("p{i}"), i as f32 * 5.0, "even").with_importance(0.5, 0.5))
        .collect();
    let scene = flat_scene(points);
    let layout = compute_placements(&scene, &PlacementConfig::default());
    let params: Vec<f32> = scene
        .points
        .iter()
        .zip(&layout.placements)
        .filter(|(_, p)| p.visible)
        .map(|(point, _)| point.curve_param)
        .collect();
    assert_eq!(params.len(), 8);
    let min_gap = params
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f32::INFINITY, f32::min);
    // A naive top-8 takes eight consecutive points, 5 apart.
    assert!(min_gap > 5.0, "min gap {min_gap}");
}

#[test]
fn degenerate_curve_still_places_labels() {
    let scene = load_scene("degenerate.json5");
    let layout = compute_placements(&scene, &PlacementConfig::default());
    assert_eq!(layout.curve_samples.len(), 1);
    assert!(layout.placements.iter().all(|p| p.visible));
    assert_in_bounds(&scene, &layout, "degenerate.json5");

    let empty = Scene {
        curve: CurveSpec::Polyline { points: Vec::new() },
        points: vec![Point::new("solo", 0.5, "x")],
        ..Scene::default()
    };
    let layout = compute_placements(&empty, &PlacementConfig::default());
    assert!(layout.curve_samples.is_empty());
    assert_in_bounds(&empty, &layout, "no curve");
}

#[test]
fn empty_scene_yields_empty_output() {
    let scene = parse_scene("{ chart: { width: 300, height: 200 }, points: [] }").expect("parse");
    let layout = compute_placements(&scene, &PlacementConfig::default());
    assert!(layout.placements.is_empty());
    assert_eq!(layout.stats.visible + layout.stats.hidden, 0);
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = parse_scene(
        r#"{ points: [
            { id: "dup", curveParam: 0.1 },
            { id: "other", curveParam: 0.2 },
            { id: "dup", curveParam: 0.3 },
        ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::DuplicateId(ref id) if id == "dup"));
    assert!(err.to_string().contains("dup"));
}

#[test]
fn partial_config_file_keeps_defaults() {
    let path = fixture_path("partial_config.json5");
    let config = load_config(Some(path.as_path())).expect("config loads");
    let defaults = PlacementConfig::default();
    assert_eq!(config.visibility.spread_weight, 0.8);
    assert_eq!(config.relaxation.max_ticks, 90);
    assert_eq!(config.relaxation.spring_strength, 0.12);
    assert_eq!(config.leader.leader_line_threshold, 32.0);
    assert_eq!(config.curve_clearance_margin, 8.0);
    assert_eq!(
        config.visibility.importance_weights,
        defaults.visibility.importance_weights
    );
    assert_eq!(
        config.relaxation.collision_strength,
        defaults.relaxation.collision_strength
    );
    assert_eq!(config.anchor_clearance_radius, defaults.anchor_clearance_radius);
}

#[test]
fn insets_shrink_the_usable_area() {
    let mut scene = load_scene("sparse.json5");
    scene.chart.insets = Insets {
        top: 240.0,
        right: 16.0,
        bottom: 16.0,
        left: 16.0,
    };
    let layout = compute_placements(&scene, &PlacementConfig::default());
    for placement in &layout.placements {
        assert!(placement.y - placement.height * 0.5 >= 240.0 - 1e-3);
    }
}

#[test]
fn place_scene_parses_then_places() {
    let input = std::fs::read_to_string(fixture_path("sparse.json5")).expect("fixture read failed");
    let config = PlacementConfig::default();
    let layout = curve_labels::place_scene(&input, &config).expect("scene places");
    assert_eq!(layout, compute_placements(&load_scene("sparse.json5"), &config));

    let err = curve_labels::place_scene(
        r#"{ points: [{ id: "a", curveParam: 1 }, { id: "a", curveParam: 2 }] }"#,
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::DuplicateId(ref id) if id == "a"));
}
