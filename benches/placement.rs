use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use curve_labels::config::PlacementConfig;
use curve_labels::ir::{BezierSegment, ChartBounds, CurveSpec, Point, Scene};
use curve_labels::layout::{CurveSampleCache, compute_placements, select_visible};
use curve_labels::place_scene;
use std::hint::black_box;

/// S-shaped curve across a 1200x800 chart with `per_category` points in each
/// of `categories` categories, importance varied deterministically.
fn dense_scene(categories: usize, per_category: usize) -> Scene {
    let chart = ChartBounds::new(1200.0, 800.0, [0.0, 100.0]);
    let curve = CurveSpec::Bezier {
        start: [16.0, 760.0],
        segments: vec![BezierSegment {
            control1: [500.0, 760.0],
            control2: [700.0, 40.0],
            end: [1184.0, 40.0],
        }],
    };
    let mut points = Vec::with_capacity(categories * per_category);
    for c in 0..categories {
        for i in 0..per_category {
            let param = (i as f32 + c as f32 * 0.37) * 100.0 / per_category as f32;
            let a = ((i * 7 + c * 3) % 11) as f32 / 10.0;
            let b = ((i * 5 + c) % 7) as f32 / 6.0;
            points.push(
                Point::new(format!("c{c}-p{i}"), param.min(100.0), format!("cat{c}"))
                    .with_importance(a, b)
                    .with_label(format!("Label {c}.{i}")),
            );
        }
    }
    Scene {
        chart,
        curve,
        points,
    }
}

fn bench_curve_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("curve_cache");
    let config = PlacementConfig::default();
    let scene = dense_scene(1, 1);
    group.bench_function("build_bezier", |b| {
        b.iter(|| {
            let cache = CurveSampleCache::from_spec(black_box(&scene.curve), &config.curve);
            black_box(cache.samples().len());
        });
    });
    let cache = CurveSampleCache::from_spec(&scene.curve, &config.curve);
    group.bench_function("position_at_x", |b| {
        b.iter(|| {
            for x in (0..1200).step_by(25) {
                black_box(cache.position_at_x(black_box(x as f32)));
            }
        });
    });
    group.finish();
}

fn bench_visibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility");
    let config = PlacementConfig::default();
    for (categories, per_category) in [(1, 20), (4, 50), (8, 200)] {
        let scene = dense_scene(categories, per_category);
        let name = format!("{categories}x{per_category}");
        group.bench_with_input(BenchmarkId::from_parameter(name), &scene.points, |b, points| {
            b.iter(|| black_box(select_visible(black_box(points), &config.visibility)));
        });
    }
    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    group.sample_size(20);
    let config = PlacementConfig::default();
    for (categories, per_category) in [(1, 10), (3, 40), (6, 100), (10, 200)] {
        let scene = dense_scene(categories, per_category);
        let name = format!("{categories}x{per_category}");
        group.bench_with_input(BenchmarkId::from_parameter(name), &scene, |b, scene| {
            b.iter(|| {
                let layout = compute_placements(black_box(scene), &config);
                black_box(layout.placements.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = PlacementConfig::default();
    let input = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/dense_categories.json5"
    ));
    group.bench_function("dense_categories", |b| {
        b.iter(|| {
            let layout = place_scene(black_box(input), &config).expect("fixture parses");
            black_box(layout.stats.visible);
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_curve_cache, bench_visibility, bench_placement, bench_end_to_end
);
criterion_main!(benches);
