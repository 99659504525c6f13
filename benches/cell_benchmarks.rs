use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geocell::geometry::wkt;
use geocell::{
    GeoValue, IntervalCellSet, Region, SpatialCell, SpatialEngine, SpatialPoint, SpatialRect,
};
use std::ops::ControlFlow;

fn benchmark_addressing(c: &mut Criterion) {
    let mut group = c.benchmark_group("addressing");
    let engine = SpatialEngine::default();

    let points: Vec<SpatialPoint> = (0..1_000)
        .map(|i| SpatialPoint::new(-80.0 + (i as f64 * 0.16), -179.0 + (i as f64 * 0.358)))
        .collect();

    group.bench_function("make_cell_1000", |b| {
        b.iter(|| {
            for p in &points {
                black_box(engine.make_cell(black_box(p)));
            }
        })
    });

    let cells: Vec<SpatialCell> = points.iter().map(|p| engine.make_cell(p)).collect();
    group.bench_function("cell_to_spatial_1000", |b| {
        b.iter(|| {
            for cell in &cells {
                black_box(engine.cell_to_spatial(black_box(cell)));
            }
        })
    });

    group.finish();
}

fn benchmark_coverings(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverings");
    let engine = SpatialEngine::default();
    let center = SpatialPoint::new(40.7128, -74.0060);

    for radius in [1_000.0, 50_000.0, 500_000.0] {
        group.bench_with_input(BenchmarkId::new("circle", radius as u64), &radius, |b, &r| {
            let region = Region::circle(center, r);
            b.iter(|| {
                let mut cells: Vec<SpatialCell> = Vec::new();
                engine.cells_covering(black_box(&region), &mut cells).unwrap();
                cells
            })
        });
    }

    for span in [1.0, 10.0, 60.0] {
        group.bench_with_input(BenchmarkId::new("rect", span as u64), &span, |b, &s| {
            let region = Region::Rect(SpatialRect::new(10.0, 10.0, 10.0 + s, 10.0 + s));
            b.iter(|| engine.cover(black_box(&region)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_interval_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_set");

    group.bench_function("insert_10000_scattered", |b| {
        b.iter(|| {
            let mut set = IntervalCellSet::new();
            for i in 0..10_000u32 {
                set.insert(SpatialCell::from_code(i.wrapping_mul(2_654_435_761) >> 8));
            }
            set
        })
    });

    let mut set = IntervalCellSet::new();
    for i in 0..10_000u32 {
        set.insert(SpatialCell::from_code(i * 3));
    }
    group.bench_function("contains_10000", |b| {
        b.iter(|| {
            let mut hits = 0;
            for i in 0..10_000u32 {
                hits += set.contains(&SpatialCell::from_code(black_box(i))) as u32;
            }
            hits
        })
    });

    group.bench_function("for_each_merged", |b| {
        b.iter(|| {
            let mut n = 0u32;
            let _ = set.for_each_merged(|_| {
                n += 1;
                ControlFlow::Continue(())
            });
            n
        })
    });

    group.finish();
}

fn benchmark_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicates");

    let polygon = wkt::parse(
        "POLYGON ((0 0, 20 0, 20 20, 0 20, 0 0), (5 5, 10 5, 10 10, 5 10, 5 5))",
    )
    .unwrap();
    let line = wkt::parse("LINESTRING (0 0, 1 1, 2 0, 3 1, 4 0, 5 1, 6 0, 7 1)").unwrap();
    let p = SpatialPoint::new(2.0, 2.0);

    group.bench_function("multipolygon_contains", |b| {
        b.iter(|| {
            let value = GeoValue::parse(&polygon).unwrap();
            value.st_contains(black_box(&p))
        })
    });

    group.bench_function("linestring_distance", |b| {
        let value = GeoValue::parse(&line).unwrap();
        b.iter(|| value.st_distance(black_box(&p)))
    });

    group.bench_function("polygon_intersects", |b| {
        let value = GeoValue::parse(&polygon).unwrap();
        let rc = SpatialRect::new(1.0, 1.0, 3.0, 3.0);
        b.iter(|| value.st_intersects(black_box(&rc)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_addressing,
    benchmark_coverings,
    benchmark_interval_set,
    benchmark_predicates
);
criterion_main!(benches);
