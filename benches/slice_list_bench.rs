// In benches/slice_list_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use slicer::config::{DatasetDescriptor, SlicerConfig};
use slicer::pattern::PatternSet;
use slicer::schedule::{plan_slice_lists, DatasetPlan, Direction};
use slicer::slicing::{global_grid, group, GroupDim, PadMode, PaddingSpec, Topology};

// --- Benchmark Datasets ---

/// A 4-D scan: 1800 projections of 2k x 2k pixels at 16 scan positions.
fn large_scan_plan(padding: bool) -> DatasetPlan {
    let dataset = DatasetDescriptor::new(&[1800, 2048, 2048, 16], PatternSet::tomography_4d());
    let mut config = SlicerConfig::new("SINOGRAM").with_max_frames(64, 8);
    if padding {
        config = config.with_padding(PaddingSpec::new(PadMode::Edge).pad(1, 4, 4));
    }
    DatasetPlan::new(&dataset, &config).unwrap()
}

// --- Benchmark Suite ---

fn bench_slice_lists(c: &mut Criterion) {
    let plan = large_scan_plan(false);
    let padded_plan = large_scan_plan(true);
    let grid = global_grid(&plan.class, &plan.window).unwrap();
    let primary = GroupDim {
        dim: plan.class.slice_dims[0],
        length: grid.lengths[0],
        step: 1,
    };

    let mut group_bench = c.benchmark_group("Slice List Construction");
    group_bench.throughput(criterion::Throughput::Elements(grid.slices.len() as u64));

    group_bench.bench_function("Global grid (2048 x 16 frames)", |b| {
        b.iter(|| black_box(global_grid(black_box(&plan.class), black_box(&plan.window))))
    });
    group_bench.bench_function("Group primary dim by 64", |b| {
        b.iter(|| black_box(group(black_box(&grid.slices), 64, &[primary])))
    });
    group_bench.bench_function("Full plan, input, rank 3 of 16", |b| {
        b.iter(|| {
            black_box(plan_slice_lists(
                Direction::In,
                black_box(&plan),
                Topology { rank: 3, world_size: 16 },
            ))
        })
    });
    group_bench.bench_function("Full plan, padded input, rank 3 of 16", |b| {
        b.iter(|| {
            black_box(plan_slice_lists(
                Direction::In,
                black_box(&padded_plan),
                Topology { rank: 3, world_size: 16 },
            ))
        })
    });

    group_bench.finish();
}

criterion_group!(benches, bench_slice_lists);
criterion_main!(benches);
