//! Calling throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vartrack::genomics::{
    CoverageManager, Difference, PositionCounterGrid, ReadClass, ReferenceGap, Strand,
    VariantCaller,
};
use vartrack::stats::{CountingDistribution, DistributionKind};
use vartrack::SnpConfig;

fn window(len: u32) -> (Vec<u8>, Vec<Difference>, Vec<ReferenceGap>, CoverageManager) {
    let reference: Vec<u8> = (0..len).map(|idx| b"ACGT"[(idx % 4) as usize]).collect();
    let mut diffs = Vec::new();
    let mut gaps = Vec::new();
    for position in (1..=len).step_by(7) {
        diffs.push(Difference::new(position, b'T', 6).with_qualities(30, 60));
        diffs.push(Difference::new(position, b'-', 2).with_qualities(25, 60));
        if position % 3 == 0 {
            gaps.push(ReferenceGap::new(position, b'A', 0, 5).with_qualities(20, 50));
        }
    }
    let mut coverage = CoverageManager::new(1, len);
    coverage.add_range(1, len, ReadClass::SinglePerfectMatch, Strand::Forward, 20);
    (reference, diffs, gaps, coverage)
}

fn benchmark_calling(c: &mut Criterion) {
    let config = SnpConfig::default();
    let caller = VariantCaller::new(config.clone());
    let mut group = c.benchmark_group("call_window");

    for len in [10_000u32, 100_000] {
        let (reference, diffs, gaps, coverage) = window(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let grid = PositionCounterGrid::build(1, len, &diffs, &gaps, &config);
                black_box(caller.call(1, 1, &grid, &coverage, &reference))
            });
        });
    }
    group.finish();
}

fn benchmark_distribution(c: &mut Criterion) {
    c.bench_function("distribution_insert_100k", |b| {
        b.iter(|| {
            let mut dist = CountingDistribution::new(DistributionKind::ReadLength);
            for value in 0..100_000u32 {
                dist.insert(black_box(value % 20_000));
            }
            black_box(dist.total_count())
        });
    });
}

criterion_group!(benches, benchmark_calling, benchmark_distribution);
criterion_main!(benches);
