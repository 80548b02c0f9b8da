use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sid_core::config::StrategyKind;
use sid_core::frame::{FRAME_DIM, FeatureFrame, FeatureSequence};
use sid_dtw::{Aligner, AlignmentStrategy};

fn synthetic(seed: u64, len: usize) -> FeatureSequence {
    let mut state = seed | 1;
    (0..len)
        .filter_map(|_| {
            let mut coeffs = [0.0; FRAME_DIM];
            for c in &mut coeffs {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                *c = (state % 4000) as f64 / 100.0 - 20.0;
            }
            FeatureFrame::new(coeffs).ok()
        })
        .collect()
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    for len in [200usize, 800] {
        let a = synthetic(7, len);
        let b = synthetic(11, len + len / 10);
        for (kind, width) in [
            (StrategyKind::Exact, None),
            (StrategyKind::Banded, Some(40)),
            (StrategyKind::Beam, Some(40)),
        ] {
            let Ok(strategy) = AlignmentStrategy::from_params(kind, width) else {
                continue;
            };
            let mut aligner = Aligner::with_capacity(b.len());
            group.bench_with_input(BenchmarkId::new(kind.name(), len), &len, |bench, _| {
                bench.iter(|| aligner.align(black_box(&a), black_box(&b), strategy));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
