//! Conversion throughput for a four channel capture.
//!
//! Run with: cargo bench --bench convert_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sds_reader::{convert, ChannelBlock, RowLayout, ScalingModel};

const SAMPLES: usize = 1_000_000;

fn channel(seed: u8) -> Vec<u8> {
    (0..SAMPLES)
        .map(|i| (i as u8).wrapping_mul(13).wrapping_add(seed))
        .collect()
}

fn bench_convert(c: &mut Criterion) {
    let data: Vec<Vec<u8>> = (0..4).map(|ch| channel(ch * 50)).collect();
    let blocks: Vec<ChannelBlock<'_>> = data
        .iter()
        .enumerate()
        .map(|(channel, samples)| ChannelBlock { channel, samples })
        .collect();
    let model = ScalingModel {
        channel_scale: [0.02, 0.04, 0.08, 0.002],
        time_offset: -3.5e-5,
        time_step: 2e-9,
    };
    let layout = RowLayout::default();
    let mut out = vec![0u8; SAMPLES * layout.row_width(blocks.len()).unwrap()];

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Elements(SAMPLES as u64));
    group.sample_size(10);
    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| convert(&model, &blocks, &layout, &mut out, workers).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
