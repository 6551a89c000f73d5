// SDS Reader Module
// Parallel sample-to-CSV conversion over a statically partitioned buffer

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, SdsError};
use crate::header::{ChannelBlock, MAX_CHANNELS};
use crate::render::RowLayout;
use crate::scaling::ScalingModel;

/// Worker count used when the caller does not choose.
pub const DEFAULT_WORKERS: usize = 8;

/// Threads backing a conversion split into `tasks` ranges: never more than
/// the ranges, nor than the machine's available parallelism.
fn pool_threads(tasks: usize) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    tasks.clamp(1, cores)
}

/// Split `[0, sample_count)` into contiguous ranges, one per worker.
///
/// Every range but the last holds `sample_count / workers` samples; the last
/// one absorbs the remainder. Never returns more ranges than samples, and a
/// worker count of zero is treated as one.
pub fn partition(sample_count: usize, worker_count: usize) -> Vec<Range<usize>> {
    if sample_count == 0 {
        return Vec::new();
    }

    let workers = worker_count.clamp(1, sample_count);
    let chunk = sample_count / workers;

    (0..workers)
        .map(|w| {
            let start = w * chunk;
            let end = if w + 1 == workers {
                sample_count
            } else {
                start + chunk
            };
            start..end
        })
        .collect()
}

/// Render every sample of `blocks` into `out`.
///
/// `out` must be exactly `sample_count * row_width` bytes. It is split into
/// `worker_count` disjoint ranges (see [`partition`]), so row `i` lands at
/// `i * row_width` whatever order the ranges finish in. The ranges run on a
/// pool capped at the available parallelism, so a worker count as large as
/// the sample count does not spawn a thread per range. Returns once all
/// ranges have joined; the first error is returned and `out` must then be
/// discarded.
pub fn convert(
    model: &ScalingModel,
    blocks: &[ChannelBlock<'_>],
    layout: &RowLayout,
    out: &mut [u8],
    worker_count: usize,
) -> Result<()> {
    let row_width = layout.row_width(blocks.len())?;
    let sample_count = blocks[0].samples.len();

    if let Some(block) = blocks.iter().find(|b| b.channel >= MAX_CHANNELS) {
        return Err(SdsError::ChannelIndexOutOfRange(block.channel));
    }

    if let Some(short) = blocks.iter().find(|b| b.samples.len() != sample_count) {
        return Err(SdsError::TruncatedChannelData {
            required: sample_count,
            actual: short.samples.len(),
        });
    }

    let expected = sample_count * row_width;
    if out.len() != expected {
        return Err(SdsError::OutputSizeMismatch {
            expected,
            actual: out.len(),
        });
    }

    let ranges = partition(sample_count, worker_count);
    if ranges.is_empty() {
        return Ok(());
    }

    let mut tasks = Vec::with_capacity(ranges.len());
    let mut rest = out;
    for range in ranges {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * row_width);
        tasks.push((range, chunk));
        rest = tail;
    }

    let threads = pool_threads(tasks.len());
    debug!(
        samples = sample_count,
        row_width,
        tasks = tasks.len(),
        threads,
        "starting conversion"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("sds-convert-{}", i))
        .build()?;

    pool.install(|| {
        tasks
            .into_par_iter()
            .try_for_each(|(range, chunk)| render_range(model, blocks, layout, range, chunk, row_width))
    })
}

fn render_range(
    model: &ScalingModel,
    blocks: &[ChannelBlock<'_>],
    layout: &RowLayout,
    range: Range<usize>,
    chunk: &mut [u8],
    row_width: usize,
) -> Result<()> {
    let mut scratch = [0.0f64; MAX_CHANNELS];
    let values = &mut scratch[..blocks.len()];

    for (index, row) in range.zip(chunk.chunks_exact_mut(row_width)) {
        for (value, block) in values.iter_mut().zip(blocks) {
            *value = model.value(block.channel, block.samples[index]);
        }
        layout.render_row(row, model.timestamp(index), values)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ScalingModel {
        ScalingModel {
            channel_scale: [0.04, 0.0, 0.4, 0.0],
            time_offset: -7e-3,
            time_step: 1e-6,
        }
    }

    fn ramp(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
    }

    fn run(blocks: &[ChannelBlock<'_>], layout: RowLayout, workers: usize) -> Vec<u8> {
        let width = layout.row_width(blocks.len()).unwrap();
        let mut out = vec![0u8; blocks[0].samples.len() * width];
        convert(&model(), blocks, &layout, &mut out, workers).unwrap();
        out
    }

    #[test]
    fn test_partition_covers_range() {
        let ranges = partition(10, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);

        let ranges = partition(16, 8);
        assert_eq!(ranges.len(), 8);
        assert!(ranges.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_partition_edge_cases() {
        assert!(partition(0, 8).is_empty());
        assert_eq!(partition(5, 0), vec![0..5]);
        assert_eq!(partition(3, 8), vec![0..1, 1..2, 2..3]);
        assert_eq!(partition(7, 1), vec![0..7]);
    }

    #[test]
    fn test_partitioning_is_byte_identical() {
        let ch1 = ramp(97, 3);
        let ch3 = ramp(97, 200);
        let blocks = [
            ChannelBlock { channel: 0, samples: &ch1 },
            ChannelBlock { channel: 2, samples: &ch3 },
        ];

        for layout in [RowLayout::default(), RowLayout::Reference] {
            let single = run(&blocks, layout, 1);
            for workers in [2, 3, 8, 50, 97] {
                assert_eq!(run(&blocks, layout, workers), single, "workers = {}", workers);
            }
        }
    }

    #[test]
    fn test_rows_in_index_order() {
        let ch1 = vec![128u8, 153, 103, 128];
        let blocks = [ChannelBlock { channel: 0, samples: &ch1 }];
        let out = run(&blocks, RowLayout::default(), 4);
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "   -0.00699900000,    0.000000");
        assert_eq!(rows[1], "   -0.00699800000,    1.000000");
        assert_eq!(rows[2], "   -0.00699700000,   -1.000000");
    }

    #[test]
    fn test_zero_samples() {
        let empty: [u8; 0] = [];
        let blocks = [ChannelBlock { channel: 0, samples: &empty }];
        let out = run(&blocks, RowLayout::default(), 8);
        assert!(out.is_empty());
    }

    #[test]
    fn test_mismatched_blocks() {
        let a = vec![0u8; 4];
        let b = vec![0u8; 3];
        let blocks = [
            ChannelBlock { channel: 0, samples: &a },
            ChannelBlock { channel: 1, samples: &b },
        ];
        let mut out = vec![0u8; 4 * 44];
        let result = convert(&model(), &blocks, &RowLayout::default(), &mut out, 2);
        assert!(matches!(
            result,
            Err(SdsError::TruncatedChannelData {
                required: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_output_size_mismatch() {
        let a = vec![0u8; 4];
        let blocks = [ChannelBlock { channel: 0, samples: &a }];
        let mut out = vec![0u8; 10];
        let result = convert(&model(), &blocks, &RowLayout::default(), &mut out, 2);
        assert!(matches!(
            result,
            Err(SdsError::OutputSizeMismatch {
                expected: 124,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_no_channels() {
        let mut out = Vec::new();
        let result = convert(&model(), &[], &RowLayout::default(), &mut out, 2);
        assert!(matches!(result, Err(SdsError::ChannelCountUnsupported(0))));
    }

    #[test]
    fn test_worker_count_equal_to_sample_count() {
        let ch1 = ramp(3000, 11);
        let ch2 = ramp(3000, 90);
        let blocks = [
            ChannelBlock { channel: 0, samples: &ch1 },
            ChannelBlock { channel: 2, samples: &ch2 },
        ];

        let single = run(&blocks, RowLayout::default(), 1);
        assert_eq!(run(&blocks, RowLayout::default(), 3000), single);
        assert_eq!(run(&blocks, RowLayout::default(), 100_000), single);
    }

    #[test]
    fn test_pool_threads_capped() {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        assert_eq!(pool_threads(1), 1);
        assert_eq!(pool_threads(0), 1);
        assert_eq!(pool_threads(3000), cores.min(3000));
    }

    #[test]
    fn test_channel_index_out_of_range() {
        let samples = vec![128u8; 8];
        let blocks = [ChannelBlock { channel: MAX_CHANNELS, samples: &samples }];
        let mut out = vec![0u8; 8 * RowLayout::default().row_width(1).unwrap()];
        let result = convert(&model(), &blocks, &RowLayout::default(), &mut out, 2);
        assert!(matches!(result, Err(SdsError::ChannelIndexOutOfRange(4))));
    }

    #[test]
    fn test_worker_error_is_reported() {
        let mut huge = model();
        huge.channel_scale[0] = 1e6;
        let mut samples = vec![128u8; 64];
        samples[50] = 255;
        let blocks = [ChannelBlock { channel: 0, samples: &samples }];
        let layout = RowLayout::default();
        let mut out = vec![0u8; 64 * layout.row_width(1).unwrap()];

        let result = convert(&huge, &blocks, &layout, &mut out, 4);
        assert!(matches!(result, Err(SdsError::RowRenderOverflow { .. })));
    }
}
