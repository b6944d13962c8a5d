// seascan_core/src/binning.rs

use crate::dispatch::{AtomicCountBuffer, AtomicF32Buffer, ComputeContext};
use crate::grid::SonarGrid;
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-bin running intensity sum and hit count, plus a counter of points the
/// coverage filter dropped this tick.
///
/// Zeroed at the start of every tick; valid only during one tick's
/// processing. Concurrent updates to the same bin from different points are
/// unordered but atomic, so the final sums are order-independent.
pub struct BinAccumulator {
    sum: AtomicF32Buffer,
    count: AtomicCountBuffer,
    dropped: AtomicU32,
}

impl BinAccumulator {
    pub fn new(bin_count: usize) -> Self {
        Self {
            sum: AtomicF32Buffer::new(bin_count),
            count: AtomicCountBuffer::new(bin_count),
            dropped: AtomicU32::new(0),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.sum.len()
    }

    /// Do not omit this between ticks: stale sums would leak into the next
    /// profile.
    pub fn reset(&self) {
        self.sum.fill(0.0);
        self.count.zero();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn accumulate(&self, index: usize, intensity: f32) {
        self.sum.add(index, intensity);
        self.count.add_one(index);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sum(&self, index: usize) -> f32 {
        self.sum.load(index)
    }

    pub fn count(&self, index: usize) -> u32 {
        self.count.load(index)
    }

    /// Points excluded by the coverage filter this tick (out of window or
    /// degenerate). Diagnostic only; exclusion itself stays silent.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Host-side readback of both accumulators after the binning dispatch
    /// has completed.
    pub fn snapshot_into(&self, sums: &mut Vec<f32>, counts: &mut Vec<u32>) {
        self.sum.snapshot_into(sums);
        self.count.snapshot_into(counts);
    }
}

/// Scatter-reduce of point intensities into range bins.
///
/// Points whose range falls outside the grid's coverage window are skipped
/// and tallied as dropped. Degenerate points arrive here with range 0 and
/// fall below any positive offset, so they are implicitly dropped too.
pub fn bin_points(
    ctx: &ComputeContext,
    grid: &SonarGrid,
    ranges: &[f32],
    intensities: &[f32],
    bins: &BinAccumulator,
) {
    debug_assert_eq!(ranges.len(), intensities.len());
    debug_assert_eq!(grid.bin_count(), bins.bin_count());

    ctx.for_each(ranges.len(), |i| match grid.bin_index(ranges[i]) {
        Some(index) => bins.accumulate(index, intensities[i]),
        None => bins.record_dropped(),
    });
}
