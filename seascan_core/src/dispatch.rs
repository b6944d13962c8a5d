// seascan_core/src/dispatch.rs

//! The parallel-dispatch primitive the pipeline stages run on.
//!
//! Each stage is launched over one index per point or per bin, mirroring a
//! GPU kernel grid. A dispatch call returns only after the whole extent has
//! been processed, so the call boundary doubles as the device-wide
//! synchronization barrier between dependent stages: no stage ever reads a
//! buffer a prior stage is still writing.

use crate::error::SonarError;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Explicit execution context for the data-parallel stages.
///
/// Owned by the sensor instance: created at sensor construction, dropped at
/// sensor teardown. There is deliberately no process-wide default pool in
/// this crate.
pub struct ComputeContext {
    pool: rayon::ThreadPool,
}

impl ComputeContext {
    /// Builds a context sized to the machine.
    pub fn new() -> Result<Self, SonarError> {
        Self::with_threads(0)
    }

    /// Builds a context with an explicit worker count. Zero means "let the
    /// pool decide". A single worker yields bit-reproducible float
    /// accumulation, which the determinism tests rely on.
    pub fn with_threads(num_threads: usize) -> Result<Self, SonarError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(Self { pool })
    }

    /// One-output-per-index kernel: fills `out[i] = kernel(i)` for the whole
    /// slice. Returns after every index has been written.
    pub fn fill<T, F>(&self, out: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        self.pool.install(|| {
            out.par_iter_mut()
                .enumerate()
                .for_each(|(i, slot)| *slot = kernel(i));
        });
    }

    /// Scatter kernel: runs `kernel(i)` for every index in the extent.
    /// Writes must go through the atomic accumulator types below.
    pub fn for_each<F>(&self, extent: usize, kernel: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        self.pool
            .install(|| (0..extent).into_par_iter().for_each(kernel));
    }
}

/// A shared `f32` buffer supporting commutative atomic add/max, built on
/// `AtomicU32` bit patterns. This is the scatter-reduce target for the
/// binning and max-reduction stages.
pub struct AtomicF32Buffer {
    bits: Vec<AtomicU32>,
}

impl AtomicF32Buffer {
    pub fn new(len: usize) -> Self {
        Self {
            bits: (0..len).map(|_| AtomicU32::new(0f32.to_bits())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn fill(&self, value: f32) {
        let bits = value.to_bits();
        for cell in &self.bits {
            cell.store(bits, Ordering::Relaxed);
        }
    }

    pub fn load(&self, index: usize) -> f32 {
        f32::from_bits(self.bits[index].load(Ordering::Relaxed))
    }

    /// Atomic `+=`. Concurrent adds to the same index from different points
    /// are unordered; the final sum is order-independent up to float
    /// rounding, which is what licenses the parallel scatter design.
    pub fn add(&self, index: usize, value: f32) {
        let _ = self.bits[index].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + value).to_bits())
        });
    }

    /// Atomic max. Safe against a `NEG_INFINITY` fill.
    pub fn max(&self, index: usize, value: f32) {
        let _ = self.bits[index].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some(f32::from_bits(bits).max(value).to_bits())
        });
    }

    /// Host-side readback of the whole buffer. Only call after the dispatch
    /// writing it has returned.
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(
            self.bits
                .iter()
                .map(|cell| f32::from_bits(cell.load(Ordering::Relaxed))),
        );
    }
}

/// A shared `u32` hit counter per bin, companion to [`AtomicF32Buffer`].
pub struct AtomicCountBuffer {
    counts: Vec<AtomicU32>,
}

impl AtomicCountBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            counts: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn zero(&self) {
        for cell in &self.counts {
            cell.store(0, Ordering::Relaxed);
        }
    }

    pub fn add_one(&self, index: usize) {
        self.counts[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self, index: usize) -> u32 {
        self.counts[index].load(Ordering::Relaxed)
    }

    pub fn snapshot_into(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.counts.iter().map(|cell| cell.load(Ordering::Relaxed)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fill_writes_every_index() {
        let ctx = ComputeContext::new().unwrap();
        let mut out = vec![0usize; 1000];
        ctx.fill(&mut out, |i| i * 2);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, i * 2);
        }
    }

    #[test]
    fn scatter_kernel_may_own_its_captures() {
        let ctx = ComputeContext::new().unwrap();
        let weights: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let expected: f32 = weights.iter().sum();
        let sums = AtomicF32Buffer::new(1);

        // Moves the weight table into the kernel; the dispatch must accept
        // owned captures, not just shared references.
        let target = &sums;
        ctx.for_each(weights.len(), move |i| target.add(0, weights[i]));

        // Integer-valued adds are exact, so the total is order-independent.
        assert_relative_eq!(sums.load(0), expected);
    }

    #[test]
    fn scatter_add_conserves_total() {
        let ctx = ComputeContext::new().unwrap();
        let sums = AtomicF32Buffer::new(4);
        let counts = AtomicCountBuffer::new(4);

        // 10_000 points, each contributing 1.0 into bin i % 4.
        ctx.for_each(10_000, |i| {
            sums.add(i % 4, 1.0);
            counts.add_one(i % 4);
        });

        let mut total_count = 0u32;
        let mut total_sum = 0.0f32;
        for bin in 0..4 {
            total_count += counts.load(bin);
            total_sum += sums.load(bin);
        }
        assert_eq!(total_count, 10_000);
        // Integer-valued adds are exact in f32 at this magnitude.
        assert_relative_eq!(total_sum, 10_000.0);
    }

    #[test]
    fn atomic_max_recovers_from_neg_infinity() {
        let ctx = ComputeContext::new().unwrap();
        let max = AtomicF32Buffer::new(1);
        max.fill(f32::NEG_INFINITY);

        let values = [0.25f32, -3.0, 7.5, 7.25, 0.0];
        ctx.for_each(values.len(), |i| max.max(0, values[i]));

        assert_eq!(max.load(0), 7.5);
    }

    #[test]
    fn snapshot_matches_individual_loads() {
        let sums = AtomicF32Buffer::new(3);
        sums.add(0, 1.5);
        sums.add(2, -2.0);
        let mut host = Vec::new();
        sums.snapshot_into(&mut host);
        assert_eq!(host, vec![1.5, 0.0, -2.0]);
    }
}
