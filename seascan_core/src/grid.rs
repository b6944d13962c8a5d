// seascan_core/src/grid.rs

use crate::error::SonarError;

/// The 1D binning geometry of the sonar: minimum range (offset), bin width
/// (resolution) and bin count. Fixed for the sensor's lifetime.
///
/// Invariant: every index returned by [`SonarGrid::bin_index`] satisfies
/// `0 <= idx < bin_count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SonarGrid {
    offset: f32,
    resolution: f32,
    bin_count: usize,
}

impl SonarGrid {
    pub fn new(offset: f32, resolution: f32, bin_count: usize) -> Result<Self, SonarError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(SonarError::InvalidRangeResolution(resolution));
        }
        if bin_count == 0 {
            return Err(SonarError::EmptyGrid);
        }
        Ok(Self {
            offset,
            resolution,
            bin_count,
        })
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Exclusive upper edge of the coverage window.
    pub fn span_end(&self) -> f32 {
        self.offset + self.resolution * self.bin_count as f32
    }

    /// Maps a range to its bin, or `None` when the range falls outside
    /// `[offset, span_end)`. The trailing bound check guards against
    /// floating-point edge cases where the division lands exactly on
    /// `bin_count`.
    pub fn bin_index(&self, range: f32) -> Option<usize> {
        if range < self.offset || range >= self.span_end() {
            return None;
        }
        let index = ((range - self.offset) / self.resolution) as usize;
        if index >= self.bin_count {
            return None;
        }
        Some(index)
    }

    /// The range value at the lower edge of every bin, in bin order. Computed
    /// once at sensor construction and reused by the noise and composition
    /// stages.
    pub fn bin_ranges(&self) -> Vec<f32> {
        (0..self.bin_count)
            .map(|i| self.offset + i as f32 * self.resolution)
            .collect()
    }
}
