// seascan_core/src/compose.rs

//! Normalization and composition of the binned sums into the final profile,
//! plus the noise-free diagnostic average path.

use crate::dispatch::{AtomicF32Buffer, ComputeContext};
use crate::error::SonarError;
use crate::types::ProfileSample;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Guards the division when every bin is empty (max stays at -inf) or the
/// maximum itself is zero.
pub const NORMALIZATION_EPSILON: f32 = 1e-6;

/// How the maximum used for normalization is tracked.
///
/// `All` reduces to a single scalar broadcast to every bin. `Range` sizes the
/// tracking buffer one-per-range-bin, but because the 1D profile is already
/// one value per range bin the reduction degenerates to the same slot-0
/// scalar as `All`. Both literal behaviors are kept; whether `Range` was
/// meant to track a running max across waterfall history is an open question
/// recorded in DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizingMethod {
    All,
    Range,
}

impl NormalizingMethod {
    /// Length of the max-intensity tracking buffer for this method.
    pub fn max_buffer_len(&self, bin_count: usize) -> usize {
        match self {
            NormalizingMethod::All => 1,
            NormalizingMethod::Range => bin_count,
        }
    }
}

impl FromStr for NormalizingMethod {
    type Err = SonarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NormalizingMethod::All),
            "range" => Ok(NormalizingMethod::Range),
            other => Err(SonarError::UnknownNormalizingMethod(other.to_string())),
        }
    }
}

/// Resets the tracking buffer to -inf, then atomic-max reduces the bin sums
/// into slot 0. Must complete before [`compose_profile`] reads the result.
pub fn reduce_max_intensity(
    ctx: &ComputeContext,
    bin_sums: &[f32],
    max_intensity: &AtomicF32Buffer,
) {
    max_intensity.fill(f32::NEG_INFINITY);
    ctx.for_each(bin_sums.len(), |i| max_intensity.max(0, bin_sums[i]));
}

/// Bin-parallel composition of the display profile:
/// normalize by the reduced maximum, apply the near-unity multiplicative
/// speckle, the additive Rayleigh term, offset and gain, clamp to [0, 1] and
/// emit the `(range, 0, intensity)` triple.
#[allow(clippy::too_many_arguments)]
pub fn compose_profile(
    ctx: &ComputeContext,
    bin_ranges: &[f32],
    bin_sums: &[f32],
    max_intensity: &AtomicF32Buffer,
    gaussian_noise: &[f32],
    rayleigh_noise: &[f32],
    offset: f32,
    gain: f32,
    out: &mut [ProfileSample],
) {
    debug_assert_eq!(bin_ranges.len(), out.len());
    debug_assert_eq!(bin_sums.len(), out.len());
    debug_assert_eq!(gaussian_noise.len(), out.len());
    debug_assert_eq!(rayleigh_noise.len(), out.len());

    let max = max_intensity.load(0);
    ctx.fill(out, |i| {
        let mut intensity = bin_sums[i] / (max + NORMALIZATION_EPSILON);
        // Base gain and adjustable margin are layered separately on purpose;
        // do not fold `0.9 + 0.1` into a literal 1.0.
        intensity *= 0.9 + 0.1 + gaussian_noise[i];
        intensity += 0.3 * rayleigh_noise[i];
        intensity += offset;
        intensity *= gain;
        ProfileSample {
            range: bin_ranges[i],
            azimuth: 0.0,
            intensity: intensity.clamp(0.0, 1.0),
        }
    });
}

/// Diagnostic/export path: plain per-bin average `sum / count` with no noise
/// or normalization, 0 for empty bins. Not part of the display pipeline.
pub fn bin_averages(ctx: &ComputeContext, bin_sums: &[f32], bin_counts: &[u32], out: &mut [f32]) {
    debug_assert_eq!(bin_sums.len(), out.len());
    debug_assert_eq!(bin_counts.len(), out.len());
    ctx.fill(out, |i| {
        if bin_counts[i] > 0 {
            bin_sums[i] / bin_counts[i] as f32
        } else {
            0.0
        }
    });
}
