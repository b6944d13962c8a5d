// seascan_core/src/noise.rs

//! Per-bin noise fields, regenerated every tick from the frame counter.
//!
//! Each bin owns an independent RNG stream derived from (seed, field, bin),
//! so the fields are deterministic given the seed and independent across
//! bins regardless of how the dispatch schedules them.

use crate::dispatch::ComputeContext;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// Empirically tuned range falloff for the Rayleigh field. Deliberately much
/// flatter than a physical quadratic range law; earlier revisions used 1.0
/// and 2.0 before settling here.
pub const RANGE_FALLOFF_EXPONENT: f32 = 0.3;

const GAUSSIAN_STREAM: u64 = 0x6A09_E667_F3BC_C909;
const RAYLEIGH_STREAM: u64 = 0xBB67_AE85_84CA_A73B;
const BIN_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

fn bin_rng(seed: u64, stream: u64, bin: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ stream ^ (bin as u64).wrapping_mul(BIN_MIX))
}

/// Fills `out` with one Gaussian sample per bin, used as the multiplicative
/// speckle perturbation.
pub fn gaussian_field(ctx: &ComputeContext, seed: u64, dist: &Normal<f32>, out: &mut [f32]) {
    ctx.fill(out, |i| dist.sample(&mut bin_rng(seed, GAUSSIAN_STREAM, i)));
}

/// Fills `out` with the additive range-dependent Rayleigh field.
///
/// Per bin: draw two standard normals, take `scale * sqrt(n1^2 + n2^2)` (the
/// classical Rayleigh construction as the norm of a 2D Gaussian vector), then
/// scale by `(range / max_range) ^ 0.3`.
///
/// The central-peak/central-std streak parameters of the 2D imaging variant
/// do not enter this formula; see `SideScanSonarConfig` for how they are
/// carried.
pub fn range_rayleigh_field(
    ctx: &ComputeContext,
    seed: u64,
    bin_ranges: &[f32],
    max_range: f32,
    scale: f32,
    out: &mut [f32],
) {
    debug_assert_eq!(bin_ranges.len(), out.len());
    ctx.fill(out, |i| {
        let mut rng = bin_rng(seed, RAYLEIGH_STREAM, i);
        let n1: f32 = rng.sample(StandardNormal);
        let n2: f32 = rng.sample(StandardNormal);
        let rayleigh = scale * (n1 * n1 + n2 * n2).sqrt();
        (bin_ranges[i] / max_range).powf(RANGE_FALLOFF_EXPONENT) * rayleigh
    });
}
