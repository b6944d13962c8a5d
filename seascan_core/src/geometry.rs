// seascan_core/src/geometry.rs

use crate::dispatch::ComputeContext;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Ranges below this are treated as degenerate raycast results.
pub const MIN_VALID_RANGE: f32 = 1e-3;

/// Sensor-local range of one world-space point under the current view
/// transform.
///
/// Degenerate inputs (NaN world coordinates, NaN/infinite norm, sub-epsilon
/// range) all report range 0, which falls below any positive grid offset and
/// is dropped by the binning bounds check instead of corrupting a bin.
pub fn sensor_local_range(view_transform: &Matrix4<f32>, point: &Point3<f32>) -> f32 {
    if point.x.is_nan() || point.y.is_nan() || point.z.is_nan() {
        return 0.0;
    }

    let homogeneous = view_transform * Vector4::new(point.x, point.y, point.z, 1.0);
    // Local coordinate convention: x is negated after the transform, y/z kept.
    let local = Vector3::new(-homogeneous.x, homogeneous.y, homogeneous.z);

    let range = local.norm();
    if range.is_nan() || range.is_infinite() || range < MIN_VALID_RANGE {
        return 0.0;
    }
    range
}

/// Point-parallel range computation over a whole frame.
pub fn compute_ranges(
    ctx: &ComputeContext,
    view_transform: &Matrix4<f32>,
    positions: &[Point3<f32>],
    out: &mut [f32],
) {
    debug_assert_eq!(positions.len(), out.len());
    ctx.fill(out, |i| sensor_local_range(view_transform, &positions[i]));
}
