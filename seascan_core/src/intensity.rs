// seascan_core/src/intensity.rs

use crate::dispatch::ComputeContext;
use crate::types::DEFAULT_REFLECTIVITY;
use nalgebra::{Matrix4, Point3, Vector3};

/// Sensor origin expressed in world coordinates, derived from the
/// world -> sensor view transform as `-R^T * T`.
pub fn sensor_world_position(view_transform: &Matrix4<f32>) -> Point3<f32> {
    let rotation = view_transform.fixed_view::<3, 3>(0, 0);
    let translation = Vector3::new(
        view_transform[(0, 3)],
        view_transform[(1, 3)],
        view_transform[(2, 3)],
    );
    Point3::from(-(rotation.transpose() * translation))
}

/// Acoustic return intensity of a single point:
/// `reflectivity * cos_theta * exp(-attenuation * distance)`.
///
/// `cos_theta` is the dot product of the negated sensor-to-point direction
/// with the surface normal, a Lambertian-like term: surfaces squarely facing
/// the sensor return the most energy.
pub fn point_intensity(
    sensor_position: &Point3<f32>,
    point: &Point3<f32>,
    normal: &Vector3<f32>,
    reflectivity: f32,
    attenuation: f32,
) -> f32 {
    let incidence = point - sensor_position;
    let distance = incidence.norm();
    let unit_direction = incidence.normalize();
    let cos_theta = (-unit_direction).dot(normal);
    reflectivity * cos_theta * (-attenuation * distance).exp()
}

/// Point-parallel intensity computation over a whole frame. No data
/// dependency exists between points.
///
/// Semantic ids beyond the reflectivity LUT fall back to
/// [`DEFAULT_REFLECTIVITY`].
#[allow(clippy::too_many_arguments)]
pub fn compute_intensities(
    ctx: &ComputeContext,
    view_transform: &Matrix4<f32>,
    positions: &[Point3<f32>],
    normals: &[Vector3<f32>],
    semantics: &[u32],
    reflectivity_lut: &[f32],
    attenuation: f32,
    out: &mut [f32],
) {
    debug_assert_eq!(positions.len(), out.len());
    debug_assert_eq!(normals.len(), out.len());
    debug_assert_eq!(semantics.len(), out.len());

    let sensor_position = sensor_world_position(view_transform);
    ctx.fill(out, |i| {
        let reflectivity = reflectivity_lut
            .get(semantics[i] as usize)
            .copied()
            .unwrap_or(DEFAULT_REFLECTIVITY);
        point_intensity(
            &sensor_position,
            &positions[i],
            &normals[i],
            reflectivity,
            attenuation,
        )
    });
}
