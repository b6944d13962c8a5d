// seascan_sim/src/scene.rs

//! Procedural survey scene: a rippled seabed with a few high-reflectivity
//! targets, sampled into a fresh point cloud every tick. Plays the role the
//! host renderer's annotators play for the real sensor.

use crate::config::SceneConfig;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seascan_core::prelude::*;
use std::f32::consts::TAU;

/// Semantic id assigned to bare seabed points.
pub const SEABED_ID: u32 = 2;
/// Targets occupy consecutive ids starting here.
pub const TARGET_BASE_ID: u32 = 3;

const TICK_MIX: u64 = 0xA076_1D64_78BD_642F;

pub struct SurveyScene {
    config: SceneConfig,
    labels: SemanticLabelTable,
}

impl SurveyScene {
    pub fn new(config: SceneConfig) -> Self {
        let mut labels = SemanticLabelTable::new();
        labels.insert(
            BACKGROUND_ID,
            LabelProperties {
                class: "BACKGROUND".into(),
                reflectivity: None,
            },
        );
        labels.insert(
            UNLABELLED_ID,
            LabelProperties {
                class: "UNLABELLED".into(),
                reflectivity: None,
            },
        );
        labels.insert(
            SEABED_ID,
            LabelProperties {
                class: "seabed".into(),
                reflectivity: Some(config.seabed_reflectivity),
            },
        );
        for (index, target) in config.targets.iter().enumerate() {
            labels.insert(
                TARGET_BASE_ID + index as u32,
                LabelProperties {
                    class: format!("target_{index}"),
                    reflectivity: Some(target.reflectivity),
                },
            );
        }
        Self { config, labels }
    }

    /// Sensor pose at a given tick: towed along +x at constant speed, at the
    /// water surface directly above the track.
    pub fn sensor_pose(&self, tick: u64) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::new(tick as f32 * self.config.tow_speed, 0.0, 0.0),
            UnitQuaternion::identity(),
        )
    }

    /// Samples one tick's point cloud. Deterministic per (seed, tick).
    pub fn frame(&self, tick: u64, seed: u64) -> ScanFrame {
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ tick.wrapping_mul(TICK_MIX));
        let pose = self.sensor_pose(tick);
        let n = self.config.points_per_tick;

        let mut positions = Vec::with_capacity(n);
        let mut normals = Vec::with_capacity(n);
        let mut semantics = Vec::with_capacity(n);

        let cross_min = self.config.swath_offset;
        let cross_max = self.config.swath_offset + self.config.swath_width;

        for _ in 0..n {
            // A thin along-track slice of the swath next to the sensor.
            let along = pose.translation.vector.x + rng.gen_range(-0.25..0.25);
            let cross = rng.gen_range(cross_min..cross_max);

            let phase = cross / self.config.ripple_wavelength * TAU;
            let ripple = self.config.ripple_amplitude * phase.sin();
            let mut z = -self.config.seafloor_depth + ripple;

            // Ripple slope tilts the normal off vertical in the cross-track
            // direction.
            let slope = self.config.ripple_amplitude * TAU / self.config.ripple_wavelength
                * phase.cos();
            let mut normal = Vector3::new(0.0, -slope, 1.0).normalize();

            let mut semantic = SEABED_ID;
            for (index, target) in self.config.targets.iter().enumerate() {
                let da = along - target.along_track;
                let dc = cross - target.cross_track;
                let planar = (da * da + dc * dc).sqrt();
                if planar < target.radius {
                    // Hemispheric bump proud of the seabed.
                    let height = (target.radius * target.radius - planar * planar).sqrt();
                    z += height;
                    normal = Vector3::new(da, dc, height.max(1e-3)).normalize();
                    semantic = TARGET_BASE_ID + index as u32;
                    break;
                }
            }

            positions.push(Point3::new(along, cross, z));
            normals.push(normal);
            semantics.push(semantic);
        }

        ScanFrame {
            positions,
            normals,
            semantics,
            // World -> sensor-local, the inverse of the sensor pose.
            view_transform: pose.inverse().to_homogeneous(),
            labels: self.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use approx::assert_relative_eq;

    #[test]
    fn frames_are_deterministic_per_seed_and_tick() {
        let scene = SurveyScene::new(SceneConfig::default());
        let a = scene.frame(5, 99);
        let b = scene.frame(5, 99);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.semantics, b.semantics);

        let c = scene.frame(6, 99);
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn frame_arrays_agree_in_length() {
        let scene = SurveyScene::new(SceneConfig::default());
        let frame = scene.frame(0, 1);
        assert!(frame.validate().is_ok());
        assert_eq!(frame.len(), SceneConfig::default().points_per_tick);
    }

    #[test]
    fn label_table_covers_every_emitted_semantic_id() {
        let config = SceneConfig::default();
        let scene = SurveyScene::new(config);
        let frame = scene.frame(240, 7); // tick near the first target
        for id in &frame.semantics {
            assert!(frame.labels.get(*id).is_some(), "missing label for id {id}");
        }
    }

    #[test]
    fn seabed_points_sit_near_the_configured_depth() {
        let config = SceneConfig {
            targets: Vec::new(),
            ..SceneConfig::default()
        };
        let depth = config.seafloor_depth;
        let amplitude = config.ripple_amplitude;
        let scene = SurveyScene::new(config);
        let frame = scene.frame(0, 42);
        for position in &frame.positions {
            assert!((position.z + depth).abs() <= amplitude + 1e-5);
        }
    }

    #[test]
    fn normals_stay_unit_length() {
        let scene = SurveyScene::new(SceneConfig::default());
        let frame = scene.frame(3, 11);
        for normal in frame.normals.iter().take(200) {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-5);
        }
    }
}
