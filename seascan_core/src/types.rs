// seascan_core/src/types.rs

use crate::error::SonarError;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic id reserved for background pixels by the upstream renderer.
pub const BACKGROUND_ID: u32 = 0;
/// Semantic id reserved for geometry without a semantic label.
pub const UNLABELLED_ID: u32 = 1;

/// Reflectivity assumed for any semantic class that does not carry an
/// explicit `reflectivity` property.
pub const DEFAULT_REFLECTIVITY: f32 = 1.0;

/// Properties attached to one semantic class in the per-tick label table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelProperties {
    /// Human-readable class name (e.g. "seabed", "BACKGROUND").
    pub class: String,
    /// Acoustic reflectivity coefficient for this material, if assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflectivity: Option<f32>,
}

/// Mapping from semantic-class index to its properties, rebuilt by the host
/// every tick. Entries `0` and `1` are BACKGROUND and UNLABELLED by
/// convention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticLabelTable {
    entries: BTreeMap<u32, LabelProperties>,
}

impl SemanticLabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, properties: LabelProperties) {
        self.entries.insert(id, properties);
    }

    pub fn get(&self, id: u32) -> Option<&LabelProperties> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty table means nothing is in sensor view this tick; the whole
    /// tick is skipped upstream.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materializes the table as a dense id -> reflectivity lookup sized
    /// `max_id + 1`, so the intensity kernel can index it directly.
    ///
    /// Ids without an explicit reflectivity property (including the reserved
    /// BACKGROUND/UNLABELLED slots) receive [`DEFAULT_REFLECTIVITY`].
    pub fn reflectivity_lut_into(&self, out: &mut Vec<f32>) {
        out.clear();
        if let Some(max_id) = self.entries.keys().next_back().copied() {
            out.resize(max_id as usize + 1, DEFAULT_REFLECTIVITY);
            for (id, properties) in &self.entries {
                if let Some(reflectivity) = properties.reflectivity {
                    out[*id as usize] = reflectivity;
                }
            }
        }
    }
}

/// One tick's worth of raw input from the external renderer: parallel arrays
/// of world-space positions, surface normals and semantic ids, plus the
/// world -> sensor-local view transform and the semantic label table.
///
/// Immutable for the duration of one pipeline pass.
#[derive(Debug, Clone)]
pub struct ScanFrame {
    pub positions: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub semantics: Vec<u32>,
    /// 4x4 rigid transform mapping world space to sensor-local space.
    pub view_transform: Matrix4<f32>,
    pub labels: SemanticLabelTable,
}

impl ScanFrame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The three point arrays must agree in length; the host contract allows
    /// N to vary per tick (including zero) but never to disagree.
    pub fn validate(&self) -> Result<(), SonarError> {
        if self.positions.len() != self.normals.len()
            || self.positions.len() != self.semantics.len()
        {
            return Err(SonarError::MismatchedFrame {
                positions: self.positions.len(),
                normals: self.normals.len(),
                semantics: self.semantics.len(),
            });
        }
        Ok(())
    }
}

/// One bin of the final side-scan profile.
///
/// `azimuth` is a placeholder held at zero: the sample keeps the 3-component
/// layout shared with the 2D imaging-sonar variant, where the second slot
/// carries a real angular coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileSample {
    pub range: f32,
    pub azimuth: f32,
    pub intensity: f32,
}
