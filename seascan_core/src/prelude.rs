// seascan_core/src/prelude.rs

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::types::{
    LabelProperties, ProfileSample, ScanFrame, SemanticLabelTable, BACKGROUND_ID, UNLABELLED_ID,
};

// --- The Sensor and its Configuration ---
pub use crate::compose::NormalizingMethod;
pub use crate::sensor::{SideScanSonar, SideScanSonarConfig};

// --- Execution & Errors ---
pub use crate::dispatch::ComputeContext;
pub use crate::error::SonarError;
