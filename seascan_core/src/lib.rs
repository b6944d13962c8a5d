// seascan_core/src/lib.rs

// This file defines the public modules of the library.
pub mod binning;
pub mod compose;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod intensity;
pub mod noise;
pub mod prelude;
pub mod sensor;
pub mod types;
pub mod waterfall;
