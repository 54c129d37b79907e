//! Time-of-flight detector simulation: photon projection onto a pixel grid,
//! per-pixel arrival histograms, depth reconstruction and dead-time pile-up.

pub mod config;
pub mod detector;
pub mod error;
pub mod parser;
pub mod processing;
#[cfg(feature = "python")]
pub mod python;
pub mod types;
pub mod utils;

pub use config::{DeadTimeConfig, DetectorConfig, HistogramConfig, PipelineConfig, ProjectionMode};
pub use detector::{Detector, PipelineOutput, run_pipeline};
pub use error::{PixelationError, Result};
pub use processing::{DeadTimeResult, ProjectionStats, Rejection};
pub use types::{
    DetectorGeometry, FailedRecord, Histogram3D, InvalidRecord, PhotonRecord, PixelEvent,
    PixelEventArena, RawCollisionRecord,
};
