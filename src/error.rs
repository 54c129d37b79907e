//! Error types shared across the crate

use crate::types::FailedRecord;
use thiserror::Error;

/// Errors raised while configuring or running a pixelation pass.
///
/// Per-record problems never surface here: malformed records are collected as
/// [`FailedRecord`](crate::types::FailedRecord) entries and processing continues.
#[derive(Debug, Error)]
pub enum PixelationError {
    #[error("degenerate detector geometry: {0}")]
    DegenerateGeometry(String),

    #[error("malformed photon record at index {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    #[error("invalid histogram range [{range_min}, {range_max}] with {bin_count} bins")]
    InvalidHistogramRange {
        range_min: f64,
        range_max: f64,
        bin_count: usize,
    },

    #[error("invalid dead-time configuration: {0}")]
    InvalidDeadTimeConfig(String),

    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl From<FailedRecord> for PixelationError {
    fn from(failed: FailedRecord) -> Self {
        PixelationError::MalformedInput {
            index: failed.index,
            reason: failed.reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PixelationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvalidRecord;

    #[test]
    fn failed_record_becomes_malformed_input() {
        let failed = FailedRecord {
            index: 7,
            reason: InvalidRecord::MissingField("distance"),
        };
        let err = PixelationError::from(failed);
        assert!(matches!(err, PixelationError::MalformedInput { index: 7, .. }));
        assert!(err.to_string().contains("index 7"));
    }
}
