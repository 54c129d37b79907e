//! Type definitions for photon records, detector geometry and per-pixel data

pub mod event_arena;
pub mod geometry;
pub mod histogram;
pub mod photon;

// Re-export the main types for convenience
pub use event_arena::PixelEventArena;
pub use geometry::DetectorGeometry;
pub use histogram::Histogram3D;
pub use photon::{FailedRecord, InvalidRecord, PhotonRecord, PixelEvent, RawCollisionRecord};
