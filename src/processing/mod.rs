//! Numeric passes over the per-pixel event store

pub mod binning;
pub mod dead_time;
pub mod projection;
pub mod reconstruction;

// Re-export for easier access
pub use binning::{PixelHistogram, bin_pixel, build_histogram};
pub use dead_time::{DeadTimeResult, DeadTimeState, PixelDeadTime, filter_arrivals, filter_pixel, simulate_dead_time};
pub use projection::{ProjectionStats, Rejection, project_photon, project_photons};
pub use reconstruction::{
    collision_mode_depth_image, difference_image, first_argmax, masked_difference_image,
    mean_depth_image, mode_depth, mode_depth_image,
};
