//! Binned per-pixel histograms

use crate::config::HistogramConfig;
use crate::types::event_arena::PixelEventArena;
use ndarray::{Array3, ArrayView1};

/// Photon counts and mean collision counts per `(x, y, bin)`.
///
/// `mean_collision[[x, y, k]]` is the mean collision count of the photons in
/// bin `k`, or 0 when the bin is empty. Out-of-range photons are kept in
/// `illegal` with the same pixel layout as the source arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram3D {
    pub counts: Array3<u32>,
    pub mean_collision: Array3<f64>,
    pub illegal: PixelEventArena,
    pub config: HistogramConfig,
}

impl Histogram3D {
    pub fn width(&self) -> usize {
        self.counts.dim().0
    }

    pub fn height(&self) -> usize {
        self.counts.dim().1
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count
    }

    pub fn range_min(&self) -> f64 {
        self.config.range_min
    }

    pub fn range_max(&self) -> f64 {
        self.config.range_max
    }

    pub fn bin_width(&self) -> f64 {
        self.config.bin_width()
    }

    pub fn pixel_counts(&self, x: usize, y: usize) -> ArrayView1<'_, u32> {
        self.counts.slice(ndarray::s![x, y, ..])
    }

    pub fn pixel_mean_collision(&self, x: usize, y: usize) -> ArrayView1<'_, f64> {
        self.mean_collision.slice(ndarray::s![x, y, ..])
    }

    /// Number of photons binned at `(x, y)`.
    pub fn in_range_count(&self, x: usize, y: usize) -> u64 {
        self.pixel_counts(x, y).iter().map(|&c| c as u64).sum()
    }

    pub fn illegal_count(&self) -> usize {
        self.illegal.total_events()
    }
}
