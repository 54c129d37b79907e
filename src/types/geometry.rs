//! Pinhole detector geometry

use crate::error::{PixelationError, Result};
use serde::{Deserialize, Serialize};

/// Read-only sensor-plane layout derived from focal length, field of view and
/// pixel resolution.
///
/// The sensor plane is centred on the optical axis. Pixel `(0, 0)` sits at
/// `(origin_x, origin_y)`, x grows with pixel column and y grows with pixel row.
/// The vertical axis is not flipped and the axes are never swapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
    pub focal_length: f64,
    pub field_of_view_degrees: f64,
    pub resolution_width: usize,
    pub resolution_height: usize,

    pub detector_width: f64,
    pub detector_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub width_resolution: f64,
    pub height_resolution: f64,
}

impl DetectorGeometry {
    pub fn new(
        focal_length: f64,
        field_of_view_degrees: f64,
        resolution_width: usize,
        resolution_height: usize,
    ) -> Result<Self> {
        if resolution_width == 0 || resolution_height == 0 {
            return Err(PixelationError::DegenerateGeometry(format!(
                "resolution must be non-zero, got {}x{}",
                resolution_width, resolution_height
            )));
        }
        if !focal_length.is_finite() || focal_length <= 0.0 {
            return Err(PixelationError::DegenerateGeometry(format!(
                "focal length must be positive and finite, got {}",
                focal_length
            )));
        }
        if !field_of_view_degrees.is_finite()
            || field_of_view_degrees <= 0.0
            || field_of_view_degrees >= 180.0
        {
            return Err(PixelationError::DegenerateGeometry(format!(
                "field of view must lie in (0, 180) degrees, got {}",
                field_of_view_degrees
            )));
        }

        let half_angle = (field_of_view_degrees / 2.0).to_radians();
        let detector_height = focal_length * half_angle.tan() * 2.0;
        let detector_width = detector_height * (resolution_width as f64 / resolution_height as f64);

        Ok(Self {
            focal_length,
            field_of_view_degrees,
            resolution_width,
            resolution_height,
            detector_width,
            detector_height,
            origin_x: -detector_width / 2.0,
            origin_y: -detector_height / 2.0,
            width_resolution: detector_width / resolution_width as f64,
            height_resolution: detector_height / resolution_height as f64,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.resolution_width * self.resolution_height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.resolution_width, self.resolution_height)
    }

    /// Map a sensor-plane point to a pixel, or `None` when it falls off the grid.
    pub fn plane_to_pixel(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let pixel_x = ((x - self.origin_x) / self.width_resolution).floor();
        let pixel_y = ((y - self.origin_y) / self.height_resolution).floor();
        self.checked_pixel(pixel_x, pixel_y)
    }

    /// Bounds-check a pixel address supplied directly by a scanning source.
    pub fn scan_pixel(&self, camera_x: i32, camera_y: i32) -> Option<(usize, usize)> {
        self.checked_pixel(camera_x as f64, camera_y as f64)
    }

    fn checked_pixel(&self, pixel_x: f64, pixel_y: f64) -> Option<(usize, usize)> {
        // NaN fails both comparisons
        if pixel_x >= 0.0
            && pixel_x < self.resolution_width as f64
            && pixel_y >= 0.0
            && pixel_y < self.resolution_height as f64
        {
            Some((pixel_x as usize, pixel_y as usize))
        } else {
            None
        }
    }
}
