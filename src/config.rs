//! Serializable configuration for the detector, binning and dead-time passes

use crate::error::{PixelationError, Result};
use crate::types::DetectorGeometry;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Speed of light in m/s used for distance to arrival-time conversion.
pub const SPEED_OF_LIGHT: f64 = 3.0e8;

/// Nominal pulse-train count of a real acquisition. Kept as the literal
/// `10 x 10^5` the pulse cadence was calibrated with.
pub const DEFAULT_PULSE_TRAIN_COUNT: f64 = 10.0 * 1e5;

/// How a photon record is mapped to a pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Flash lidar: intersect the ray with the sensor plane behind a pinhole.
    #[default]
    Pinhole,
    /// Scanning lidar: the record carries its pixel address.
    Scan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DetectorConfig {
    #[builder(default = 0.01)]
    pub focal_length: f64,
    #[builder(default = 50.0)]
    pub field_of_view_degrees: f64,
    #[builder(default = 500)]
    pub resolution_width: usize,
    #[builder(default = 500)]
    pub resolution_height: usize,
    #[builder(default)]
    pub projection_mode: ProjectionMode,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DetectorConfig {
    pub fn geometry(&self) -> Result<DetectorGeometry> {
        DetectorGeometry::new(
            self.focal_length,
            self.field_of_view_degrees,
            self.resolution_width,
            self.resolution_height,
        )
    }
}

/// Distance window and bin count used to re-bin each pixel's events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct HistogramConfig {
    #[builder(default = 1000.0)]
    pub range_min: f64,
    #[builder(default = 2500.0)]
    pub range_max: f64,
    #[builder(default = 25)]
    pub bin_count: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bin_count == 0
            || !self.range_min.is_finite()
            || !self.range_max.is_finite()
            || self.range_min >= self.range_max
        {
            return Err(PixelationError::InvalidHistogramRange {
                range_min: self.range_min,
                range_max: self.range_max,
                bin_count: self.bin_count,
            });
        }
        Ok(())
    }

    pub fn bin_width(&self) -> f64 {
        (self.range_max - self.range_min) / self.bin_count as f64
    }

    /// Centre distance of bin `index`.
    pub fn bin_center(&self, index: usize) -> f64 {
        self.range_min + (index as f64 + 0.5) * self.bin_width()
    }

    /// Bin for an in-range distance, `None` when the distance lies outside
    /// `[range_min, range_max]`.
    pub fn bin_index(&self, distance: f64) -> Option<usize> {
        if !(self.range_min..=self.range_max).contains(&distance) {
            return None;
        }
        let raw = ((distance - self.range_min) / self.bin_width()).floor();
        // range_max itself lands one past the last bin
        Some((raw.max(0.0) as usize).min(self.bin_count - 1))
    }
}

/// Parameters of the paralyzable dead-time model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DeadTimeConfig {
    /// Expected true photon count of the real acquisition.
    #[builder(default = 1.0)]
    pub real_photon_count: f64,
    /// Nominal number of laser pulses in the real acquisition.
    #[builder(default = DEFAULT_PULSE_TRAIN_COUNT)]
    pub pulse_train_count: f64,
    /// Photons present in the simulated dataset. When absent the total event
    /// count of the arena being filtered is used.
    pub simulated_photon_count: Option<u64>,
    /// Blind window after an accepted detection, in picoseconds.
    #[builder(default = 0.0)]
    pub dead_time_ps: f64,
    #[builder(default = SPEED_OF_LIGHT)]
    pub speed_of_light: f64,
}

impl Default for DeadTimeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DeadTimeConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.real_photon_count > 0.0, "real_photon_count must be positive"),
            (self.pulse_train_count > 0.0, "pulse_train_count must be positive"),
            (self.dead_time_ps >= 0.0, "dead_time_ps must not be negative"),
            (self.speed_of_light > 0.0, "speed_of_light must be positive"),
        ];
        for (ok, message) in checks {
            if !ok {
                return Err(PixelationError::InvalidDeadTimeConfig(message.to_string()));
            }
        }
        if !(self.real_photon_count.is_finite()
            && self.pulse_train_count.is_finite()
            && self.dead_time_ps.is_finite()
            && self.speed_of_light.is_finite())
        {
            return Err(PixelationError::InvalidDeadTimeConfig(
                "parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// `max(1, round(simulated / real * pulse_train_count))`
    pub fn simulated_pulse_train_count(&self, simulated_photon_count: u64) -> usize {
        let scaled =
            (simulated_photon_count as f64 / self.real_photon_count * self.pulse_train_count).round();
        if scaled.is_finite() && scaled >= 1.0 {
            scaled as usize
        } else {
            1
        }
    }

    /// Arrival time in picoseconds for a distance in millimetres.
    pub fn arrival_time_ps(&self, distance: f64) -> f64 {
        (distance / 1000.0) / self.speed_of_light * 1e12
    }
}

/// Full configuration of one pixelation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    #[builder(default)]
    pub detector: DetectorConfig,
    pub histogram: Option<HistogramConfig>,
    pub dead_time: Option<DeadTimeConfig>,
    /// Worker-pool size; defaults to the available parallelism.
    pub workers: Option<usize>,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(?config, "loaded pipeline configuration");
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.geometry()?;
        if let Some(histogram) = &self.histogram {
            histogram.validate()?;
        }
        if let Some(dead_time) = &self.dead_time {
            dead_time.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_index_clamps_range_max_into_last_bin() {
        let config = HistogramConfig::builder()
            .range_min(900.0)
            .range_max(1100.0)
            .bin_count(2)
            .build();
        assert_eq!(config.bin_width(), 100.0);
        assert_eq!(config.bin_index(900.0), Some(0));
        assert_eq!(config.bin_index(1000.0), Some(1));
        assert_eq!(config.bin_index(1100.0), Some(1));
        assert_eq!(config.bin_index(899.9), None);
        assert_eq!(config.bin_index(4000.0), None);
        assert_eq!(config.bin_center(1), 1050.0);
    }

    #[test]
    fn histogram_validation() {
        assert!(HistogramConfig::default().validate().is_ok());
        let empty = HistogramConfig::builder().bin_count(0).build();
        assert!(matches!(
            empty.validate(),
            Err(PixelationError::InvalidHistogramRange { .. })
        ));
        let inverted = HistogramConfig::builder()
            .range_min(10.0)
            .range_max(5.0)
            .build();
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn pulse_train_count_uses_literal_scale() {
        let config = DeadTimeConfig::builder().real_photon_count(2.0e6).build();
        assert_eq!(config.pulse_train_count, 1.0e6);
        assert_eq!(config.simulated_pulse_train_count(4_000), 2_000);
        // never below one slot
        assert_eq!(config.simulated_pulse_train_count(0), 1);
    }

    #[test]
    fn arrival_time_in_picoseconds() {
        let config = DeadTimeConfig::default();
        // 3 m at c = 3e8 m/s is 10 ns
        assert!((config.arrival_time_ps(3000.0) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn pipeline_config_from_json() {
        let json = r#"{
            "detector": { "resolution_width": 4, "resolution_height": 4, "projection_mode": "scan" },
            "histogram": { "range_min": 900.0, "range_max": 1100.0, "bin_count": 2 },
            "dead_time": { "real_photon_count": 100.0, "dead_time_ps": 10.0 },
            "workers": 2
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.detector.resolution_width, 4);
        assert_eq!(config.detector.focal_length, 0.01);
        assert_eq!(config.detector.projection_mode, ProjectionMode::Scan);
        assert_eq!(config.histogram.unwrap().bin_count, 2);
        assert_eq!(config.dead_time.unwrap().speed_of_light, SPEED_OF_LIGHT);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn pipeline_config_rejects_degenerate_detector() {
        let json = r#"{ "detector": { "field_of_view_degrees": 0.0 } }"#;
        assert!(matches!(
            PipelineConfig::from_json_str(json),
            Err(PixelationError::DegenerateGeometry(_))
        ));
    }
}
