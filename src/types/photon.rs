//! Photon collision records and the per-pixel events derived from them

use bon::{Builder, bon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a raw record could not become a [`PhotonRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecord {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("direction vector has zero length")]
    ZeroDirection,
    #[error("direction vector has non-finite components")]
    NonFiniteDirection,
    #[error("distance {0} is negative or non-finite")]
    InvalidDistance(f64),
    #[error("collision count {0} is negative")]
    NegativeCollisionCount(i32),
}

/// One simulated detection: a unit direction, the distance travelled and the
/// number of scattering events along the way.
///
/// The direction is normalized on construction and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonRecord {
    direction: [f64; 3],
    direction_length: f64,
    distance: f64,
    collision_count: u32,
    camera_pixel: Option<(i32, i32)>,
}

#[bon]
impl PhotonRecord {
    #[builder]
    pub fn new(
        direction: [f64; 3],
        distance: f64,
        collision_count: u32,
        camera_pixel: Option<(i32, i32)>,
    ) -> Result<Self, InvalidRecord> {
        if direction.iter().any(|c| !c.is_finite()) {
            return Err(InvalidRecord::NonFiniteDirection);
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(InvalidRecord::InvalidDistance(distance));
        }
        let [dx, dy, dz] = direction;
        let length = (dx * dx + dy * dy + dz * dz).sqrt();
        if length == 0.0 {
            return Err(InvalidRecord::ZeroDirection);
        }

        Ok(Self {
            direction: [dx / length, dy / length, dz / length],
            direction_length: length,
            distance,
            collision_count,
            camera_pixel,
        })
    }

    pub fn direction(&self) -> [f64; 3] {
        self.direction
    }

    /// Length of the direction vector before normalization.
    pub fn direction_length(&self) -> f64 {
        self.direction_length
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn collision_count(&self) -> u32 {
        self.collision_count
    }

    /// Pixel address carried by scan-lidar records.
    pub fn camera_pixel(&self) -> Option<(i32, i32)> {
        self.camera_pixel
    }

    /// A record with no collision never reached a surface.
    pub fn has_collision(&self) -> bool {
        self.collision_count != 0
    }

    pub fn to_event(&self) -> PixelEvent {
        PixelEvent {
            distance: self.distance,
            collision_count: self.collision_count,
        }
    }
}

/// A decoded row from an upstream photon container. Every field is optional
/// because containers and logs may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct RawCollisionRecord {
    pub collision_count: Option<i32>,
    pub distance: Option<f64>,
    pub location: Option<[f64; 3]>,
    pub direction: Option<[f64; 3]>,
    pub camera_x: Option<i32>,
    pub camera_y: Option<i32>,
}

/// A record that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord {
    pub index: usize,
    pub reason: InvalidRecord,
}

/// `(distance, collision_count)` as stored in a pixel's event list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
pub struct PixelEvent {
    pub distance: f64,
    pub collision_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let photon = PhotonRecord::builder()
            .direction([0.0, 3.0, -4.0])
            .distance(12.5)
            .collision_count(2)
            .build()
            .unwrap();

        let [dx, dy, dz] = photon.direction();
        assert!((dx * dx + dy * dy + dz * dz - 1.0).abs() < 1e-12);
        assert!((dy - 0.6).abs() < 1e-12);
        assert!((dz + 0.8).abs() < 1e-12);
        assert_eq!(photon.direction_length(), 5.0);
    }

    #[test]
    fn zero_direction_is_rejected() {
        let err = PhotonRecord::builder()
            .direction([0.0, 0.0, 0.0])
            .distance(1.0)
            .collision_count(1)
            .build()
            .unwrap_err();
        assert_eq!(err, InvalidRecord::ZeroDirection);
    }

    #[test]
    fn negative_distance_is_rejected() {
        let err = PhotonRecord::builder()
            .direction([0.0, 0.0, -1.0])
            .distance(-3.0)
            .collision_count(1)
            .build()
            .unwrap_err();
        assert_eq!(err, InvalidRecord::InvalidDistance(-3.0));
    }
}
