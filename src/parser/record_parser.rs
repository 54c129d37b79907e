//! Validation of decoded container rows into photon records

use crate::error::PixelationError;
use crate::types::photon::{FailedRecord, InvalidRecord, PhotonRecord, RawCollisionRecord};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Turn one raw row into a photon record.
///
/// Returns `Ok(None)` for rows without a collision; those are expected in the
/// stream and are not failures.
pub fn parse_record(raw: &RawCollisionRecord) -> Result<Option<PhotonRecord>, InvalidRecord> {
    let collision_count = raw
        .collision_count
        .ok_or(InvalidRecord::MissingField("collision_count"))?;
    if collision_count == 0 {
        return Ok(None);
    }
    if collision_count < 0 {
        return Err(InvalidRecord::NegativeCollisionCount(collision_count));
    }
    let distance = raw.distance.ok_or(InvalidRecord::MissingField("distance"))?;
    let direction = raw.direction.ok_or(InvalidRecord::MissingField("direction"))?;

    let camera_pixel = match (raw.camera_x, raw.camera_y) {
        (Some(x), Some(y)) => Some((x, y)),
        _ => None,
    };

    PhotonRecord::builder()
        .direction(direction)
        .distance(distance)
        .collision_count(collision_count as u32)
        .maybe_camera_pixel(camera_pixel)
        .build()
        .map(Some)
}

/// Parse a batch of raw rows, keeping the input order of the valid records.
///
/// Invalid rows are skipped and reported with their index.
pub fn parse_records(raw: &[RawCollisionRecord]) -> (Vec<PhotonRecord>, Vec<FailedRecord>) {
    let results: Vec<Result<Option<PhotonRecord>, FailedRecord>> = raw
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            parse_record(record).map_err(|reason| FailedRecord { index, reason })
        })
        .collect();

    let mut photons = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(Some(photon)) => photons.push(photon),
            Ok(None) => {}
            Err(failure) => failed.push(failure),
        }
    }

    if !failed.is_empty() {
        warn!(
            failed = failed.len(),
            total = raw.len(),
            first = %PixelationError::from(failed[0].clone()),
            "skipped malformed photon records"
        );
    }
    debug!(parsed = photons.len(), total = raw.len(), "parsed photon records");

    (photons, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> RawCollisionRecord {
        RawCollisionRecord::builder()
            .collision_count(2)
            .distance(1500.0)
            .location([0.0, 0.0, 0.0])
            .direction([0.0, 0.0, -2.0])
            .build()
    }

    #[test]
    fn parses_valid_row() {
        let photon = parse_record(&valid_row()).unwrap().unwrap();
        assert_eq!(photon.collision_count(), 2);
        assert_eq!(photon.direction(), [0.0, 0.0, -1.0]);
        assert_eq!(photon.camera_pixel(), None);
    }

    #[test]
    fn zero_collision_is_skipped_without_failure() {
        let row = RawCollisionRecord {
            collision_count: Some(0),
            ..valid_row()
        };
        assert_eq!(parse_record(&row), Ok(None));
    }

    #[test]
    fn scan_coordinates_are_kept() {
        let row = RawCollisionRecord {
            camera_x: Some(3),
            camera_y: Some(7),
            ..valid_row()
        };
        let photon = parse_record(&row).unwrap().unwrap();
        assert_eq!(photon.camera_pixel(), Some((3, 7)));
    }

    #[test]
    fn batch_records_failures_by_index() {
        let rows = vec![
            valid_row(),
            RawCollisionRecord {
                distance: None,
                ..valid_row()
            },
            RawCollisionRecord {
                collision_count: Some(0),
                ..valid_row()
            },
            RawCollisionRecord {
                direction: Some([0.0, 0.0, 0.0]),
                ..valid_row()
            },
            valid_row(),
        ];

        let (photons, failed) = parse_records(&rows);
        assert_eq!(photons.len(), 2);
        assert_eq!(
            failed,
            vec![
                FailedRecord {
                    index: 1,
                    reason: InvalidRecord::MissingField("distance"),
                },
                FailedRecord {
                    index: 3,
                    reason: InvalidRecord::ZeroDirection,
                },
            ]
        );
    }
}
