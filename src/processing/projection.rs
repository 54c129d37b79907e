use crate::config::ProjectionMode;
use crate::types::{DetectorGeometry, PhotonRecord, PixelEvent, PixelEventArena};
use rayon::prelude::*;

/// Photons handed to one worker at a time during batch projection.
const PROJECTION_CHUNK: usize = 16 * 1024;

/// Why a photon did not land on the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoCollision,
    /// The ray does not travel toward the sensor plane (`dz >= 0`).
    WrongDirection,
    /// Scan-mode record without a pixel address.
    MissingCameraPixel,
    OutOfFrame,
}

/// Counters and distance extremes of a projection pass.
///
/// Partial stats from different workers combine with [`merge`](Self::merge),
/// which is associative and commutative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionStats {
    pub projected: usize,
    pub no_collision: usize,
    pub wrong_direction: usize,
    pub missing_camera_pixel: usize,
    pub out_of_frame: usize,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for ProjectionStats {
    fn default() -> Self {
        Self {
            projected: 0,
            no_collision: 0,
            wrong_direction: 0,
            missing_camera_pixel: 0,
            out_of_frame: 0,
            min_distance: f64::INFINITY,
            max_distance: 0.0,
        }
    }
}

impl ProjectionStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            projected: self.projected + other.projected,
            no_collision: self.no_collision + other.no_collision,
            wrong_direction: self.wrong_direction + other.wrong_direction,
            missing_camera_pixel: self.missing_camera_pixel + other.missing_camera_pixel,
            out_of_frame: self.out_of_frame + other.out_of_frame,
            min_distance: self.min_distance.min(other.min_distance),
            max_distance: self.max_distance.max(other.max_distance),
        }
    }

    pub fn rejected(&self) -> usize {
        self.no_collision + self.wrong_direction + self.missing_camera_pixel + self.out_of_frame
    }

    pub(crate) fn accept(&mut self, distance: f64) {
        self.projected += 1;
        self.min_distance = self.min_distance.min(distance);
        self.max_distance = self.max_distance.max(distance);
    }

    pub(crate) fn reject(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::NoCollision => self.no_collision += 1,
            Rejection::WrongDirection => self.wrong_direction += 1,
            Rejection::MissingCameraPixel => self.missing_camera_pixel += 1,
            Rejection::OutOfFrame => self.out_of_frame += 1,
        }
    }
}

/// Pixel hit by `photon`, or the reason it missed.
pub fn project_photon(
    geometry: &DetectorGeometry,
    mode: ProjectionMode,
    photon: &PhotonRecord,
) -> Result<(usize, usize), Rejection> {
    if !photon.has_collision() {
        return Err(Rejection::NoCollision);
    }
    let [dx, dy, dz] = photon.direction();
    // pinhole at the origin, sensor plane behind it on -z
    if dz >= 0.0 {
        return Err(Rejection::WrongDirection);
    }

    match mode {
        ProjectionMode::Pinhole => {
            let t = geometry.focal_length / dz.abs();
            geometry
                .plane_to_pixel(t * dx, t * dy)
                .ok_or(Rejection::OutOfFrame)
        }
        ProjectionMode::Scan => {
            let (camera_x, camera_y) = photon
                .camera_pixel()
                .ok_or(Rejection::MissingCameraPixel)?;
            geometry
                .scan_pixel(camera_x, camera_y)
                .ok_or(Rejection::OutOfFrame)
        }
    }
}

/// Project a batch of photons and append the hits to `arena`.
///
/// Chunks are projected in parallel into local buffers, then appended in input
/// order, so each pixel's list matches a sequential pass.
pub fn project_photons(
    geometry: &DetectorGeometry,
    mode: ProjectionMode,
    photons: &[PhotonRecord],
    arena: &mut PixelEventArena,
) -> ProjectionStats {
    let partials: Vec<(Vec<(usize, usize, PixelEvent)>, ProjectionStats)> = photons
        .par_chunks(PROJECTION_CHUNK)
        .map(|chunk| {
            let mut hits = Vec::with_capacity(chunk.len());
            let mut stats = ProjectionStats::default();
            for photon in chunk {
                match project_photon(geometry, mode, photon) {
                    Ok((x, y)) => {
                        stats.accept(photon.distance());
                        hits.push((x, y, photon.to_event()));
                    }
                    Err(rejection) => stats.reject(rejection),
                }
            }
            (hits, stats)
        })
        .collect();

    let mut total = ProjectionStats::default();
    for (hits, stats) in partials {
        for (x, y, event) in hits {
            arena.push(x, y, event);
        }
        total = total.merge(stats);
    }
    total
}
