use crate::config::{DeadTimeConfig, DetectorConfig, HistogramConfig, PipelineConfig, ProjectionMode};
use crate::error::Result;
use crate::parser::parse_records;
use crate::processing::{
    DeadTimeResult, ProjectionStats, Rejection, build_histogram, mean_depth_image,
    mode_depth_image, project_photon, project_photons, simulate_dead_time,
};
use crate::types::{
    DetectorGeometry, FailedRecord, Histogram3D, PhotonRecord, PixelEventArena, RawCollisionRecord,
};
use crate::utils::frame_export::events_to_dataframe;
use crate::utils::pool::build_pool;
use ndarray::Array2;
use polars::prelude::{DataFrame, PolarsError};
use rayon::ThreadPool;
use tracing::{info, warn};

/// A simulated time-of-flight detector accumulating photon events per pixel.
pub struct Detector {
    pub geometry: DetectorGeometry,
    pub projection_mode: ProjectionMode,
    arena: PixelEventArena,
    stats: ProjectionStats,
    failed_records: Vec<FailedRecord>,
    pool: ThreadPool,
}

/// Everything one [`run_pipeline`] call produces.
pub struct PipelineOutput {
    pub mean_depth: Array2<f64>,
    pub histogram: Option<Histogram3D>,
    pub mode_depth: Option<Array2<f64>>,
    pub dead_time: Option<DeadTimeResult>,
    pub stats: ProjectionStats,
    pub failed_records: Vec<FailedRecord>,
}

impl Detector {
    /// Build a detector; fails fast on degenerate geometry.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        Self::with_workers(config, None)
    }

    pub fn with_workers(config: &DetectorConfig, workers: Option<usize>) -> Result<Self> {
        let geometry = config.geometry()?;
        let pool = build_pool(workers)?;
        info!(
            width = geometry.resolution_width,
            height = geometry.resolution_height,
            fov = geometry.field_of_view_degrees,
            workers = pool.current_num_threads(),
            "created detector"
        );

        Ok(Self {
            arena: PixelEventArena::new(geometry.resolution_width, geometry.resolution_height),
            geometry,
            projection_mode: config.projection_mode,
            stats: ProjectionStats::default(),
            failed_records: Vec::new(),
            pool,
        })
    }

    pub fn from_pipeline(config: &PipelineConfig) -> Result<Self> {
        Self::with_workers(&config.detector, config.workers)
    }

    /// Project a single photon, appending it to its pixel on a hit.
    pub fn photon_to_detector(
        &mut self,
        photon: &PhotonRecord,
    ) -> std::result::Result<(usize, usize), Rejection> {
        let hit = project_photon(&self.geometry, self.projection_mode, photon);
        match hit {
            Ok((x, y)) => {
                self.arena.push(x, y, photon.to_event());
                self.stats.accept(photon.distance());
            }
            Err(rejection) => self.stats.reject(rejection),
        }
        hit
    }

    /// Project a batch of photons on the detector's worker pool.
    pub fn project(&mut self, photons: &[PhotonRecord]) -> ProjectionStats {
        let geometry = self.geometry;
        let mode = self.projection_mode;
        let arena = &mut self.arena;
        let batch = self
            .pool
            .install(|| project_photons(&geometry, mode, photons, arena));
        self.stats = self.stats.merge(batch);

        info!(
            projected = batch.projected,
            rejected = batch.rejected(),
            out_of_frame = batch.out_of_frame,
            "projected photon batch"
        );
        if batch.missing_camera_pixel > 0 {
            warn!(
                missing = batch.missing_camera_pixel,
                "scan-mode records without a camera pixel were dropped"
            );
        }
        batch
    }

    /// Validate decoded rows and project the valid ones. Malformed rows are
    /// kept in [`failed_records`](Self::failed_records) with their index.
    pub fn ingest(&mut self, raw: &[RawCollisionRecord]) -> ProjectionStats {
        let (photons, failed) = self.pool.install(|| parse_records(raw));
        self.failed_records.extend(failed);
        self.project(&photons)
    }

    pub fn arena(&self) -> &PixelEventArena {
        &self.arena
    }

    pub fn into_arena(self) -> PixelEventArena {
        self.arena
    }

    pub fn stats(&self) -> &ProjectionStats {
        &self.stats
    }

    pub fn failed_records(&self) -> &[FailedRecord] {
        &self.failed_records
    }

    /// Smallest projected distance, `None` before any hit.
    pub fn min_distance(&self) -> Option<f64> {
        (self.stats.projected > 0).then_some(self.stats.min_distance)
    }

    /// Largest projected distance, `None` before any hit.
    pub fn max_distance(&self) -> Option<f64> {
        (self.stats.projected > 0).then_some(self.stats.max_distance)
    }

    pub fn sort_by_distance(&mut self) {
        let arena = &mut self.arena;
        self.pool.install(|| arena.sort_by_distance());
    }

    pub fn histogram(&self, config: &HistogramConfig) -> Result<Histogram3D> {
        self.pool.install(|| build_histogram(&self.arena, config))
    }

    pub fn mode_depth_image(&self, config: &HistogramConfig) -> Result<Array2<f64>> {
        let histogram = self.histogram(config)?;
        Ok(self.pool.install(|| mode_depth_image(&histogram)))
    }

    pub fn mean_depth_image(&self) -> Array2<f64> {
        self.pool.install(|| mean_depth_image(&self.arena))
    }

    pub fn simulate_dead_time(&self, config: &DeadTimeConfig) -> Result<DeadTimeResult> {
        self.pool.install(|| simulate_dead_time(&self.arena, config))
    }

    /// Distances inside the rectangle `(x, y, width, height)`.
    pub fn region_distances(&self, x: usize, y: usize, width: usize, height: usize) -> Vec<f64> {
        self.arena.region_distances(x, y, width, height)
    }

    pub fn events_dataframe(&self) -> std::result::Result<DataFrame, PolarsError> {
        events_to_dataframe(&self.arena)
    }

    /// Get a summary of the detector contents
    pub fn get_summary(&self) -> String {
        let mut result = String::new();

        result.push_str("Detector:\n");
        result.push_str(&format!(
            "  Resolution: {}x{}\n",
            self.geometry.resolution_width, self.geometry.resolution_height
        ));
        result.push_str(&format!(
            "  Field of view: {} deg, focal length {}\n",
            self.geometry.field_of_view_degrees, self.geometry.focal_length
        ));
        result.push_str(&format!("  Projection: {:?}\n", self.projection_mode));

        result.push_str("\nPhotons:\n");
        result.push_str(&format!("  Projected: {}\n", self.stats.projected));
        result.push_str(&format!("  Rejected: {}\n", self.stats.rejected()));
        result.push_str(&format!("  Malformed records: {}\n", self.failed_records.len()));
        if let (Some(min), Some(max)) = (self.min_distance(), self.max_distance()) {
            result.push_str(&format!("  Min distance: {:.3}\n", min));
            result.push_str(&format!("  Max distance: {:.3}\n", max));
        }

        result
    }
}

/// Run the full pass described by `config` over decoded photon rows.
pub fn run_pipeline(config: &PipelineConfig, raw: &[RawCollisionRecord]) -> Result<PipelineOutput> {
    config.validate()?;
    let mut detector = Detector::from_pipeline(config)?;
    detector.ingest(raw);

    let histogram = config
        .histogram
        .as_ref()
        .map(|histogram| detector.histogram(histogram))
        .transpose()?;
    let mode_depth = histogram
        .as_ref()
        .map(|histogram| detector.pool.install(|| mode_depth_image(histogram)));
    let dead_time = config
        .dead_time
        .as_ref()
        .map(|dead_time| detector.simulate_dead_time(dead_time))
        .transpose()?;

    Ok(PipelineOutput {
        mean_depth: detector.mean_depth_image(),
        histogram,
        mode_depth,
        dead_time,
        stats: detector.stats,
        failed_records: detector.failed_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_detector() -> Detector {
        let config = DetectorConfig::builder()
            .focal_length(1.0)
            .field_of_view_degrees(90.0)
            .resolution_width(4)
            .resolution_height(4)
            .build();
        Detector::with_workers(&config, Some(2)).unwrap()
    }

    fn row(direction: [f64; 3], distance: f64, collisions: i32) -> RawCollisionRecord {
        RawCollisionRecord::builder()
            .collision_count(collisions)
            .distance(distance)
            .direction(direction)
            .build()
    }

    #[test]
    fn ingest_projects_and_records_failures() {
        let mut detector = small_detector();
        let stats = detector.ingest(&[
            row([0.1, 0.1, -1.0], 1000.0, 1),
            RawCollisionRecord::default(),
            row([0.1, 0.1, -1.0], 1005.0, 1),
            row([0.1, 0.1, -1.0], 4000.0, 1),
            row([0.1, 0.1, 1.0], 1000.0, 1),
        ]);

        assert_eq!(stats.projected, 3);
        assert_eq!(stats.wrong_direction, 1);
        assert_eq!(detector.failed_records().len(), 1);
        assert_eq!(detector.failed_records()[0].index, 1);
        assert_eq!(detector.min_distance(), Some(1000.0));
        assert_eq!(detector.max_distance(), Some(4000.0));
        assert_eq!(detector.arena().events(2, 2).len(), 3);

        let histogram = HistogramConfig::builder()
            .range_min(900.0)
            .range_max(1100.0)
            .bin_count(2)
            .build();
        let depth = detector.mode_depth_image(&histogram).unwrap();
        assert_eq!(depth[[2, 2]], 1050.0);
        assert_eq!(depth[[0, 0]], 0.0);

        let mean = detector.mean_depth_image();
        assert!((mean[[2, 2]] - 2001.6666666666667).abs() < 1e-9);
    }

    #[test]
    fn single_photon_projection_updates_stats() {
        let mut detector = small_detector();
        let photon = PhotonRecord::builder()
            .direction([-0.9, 0.6, -1.0])
            .distance(12.0)
            .collision_count(1)
            .build()
            .unwrap();
        assert_eq!(detector.photon_to_detector(&photon), Ok((0, 3)));
        assert_eq!(detector.stats().projected, 1);
        assert_eq!(detector.arena().events(0, 3).len(), 1);
        assert_eq!(detector.min_distance(), Some(12.0));
        assert!(detector.get_summary().contains("Projected: 1"));
    }

    #[test]
    fn empty_detector_has_no_extremes() {
        let detector = small_detector();
        assert_eq!(detector.min_distance(), None);
        assert_eq!(detector.arena().iter_pixels().count(), 16);
        assert_eq!(detector.mean_depth_image().sum(), 0.0);
    }

    #[test]
    fn pipeline_runs_every_configured_pass() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "detector": { "focal_length": 1.0, "field_of_view_degrees": 90.0,
                              "resolution_width": 4, "resolution_height": 4 },
                "histogram": { "range_min": 900.0, "range_max": 1100.0, "bin_count": 2 },
                "dead_time": { "real_photon_count": 1e12, "dead_time_ps": 1e9 },
                "workers": 2
            }"#,
        )
        .unwrap();
        let rows = vec![
            row([0.1, 0.1, -1.0], 1000.0, 1),
            row([0.1, 0.1, -1.0], 1005.0, 2),
            row([-0.9, -0.9, -1.0], 950.0, 1),
        ];

        let output = run_pipeline(&config, &rows).unwrap();
        assert_eq!(output.stats.projected, 3);
        assert!(output.failed_records.is_empty());
        assert_eq!(output.mode_depth.unwrap()[[2, 2]], 1050.0);
        assert_eq!(output.histogram.unwrap().in_range_count(0, 0), 1);

        // one pulse slot and a huge dead window keep only the first photon per pixel
        let dead_time = output.dead_time.unwrap();
        assert_eq!(dead_time.accepted, 2);
        assert_eq!(dead_time.discarded, 1);
        assert_eq!(output.mean_depth[[0, 0]], 950.0);
    }
}
