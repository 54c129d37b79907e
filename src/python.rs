//! Python bindings exposed as the `tof_pixelation` extension module

use crate::config::PipelineConfig;
use crate::detector::run_pipeline;
use crate::error::PixelationError;
use crate::types::RawCollisionRecord;
use crate::utils::frame_export::{events_to_dataframe, histogram_metadata, histogram_to_dataframe};
use ndarray::Array2;
use pyo3::{
    Bound, PyErr, PyResult, Python, pyfunction, pymodule, types::PyModule,
    types::PyModuleMethods, wrap_pyfunction,
};
use pyo3_polars::PyDataFrame;

impl From<PixelationError> for PyErr {
    fn from(err: PixelationError) -> PyErr {
        match err {
            PixelationError::Io(e) => pyo3::exceptions::PyIOError::new_err(e.to_string()),
            other => pyo3::exceptions::PyValueError::new_err(other.to_string()),
        }
    }
}

/// `(collision_count, distance, direction, camera_pixel)` as sent from Python.
type PyPhotonRow = (i32, f64, (f64, f64, f64), Option<(i32, i32)>);

fn to_records(records: Vec<PyPhotonRow>) -> Vec<RawCollisionRecord> {
    records
        .into_iter()
        .map(|(collision_count, distance, (dx, dy, dz), camera_pixel)| {
            RawCollisionRecord::builder()
                .collision_count(collision_count)
                .distance(distance)
                .direction([dx, dy, dz])
                .maybe_camera_x(camera_pixel.map(|(x, _)| x))
                .maybe_camera_y(camera_pixel.map(|(_, y)| y))
                .build()
        })
        .collect()
}

fn to_nested(image: &Array2<f64>) -> Vec<Vec<f64>> {
    image.outer_iter().map(|row| row.to_vec()).collect()
}

/// Projects photon records and returns the depth images and histograms.
///
/// Args:
///     config_json (str): Pipeline configuration as JSON.
///     records (list[tuple[int, float, tuple[float, float, float], tuple[int, int] | None]]):
///         `(collision_count, distance, direction, camera_pixel)` per photon.
///         `camera_pixel` is required for records projected in scan mode.
///
/// Returns:
///     tuple: `(mean_depth, mode_depth, histogram_df, metadata_df, events_df)`.
///     `mode_depth`, `histogram_df` and `metadata_df` are None without a
///     histogram section in the configuration. `events_df` holds the
///     dead-time filtered events when a dead-time section is present.
///
/// Raises:
///     ValueError: If the configuration is invalid.
#[pyfunction]
#[pyo3(signature = (config_json, records))]
#[allow(clippy::type_complexity)]
fn pixelate(
    py: Python<'_>,
    config_json: &str,
    records: Vec<PyPhotonRow>,
) -> PyResult<(
    Vec<Vec<f64>>,
    Option<Vec<Vec<f64>>>,
    Option<PyDataFrame>,
    Option<PyDataFrame>,
    Option<PyDataFrame>,
)> {
    let config = PipelineConfig::from_json_str(config_json)?;
    let raw = to_records(records);
    let output = py.allow_threads(|| run_pipeline(&config, &raw))?;

    let (histogram_df, metadata_df) = match &output.histogram {
        Some(histogram) => (
            Some(PyDataFrame(histogram_to_dataframe(histogram).map_err(PixelationError::from)?)),
            Some(PyDataFrame(histogram_metadata(histogram).map_err(PixelationError::from)?)),
        ),
        None => (None, None),
    };
    let events_df = match &output.dead_time {
        Some(dead_time) => Some(PyDataFrame(
            events_to_dataframe(&dead_time.filtered).map_err(PixelationError::from)?,
        )),
        None => None,
    };

    Ok((
        to_nested(&output.mean_depth),
        output.mode_depth.as_ref().map(to_nested),
        histogram_df,
        metadata_df,
        events_df,
    ))
}

/// The name of this function must match the `lib.name` setting in the
/// `Cargo.toml`, else Python will not be able to import the module.
#[pymodule]
fn tof_pixelation(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(pixelate, m)?)?;
    Ok(())
}
