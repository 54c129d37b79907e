use crate::types::{Histogram3D, PixelEventArena};
use ndarray::Array2;
use polars::prelude::*;

/// One row per event: `x`, `y`, `distance`, `collision_count`.
pub fn events_to_dataframe(arena: &PixelEventArena) -> Result<DataFrame, PolarsError> {
    let total = arena.total_events();
    let mut xs: Vec<u32> = Vec::with_capacity(total);
    let mut ys: Vec<u32> = Vec::with_capacity(total);
    let mut distances: Vec<f64> = Vec::with_capacity(total);
    let mut collisions: Vec<u32> = Vec::with_capacity(total);

    for (x, y, events) in arena.iter_pixels() {
        for event in events {
            xs.push(x as u32);
            ys.push(y as u32);
            distances.push(event.distance);
            collisions.push(event.collision_count);
        }
    }

    DataFrame::new(vec![
        Series::new("x".into(), &xs).into(),
        Series::new("y".into(), &ys).into(),
        Series::new("distance".into(), &distances).into(),
        Series::new("collision_count".into(), &collisions).into(),
    ])
}

/// Non-empty histogram bins in long format: `x`, `y`, `bin`, `bin_center`,
/// `count`, `mean_collision`.
///
/// Empty bins are left out, so a pixel absent from the frame has no in-range
/// photons. Grid and binning parameters are returned by
/// [`histogram_metadata`].
pub fn histogram_to_dataframe(histogram: &Histogram3D) -> Result<DataFrame, PolarsError> {
    let mut xs: Vec<u32> = Vec::new();
    let mut ys: Vec<u32> = Vec::new();
    let mut bins: Vec<u32> = Vec::new();
    let mut centers: Vec<f64> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();
    let mut means: Vec<f64> = Vec::new();

    for ((x, y, bin), &count) in histogram.counts.indexed_iter() {
        if count == 0 {
            continue;
        }
        xs.push(x as u32);
        ys.push(y as u32);
        bins.push(bin as u32);
        centers.push(histogram.config.bin_center(bin));
        counts.push(count);
        means.push(histogram.mean_collision[[x, y, bin]]);
    }

    DataFrame::new(vec![
        Series::new("x".into(), &xs).into(),
        Series::new("y".into(), &ys).into(),
        Series::new("bin".into(), &bins).into(),
        Series::new("bin_center".into(), &centers).into(),
        Series::new("count".into(), &counts).into(),
        Series::new("mean_collision".into(), &means).into(),
    ])
}

/// Single-row frame with the parameters needed to read a histogram back:
/// grid size, bin count and distance range.
pub fn histogram_metadata(histogram: &Histogram3D) -> Result<DataFrame, PolarsError> {
    DataFrame::new(vec![
        Series::new("image_width".into(), &[histogram.width() as u32]).into(),
        Series::new("image_height".into(), &[histogram.height() as u32]).into(),
        Series::new("bin_number".into(), &[histogram.bin_count() as u32]).into(),
        Series::new("range_min".into(), &[histogram.range_min()]).into(),
        Series::new("range_max".into(), &[histogram.range_max()]).into(),
    ])
}

/// Depth image in long format: `x`, `y`, `depth`, with `depth` null where the
/// image holds the 0 sentinel.
pub fn depth_to_dataframe(depth: &Array2<f64>) -> Result<DataFrame, PolarsError> {
    let mut xs: Vec<u32> = Vec::with_capacity(depth.len());
    let mut ys: Vec<u32> = Vec::with_capacity(depth.len());
    let mut values: Vec<Option<f64>> = Vec::with_capacity(depth.len());

    for ((x, y), &value) in depth.indexed_iter() {
        xs.push(x as u32);
        ys.push(y as u32);
        values.push((value != 0.0).then_some(value));
    }

    DataFrame::new(vec![
        Series::new("x".into(), &xs).into(),
        Series::new("y".into(), &ys).into(),
        Series::new("depth".into(), &values).into(),
    ])
}

/// Keep the event rows whose distance lies in `[min, max]`.
pub fn filter_by_distance(df: &DataFrame, min: f64, max: f64) -> Result<DataFrame, PolarsError> {
    df.clone()
        .lazy()
        .filter(
            col("distance")
                .gt_eq(lit(min))
                .and(col("distance").lt_eq(lit(max))),
        )
        .collect()
}
