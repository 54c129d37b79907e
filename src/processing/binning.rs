use crate::config::HistogramConfig;
use crate::error::{PixelationError, Result};
use crate::types::{Histogram3D, PixelEvent, PixelEventArena};
use ndarray::Array3;
use rayon::prelude::*;
use tracing::info;

/// Histogram row of a single pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelHistogram {
    pub counts: Vec<u32>,
    pub mean_collision: Vec<f64>,
    pub illegal: Vec<PixelEvent>,
}

/// Bin one pixel's events into `config.bin_count` fixed-width bins.
///
/// Events outside `[range_min, range_max]` go to `illegal` instead of a bin.
/// The collision sums are turned into means once every event is binned.
pub fn bin_pixel(events: &[PixelEvent], config: &HistogramConfig) -> PixelHistogram {
    let mut counts = vec![0u32; config.bin_count];
    let mut collision_sums = vec![0.0f64; config.bin_count];
    let mut illegal = Vec::new();

    for event in events {
        match config.bin_index(event.distance) {
            Some(bin) => {
                counts[bin] += 1;
                collision_sums[bin] += event.collision_count as f64;
            }
            None => illegal.push(*event),
        }
    }

    let mean_collision = counts
        .iter()
        .zip(collision_sums)
        .map(|(&count, sum)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect();

    PixelHistogram {
        counts,
        mean_collision,
        illegal,
    }
}

/// Bin every pixel of `arena` in parallel and assemble the `(x, y, bin)` arrays.
pub fn build_histogram(arena: &PixelEventArena, config: &HistogramConfig) -> Result<Histogram3D> {
    config.validate()?;

    let rows: Vec<PixelHistogram> = arena
        .slots()
        .par_iter()
        .map(|events| bin_pixel(events, config))
        .collect();

    let (width, height) = arena.dimensions();
    let shape = (width, height, config.bin_count);
    let mut counts = Array3::<u32>::zeros(shape);
    let mut mean_collision = Array3::<f64>::zeros(shape);
    let mut illegal = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let (x, y) = arena.coordinates(index);
        for (bin, (&count, &mean)) in row.counts.iter().zip(&row.mean_collision).enumerate() {
            counts[[x, y, bin]] = count;
            mean_collision[[x, y, bin]] = mean;
        }
        illegal.push(row.illegal);
    }
    let illegal_len = illegal.len();

    let illegal = PixelEventArena::from_slots(width, height, illegal).ok_or(
        PixelationError::ShapeMismatch {
            left: (width, height),
            right: (illegal_len, 1),
        },
    )?;

    info!(
        width,
        height,
        bins = config.bin_count,
        illegal = illegal.total_events(),
        "built pixel histograms"
    );

    Ok(Histogram3D {
        counts,
        mean_collision,
        illegal,
        config: *config,
    })
}
