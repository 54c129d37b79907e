//! Depth images from binned histograms and raw event lists
//!
//! Every image is shaped `(width, height)` and uses 0 for pixels without data.

use crate::config::HistogramConfig;
use crate::error::{PixelationError, Result};
use crate::types::{Histogram3D, PixelEventArena};
use ndarray::{Array2, ArrayView1, Axis, Zip};

/// Index of the largest value, keeping the first one on ties.
pub fn first_argmax<T: PartialOrd + Copy>(values: ArrayView1<'_, T>) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if !(value > current) => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Bin-centre depth of the most populated bin of one pixel, or 0 when the
/// pixel has no in-range photons.
pub fn mode_depth(counts: ArrayView1<'_, u32>, config: &HistogramConfig) -> f64 {
    match first_argmax(counts) {
        Some(index) if counts[index] > 0 => config.bin_center(index),
        _ => 0.0,
    }
}

/// Mode-based depth image from the photon-count channel.
pub fn mode_depth_image(histogram: &Histogram3D) -> Array2<f64> {
    let config = histogram.config;
    let mut depth = Array2::<f64>::zeros((histogram.width(), histogram.height()));
    Zip::from(&mut depth)
        .and(histogram.counts.lanes(Axis(2)))
        .par_for_each(|depth, counts| *depth = mode_depth(counts, &config));
    depth
}

/// Mode-based depth image from the mean-collision channel.
///
/// Same bin-centre rule as [`mode_depth_image`], with the argmax taken over the
/// mean collision count of each bin. Pixels whose bins are all 0 stay at 0.
pub fn collision_mode_depth_image(histogram: &Histogram3D) -> Array2<f64> {
    let config = histogram.config;
    let mut depth = Array2::<f64>::zeros((histogram.width(), histogram.height()));
    Zip::from(&mut depth)
        .and(histogram.mean_collision.lanes(Axis(2)))
        .par_for_each(|depth, means| {
            *depth = match first_argmax(means) {
                Some(index) if means[index] > 0.0 => config.bin_center(index),
                _ => 0.0,
            }
        });
    depth
}

/// Arithmetic mean of every distance recorded at each pixel.
pub fn mean_depth_image(arena: &PixelEventArena) -> Array2<f64> {
    let counts = arena.count_image();
    let sums = arena.sum_image();
    Zip::from(&sums).and(&counts).par_map_collect(|&sum, &count| {
        if count > 0 { sum / count as f64 } else { 0.0 }
    })
}

/// Elementwise `|a - b|`.
///
/// Sentinel pixels are not masked: a pixel with data in only one image yields
/// that image's depth. Use [`masked_difference_image`] to zero them.
pub fn difference_image(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    check_shapes(a, b)?;
    Ok(Zip::from(a).and(b).par_map_collect(|&a, &b| (a - b).abs()))
}

/// Like [`difference_image`] but 0 wherever either input is the 0 sentinel.
pub fn masked_difference_image(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    check_shapes(a, b)?;
    Ok(Zip::from(a).and(b).par_map_collect(|&a, &b| {
        if a == 0.0 || b == 0.0 { 0.0 } else { (a - b).abs() }
    }))
}

fn check_shapes(a: &Array2<f64>, b: &Array2<f64>) -> Result<()> {
    if a.dim() != b.dim() {
        return Err(PixelationError::ShapeMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::binning::build_histogram;
    use crate::types::PixelEvent;
    use ndarray::{Array1, array};

    fn event(distance: f64) -> PixelEvent {
        PixelEvent {
            distance,
            collision_count: 1,
        }
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        let values = Array1::from(vec![1u32, 4, 2, 4, 0]);
        assert_eq!(first_argmax(values.view()), Some(1));
        let empty = Array1::<u32>::zeros(0);
        assert_eq!(first_argmax(empty.view()), None);
        let zeros = Array1::<u32>::zeros(3);
        assert_eq!(first_argmax(zeros.view()), Some(0));
    }

    #[test]
    fn mode_depth_uses_bin_centre() {
        let config = HistogramConfig::builder()
            .range_min(900.0)
            .range_max(1100.0)
            .bin_count(2)
            .build();
        let counts = Array1::from(vec![0u32, 2]);
        assert_eq!(mode_depth(counts.view(), &config), 1050.0);
        let empty = Array1::from(vec![0u32, 0]);
        assert_eq!(mode_depth(empty.view(), &config), 0.0);
        let tie = Array1::from(vec![3u32, 3]);
        assert_eq!(mode_depth(tie.view(), &config), 950.0);
    }

    #[test]
    fn mode_depth_image_from_scenario() {
        let mut arena = PixelEventArena::new(4, 4);
        for distance in [1000.0, 1005.0, 4000.0] {
            arena.push(2, 1, event(distance));
        }
        let config = HistogramConfig::builder()
            .range_min(900.0)
            .range_max(1100.0)
            .bin_count(2)
            .build();
        let histogram = build_histogram(&arena, &config).unwrap();
        let depth = mode_depth_image(&histogram);

        assert_eq!(depth.dim(), (4, 4));
        assert_eq!(depth[[2, 1]], 1050.0);
        assert_eq!(depth.iter().filter(|&&d| d != 0.0).count(), 1);
    }

    #[test]
    fn collision_mode_picks_highest_mean() {
        let mut arena = PixelEventArena::new(1, 1);
        arena.push(0, 0, PixelEvent { distance: 910.0, collision_count: 1 });
        arena.push(0, 0, PixelEvent { distance: 920.0, collision_count: 1 });
        arena.push(0, 0, PixelEvent { distance: 1050.0, collision_count: 6 });
        let config = HistogramConfig::builder()
            .range_min(900.0)
            .range_max(1100.0)
            .bin_count(2)
            .build();
        let histogram = build_histogram(&arena, &config).unwrap();

        assert_eq!(mode_depth_image(&histogram)[[0, 0]], 950.0);
        assert_eq!(collision_mode_depth_image(&histogram)[[0, 0]], 1050.0);
    }

    #[test]
    fn mean_depth_ignores_empty_pixels() {
        let mut arena = PixelEventArena::new(2, 1);
        arena.push(0, 0, event(10.0));
        arena.push(0, 0, event(20.0));
        let depth = mean_depth_image(&arena);
        assert_eq!(depth, array![[15.0], [0.0]]);
    }

    #[test]
    fn difference_images() {
        let a = array![[10.0, 0.0], [5.0, 7.0]];
        let b = array![[4.0, 3.0], [0.0, 9.0]];

        assert_eq!(difference_image(&a, &b).unwrap(), array![[6.0, 3.0], [5.0, 2.0]]);
        assert_eq!(
            masked_difference_image(&a, &b).unwrap(),
            array![[6.0, 0.0], [0.0, 2.0]]
        );

        let c = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            difference_image(&a, &c),
            Err(PixelationError::ShapeMismatch { .. })
        ));
    }
}
