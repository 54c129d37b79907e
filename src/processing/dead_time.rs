//! Paralyzable dead-time (pile-up) simulation
//!
//! Every pixel owns a set of simulated pulse slots. Photons are visited in
//! arrival order and dropped onto a pseudo-random slot; a photon landing less
//! than `dead_time_ps` after the last accepted photon of its slot is discarded.
//! The stream deciding the slots is seeded from the pixel coordinates alone, so
//! the outcome of a pixel never depends on scheduling.

use crate::config::DeadTimeConfig;
use crate::error::{PixelationError, Result};
use crate::types::{PixelEvent, PixelEventArena};
use crate::utils::misc::pixel_seed;
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

/// Last accepted arrival time per pulse slot of one pixel.
///
/// Slots are created on first use, so memory follows the number of photons
/// rather than the number of simulated pulses.
#[derive(Debug, Default)]
pub struct DeadTimeState {
    last_accepted: HashMap<usize, f64>,
}

impl DeadTimeState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            last_accepted: HashMap::with_capacity(capacity),
        }
    }

    /// Offer a photon to `pulse`. Returns `true` and records the arrival when
    /// the slot is idle or its dead window has elapsed.
    pub fn offer(&mut self, pulse: usize, arrival_ps: f64, dead_time_ps: f64) -> bool {
        match self.last_accepted.get(&pulse) {
            Some(&prior) if prior + dead_time_ps > arrival_ps => false,
            _ => {
                self.last_accepted.insert(pulse, arrival_ps);
                true
            }
        }
    }

    pub fn last_accepted(&self, pulse: usize) -> Option<f64> {
        self.last_accepted.get(&pulse).copied()
    }
}

/// Accept/discard decision for explicit arrival times and pulse assignments.
///
/// `arrivals_ps` must already be in ascending order.
pub fn filter_arrivals(arrivals_ps: &[f64], pulses: &[usize], dead_time_ps: f64) -> Vec<bool> {
    let mut state = DeadTimeState::with_capacity(arrivals_ps.len());
    arrivals_ps
        .iter()
        .zip(pulses)
        .map(|(&arrival, &pulse)| state.offer(pulse, arrival, dead_time_ps))
        .collect()
}

/// Outcome of the dead-time pass over one pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelDeadTime {
    /// Surviving events in ascending distance order.
    pub accepted: Vec<PixelEvent>,
    pub discarded: usize,
}

/// Run the dead-time filter over one pixel's events.
pub fn filter_pixel(
    events: &[PixelEvent],
    x: usize,
    y: usize,
    pulse_train_count: usize,
    config: &DeadTimeConfig,
) -> PixelDeadTime {
    let mut ordered = events.to_vec();
    ordered.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let pulse_train_count = pulse_train_count.max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(pixel_seed(x, y));
    let mut state = DeadTimeState::with_capacity(ordered.len().min(pulse_train_count));
    let mut accepted = Vec::with_capacity(ordered.len());
    let mut discarded = 0;

    for event in ordered {
        let arrival = config.arrival_time_ps(event.distance);
        let pulse = rng.gen_range(0..pulse_train_count);
        if state.offer(pulse, arrival, config.dead_time_ps) {
            accepted.push(event);
        } else {
            discarded += 1;
        }
    }

    PixelDeadTime {
        accepted,
        discarded,
    }
}

/// Result of a dead-time pass over a whole detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadTimeResult {
    pub filtered: PixelEventArena,
    pub accepted: usize,
    pub discarded: usize,
    /// Accepted events per pixel, shaped `(width, height)`.
    pub accepted_image: Array2<u32>,
    /// Discarded events per pixel, shaped `(width, height)`.
    pub discarded_image: Array2<u32>,
    pub pulse_train_count: usize,
}

/// Filter every pixel of `arena` in parallel on the current rayon pool.
///
/// Totals are combined with an associative reduction after the per-pixel work.
pub fn simulate_dead_time(arena: &PixelEventArena, config: &DeadTimeConfig) -> Result<DeadTimeResult> {
    config.validate()?;

    let simulated_photons = config
        .simulated_photon_count
        .unwrap_or(arena.total_events() as u64);
    let pulse_train_count = config.simulated_pulse_train_count(simulated_photons);

    let pixels: Vec<PixelDeadTime> = arena
        .slots()
        .par_iter()
        .enumerate()
        .map(|(index, events)| {
            let (x, y) = arena.coordinates(index);
            filter_pixel(events, x, y, pulse_train_count, config)
        })
        .collect();

    let (accepted, discarded) = pixels
        .par_iter()
        .map(|pixel| (pixel.accepted.len(), pixel.discarded))
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    let (width, height) = arena.dimensions();
    let mut accepted_image = Array2::<u32>::zeros((width, height));
    let mut discarded_image = Array2::<u32>::zeros((width, height));
    let mut slots = Vec::with_capacity(pixels.len());
    for (index, pixel) in pixels.into_iter().enumerate() {
        let (x, y) = arena.coordinates(index);
        accepted_image[[x, y]] = pixel.accepted.len() as u32;
        discarded_image[[x, y]] = pixel.discarded as u32;
        slots.push(pixel.accepted);
    }
    let slot_count = slots.len();
    let filtered = PixelEventArena::from_slots(width, height, slots).ok_or(
        PixelationError::ShapeMismatch {
            left: (width, height),
            right: (slot_count, 1),
        },
    )?;

    info!(
        accepted,
        discarded,
        pulse_train_count,
        dead_time_ps = config.dead_time_ps,
        "dead-time simulation finished"
    );

    Ok(DeadTimeResult {
        filtered,
        accepted,
        discarded,
        accepted_image,
        discarded_image,
        pulse_train_count,
    })
}
