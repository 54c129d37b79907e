//! Flat per-pixel storage of photon events

use crate::types::photon::PixelEvent;
use itertools::iproduct;
use ndarray::Array2;
use rayon::prelude::*;

/// One growable event list per pixel, stored contiguously and indexed by
/// `y * width + x`.
///
/// Each slot is owned by exactly one pixel, so slots can be handed to
/// different workers without synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelEventArena {
    width: usize,
    height: usize,
    slots: Vec<Vec<PixelEvent>>,
}

impl PixelEventArena {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            slots: vec![Vec::new(); width * height],
        }
    }

    /// Wrap already-filled slots. Returns `None` if the slot count does not
    /// match the grid.
    pub fn from_slots(width: usize, height: usize, slots: Vec<Vec<PixelEvent>>) -> Option<Self> {
        (slots.len() == width * height).then_some(Self {
            width,
            height,
            slots,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Slot index of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        match self.checked_index(x, y) {
            Some(index) => index,
            None => panic!(
                "pixel ({x}, {y}) is outside the {}x{} grid",
                self.width, self.height
            ),
        }
    }

    /// Slot index of pixel `(x, y)`, `None` outside the grid.
    #[inline]
    pub fn checked_index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn push(&mut self, x: usize, y: usize, event: PixelEvent) {
        let index = self.index(x, y);
        self.slots[index].push(event);
    }

    pub fn events(&self, x: usize, y: usize) -> &[PixelEvent] {
        &self.slots[self.index(x, y)]
    }

    /// Events of pixel `(x, y)`, `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<&[PixelEvent]> {
        self.checked_index(x, y).map(|index| self.slots[index].as_slice())
    }

    pub fn slots(&self) -> &[Vec<PixelEvent>] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Vec<PixelEvent>> {
        self.slots
    }

    pub fn total_events(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Sort every pixel's events by ascending distance.
    pub fn sort_by_distance(&mut self) {
        self.slots
            .par_iter_mut()
            .for_each(|events| events.sort_by(|a, b| a.distance.total_cmp(&b.distance)));
    }

    /// Iterate `(x, y, events)` in row-major order.
    pub fn iter_pixels(&self) -> impl Iterator<Item = (usize, usize, &[PixelEvent])> + '_ {
        iproduct!(0..self.height, 0..self.width)
            .map(move |(y, x)| (x, y, self.events(x, y)))
    }

    /// Number of events per pixel, shaped `(width, height)`.
    pub fn count_image(&self) -> Array2<u32> {
        Array2::from_shape_fn((self.width, self.height), |(x, y)| {
            self.events(x, y).len() as u32
        })
    }

    /// Sum of distances per pixel, shaped `(width, height)`.
    pub fn sum_image(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.width, self.height), |(x, y)| {
            self.events(x, y).iter().map(|e| e.distance).sum()
        })
    }

    /// All distances recorded inside the rectangle starting at `(x, y)`.
    /// The rectangle is clipped to the grid.
    pub fn region_distances(&self, x: usize, y: usize, width: usize, height: usize) -> Vec<f64> {
        let x_end = (x + width).min(self.width);
        let y_end = (y + height).min(self.height);

        iproduct!(x..x_end, y..y_end)
            .flat_map(|(px, py)| self.events(px, py).iter().map(|e| e.distance))
            .collect()
    }
}
