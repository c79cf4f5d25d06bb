//! Bounded rolling window of recent readings.

use std::collections::VecDeque;

/// Maximum number of readings kept per metric.
pub const WINDOW_CAPACITY: usize = 20;

/// The most recent finite readings for one metric, oldest first.
///
/// Appending to a full window evicts the oldest reading, so the chart x-axis
/// is always arrival order of the last [`WINDOW_CAPACITY`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleWindow {
    values: VecDeque<f64>,
}

impl SampleWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self {
            values: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
        }
    }

    /// Append a reading.
    ///
    /// Returns `false` and leaves the window untouched if the value is NaN or
    /// infinite.
    pub fn push(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }

        self.values.push_back(value);
        if self.values.len() > WINDOW_CAPACITY {
            self.values.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate readings oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// The newest reading, if any.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Readings as `(x, y)` points for a line chart, x being arrival index.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect()
    }

    /// Smallest and largest reading, if any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.iter();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}
