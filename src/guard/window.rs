//! Fixed-capacity FIFO of latency samples.

use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    /// A zero capacity is treated as one so the latest sample is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when the window is full.
    pub fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first.
    pub fn to_vec(&self) -> Vec<Duration> {
        self.samples.iter().copied().collect()
    }

    /// The sample at rank `floor(len * percentile)` of the ascending order,
    /// clamped to the last rank. `None` for an empty window.
    ///
    /// Works on a copy; selection gives the same element a full sort would.
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.to_vec();
        let rank = tail_rank(sorted.len(), percentile);
        let (_, nth, _) = sorted.select_nth_unstable(rank);
        Some(*nth)
    }
}

fn tail_rank(len: usize, percentile: f64) -> usize {
    let rank = (len as f64 * percentile).floor();
    if rank <= 0.0 {
        0
    } else {
        (rank as usize).min(len - 1)
    }
}
