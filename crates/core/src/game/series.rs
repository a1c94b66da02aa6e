//! Sliding window of recent market samples.

use std::collections::VecDeque;

/// Fixed-capacity FIFO window backing the chart.
#[derive(Debug, Clone)]
pub struct Series {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Series {
    /// Empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window pre-filled from `values`, keeping only the newest `capacity`.
    pub fn seeded(capacity: usize, values: impl IntoIterator<Item = f64>) -> Self {
        let mut series = Self::new(capacity);
        for value in values {
            series.push(value);
        }
        series
    }

    /// Append a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples the window retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples as `(index, value)` points, oldest first, for plotting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(index, value)| (index as f64, *value))
            .collect()
    }

    /// Iterate the samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_capacity() {
        let mut series = Series::new(15);
        for i in 0..100 {
            series.push(i as f64);
            assert!(series.len() <= 15);
        }
        assert_eq!(series.len(), 15);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut series = Series::new(3);
        for value in [1.0, 2.0, 3.0, 4.0] {
            series.push(value);
        }
        let kept: Vec<f64> = series.iter().collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
        assert_eq!(series.latest(), Some(4.0));
    }

    #[test]
    fn seeded_truncates_to_capacity() {
        let series = Series::seeded(2, [1.0, 2.0, 3.0]);
        let kept: Vec<f64> = series.iter().collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn points_index_from_zero() {
        let series = Series::seeded(3, [5.0, 6.0]);
        assert_eq!(series.points(), vec![(0.0, 5.0), (1.0, 6.0)]);
    }
}
