use std::collections::VecDeque;

use crate::signal::ScopeError;

/// One value on the shared x axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub index: u64,
    pub value: f64,
}

impl Sample {
    pub fn new(index: u64, value: f64) -> Self {
        Self { index, value }
    }

    pub fn point(&self) -> [f64; 2] {
        [self.index as f64, self.value]
    }
}

/// Fixed-capacity FIFO of samples; the oldest sample is evicted once full.
#[derive(Clone, Debug)]
pub struct SlidingWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SlidingWindow {
    /// Creates a window already holding `capacity` zero samples at indices
    /// `0..capacity`, so a renderer has a full-width trace before data arrives.
    pub fn prefilled(capacity: usize) -> Result<Self, ScopeError> {
        let mut window = Self::empty(capacity)?;
        for index in 0..capacity as u64 {
            window.samples.push_back(Sample::new(index, 0.0));
        }
        Ok(window)
    }

    pub fn empty(capacity: usize) -> Result<Self, ScopeError> {
        if capacity == 0 {
            return Err(ScopeError::InvalidCapacity);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefilled_window_is_full_of_zeros() {
        let window = SlidingWindow::prefilled(200).unwrap();
        assert_eq!(window.len(), 200);
        assert!(window.is_full());
        assert!(window.values().iter().all(|v| *v == 0.0));
        assert_eq!(window.indices(), (0..200).collect::<Vec<u64>>());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            SlidingWindow::prefilled(0),
            Err(ScopeError::InvalidCapacity)
        ));
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = SlidingWindow::empty(5).unwrap();
        for i in 0..12u64 {
            window.push(Sample::new(i, i as f64));
            assert!(window.len() <= window.capacity());
            if i >= 4 {
                assert_eq!(window.len(), 5);
            }
        }
    }

    #[test]
    fn push_into_full_window_evicts_oldest() {
        let mut window = SlidingWindow::prefilled(4).unwrap();
        for i in 0..3u64 {
            window.push(Sample::new(10 + i, i as f64 + 1.0));
        }
        let before = window.snapshot();
        window.push(Sample::new(20, 9.0));
        let after = window.snapshot();
        assert_eq!(after[0], before[1]);
        assert_eq!(after.last(), Some(&Sample::new(20, 9.0)));
        assert_eq!(after.len(), 4);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut window = SlidingWindow::empty(3).unwrap();
        window.push(Sample::new(0, 1.0));
        window.push(Sample::new(1, 2.0));
        let first = window.snapshot();
        let second = window.snapshot();
        assert_eq!(first, second);
        assert_eq!(window.latest(), Some(Sample::new(1, 2.0)));
    }
}
