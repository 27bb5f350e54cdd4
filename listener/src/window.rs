use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer of the most recent temperatures for one stream.
///
/// Pushing onto a full window evicts the oldest value. There is no other way
/// to remove values; the window lives as long as its owning monitor.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl SlidingWindow {
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Values oldest first, most recent last.
    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn newest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.values.front().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
