//! Bounded Ring Buffer Implementation

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default buffer capacity (30 samples = ~1s at 30fps)
pub const DEFAULT_CAPACITY: usize = 30;

/// Fixed-capacity FIFO buffer; pushing into a full buffer evicts the oldest entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingBuffer<T> {
    /// Stored samples, oldest first
    storage: VecDeque<T>,
    /// Capacity of the buffer
    capacity: usize,
    /// Total samples pushed (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (30 samples)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push a sample into the buffer (evicts oldest if full)
    pub fn push(&mut self, sample: T) -> Option<T> {
        let evicted = if self.storage.len() == self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(sample);
        self.total_written += 1;
        evicted
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.storage.iter()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Get total samples pushed, including evicted ones
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Read the last N samples (most recent first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        self.storage.iter().rev().take(count).cloned().collect()
    }

    /// Copy contents out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.iter().cloned().collect()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for sample in iter {
            self.push(sample);
        }
    }
}
