//! Capacity-capped history buffer
//!
//! Used for execution records and the message log. Pushing past capacity
//! evicts the oldest entries first; readers always see insertion order.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Thread-safe ring buffer of the most recent `capacity` entries
#[derive(Debug)]
pub struct BoundedHistory<T> {
    capacity: usize,
    entries: Mutex<VecDeque<T>>,
}

impl<T: Clone> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Append an entry, returning how many old entries were evicted
    pub fn push(&self, entry: T) -> usize {
        let mut entries = self.entries.lock();
        entries.push_back(entry);

        let mut evicted = 0;
        while entries.len() > self.capacity {
            entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// The newest `limit` entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<T> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// The newest `limit` entries matching `predicate`, oldest first
    pub fn recent_matching<F>(&self, limit: usize, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let entries = self.entries.lock();
        let mut matched: Vec<T> = entries
            .iter()
            .rev()
            .filter(|entry| predicate(entry))
            .take(limit)
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
