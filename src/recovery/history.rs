//! Bounded history of recent recovery results.

use std::collections::VecDeque;

use super::result::RecoveryResult;

/// Default number of results kept
pub const DEFAULT_RECENT_CAPACITY: usize = 20;

/// Ring buffer of the most recent results; the oldest entry is evicted
/// once capacity is reached.
#[derive(Debug, Clone)]
pub struct RecentResults {
    capacity: usize,
    results: VecDeque<RecoveryResult>,
}

impl RecentResults {
    /// A capacity of zero keeps nothing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            results: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: RecoveryResult) {
        if self.capacity == 0 {
            return;
        }
        if self.results.len() == self.capacity {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RecoveryResult> {
        self.results.iter()
    }

    pub fn latest(&self) -> Option<&RecoveryResult> {
        self.results.back()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

impl Default for RecentResults {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }
}
