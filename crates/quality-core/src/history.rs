//! Bounded, append-only logs
//!
//! Snapshots and per-interval scores are kept in FIFO logs with a fixed
//! capacity. Once the capacity is reached every push evicts the oldest entry,
//! so memory stays bounded no matter how long a probe runs.

use std::collections::VecDeque;

use crate::stats::StatSnapshot;

/// Snapshot history, oldest first
pub type History = BoundedLog<StatSnapshot>;

/// Per-interval scores for one media kind, oldest first
pub type ScoreLog = BoundedLog<f64>;

/// Fixed-capacity FIFO log with O(1) eviction
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    cap: usize,
}

impl<T> BoundedLog<T> {
    /// Create an empty log holding at most `cap` entries (never less than one)
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    /// Create a log from existing entries, keeping only the newest `cap`
    pub fn from_entries(cap: usize, entries: impl IntoIterator<Item = T>) -> Self {
        let mut log = Self::new(cap);
        for entry in entries {
            log.push(entry);
        }
        log
    }

    /// Append an entry, returning the evicted entry if the log was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() == self.cap {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// The two most recent entries as `(previous, current)`
    pub fn last_pair(&self) -> Option<(&T, &T)> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        Some((&self.entries[len - 2], &self.entries[len - 1]))
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Iterate over the newest `n` entries, oldest first
    pub fn tail(&self, n: usize) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.range(skip..)
    }
}

impl BoundedLog<f64> {
    /// Sum of all entries
    pub fn sum(&self) -> f64 {
        self.entries.iter().sum()
    }

    /// Arithmetic mean of all entries, zero when empty
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.sum() / self.entries.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_below_cap() {
        let mut log = BoundedLog::new(3);
        assert!(log.is_empty());
        assert_eq!(log.push(1), None);
        assert_eq!(log.push(2), None);
        assert_eq!(log.len(), 2);
        assert_eq!(log.latest(), Some(&2));
        assert_eq!(log.last_pair(), Some((&1, &2)));
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut log = BoundedLog::new(3);
        for i in 0..3 {
            log.push(i);
        }
        assert_eq!(log.push(3), Some(0));
        assert_eq!(log.push(4), Some(1));
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(log.len(), log.cap());
    }

    #[test]
    fn test_last_pair_survives_eviction() {
        let mut log = BoundedLog::new(2);
        log.push("a");
        log.push("b");
        log.push("c");
        assert_eq!(log.last_pair(), Some((&"b", &"c")));
    }

    #[test]
    fn test_tail() {
        let log = BoundedLog::from_entries(10, 0..6);
        assert_eq!(log.tail(3).copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(log.tail(100).count(), 6);
        assert_eq!(log.tail(0).count(), 0);
    }

    #[test]
    fn test_zero_cap_holds_one() {
        let mut log = BoundedLog::new(0);
        log.push(1);
        log.push(2);
        assert_eq!(log.cap(), 1);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_score_sum_and_mean() {
        let log: ScoreLog = BoundedLog::from_entries(10, [1.0, 2.0, 4.5]);
        assert_eq!(log.sum(), 7.5);
        assert_eq!(log.mean(), 2.5);
        assert_eq!(ScoreLog::new(10).mean(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_cap(cap in 1usize..64, pushes in 0usize..500) {
            let mut log = BoundedLog::new(cap);
            for i in 0..pushes {
                log.push(i);
                prop_assert!(log.len() <= cap);
            }
            prop_assert_eq!(log.len(), pushes.min(cap));
            if pushes > 0 {
                prop_assert_eq!(log.latest(), Some(&(pushes - 1)));
            }
        }
    }
}
