use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Per-key bounded history of event timestamps used for velocity checks.
///
/// Each key keeps at most `capacity` timestamps in ascending order; the oldest
/// is evicted when a new one arrives at capacity. Sustained rates above
/// `capacity` per window therefore undercount, so size the capacity above the
/// velocity threshold.
#[derive(Debug, Clone)]
pub struct EventRateTracker {
    capacity: usize,
    events: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl EventRateTracker {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "EventRateTracker capacity must be non-zero");
        Self {
            capacity,
            events: HashMap::new(),
        }
    }

    /// Record an event for `key`, creating its history on first use
    pub fn record(&mut self, key: &str, timestamp: DateTime<Utc>) {
        let capacity = self.capacity;
        let history = self
            .events
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        // Late arrivals are placed in order so the history stays ascending
        match history.back() {
            Some(last) if timestamp < *last => {
                let pos = history.partition_point(|t| *t <= timestamp);
                history.insert(pos, timestamp);
            }
            _ => history.push_back(timestamp),
        }

        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    /// Number of stored timestamps for `key` strictly after `cutoff`
    pub fn count_since(&self, key: &str, cutoff: DateTime<Utc>) -> usize {
        self.events
            .get(key)
            .map(|history| history.len() - history.partition_point(|t| *t <= cutoff))
            .unwrap_or(0)
    }

    /// Number of timestamps currently stored for `key`
    pub fn len(&self, key: &str) -> usize {
        self.events.get(key).map(VecDeque::len).unwrap_or(0)
    }

    pub fn key_count(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
