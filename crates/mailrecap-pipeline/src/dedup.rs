use std::collections::{HashSet, VecDeque};

pub const DEFAULT_TRACKER_CAPACITY: usize = 1000;

/// Bounded, process-local cache of recently processed message IDs.
///
/// A set gives O(1) membership; a FIFO of the same capacity tracks insertion
/// order so that overflow evicts exactly the single oldest entry from both
/// structures. This is an optimization in front of the persisted
/// `message_id` lookup, never a replacement for it.
#[derive(Debug)]
pub struct DedupTracker {
    seen: HashSet<String>,
    recent: VecDeque<String>,
    capacity: usize,
}

impl DedupTracker {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn is_duplicate(&self, message_id: &str) -> bool {
        self.seen.contains(message_id)
    }

    pub fn mark_processed(&mut self, message_id: &str) {
        if !self.seen.insert(message_id.to_string()) {
            // Already tracked; re-marking must not push a second queue entry.
            return;
        }
        self.recent.push_back(message_id.to_string());

        if self.recent.len() > self.capacity {
            if let Some(oldest) = self.recent.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.recent.clear();
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

impl Default for DedupTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKER_CAPACITY)
    }
}
