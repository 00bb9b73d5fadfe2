use std::collections::VecDeque;

use crate::models::ScanHistoryEntry;

pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Bounded, most-recent-first record of confirmed scans.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<ScanHistoryEntry>,
    max_size: usize,
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl ScanHistory {
    pub fn new(max_size: usize) -> Self {
        let max_size = if max_size == 0 { DEFAULT_HISTORY_SIZE } else { max_size };
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn add(&mut self, entry: ScanHistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.max_size);
    }

    /// Snapshot copy; the caller may mutate it freely.
    pub fn list(&self) -> Vec<ScanHistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Zero is ignored. Shrinking drops the oldest entries right away.
    pub fn set_max_size(&mut self, max_size: usize) {
        if max_size == 0 {
            return;
        }
        self.max_size = max_size;
        self.entries.truncate(max_size);
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
