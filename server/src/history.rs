//! Ordered in-memory log of draw operations for the shared canvas.
//!
//! Ordinals are assigned here, never by clients. The log is bounded: once it
//! grows past `cap` the oldest operations are drained from the front. A clear
//! drops everything but keeps the ordinal counter running.

use std::collections::VecDeque;
use std::ops::Range;

use syncboard_shared::{DrawOperation, HistoryFileData, Segment};

pub const DEFAULT_HISTORY_CAP: usize = 20_000;

pub struct HistoryStore {
    operations: VecDeque<DrawOperation>,
    next_sequence: u64,
    cap: usize,
    dirty: bool,
}

impl HistoryStore {
    pub fn new(cap: usize) -> Self {
        Self {
            operations: VecDeque::new(),
            next_sequence: 1,
            cap: cap.max(1),
            dirty: false,
        }
    }

    /// Rebuilds the store from persisted data. Operations are re-sorted and the
    /// cap is applied, so a file written with a larger cap still loads.
    pub fn restore(data: HistoryFileData, cap: usize) -> Self {
        let mut operations = data.operations;
        operations.sort_by_key(|operation| operation.sequence);
        let last = operations.last().map_or(0, |operation| operation.sequence);
        let mut store = Self {
            operations: operations.into(),
            next_sequence: data.next_sequence.max(last + 1),
            cap: cap.max(1),
            dirty: false,
        };
        store.trim();
        store
    }

    /// Appends a batch, assigning contiguous ordinals in batch order, and
    /// returns the assigned range.
    pub fn append<I>(&mut self, segments: I) -> Range<u64>
    where
        I: IntoIterator<Item = Segment>,
    {
        let start = self.next_sequence;
        for segment in segments {
            self.operations.push_back(DrawOperation {
                sequence: self.next_sequence,
                segment,
            });
            self.next_sequence += 1;
        }
        if self.next_sequence != start {
            self.dirty = true;
            self.trim();
        }
        start..self.next_sequence
    }

    pub fn snapshot(&self) -> Vec<DrawOperation> {
        self.operations.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the data to persist if anything changed since the last call.
    pub fn take_dirty(&mut self) -> Option<HistoryFileData> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(HistoryFileData {
            next_sequence: self.next_sequence,
            operations: self.snapshot(),
        })
    }

    /// Re-arms persistence after a failed save.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn trim(&mut self) {
        let overflow = self.operations.len().saturating_sub(self.cap);
        if overflow > 0 {
            self.operations.drain(..overflow);
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
