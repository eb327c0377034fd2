//! Command history
//!
//! Bounded, most-recent-first log of dispatched gestures. Every event is
//! recorded, including dry runs and unmapped gestures.

use crate::gesture::library::GestureKind;
use crate::time::timebase::Timestamp;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 900;

/// Entries shown after the latest one in [`CommandHistory::summary`]
const SUMMARY_TAIL: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub gesture: String,
    pub kind: GestureKind,
    /// Frame timestamp of the gesture
    pub timestamp: Timestamp,
    /// Wall-clock time it was dispatched
    pub at: DateTime<Local>,
}

/// Fixed-capacity ring, newest first
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl CommandHistory {
    /// A zero capacity is bumped to one so the latest entry is always kept
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, gesture: &str, kind: GestureKind, timestamp: Timestamp) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(HistoryEntry {
            gesture: gesture.to_string(),
            kind,
            timestamp,
            at: Local::now(),
        });
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Latest gesture on the first line, the previous nine joined by ` | ` on the second
    pub fn summary(&self) -> String {
        let mut names = self.entries.iter().map(|e| e.gesture.as_str());
        match names.next() {
            None => String::new(),
            Some(latest) => {
                let tail: Vec<&str> = names.take(SUMMARY_TAIL).collect();
                format!("{}\n{}", latest, tail.join(" | "))
            }
        }
    }
}
