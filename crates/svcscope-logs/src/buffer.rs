use std::collections::VecDeque;

use svcscope_types::LogEntry;

/// Bounded window keeping the most recently pushed entries
#[derive(Clone, Debug)]
pub struct TailWindow {
    /// Internal storage, oldest first
    entries: VecDeque<LogEntry>,

    /// Maximum capacity, `None` for unbounded
    capacity: Option<usize>,

    /// Entries pushed out to respect the capacity
    evicted: usize,
}

impl TailWindow {
    /// Create a window holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            // Capacity is caller-supplied and may be far larger than the input
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: Some(capacity),
            evicted: 0,
        }
    }

    /// Create a window that keeps everything
    pub fn unbounded() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: None,
            evicted: 0,
        }
    }

    /// Push a new entry, evicting oldest if at capacity
    pub fn push(&mut self, entry: LogEntry) {
        match self.capacity {
            Some(0) => {
                self.evicted += 1;
                return;
            }
            Some(capacity) if self.entries.len() >= capacity => {
                self.entries.pop_front();
                self.evicted += 1;
            }
            _ => {}
        }
        self.entries.push_back(entry);
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries dropped to stay within capacity
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Take the retained entries, oldest first
    pub fn into_vec(self) -> Vec<LogEntry> {
        self.entries.into()
    }
}

impl Extend<LogEntry> for TailWindow {
    fn extend<I: IntoIterator<Item = LogEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}
