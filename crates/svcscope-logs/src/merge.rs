//! K-way merge of per-source entry sequences using a min-heap (oldest first)

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use svcscope_types::LogEntry;

use crate::buffer::TailWindow;

/// Head entry of one source in the priority queue
#[derive(Debug)]
struct HeapEntry {
    entry: LogEntry,
    source_idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap; equal times pop in source order
        other
            .entry
            .time
            .cmp(&self.entry.time)
            .then_with(|| other.source_idx.cmp(&self.source_idx))
    }
}

/// Iterator merging ascending entry sequences into one ascending sequence.
///
/// Only the head of each source is held in the heap, so entries with equal
/// times come out in source order and keep their order within a source.
pub struct MergedEntries {
    sources: Vec<std::vec::IntoIter<LogEntry>>,
    heap: BinaryHeap<HeapEntry>,
}

impl MergedEntries {
    pub fn new(sources: Vec<Vec<LogEntry>>) -> Self {
        let mut sources: Vec<_> = sources.into_iter().map(Vec::into_iter).collect();
        let mut heap = BinaryHeap::with_capacity(sources.len());

        for (source_idx, source) in sources.iter_mut().enumerate() {
            if let Some(entry) = source.next() {
                heap.push(HeapEntry { entry, source_idx });
            }
        }

        Self { sources, heap }
    }
}

impl Iterator for MergedEntries {
    type Item = LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let HeapEntry { entry, source_idx } = self.heap.pop()?;

        if let Some(next) = self.sources[source_idx].next() {
            self.heap.push(HeapEntry {
                entry: next,
                source_idx,
            });
        }

        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.heap.len() + self.sources.iter().map(|s| s.len()).sum::<usize>();
        (remaining, Some(remaining))
    }
}

/// Merge ascending sequences, keeping only the `limit` most recent entries.
///
/// The window holds the tail of the full ascending merge, never its head.
pub fn merge_entries(sources: Vec<Vec<LogEntry>>, limit: Option<usize>) -> TailWindow {
    let mut window = match limit {
        Some(limit) => TailWindow::new(limit),
        None => TailWindow::unbounded(),
    };
    window.extend(MergedEntries::new(sources));
    window
}
