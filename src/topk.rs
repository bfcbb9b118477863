//! Top-k document priority queue.
//!
//! A min-heap bounded at k entries. Once full, a new entry must beat the
//! score on top of the heap (the threshold) to enter; the displaced minimum
//! is dropped so the heap never grows past k. Entries are unsorted until
//! `finalize`, which produces the descending-score result list.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::{self, Write};

use crate::DocId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f32,
    docid: DocId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Inverted so the binary heap surfaces the lowest score; equal scores
    // surface the larger docid, so earlier insertions survive eviction.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.docid.cmp(&other.docid))
    }
}

/// Bounded top-k queue with an entry threshold.
pub struct TopkQueue {
    k: usize,
    threshold: f32,
    heap: BinaryHeap<Entry>,
    sorted: Vec<(f32, DocId)>,
}

impl TopkQueue {
    /// A queue holding at most `k` entries, threshold starting at zero.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            threshold: 0.0,
            heap: BinaryHeap::with_capacity(k + 1),
            sorted: Vec::new(),
        }
    }

    /// Whether an entry with `score` would currently be admitted.
    pub fn would_enter(&self, score: f32) -> bool {
        score > self.threshold
    }

    /// Offer an entry. Returns false when the score does not beat the
    /// threshold; otherwise the entry is admitted and, if the queue is full,
    /// the minimum is dropped.
    pub fn insert(&mut self, score: f32, docid: DocId) -> bool {
        if !self.would_enter(score) {
            return false;
        }
        self.heap.push(Entry { score, docid });
        if self.heap.len() > self.k {
            self.heap.pop();
        }
        if self.heap.len() == self.k {
            if let Some(min) = self.heap.peek() {
                self.threshold = min.score;
            }
        }
        true
    }

    /// Sort the accumulated entries into descending-score order (ties by
    /// ascending docid, which is insertion order for docid-ordered
    /// traversals) and drop non-positive scores. The queue must not be
    /// inserted into afterwards until [`clear`](Self::clear).
    pub fn finalize(&mut self) {
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.docid.cmp(&b.docid))
        });
        entries.retain(|entry| entry.score > 0.0);
        self.sorted = entries.into_iter().map(|entry| (entry.score, entry.docid)).collect();
    }

    /// The finalized (score, docid) list, descending.
    pub fn topk(&self) -> &[(f32, DocId)] {
        &self.sorted
    }

    /// Current admission threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Empty the queue and reset the threshold for the next query.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.sorted.clear();
        self.threshold = 0.0;
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Current number of entries (heap before finalize, list after).
    pub fn len(&self) -> usize {
        self.heap.len() + self.sorted.len()
    }

    /// True when no entries have been admitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dump the finalized results as TREC run lines:
    /// `qid Q0 docid rank score tag`.
    pub fn write_trec<W: Write>(&self, qid: &str, tag: &str, out: &mut W) -> io::Result<()> {
        for (rank, (score, docid)) in self.sorted.iter().enumerate() {
            writeln!(out, "{qid} Q0 {docid} {rank} {score} {tag}")?;
        }
        Ok(())
    }
}
