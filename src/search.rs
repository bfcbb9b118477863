//! Query processors over postings cursors.
//!
//! Document-at-a-time evaluation: conjunction anchors on the shortest list,
//! disjunction and ranked disjunction advance a min-docid frontier.

use crate::block::NIL;
use crate::cursor::PostingsCursor;
use crate::topk::TopkQueue;
use crate::DocId;

/// TF-IDF scoring weights.
pub struct TfIdfRanker {
    num_docs: u32,
}

impl TfIdfRanker {
    /// `num_docs` is the collection size N used by the idf weight.
    pub fn new(num_docs: u32) -> Self {
        Self { num_docs }
    }

    /// `ln(1 + tf)`
    pub fn tf_weight(&self, tf: u32) -> f32 {
        (1.0 + tf as f32).ln()
    }

    /// `ln(1 + N / df)`
    pub fn idf_weight(&self, df: u32) -> f32 {
        (1.0 + self.num_docs as f32 / df as f32).ln()
    }
}

/// Boolean AND over the cursors: documents containing every term.
///
/// Cursors are reordered shortest-list-first; the shortest is the leader and
/// proposes candidates, the rest `next_geq` to each candidate and a miss
/// advances the leader to its next posting.
pub fn boolean_conjunction(cursors: &mut [PostingsCursor<'_>]) -> Vec<DocId> {
    if cursors.is_empty() {
        return Vec::new();
    }
    cursors.sort_by_key(|cursor| cursor.doc_freq());

    let mut results = Vec::new();
    let mut candidate = cursors[0].docid();
    while candidate != NIL {
        let mut all_match = true;
        for cursor in cursors.iter_mut().skip(1) {
            cursor.next_geq(candidate);
            if cursor.docid() != candidate {
                all_match = false;
                break;
            }
        }
        if all_match {
            results.push(candidate);
        }
        cursors[0].next();
        candidate = cursors[0].docid();
    }
    results
}

/// Advancement counts for one cursor during a profiled conjunction.
pub struct CursorProfile {
    /// The cursor's term.
    pub term: String,
    /// The cursor's document frequency.
    pub doc_freq: u32,
    /// How often the cursor was advanced (next_geq for followers, next for
    /// the leader).
    pub advance_count: usize,
}

/// [`boolean_conjunction`] with per-cursor advancement counts, for query
/// profiling. Profiles come back in the evaluated (df-ascending) order, the
/// leader first.
pub fn profiled_boolean_conjunction(
    cursors: &mut [PostingsCursor<'_>],
) -> (Vec<DocId>, Vec<CursorProfile>) {
    if cursors.is_empty() {
        return (Vec::new(), Vec::new());
    }
    cursors.sort_by_key(|cursor| cursor.doc_freq());

    let mut counts = vec![0usize; cursors.len()];
    let mut results = Vec::new();
    let mut candidate = cursors[0].docid();
    while candidate != NIL {
        let mut all_match = true;
        for (i, cursor) in cursors.iter_mut().enumerate().skip(1) {
            cursor.next_geq(candidate);
            counts[i] += 1;
            if cursor.docid() != candidate {
                all_match = false;
                break;
            }
        }
        if all_match {
            results.push(candidate);
        }
        counts[0] += 1;
        cursors[0].next();
        candidate = cursors[0].docid();
    }

    let profiles = cursors
        .iter()
        .zip(counts)
        .map(|(cursor, advance_count)| CursorProfile {
            term: cursor.term().to_string(),
            doc_freq: cursor.doc_freq(),
            advance_count,
        })
        .collect();
    (results, profiles)
}

/// Boolean OR over the cursors: documents containing any term.
pub fn boolean_disjunction(cursors: &mut [PostingsCursor<'_>]) -> Vec<DocId> {
    if cursors.is_empty() {
        return Vec::new();
    }
    let mut results = Vec::new();
    let mut candidate = frontier_min(cursors);
    while candidate != NIL {
        results.push(candidate);
        let mut next_doc = NIL;
        for cursor in cursors.iter_mut() {
            if cursor.docid() == candidate {
                cursor.next();
            }
            next_doc = next_doc.min(cursor.docid());
        }
        candidate = next_doc;
    }
    results
}

/// Ranked OR: the disjunction traversal, scoring each candidate with
/// `sum(tf_weight(freq) * idf_weight(df))` over the cursors that land on it
/// and offering the score to `heap`. Finalizes the heap and returns its
/// size.
pub fn ranked_disjunction(
    cursors: &mut [PostingsCursor<'_>],
    ranker: &TfIdfRanker,
    heap: &mut TopkQueue,
) -> usize {
    if cursors.is_empty() {
        return 0;
    }
    let mut candidate = frontier_min(cursors);
    while candidate != NIL {
        let mut score = 0.0f32;
        let mut next_doc = NIL;
        for cursor in cursors.iter_mut() {
            if cursor.docid() == candidate {
                score += ranker.tf_weight(cursor.freq()) * ranker.idf_weight(cursor.doc_freq());
                cursor.next();
            }
            next_doc = next_doc.min(cursor.docid());
        }
        heap.insert(score, candidate);
        candidate = next_doc;
    }
    heap.finalize();
    heap.len()
}

fn frontier_min(cursors: &[PostingsCursor<'_>]) -> DocId {
    cursors.iter().map(|cursor| cursor.docid()).min().unwrap_or(NIL)
}
