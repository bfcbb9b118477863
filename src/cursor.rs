//! Cursors over one term's postings chain.
//!
//! A cursor borrows the index immutably for its lifetime, walks the chain
//! head -> torso* -> tail, and exposes the classic docid/freq iteration
//! surface plus `next_geq` with block-level skipping: a single decode of the
//! block-leading gap decides whether to descend into a block at all.

use tracing::warn;

use crate::block::{BLOCK_SIZE, MAX_SLAB_IDX, NIL, TT_PL_OFFSET};
use crate::index::BlockIndex;
use crate::query::Query;
use crate::DocId;

/// A read cursor over one term's chain.
///
/// Construction seats the cursor on the first posting, so `docid()` and
/// `freq()` are immediately meaningful on a valid cursor. An exhausted
/// cursor reports [`NIL`] as its docid.
pub struct PostingsCursor<'a> {
    index: &'a BlockIndex,
    term: String,
    head_block: u32,
    tail_block: u32,
    doc_freq: u32,
    current_block: u32,
    current_offset: usize,
    /// Sum of between-block gaps up to the current block: the docid of the
    /// current block's first posting.
    gap_accumulator: u32,
    current_docid: u32,
    current_tf: u32,
    /// Logical blocks visited since the head, saturating; indexes the slab
    /// table for the current block's byte capacity.
    block_count: u32,
}

impl<'a> PostingsCursor<'a> {
    /// Look `term` up and seat a cursor on its first posting. A term absent
    /// from the directory yields an invalid cursor (and a warning).
    pub fn new(index: &'a BlockIndex, term: &str) -> Self {
        let mut cursor = Self {
            index,
            term: term.to_string(),
            head_block: NIL,
            tail_block: NIL,
            doc_freq: 0,
            current_block: NIL,
            current_offset: 0,
            gap_accumulator: 0,
            current_docid: 0,
            current_tf: 0,
            block_count: 0,
        };
        let head = index.head_for_term(term);
        if head == NIL {
            // Trivially exhausted: processors can carry an invalid cursor
            // without special-casing it.
            cursor.current_docid = NIL;
            warn!(term, "term not found in directory");
        } else {
            cursor.head_block = head;
            cursor.current_block = head;
            cursor.tail_block = index.tail_block_of(head);
            cursor.doc_freq = index.doc_freq_of(head);
            cursor.current_offset = index.head_data_offset(head);
            cursor.next();
        }
        cursor
    }

    /// False when the term was not found.
    pub fn valid(&self) -> bool {
        self.head_block != NIL
    }

    /// Number of postings in this term's chain.
    pub fn doc_freq(&self) -> u32 {
        self.doc_freq
    }

    /// Current document id, or [`NIL`] when exhausted.
    pub fn docid(&self) -> DocId {
        self.current_docid
    }

    /// In-document frequency at the current posting.
    pub fn freq(&self) -> u32 {
        self.current_tf
    }

    /// The term this cursor iterates.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Reseat the cursor on the first posting.
    pub fn reset(&mut self) {
        if !self.valid() {
            return;
        }
        self.current_block = self.head_block;
        self.current_offset = self.index.head_data_offset(self.head_block);
        self.current_docid = 0;
        self.gap_accumulator = 0;
        self.block_count = 0;
        self.next();
    }

    /// Advance to the next posting. Exhausted cursors stay exhausted.
    pub fn next(&mut self) {
        if self.current_block == NIL {
            return;
        }
        let cap = self.index.slab_size(self.block_count) * BLOCK_SIZE;
        if self.current_offset < cap && self.index.has_data(self.current_block, self.current_offset)
        {
            let (gap, tf) = self.index.pair_at(self.current_block, &mut self.current_offset);
            self.current_docid += gap;
            self.current_tf = tf;
        } else {
            self.block_count = (self.block_count + 1).min(MAX_SLAB_IDX);
            let next_block = self.index.chain_next(self.current_block, self.tail_block);
            if next_block == NIL {
                self.current_block = NIL;
                self.current_docid = NIL;
                return;
            }
            self.current_block = next_block;
            self.current_offset = TT_PL_OFFSET;
            // A fresh block leads with its b-gap.
            let (gap, tf) = self.index.pair_at(self.current_block, &mut self.current_offset);
            self.gap_accumulator += gap;
            self.current_docid = self.gap_accumulator;
            self.current_tf = tf;
        }
    }

    /// Advance to the first posting with docid >= `target`. No-op when the
    /// cursor is already there.
    ///
    /// Skips whole logical blocks while the next block still starts below
    /// the target, keeping a previous-block fallback for the overshoot case,
    /// then realigns to the chosen block's first posting and walks within it.
    pub fn next_geq(&mut self, target: DocId) {
        if target <= self.current_docid {
            return;
        }

        let mut current_block = self.current_block;
        let mut current_docid = self.gap_accumulator;
        let mut prev_block = self.current_block;
        let mut prev_docid = self.gap_accumulator;
        let mut block_count = self.block_count;

        while current_docid < target && current_block != NIL {
            prev_block = current_block;
            prev_docid = current_docid;
            block_count += 1;
            current_block = self.index.chain_next(current_block, self.tail_block);
            if current_block != NIL {
                let mut probe_offset = TT_PL_OFFSET;
                let (gap, _) = self.index.pair_at(current_block, &mut probe_offset);
                current_docid += gap;
            }
        }

        if current_docid > target || current_block == NIL {
            // Overshot (or ran out): the target, if present, is in the
            // previous block.
            self.current_block = prev_block;
            self.gap_accumulator = prev_docid;
            self.current_docid = prev_docid;
            self.block_count = block_count - 1;
        } else {
            self.current_block = current_block;
            self.gap_accumulator = current_docid;
            self.current_docid = current_docid;
            self.block_count = block_count;
        }

        // Realign to the block's first posting before the within-block walk.
        if self.current_block == self.head_block {
            let mut offset = self.index.head_data_offset(self.current_block);
            let (gap, tf) = self.index.pair_at(self.current_block, &mut offset);
            self.current_docid = gap;
            self.current_tf = tf;
            self.current_offset = offset;
        } else {
            let mut offset = TT_PL_OFFSET;
            let (_, tf) = self.index.pair_at(self.current_block, &mut offset);
            self.current_tf = tf;
            self.current_offset = offset;
        }

        self.block_count = self.block_count.min(MAX_SLAB_IDX);
        self.advance_to_id(target);
    }

    /// Within-block walk to the first docid >= `target`.
    fn advance_to_id(&mut self, target: DocId) {
        while self.current_docid < target {
            self.next();
        }
    }
}

/// Build one cursor per query term.
///
/// Terms the index has never seen yield trivially exhausted cursors: a
/// disjunction ignores them, a conjunction over them is empty.
pub fn cursors_for_query<'a>(index: &'a BlockIndex, query: &Query) -> Vec<PostingsCursor<'a>> {
    query.terms.iter().map(|term| PostingsCursor::new(index, term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Enough postings for several logical blocks under triangular growth.
    fn build_index(docids: &[(u32, u32)]) -> BlockIndex {
        let mut idx = BlockIndex::new(1 << 14, 128);
        for &(docid, freq) in docids {
            idx.insert(docid, "term", freq).unwrap();
        }
        idx
    }

    fn evens(n: u32) -> Vec<(u32, u32)> {
        (1..=n).map(|i| (i * 2, (i % 4) + 1)).collect()
    }

    #[test]
    fn construction_seats_on_the_first_posting() {
        let idx = build_index(&[(7, 3), (9, 1)]);
        let cursor = PostingsCursor::new(&idx, "term");
        assert!(cursor.valid());
        assert_eq!(cursor.doc_freq(), 2);
        assert_eq!(cursor.docid(), 7);
        assert_eq!(cursor.freq(), 3);
    }

    #[test]
    fn missing_term_yields_invalid_cursor() {
        let idx = build_index(&[(1, 1)]);
        let cursor = PostingsCursor::new(&idx, "absent");
        assert!(!cursor.valid());
    }

    #[test]
    fn iteration_visits_every_posting_in_order() {
        let postings = evens(3000);
        let idx = build_index(&postings);
        let mut cursor = PostingsCursor::new(&idx, "term");
        for &(docid, freq) in &postings {
            assert_eq!(cursor.docid(), docid);
            assert_eq!(cursor.freq(), freq);
            cursor.next();
        }
        assert_eq!(cursor.docid(), NIL);
        // Walking off the end stays exhausted.
        cursor.next();
        assert_eq!(cursor.docid(), NIL);
    }

    #[test]
    fn reset_rewinds_to_the_first_posting() {
        let postings = evens(500);
        let idx = build_index(&postings);
        let mut cursor = PostingsCursor::new(&idx, "term");
        for _ in 0..300 {
            cursor.next();
        }
        cursor.reset();
        assert_eq!(cursor.docid(), 2);
        let mut count = 0;
        while cursor.docid() != NIL {
            count += 1;
            cursor.next();
        }
        assert_eq!(count, 500);
    }

    #[test]
    fn next_geq_lands_on_present_docid() {
        let idx = build_index(&evens(3000));
        let mut cursor = PostingsCursor::new(&idx, "term");
        cursor.next_geq(4000);
        assert_eq!(cursor.docid(), 4000);
    }

    #[test]
    fn next_geq_lands_past_absent_docid() {
        let idx = build_index(&evens(3000));
        let mut cursor = PostingsCursor::new(&idx, "term");
        cursor.next_geq(3999);
        assert_eq!(cursor.docid(), 4000);
    }

    #[test]
    fn next_geq_within_current_block_is_a_within_block_walk() {
        let idx = build_index(&evens(50));
        let mut cursor = PostingsCursor::new(&idx, "term");
        cursor.next_geq(20);
        assert_eq!(cursor.docid(), 20);
        cursor.next_geq(20);
        assert_eq!(cursor.docid(), 20);
    }

    #[test]
    fn next_geq_past_the_end_exhausts() {
        let idx = build_index(&evens(100));
        let mut cursor = PostingsCursor::new(&idx, "term");
        cursor.next_geq(1_000_000);
        assert_eq!(cursor.docid(), NIL);
    }

    #[test]
    fn next_geq_is_a_noop_at_or_behind_the_cursor() {
        let idx = build_index(&evens(100));
        let mut cursor = PostingsCursor::new(&idx, "term");
        cursor.next_geq(50);
        let here = cursor.docid();
        cursor.next_geq(10);
        assert_eq!(cursor.docid(), here);
    }

    proptest! {
        #[test]
        fn staged_next_geq_matches_direct(
            mut docids in prop::collection::vec(1u32..100_000, 10..400),
            x in 1u32..100_000,
            y in 1u32..100_000,
        ) {
            docids.sort_unstable();
            docids.dedup();
            let postings: Vec<(u32, u32)> = docids.iter().map(|&d| (d, 1)).collect();
            let idx = build_index(&postings);

            let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
            let mut staged = PostingsCursor::new(&idx, "term");
            staged.next_geq(lo);
            staged.next_geq(hi);

            let mut direct = PostingsCursor::new(&idx, "term");
            direct.next_geq(hi);

            prop_assert_eq!(staged.docid(), direct.docid());
        }

        #[test]
        fn next_geq_agrees_with_linear_scan(
            mut docids in prop::collection::vec(1u32..50_000, 10..300),
            target in 1u32..50_000,
        ) {
            docids.sort_unstable();
            docids.dedup();
            let postings: Vec<(u32, u32)> = docids.iter().map(|&d| (d, 1)).collect();
            let idx = build_index(&postings);

            let mut skipping = PostingsCursor::new(&idx, "term");
            skipping.next_geq(target);

            let expected = docids.iter().copied().find(|&d| d >= target).unwrap_or(NIL);
            prop_assert_eq!(skipping.docid(), expected);
        }
    }
}
