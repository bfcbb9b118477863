//! The block-chained index: arena, term directory, builder and serializers.
//!
//! One `BlockIndex` owns a contiguous zero-initialized arena of fixed-size
//! physical blocks and an open-addressing directory from term to head-block
//! index. Postings are appended per term into the chain's tail block,
//! growing the chain by a freshly bump-allocated slab when the tail fills.
//! Blocks are granted monotonically and never freed.
//!
//! Build calls must arrive in non-decreasing document order; the builder does
//! not detect violations (the gap arithmetic relies on the contract).

use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};

use blockpost_codec::{magic, vbyte};
use rustc_hash::FxHasher;

use crate::block::{
    GrowthPolicy, HeadMut, HeadRef, SlabTable, TailMut, TailRef, TorsoMut, BLOCK_SIZE, HEAD_BYTES,
    MAX_SLAB_IDX, NIL, TT_PL_OFFSET,
};
use crate::{DocId, Error, Result};

/// Directory slots per vocabulary term (load factor 0.5).
pub const HASH_VOCAB_MULTIPLE: usize = 2;

/// Sizing guess for the number of bytes in a word.
pub const AVERAGE_WORD_BYTES: usize = 8;

/// An in-memory inverted index over block-chained postings.
pub struct BlockIndex {
    data: Vec<u8>,
    next_empty: usize,
    directory: Vec<u32>,
    slabs: SlabTable,
}

impl BlockIndex {
    /// Create an index with room for `no_blocks` physical blocks and a
    /// directory of `no_hash_slots` entries, using the default (triangular)
    /// growth policy.
    pub fn new(no_blocks: usize, no_hash_slots: usize) -> Self {
        Self::with_growth(no_blocks, no_hash_slots, GrowthPolicy::default())
    }

    /// Create an index with an explicit growth policy.
    pub fn with_growth(no_blocks: usize, no_hash_slots: usize, policy: GrowthPolicy) -> Self {
        Self {
            data: vec![0u8; no_blocks.max(1) * BLOCK_SIZE],
            next_empty: 0,
            directory: vec![NIL; no_hash_slots.max(1)],
            slabs: SlabTable::new(policy),
        }
    }

    /// Size an index from collection statistics: 150% of the estimated raw
    /// postings bytes, and two directory slots per vocabulary term.
    pub fn sized_for(total_postings: usize, unique_terms: usize) -> Self {
        let blocks = (1.5 * (total_postings * AVERAGE_WORD_BYTES) as f64 / BLOCK_SIZE as f64) as usize;
        Self::new(blocks, unique_terms * HASH_VOCAB_MULTIPLE)
    }

    /// Physical blocks handed out so far.
    pub fn blocks_in_use(&self) -> usize {
        self.next_empty
    }

    /// Total physical blocks the arena can hold.
    pub fn block_capacity(&self) -> usize {
        self.data.len() / BLOCK_SIZE
    }

    /// Number of directory slots.
    pub fn directory_size(&self) -> usize {
        self.directory.len()
    }

    /// Walk the vocabulary: every (term, head block) pair, in directory
    /// order.
    pub fn terms(&self) -> impl Iterator<Item = (String, u32)> + '_ {
        self.directory.iter().filter(|&&entry| entry != NIL).map(move |&head_idx| {
            let head = self.head(head_idx);
            (String::from_utf8_lossy(head.term_bytes()).into_owned(), head_idx)
        })
    }

    /// Insert a posting: `term` occurs `freq` times in `docid`.
    ///
    /// Documents must arrive in non-decreasing docid order, and a given
    /// (docid, term) pair must be inserted at most once.
    pub fn insert(&mut self, docid: DocId, term: &str, freq: u32) -> Result<()> {
        let head_index = self.head_for_insert(term)?;

        let head = self.head(head_index);
        let doc_gap = docid - head.recent_docid();
        let current_block = head.tail_block();
        let write_offset = head.tail_byte_offset() as usize;
        let growth = head.growth_offset() as u32;
        {
            let mut head = self.head_mut(head_index);
            head.increment_doc_freq();
            head.set_recent_docid(docid);
        }

        let need = magic::bytes_required(doc_gap, freq);
        let cap = self.slabs.size(growth) * BLOCK_SIZE;
        if write_offset + need <= cap {
            let written = self.encode_pair_at(current_block, write_offset, doc_gap, freq);
            self.head_mut(head_index).advance_tail_byte_offset(written as u16);
        } else {
            let (new_block, b_gap) = self.grow_chain(head_index, current_block, docid, 0)?;
            let written = self.encode_pair_at(new_block, TT_PL_OFFSET, b_gap, freq);
            self.head_mut(head_index).advance_tail_byte_offset(written as u16);
        }
        Ok(())
    }

    /// Insert a positional posting: `term` occurs in `docid` at the given
    /// 1-based word positions, all at once.
    ///
    /// Each occurrence is encoded as a (word-gap, doc-gap) pair. The head's
    /// recent docid is stored as `docid - 1` so the per-occurrence doc gap of
    /// 1 keeps every emitted gap non-zero.
    pub fn insert_positions(&mut self, docid: DocId, term: &str, positions: &[u32]) -> Result<()> {
        let head_index = self.head_for_insert(term)?;

        let mut doc_gap = docid - self.head(head_index).recent_docid();
        {
            let mut head = self.head_mut(head_index);
            head.increment_doc_freq();
            head.set_recent_docid(docid - 1);
        }

        let mut last_word_pos = 0u32;
        for &pos in positions {
            let word_gap = pos - last_word_pos;
            last_word_pos = pos;

            let head = self.head(head_index);
            let current_block = head.tail_block();
            let write_offset = head.tail_byte_offset() as usize;
            let growth = head.growth_offset() as u32;

            // Word gap first: positions are usually the smaller value.
            let need = magic::bytes_required(word_gap, doc_gap);
            let cap = self.slabs.size(growth) * BLOCK_SIZE;
            if write_offset + need <= cap {
                let written = self.encode_pair_at(current_block, write_offset, word_gap, doc_gap);
                self.head_mut(head_index).advance_tail_byte_offset(written as u16);
            } else {
                // The block-leading entry is two plain VBytes, b-gap first:
                // the decoder expects the raw doc gap at the front of a block.
                let (new_block, b_gap) = self.grow_chain(head_index, current_block, docid, 1)?;
                let written = self.encode_u32_at(new_block, TT_PL_OFFSET, b_gap);
                self.head_mut(head_index).advance_tail_byte_offset(written as u16);
                let offset = self.head(head_index).tail_byte_offset() as usize;
                let written = self.encode_u32_at(new_block, offset, word_gap);
                self.head_mut(head_index).advance_tail_byte_offset(written as u16);
            }
            doc_gap = 1;
        }
        Ok(())
    }

    /// Write the raw snapshot: block count, directory size, directory, then
    /// the in-use arena bytes. No reordering.
    pub fn serialize<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&(self.next_empty as u64).to_le_bytes())?;
        out.write_all(&(self.directory.len() as u64).to_le_bytes())?;
        for &entry in &self.directory {
            out.write_all(&entry.to_le_bytes())?;
        }
        out.write_all(&self.data[..self.next_empty * BLOCK_SIZE])?;
        Ok(())
    }

    /// Write a compacted snapshot: chains are streamed contiguously in
    /// directory order, with next/tail pointers rewritten to the relocated
    /// physical indices, and the directory is rewritten in place afterwards.
    ///
    /// This consumes the index's usefulness as a builder (pointers are
    /// patched in place); serialization is terminal.
    pub fn serialize_pack<W: Write + Seek>(&mut self, out: &mut W) -> Result<()> {
        out.write_all(&(self.next_empty as u64).to_le_bytes())?;
        out.write_all(&(self.directory.len() as u64).to_le_bytes())?;

        // The directory is rewritten once the new head offsets are known.
        let directory_offset = out.stream_position()?;
        for &entry in &self.directory {
            out.write_all(&entry.to_le_bytes())?;
        }

        let mut next_idx: u32 = 0;
        for slot in 0..self.directory.len() {
            let head_block_idx = self.directory[slot];
            if head_block_idx == NIL {
                continue;
            }
            self.directory[slot] = next_idx;

            let tail_block = self.head(head_block_idx).tail_block();

            // First walk: count the physical blocks before the tail, so the
            // head's tail pointer can be relocated up front.
            let mut blocks_before_tail = 0u32;
            let mut slab_index = 0u32;
            let mut block_idx = head_block_idx;
            while block_idx != tail_block {
                let next = self.head(block_idx).next_block();
                blocks_before_tail += self.slabs.size(slab_index) as u32;
                slab_index = (slab_index + 1).min(MAX_SLAB_IDX);
                block_idx = next;
            }
            self.head_mut(head_block_idx).set_tail_block(next_idx + blocks_before_tail);

            // Second walk: patch each next pointer to the relocated index of
            // its successor, then stream the slab's bytes.
            let mut block_idx = head_block_idx;
            let mut slab_index = 0u32;
            while block_idx != tail_block {
                let next = self.head(block_idx).next_block();
                let slab_blocks = self.slabs.size(slab_index);
                next_idx += slab_blocks as u32;
                self.torso_mut(block_idx).set_next_block(next_idx);
                let start = block_idx as usize * BLOCK_SIZE;
                out.write_all(&self.data[start..start + slab_blocks * BLOCK_SIZE])?;
                block_idx = next;
                slab_index = (slab_index + 1).min(MAX_SLAB_IDX);
            }
            // The tail keeps its first_docid word; nothing to patch.
            let slab_blocks = self.slabs.size(slab_index);
            let start = block_idx as usize * BLOCK_SIZE;
            out.write_all(&self.data[start..start + slab_blocks * BLOCK_SIZE])?;
            next_idx += slab_blocks as u32;
        }

        out.seek(SeekFrom::Start(directory_offset))?;
        for &entry in &self.directory {
            out.write_all(&entry.to_le_bytes())?;
        }
        Ok(())
    }

    /// Load a snapshot written by [`serialize`](Self::serialize) or
    /// [`serialize_pack`](Self::serialize_pack), with the default growth
    /// policy.
    ///
    /// The format carries no header, so the loader must use the same growth
    /// policy the builder did; see [`load_with_growth`](Self::load_with_growth).
    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        Self::load_with_growth(input, GrowthPolicy::default())
    }

    /// Load a snapshot built under a specific growth policy.
    pub fn load_with_growth<R: Read>(input: &mut R, policy: GrowthPolicy) -> Result<Self> {
        let mut word = [0u8; 8];
        input.read_exact(&mut word)?;
        let next_empty = u64::from_le_bytes(word) as usize;
        input.read_exact(&mut word)?;
        let ht_size = u64::from_le_bytes(word) as usize;

        let mut raw = vec![0u8; ht_size * 4];
        input.read_exact(&mut raw)?;
        let directory = raw
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let mut data = vec![0u8; next_empty * BLOCK_SIZE];
        input.read_exact(&mut data)?;

        Ok(Self { data, next_empty, directory, slabs: SlabTable::new(policy) })
    }

    /// Directory lookup: head-block index for `term`, or [`NIL`] when the
    /// term is absent (or the table is full, which a query treats the same
    /// way).
    pub(crate) fn head_for_term(&self, term: &str) -> u32 {
        match self.found_or_empty_offset(term) {
            Some(slot) => self.directory[slot],
            None => NIL,
        }
    }

    /// Open-addressing probe: the slot holding `term`, or the first empty
    /// slot. `None` when the probe wrapped the whole table without finding
    /// either.
    fn found_or_empty_offset(&self, term: &str) -> Option<usize> {
        let table_size = self.directory.len();
        let mut index = self.term_to_offset(term);
        for _ in 0..table_size {
            let entry = self.directory[index];
            if entry == NIL || self.head(entry).term_bytes() == term.as_bytes() {
                return Some(index);
            }
            index = (index + 1) % table_size;
        }
        None
    }

    fn term_to_offset(&self, term: &str) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        hasher.finish() as usize % self.directory.len()
    }

    /// Resolve the head block for an insert, creating the chain on first
    /// sight of the term.
    fn head_for_insert(&mut self, term: &str) -> Result<u32> {
        if term.is_empty() {
            return Err(Error::EmptyTerm);
        }
        if term.len() > HEAD_BYTES {
            return Err(Error::TermTooLong(term.to_string()));
        }
        let slot = self
            .found_or_empty_offset(term)
            .ok_or(Error::DirectoryFull { size: self.directory.len() })?;
        let mut head_index = self.directory[slot];
        if head_index == NIL {
            head_index = self.next_free_slot(self.slabs.size(0))?;
            self.directory[slot] = head_index;
            self.head_mut(head_index).init(term, head_index);
        }
        Ok(head_index)
    }

    /// Grant `blocks_desired` contiguous physical blocks.
    fn next_free_slot(&mut self, blocks_desired: usize) -> Result<u32> {
        let capacity = self.block_capacity();
        if self.next_empty + blocks_desired >= capacity {
            return Err(Error::ArenaFull {
                requested: blocks_desired,
                available: capacity - self.next_empty,
            });
        }
        let next = self.next_empty;
        self.next_empty += blocks_desired;
        Ok(next as u32)
    }

    /// Shared grow path: step the slab size, allocate the new tail, compute
    /// the b-gap against the previous tail, convert it to a torso and repoint
    /// the head. Returns the new tail block and the b-gap to encode first.
    ///
    /// `b_gap_skew` is 1 on the positions path, where the new block may start
    /// at the same docid as the previous tail and the gap must stay non-zero.
    fn grow_chain(
        &mut self,
        head_index: u32,
        prev_block: u32,
        docid: DocId,
        b_gap_skew: u32,
    ) -> Result<(u32, u32)> {
        self.head_mut(head_index).increment_growth_offset();
        let growth = self.head(head_index).growth_offset() as u32;
        let new_block = self.next_free_slot(self.slabs.size(growth))?;

        self.tail_mut(new_block).set_first_docid(docid);

        let b_gap = if prev_block == head_index {
            // The b-gap of the second block is the docid itself (relative to 0).
            docid
        } else {
            docid - self.tail_ref(prev_block).first_docid() + b_gap_skew
        };

        self.torso_mut(prev_block).set_next_block(new_block);

        let mut head = self.head_mut(head_index);
        head.set_tail_block(new_block);
        head.set_tail_byte_offset(TT_PL_OFFSET as u16);
        Ok((new_block, b_gap))
    }

    fn encode_pair_at(&mut self, block: u32, offset: usize, docgap: u32, freq: u32) -> usize {
        let start = block as usize * BLOCK_SIZE + offset;
        magic::encode_pair(docgap, freq, &mut self.data[start..])
    }

    fn encode_u32_at(&mut self, block: u32, offset: usize, value: u32) -> usize {
        let start = block as usize * BLOCK_SIZE + offset;
        vbyte::encode(value, &mut self.data[start..])
    }

    /// Decode the (gap, freq) pair at `offset` within `block`, advancing
    /// `offset` past it.
    pub(crate) fn pair_at(&self, block: u32, offset: &mut usize) -> (u32, u32) {
        let start = block as usize * BLOCK_SIZE + *offset;
        let (gap, freq, stride) = magic::decode_pair(&self.data[start..]);
        *offset += stride;
        (gap, freq)
    }

    /// True while the byte at `offset` within `block` starts another posting.
    /// The arena is zero-filled and gaps are never zero, so a zero byte marks
    /// the end of the block's payload.
    pub(crate) fn has_data(&self, block: u32, offset: usize) -> bool {
        self.data[block as usize * BLOCK_SIZE + offset] != 0
    }

    /// Successor of `block` in its chain, or [`NIL`] past the tail.
    pub(crate) fn chain_next(&self, block: u32, tail_idx: u32) -> u32 {
        if block == tail_idx {
            NIL
        } else {
            self.head(block).next_block()
        }
    }

    pub(crate) fn tail_block_of(&self, head_idx: u32) -> u32 {
        self.head(head_idx).tail_block()
    }

    pub(crate) fn doc_freq_of(&self, head_idx: u32) -> u32 {
        self.head(head_idx).doc_freq()
    }

    pub(crate) fn head_data_offset(&self, head_idx: u32) -> usize {
        self.head(head_idx).data_offset()
    }

    pub(crate) fn slab_size(&self, step: u32) -> usize {
        self.slabs.size(step)
    }

    fn block_bytes(&self, idx: u32) -> &[u8] {
        &self.data[idx as usize * BLOCK_SIZE..][..BLOCK_SIZE]
    }

    fn block_bytes_mut(&mut self, idx: u32) -> &mut [u8] {
        &mut self.data[idx as usize * BLOCK_SIZE..][..BLOCK_SIZE]
    }

    fn head(&self, idx: u32) -> HeadRef<'_> {
        HeadRef(self.block_bytes(idx))
    }

    fn head_mut(&mut self, idx: u32) -> HeadMut<'_> {
        HeadMut(self.block_bytes_mut(idx))
    }

    fn torso_mut(&mut self, idx: u32) -> TorsoMut<'_> {
        TorsoMut(self.block_bytes_mut(idx))
    }

    fn tail_ref(&self, idx: u32) -> TailRef<'_> {
        TailRef(self.block_bytes(idx))
    }

    fn tail_mut(&mut self, idx: u32) -> TailMut<'_> {
        TailMut(self.block_bytes_mut(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::PostingsCursor;
    use std::io::Cursor as IoCursor;

    fn tiny_index() -> BlockIndex {
        BlockIndex::new(4096, 64)
    }

    #[test]
    fn first_posting_initializes_the_chain() {
        let mut idx = tiny_index();
        idx.insert(5, "apple", 2).unwrap();

        let head_idx = idx.head_for_term("apple");
        assert_ne!(head_idx, NIL);
        let head = idx.head(head_idx);
        assert_eq!(head.term_bytes(), b"apple");
        assert_eq!(head.doc_freq(), 1);
        assert_eq!(head.recent_docid(), 5);
        assert_eq!(head.tail_block(), head_idx);
        assert_eq!(head.next_block(), NIL);

        // The first gap is the docid itself, relative to 0.
        let mut offset = idx.head_data_offset(head_idx);
        let (gap, freq) = idx.pair_at(head_idx, &mut offset);
        assert_eq!((gap, freq), (5, 2));
    }

    #[test]
    fn chain_growth_links_head_to_second_block() {
        let mut idx = tiny_index();
        // One-byte pairs; the head payload (64 - 20 - 4 term bytes) fills
        // after 40 postings.
        let mut docid = 0;
        loop {
            docid += 1;
            idx.insert(docid, "term", 1).unwrap();
            let head_idx = idx.head_for_term("term");
            if idx.head(head_idx).tail_block() != head_idx {
                break;
            }
        }

        let head_idx = idx.head_for_term("term");
        let head = idx.head(head_idx);
        let second = head.tail_block();
        assert_eq!(head.next_block(), second);
        assert_eq!(idx.tail_ref(second).first_docid(), docid);

        // The block-leading entry decodes to the b-gap, which for the second
        // block is the docid itself.
        let mut offset = TT_PL_OFFSET;
        let (gap, freq) = idx.pair_at(second, &mut offset);
        assert_eq!((gap, freq), (docid, 1));
    }

    #[test]
    fn insert_then_cursor_roundtrip() {
        let mut idx = tiny_index();
        for docid in 1..200u32 {
            idx.insert(docid * 3, "steady", (docid % 7) + 1).unwrap();
        }
        let head_idx = idx.head_for_term("steady");
        let mut cursor = PostingsCursor::new(&idx, "steady");
        let mut expected = Vec::new();
        for docid in 1..200u32 {
            expected.push((docid * 3, (docid % 7) + 1));
        }
        let mut got = Vec::new();
        while cursor.docid() != NIL {
            got.push((cursor.docid(), cursor.freq()));
            cursor.next();
        }
        assert_eq!(got, expected);
        assert_eq!(idx.doc_freq_of(head_idx), 199);
    }

    #[test]
    fn arena_exhaustion_is_an_error() {
        let mut idx = BlockIndex::new(2, 16);
        idx.insert(1, "a", 1).unwrap();
        let err = idx.insert(1, "b", 1).unwrap_err();
        assert!(matches!(err, Error::ArenaFull { .. }));
    }

    #[test]
    fn full_directory_is_an_error() {
        let mut idx = BlockIndex::new(64, 2);
        idx.insert(1, "a", 1).unwrap();
        idx.insert(1, "b", 1).unwrap();
        let err = idx.insert(1, "c", 1).unwrap_err();
        assert!(matches!(err, Error::DirectoryFull { .. }));
    }

    #[test]
    fn empty_and_oversized_terms_are_rejected() {
        let mut idx = tiny_index();
        assert!(matches!(idx.insert(1, "", 1), Err(Error::EmptyTerm)));
        let long = "x".repeat(HEAD_BYTES + 1);
        assert!(matches!(idx.insert(1, &long, 1), Err(Error::TermTooLong(_))));
    }

    #[test]
    fn colliding_terms_probe_to_distinct_chains() {
        let mut idx = BlockIndex::new(4096, 8);
        for (docid, term) in ["kiwi", "lime", "plum", "pear"].iter().enumerate() {
            idx.insert(docid as u32 + 1, term, 1).unwrap();
        }
        for (docid, term) in ["kiwi", "lime", "plum", "pear"].iter().enumerate() {
            let head_idx = idx.head_for_term(term);
            assert_ne!(head_idx, NIL, "{term}");
            assert_eq!(idx.head(head_idx).term_bytes(), term.as_bytes());
            let mut offset = idx.head_data_offset(head_idx);
            let (gap, _) = idx.pair_at(head_idx, &mut offset);
            assert_eq!(gap, docid as u32 + 1);
        }
    }

    /// Decode the word-gap stream of a positional chain the way it was
    /// written: within blocks each entry is a (w-gap, d-gap) pair; the
    /// leading entry of a non-head block is two plain VBytes, b-gap then
    /// w-gap.
    fn decode_word_gaps(idx: &BlockIndex, term: &str) -> Vec<u32> {
        let head_idx = idx.head_for_term(term);
        assert_ne!(head_idx, NIL);
        let tail = idx.tail_block_of(head_idx);
        let mut word_gaps = Vec::new();

        let mut block = head_idx;
        let mut offset = idx.head_data_offset(head_idx);
        let mut step = 0u32;
        loop {
            let cap = idx.slab_size(step) * BLOCK_SIZE;
            if offset < cap && idx.has_data(block, offset) {
                let (word_gap, _doc_gap) = idx.pair_at(block, &mut offset);
                word_gaps.push(word_gap);
            } else {
                step = (step + 1).min(MAX_SLAB_IDX);
                let next = idx.chain_next(block, tail);
                if next == NIL {
                    break;
                }
                block = next;
                let start = block as usize * BLOCK_SIZE + TT_PL_OFFSET;
                let (_b_gap, s1) = vbyte::decode(&idx.data[start..]);
                let (word_gap, s2) = vbyte::decode(&idx.data[start + s1..]);
                offset = TT_PL_OFFSET + s1 + s2;
                word_gaps.push(word_gap);
            }
        }
        word_gaps
    }

    #[test]
    fn positions_roundtrip_within_one_block() {
        let mut idx = tiny_index();
        idx.insert_positions(3, "w", &[1, 4, 9]).unwrap();

        let head_idx = idx.head_for_term("w");
        assert_eq!(idx.doc_freq_of(head_idx), 1);

        // First entry: (w-gap 1, d-gap 3); then (3, 1), (5, 1) with the doc
        // gap pinned at 1.
        let mut offset = idx.head_data_offset(head_idx);
        assert_eq!(idx.pair_at(head_idx, &mut offset), (1, 3));
        assert_eq!(idx.pair_at(head_idx, &mut offset), (3, 1));
        assert_eq!(idx.pair_at(head_idx, &mut offset), (5, 1));
        assert!(!idx.has_data(head_idx, offset));
    }

    #[test]
    fn positions_recent_docid_is_rewound() {
        let mut idx = tiny_index();
        idx.insert_positions(3, "w", &[1, 4]).unwrap();
        let head_idx = idx.head_for_term("w");
        assert_eq!(idx.head(head_idx).recent_docid(), 2);

        // The next document's first gap is measured against docid - 1.
        idx.insert_positions(4, "w", &[2]).unwrap();
        let mut offset = idx.head_data_offset(head_idx);
        idx.pair_at(head_idx, &mut offset);
        idx.pair_at(head_idx, &mut offset);
        assert_eq!(idx.pair_at(head_idx, &mut offset), (2, 2));
    }

    #[test]
    fn positions_block_overflow_writes_plain_vbytes() {
        let mut idx = tiny_index();
        // Keep inserting single-occurrence docs until the chain grows.
        let mut docid = 0;
        loop {
            docid += 1;
            idx.insert_positions(docid, "w", &[docid]).unwrap();
            let head_idx = idx.head_for_term("w");
            if idx.head(head_idx).tail_block() != head_idx {
                break;
            }
        }
        let head_idx = idx.head_for_term("w");
        let second = idx.head(head_idx).tail_block();
        assert_eq!(idx.tail_ref(second).first_docid(), docid);

        let start = second as usize * BLOCK_SIZE + TT_PL_OFFSET;
        let (b_gap, s1) = vbyte::decode(&idx.data[start..]);
        let (word_gap, _) = vbyte::decode(&idx.data[start + s1..]);
        // b-gap for the second block is the docid itself; the word gap is the
        // single position of that document.
        assert_eq!(b_gap, docid);
        assert_eq!(word_gap, docid);
    }

    #[test]
    fn positions_decode_across_blocks() {
        let mut idx = tiny_index();
        // Word gaps restart from zero at each document, so the full stream
        // is reconstructible even across block breaks.
        let mut expected = Vec::new();
        for docid in 1..=120u32 {
            let positions = [docid, docid + 2, docid + 10];
            idx.insert_positions(docid, "w", &positions).unwrap();
            let mut last = 0;
            for &p in &positions {
                expected.push(p - last);
                last = p;
            }
        }
        assert_eq!(decode_word_gaps(&idx, "w"), expected);
    }

    #[test]
    fn serialize_then_load_preserves_postings() {
        let mut idx = tiny_index();
        for docid in 1..=50u32 {
            idx.insert(docid, "alpha", 1).unwrap();
            if docid % 2 == 0 {
                idx.insert(docid, "beta", docid).unwrap();
            }
        }

        let mut buf = Vec::new();
        idx.serialize(&mut buf).unwrap();
        let loaded = BlockIndex::load(&mut IoCursor::new(buf)).unwrap();

        assert_eq!(loaded.blocks_in_use(), idx.blocks_in_use());
        for term in ["alpha", "beta"] {
            let mut original = PostingsCursor::new(&idx, term);
            let mut reloaded = PostingsCursor::new(&loaded, term);
            while original.docid() != NIL {
                assert_eq!(reloaded.docid(), original.docid());
                assert_eq!(reloaded.freq(), original.freq());
                original.next();
                reloaded.next();
            }
            assert_eq!(reloaded.docid(), NIL);
        }
    }

    #[test]
    fn serialize_pack_relocates_chains_contiguously() {
        let mut idx = BlockIndex::new(1 << 14, 64);
        // Interleave three terms so their chains interleave in the arena.
        for docid in 1..=4000u32 {
            idx.insert(docid, "one", 1).unwrap();
            idx.insert(docid, "two", 2).unwrap();
            idx.insert(docid, "three", 3).unwrap();
        }

        let mut packed = IoCursor::new(Vec::new());
        idx.serialize_pack(&mut packed).unwrap();
        packed.set_position(0);
        let loaded = BlockIndex::load(&mut packed).unwrap();

        for term in ["one", "two", "three"] {
            let head_idx = loaded.head_for_term(term);
            assert_ne!(head_idx, NIL, "{term}");
            let tail = loaded.tail_block_of(head_idx);

            // Chains occupy an ascending contiguous run: each block's
            // successor sits exactly one slab further on.
            let mut block = head_idx;
            let mut step = 0u32;
            while block != tail {
                let next = loaded.chain_next(block, tail);
                assert_eq!(next, block + loaded.slab_size(step) as u32, "{term}");
                step = (step + 1).min(MAX_SLAB_IDX);
                block = next;
            }
        }
    }

    #[test]
    fn pack_then_load_roundtrips_postings() {
        let mut idx = BlockIndex::new(1 << 13, 64);
        let mut expected: Vec<(u32, u32)> = Vec::new();
        for docid in 1..=1500u32 {
            let freq = (docid % 5) + 1;
            idx.insert(docid * 2, "gamma", freq).unwrap();
            expected.push((docid * 2, freq));
        }

        let mut packed = IoCursor::new(Vec::new());
        idx.serialize_pack(&mut packed).unwrap();
        packed.set_position(0);
        let loaded = BlockIndex::load(&mut packed).unwrap();

        let mut cursor = PostingsCursor::new(&loaded, "gamma");
        let mut got = Vec::new();
        while cursor.docid() != NIL {
            got.push((cursor.docid(), cursor.freq()));
            cursor.next();
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn b_gaps_accumulate_to_the_tail_first_docid() {
        // Summing the block-leading gaps along a chain reconstructs the
        // uncompressed first_docid retained in the tail.
        let mut idx = tiny_index();
        for docid in 1..=300u32 {
            idx.insert(docid * 5, "delta", 1).unwrap();
        }
        let head_idx = idx.head_for_term("delta");
        let tail = idx.tail_block_of(head_idx);
        assert_ne!(tail, head_idx);

        let mut accumulated = 0u32;
        let mut block = idx.chain_next(head_idx, tail);
        while block != NIL {
            let mut offset = TT_PL_OFFSET;
            let (b_gap, _) = idx.pair_at(block, &mut offset);
            accumulated += b_gap;
            block = idx.chain_next(block, tail);
        }
        assert_eq!(accumulated, idx.tail_ref(tail).first_docid());
    }
}
