//! # blockpost
//!
//! An in-memory, incrementally built inverted index over **block-chained
//! postings**: every term's postings live in a chain of fixed-size arena
//! blocks (head -> torso* -> tail), compressed with VByte and a double-VByte
//! (gap, frequency) pair codec, and queried through skipping cursors.
//!
//! ## Scope (deliberate)
//!
//! - **Append-only build**: documents arrive in ascending docid order and
//!   postings are only ever appended to a term's tail block.
//! - **One contiguous arena**: blocks are bump-allocated out of a pre-sized
//!   buffer and addressed by index, which makes compaction and persistence
//!   a matter of rewriting a few u32 fields.
//! - **Query processors**: Boolean conjunction, Boolean disjunction, and
//!   ranked (top-k) disjunction with TF-IDF weights.
//!
//! ## Non-goals (for now)
//!
//! - Deletions or in-place updates to existing postings
//! - Concurrent writers (a build owns its index; cursors borrow it)
//! - Compression schemes beyond VByte / double-VByte
//! - Persisting the mutable arena (only the serialized snapshots)
//!
//! Related crate in this repo:
//! - `blockpost-codec`: the VByte / pair-codec building blocks (in
//!   `crates/`).

pub mod block;
pub mod collection;
pub mod cursor;
pub mod index;
pub mod pisa;
pub mod query;
pub mod search;
pub mod topk;

pub use block::{GrowthPolicy, BLOCK_SIZE, NIL};
pub use collection::{read_collection, Collection, Document, TermPositions};
pub use cursor::{cursors_for_query, PostingsCursor};
pub use index::{BlockIndex, AVERAGE_WORD_BYTES, HASH_VOCAB_MULTIPLE};
pub use pisa::export_pisa;
pub use query::{read_queries, Query};
pub use search::{
    boolean_conjunction, boolean_disjunction, profiled_boolean_conjunction, ranked_disjunction,
    CursorProfile, TfIdfRanker,
};
pub use topk::TopkQueue;

/// Document identifier.
pub type DocId = u32;

/// Errors surfaced by index building and persistence.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The pre-sized arena has no room for the requested blocks. The builder
    /// has no spill mechanism; size the arena for the collection up front.
    #[error("block arena exhausted: requested {requested} blocks, {available} remaining")]
    ArenaFull {
        /// Blocks the failed allocation asked for.
        requested: usize,
        /// Blocks still unallocated.
        available: usize,
    },
    /// Every directory slot is occupied; probing can no longer terminate.
    #[error("term directory full ({size} slots); size it at twice the vocabulary")]
    DirectoryFull {
        /// Number of slots in the directory.
        size: usize,
    },
    /// Terms must be non-empty.
    #[error("empty term")]
    EmptyTerm,
    /// A term must fit in a head block's payload.
    #[error("term too long for a head block: {0:?}")]
    TermTooLong(String),
    /// Failure reading or writing a serialized index.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
