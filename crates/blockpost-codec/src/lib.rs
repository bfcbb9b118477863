//! `blockpost-codec`: integer codecs for postings payloads.
//!
//! This crate holds the *mechanical* encodings shared by the index builder
//! and the query-side cursors:
//! - variable-byte (VByte) encoding for `u32`
//! - the double-VByte pair codec that co-encodes a (docgap, freq) pair
//!
//! It intentionally does **not** define an index; it exists so the builder,
//! the cursors and the serializers agree on one byte-level contract.
//!
//! ## Trust model
//!
//! Decoders here operate on payload bytes the builder itself produced, inside
//! zero-initialized fixed-size blocks where a zero byte terminates the
//! stream. They therefore take trusted input and panic on malformed bytes
//! rather than threading `Result` through the query hot path.

#![warn(missing_docs)]

pub mod magic;
pub mod vbyte;
