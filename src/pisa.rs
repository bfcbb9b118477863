//! Exporter for the PISA engine's uncompressed binary collection format.
//!
//! Five files share a basename:
//! - `.docs`: u32 sequences, one per term, of 0-based docids; preceded by a
//!   header sequence `(1, |D|)`.
//! - `.freqs`: u32 sequences, one per term, of in-document frequencies.
//! - `.sizes`: a single u32 sequence of per-document lengths.
//! - `.terms`: one term per line, in the same order as the postings
//!   sequences (lexicographic here).
//! - `.documents`: one document identifier per line, in docid order.
//!
//! A sequence is a little-endian u32 element count followed by that many
//! little-endian u32 values.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::block::NIL;
use crate::collection::Collection;
use crate::cursor::PostingsCursor;
use crate::index::BlockIndex;
use crate::Result;

fn write_sequence<W: Write>(out: &mut W, values: &[u32]) -> io::Result<()> {
    out.write_all(&(values.len() as u32).to_le_bytes())?;
    for &value in values {
        out.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Export `index` (built without positions over `collection`) to
/// `<basename>.{docs,freqs,sizes,terms,documents}`.
pub fn export_pisa(index: &BlockIndex, collection: &Collection, basename: &str) -> Result<()> {
    let mut docs_out = BufWriter::new(File::create(format!("{basename}.docs"))?);
    let mut freqs_out = BufWriter::new(File::create(format!("{basename}.freqs"))?);
    let mut sizes_out = BufWriter::new(File::create(format!("{basename}.sizes"))?);
    let mut terms_out = BufWriter::new(File::create(format!("{basename}.terms"))?);
    let mut documents_out = BufWriter::new(File::create(format!("{basename}.documents"))?);

    // Header sequence: the number of documents.
    write_sequence(&mut docs_out, &[collection.len() as u32])?;

    let mut terms: Vec<String> = index.terms().map(|(term, _)| term).collect();
    terms.sort_unstable();

    let mut docids = Vec::new();
    let mut freqs = Vec::new();
    for term in &terms {
        docids.clear();
        freqs.clear();
        let mut cursor = PostingsCursor::new(index, term);
        while cursor.docid() != NIL {
            // Internal docids are 1-based; PISA's are 0-based.
            docids.push(cursor.docid() - 1);
            freqs.push(cursor.freq());
            cursor.next();
        }
        write_sequence(&mut docs_out, &docids)?;
        write_sequence(&mut freqs_out, &freqs)?;
        writeln!(terms_out, "{term}")?;
    }

    let sizes: Vec<u32> = collection.documents.iter().map(|doc| doc.length).collect();
    write_sequence(&mut sizes_out, &sizes)?;

    for doc in &collection.documents {
        writeln!(documents_out, "{}", doc.text_id)?;
    }

    docs_out.flush()?;
    freqs_out.flush()?;
    sizes_out.flush()?;
    terms_out.flush()?;
    documents_out.flush()?;
    Ok(())
}
