//! Batch indexer: read a document collection, build the index, serialize it.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blockpost::{read_collection, BlockIndex};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a block-chained index from a document collection", long_about = None)]
struct Args {
    /// Document file: one `<text_id> <term_1> <term_2> ...` per line
    documents: PathBuf,

    /// Output index file
    output: PathBuf,

    /// Index word positions instead of (docid, freq) postings
    #[arg(short = 'p', long)]
    positions: bool,

    /// Compact each term's chain into a contiguous run while serializing
    #[arg(long)]
    pack: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!(documents = %args.documents.display(), positions = args.positions, "indexing");

    let input = File::open(&args.documents)
        .with_context(|| format!("opening {}", args.documents.display()))?;
    let collection = read_collection(BufReader::new(input))?;
    info!(
        docs = collection.len(),
        postings = collection.total_postings,
        vocabulary = collection.unique_terms,
        "collection read"
    );

    let mut index = BlockIndex::sized_for(collection.total_postings, collection.unique_terms);
    info!(
        blocks = index.block_capacity(),
        hash_slots = index.directory_size(),
        "index sized"
    );

    let start = Instant::now();
    for (i, doc) in collection.documents.iter().enumerate() {
        let docid = i as u32 + 1;
        for entry in &doc.terms {
            if args.positions {
                index.insert_positions(docid, &entry.term, &entry.positions)?;
            } else {
                index.insert(docid, &entry.term, entry.positions.len() as u32)?;
            }
        }
    }
    let elapsed = start.elapsed();
    info!(
        docs = collection.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        micros_per_doc = elapsed.as_micros() as u64 / collection.len().max(1) as u64,
        blocks_used = index.blocks_in_use(),
        "build complete"
    );

    let output = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let start = Instant::now();
    if args.pack {
        index.serialize_pack(&mut BufWriter::new(output))?;
    } else {
        index.serialize(&mut BufWriter::new(output))?;
    }
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "index serialized");

    Ok(())
}
