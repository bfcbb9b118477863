//! Export a document collection to PISA's uncompressed binary format.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blockpost::{export_pisa, read_collection, BlockIndex};

#[derive(Parser)]
#[command(name = "stream2pisa")]
#[command(about = "Convert a document collection to the PISA binary format", long_about = None)]
struct Args {
    /// Document file: one `<text_id> <term_1> <term_2> ...` per line
    documents: PathBuf,

    /// Output basename; writes `<basename>.{docs,freqs,sizes,terms,documents}`
    basename: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
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
    for (i, doc) in collection.documents.iter().enumerate() {
        let docid = i as u32 + 1;
        for entry in &doc.terms {
            index.insert(docid, &entry.term, entry.positions.len() as u32)?;
        }
    }
    info!(blocks_used = index.blocks_in_use(), "index built");

    export_pisa(&index, &collection, &args.basename)?;
    info!(basename = %args.basename, "export complete");
    Ok(())
}
