//! Streaming indexer: documents on stdin, preconfigured sizing per
//! collection key.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use blockpost::{BlockIndex, BLOCK_SIZE};

#[derive(Parser)]
#[command(name = "stream_indexer")]
#[command(about = "Index a document stream from stdin with preset sizing", long_about = None)]
struct Args {
    /// Collection key selecting (arena blocks, hash buckets): wsj1, robust
    /// or wiki
    collection_key: String,

    /// Output index file
    #[arg(short = 'o', long, default_value = "tmp.idx")]
    output: PathBuf,

    /// Index word positions instead of (docid, freq) postings
    #[arg(short = 'p', long)]
    positions: bool,

    /// Write the build-order snapshot instead of compacting chains
    #[arg(long)]
    raw: bool,
}

fn preset(key: &str) -> Option<(usize, usize)> {
    match key {
        "wsj1" => Some((248_602_600 / BLOCK_SIZE, 319_468)),
        "robust" => Some((1_463_852_840 / BLOCK_SIZE, 1_313_536)),
        "wiki" => Some((11_955_330_080 / BLOCK_SIZE, 10_561_650)),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let Some((idx_blocks, hash_buckets)) = preset(&args.collection_key) else {
        bail!("unknown collection: {}, cannot guess params", args.collection_key);
    };
    info!(
        collection = %args.collection_key,
        blocks = idx_blocks,
        hash_buckets,
        positions = args.positions,
        "indexing from stream"
    );

    let mut index = BlockIndex::new(idx_blocks, hash_buckets);

    let start = Instant::now();
    let stdin = io::stdin();
    let mut docid: u32 = 0;
    let mut postings_count: usize = 0;
    let mut words_count: usize = 0;
    let mut term_to_pos: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        if tokens.next().is_none() {
            continue;
        }
        docid += 1;

        term_to_pos.clear();
        let mut position = 1u32;
        for term in tokens {
            term_to_pos.entry(term.to_string()).or_default().push(position);
            position += 1;
        }
        for (term, positions) in &term_to_pos {
            if args.positions {
                index.insert_positions(docid, term, positions)?;
            } else {
                index.insert(docid, term, positions.len() as u32)?;
            }
        }
        postings_count += term_to_pos.len();
        words_count += position as usize - 1;
    }
    info!(
        docs = docid,
        postings = postings_count,
        words = words_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        blocks_used = index.blocks_in_use(),
        "stream indexed"
    );

    let output = File::create(&args.output)?;
    if args.raw {
        index.serialize(&mut BufWriter::new(output))?;
    } else {
        index.serialize_pack(&mut BufWriter::new(output))?;
    }
    info!(
        output = %args.output.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "indexed and serialized"
    );

    Ok(())
}
