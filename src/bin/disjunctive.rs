//! Ranked disjunctive (top-k) query driver.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blockpost::{
    cursors_for_query, ranked_disjunction, read_queries, BlockIndex, TfIdfRanker, TopkQueue,
};

#[derive(Parser)]
#[command(name = "disjunctive")]
#[command(about = "Run ranked disjunctive queries against a serialized index", long_about = None)]
struct Args {
    /// Serialized index file
    index: PathBuf,

    /// Query file: one `<qid> <term_1> <term_2> ...` per line
    queries: PathBuf,

    /// Result heap capacity
    k: usize,

    /// Number of documents in the collection (for idf weights)
    num_docs: u32,

    /// Log per-query latency and dump TREC run lines
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn percentile(sorted: &[f64], p: usize) -> f64 {
    sorted[p * sorted.len() / 100]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!(index = %args.index.display(), k = args.k, num_docs = args.num_docs, "loading");

    let mut input = BufReader::new(
        File::open(&args.index).with_context(|| format!("opening {}", args.index.display()))?,
    );
    let index = BlockIndex::load(&mut input)?;
    let queries = read_queries(BufReader::new(File::open(&args.queries)?))?;
    info!(count = queries.len(), "queries read");

    let mut heap = TopkQueue::new(args.k);
    let ranker = TfIdfRanker::new(args.num_docs);
    let mut query_times: Vec<f64> = Vec::new();
    let stdout = io::stdout();

    for query in &queries {
        heap.clear();

        let start = Instant::now();
        let mut cursors = cursors_for_query(&index, query);
        let result_count = ranked_disjunction(&mut cursors, &ranker, &mut heap);
        let micros = start.elapsed().as_secs_f64() * 1e6;

        if result_count > 0 {
            query_times.push(micros);
            if args.verbose {
                println!("{} latency={micros} matches={result_count}", query.id);
                heap.write_trec(&query.id, "blockpost", &mut stdout.lock())?;
            }
        }
    }

    info!(queries_with_matches = query_times.len(), "statistics basis");
    if !query_times.is_empty() {
        query_times.sort_by(|a, b| a.total_cmp(b));
        let mean = query_times.iter().sum::<f64>() / query_times.len() as f64;
        info!(
            mean,
            p50 = percentile(&query_times, 50),
            p90 = percentile(&query_times, 90),
            p95 = percentile(&query_times, 95),
            p99 = percentile(&query_times, 99),
            "latency (usecs)"
        );
    }

    io::stdout().flush()?;
    Ok(())
}
