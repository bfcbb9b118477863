//! Boolean-AND query driver with latency and match statistics.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blockpost::{
    boolean_conjunction, cursors_for_query, profiled_boolean_conjunction, read_queries, BlockIndex,
};

#[derive(Parser)]
#[command(name = "conjunctive")]
#[command(about = "Run Boolean conjunctive queries against a serialized index", long_about = None)]
struct Args {
    /// Serialized index file
    index: PathBuf,

    /// Query file: one `<qid> <term_1> <term_2> ...` per line
    queries: PathBuf,

    /// -v: per-query latency and match count; -vv: per-cursor advancement
    /// counts
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
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
    let verbose = args.verbose == 1;
    let very_verbose = args.verbose >= 2;

    info!(index = %args.index.display(), queries = %args.queries.display(), "loading");
    let mut input = BufReader::new(
        File::open(&args.index).with_context(|| format!("opening {}", args.index.display()))?,
    );
    let index = BlockIndex::load(&mut input)?;
    let queries = read_queries(BufReader::new(File::open(&args.queries)?))?;
    info!(count = queries.len(), "queries read");

    let mut query_times: Vec<f64> = Vec::new();
    let mut match_counts: Vec<usize> = Vec::new();

    for query in &queries {
        if very_verbose {
            let mut cursors = cursors_for_query(&index, query);
            let (results, profiles) = profiled_boolean_conjunction(&mut cursors);
            println!("------");
            for (i, profile) in profiles.iter().enumerate() {
                println!(
                    "[{i}] -> {}  df= {}  next_geq_count= {}",
                    profile.term, profile.doc_freq, profile.advance_count
                );
            }
            if !results.is_empty() {
                match_counts.push(results.len());
            }
        } else {
            let start = Instant::now();
            let mut cursors = cursors_for_query(&index, query);
            let results = boolean_conjunction(&mut cursors);
            let micros = start.elapsed().as_secs_f64() * 1e6;
            // Statistics only cover queries with at least one match.
            if !results.is_empty() {
                if verbose {
                    println!("{} latency={micros} matches={}", query.id, results.len());
                }
                query_times.push(micros);
                match_counts.push(results.len());
            }
        }
    }

    info!(queries_with_matches = match_counts.len(), "statistics basis");

    if !verbose && !very_verbose && !query_times.is_empty() {
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

    if !match_counts.is_empty() {
        match_counts.sort_unstable();
        let mean = match_counts.iter().sum::<usize>() as f64 / match_counts.len() as f64;
        info!(
            mean,
            min = match_counts[0],
            p50 = match_counts[match_counts.len() / 2],
            max = match_counts[match_counts.len() - 1],
            "matches"
        );
    }

    Ok(())
}
