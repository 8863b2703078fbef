//! buddy-sim - places a file of labelled requests into a buddy tree and
//! prints every placement followed by the tree report.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use buddy_tree_allocator::{
    parse_requests, write_report, write_stats, BatchSummary, BuddyTree, PlacementLine,
    StatsReporter,
};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Binary buddy allocator simulator.
#[derive(Parser)]
#[command(name = "buddy-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Request file, one `<label> <size in KB>` pair per line
    input: PathBuf,

    /// Print allocation statistics after the report
    #[arg(long)]
    stats: bool,

    /// Increase verbosity (-v, -vv, -vvv); -vv also logs the free-block picture on
    /// fragmentation failures and dumps the final tree
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let input = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read request file {}", cli.input.display()))?;

    let mut tree = BuddyTree::new();
    let mut processed = 0;

    let start = Instant::now();
    for request in parse_requests(&input) {
        let request = request
            .with_context(|| format!("Malformed request in {}", cli.input.display()))?;
        let result = tree.allocate(request.label, request.size_bytes);
        if let Err(err) = &result {
            debug!(label = request.label, error = %err, "request not placed");
            if cli.verbose >= 2 && err.is_fragmentation() {
                StatsReporter::log_alloc_failure(&tree.stats(), request.label, request.size_bytes);
            }
        }
        println!("{}", PlacementLine::new(&tree, request.label, &result));
        processed += 1;
    }
    let summary = BatchSummary {
        processed,
        elapsed: start.elapsed(),
    };
    info!(processed, elapsed = ?summary.elapsed, "batch finished");

    println!();
    println!("{summary}");

    let mut report = String::new();
    write_report(&tree, &mut report)?;
    println!();
    print!("{report}");

    if cli.stats {
        let mut stats = String::new();
        write_stats(&tree.stats(), &mut stats)?;
        println!();
        print!("{stats}");
    }

    if cli.verbose >= 2 {
        tree.print_tree_info();
    }

    Ok(())
}
