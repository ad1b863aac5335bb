//! Split the monolithic `token-counts.jsonl` into one file per model and dataset.
//!
//! Creates files like `results/haiku-flat-10.jsonl` and `results/opus-nested-deep.jsonl`.
//! The source file is left in place.

use clap::Parser;
use stele_bench::{cli, split};

#[derive(Parser, Debug)]
#[command(name = "split-results", version, about = "Split the monolithic results log by model and dataset")]
struct Cli {
    /// Show what would be created without writing anything
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    common: cli::CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = cli::parse_args();
    let config = args.common.init()?;

    if args.dry_run {
        println!("=== DRY RUN ===");
    }

    let Some(outcome) = split::split_results(&config.split, args.dry_run)? else {
        eprintln!("Source file not found: {}", config.split.source_path().display());
        return Ok(());
    };

    for (file, count) in &outcome.counts {
        if outcome.dry_run {
            println!("  Would create: {file} ({count} entries)");
        } else {
            println!("  Created: {file} ({count} entries)");
        }
    }

    if !outcome.counts.is_empty() {
        println!();
        println!("Total: {} files, {} entries", outcome.counts.len(), outcome.total_entries());

        if !outcome.dry_run {
            println!();
            println!("Original file preserved: {}", outcome.source.display());
            println!("You can delete it manually after verifying the split files.");
        }
    }

    Ok(())
}
