//! Extract token counts from a session JSONL log and print them as JSON.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stele_bench::{cli, session};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "extract-tokens", version, about = "Extract token counts from a session JSONL file")]
struct Cli {
    /// Session log, one JSON event per line
    session_file: PathBuf,

    /// Emit the full per-run metrics shape (with `total_input` and `total_all`)
    #[arg(long)]
    metrics: bool,

    /// Write the JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: cli::CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = cli::parse_args();
    let config = args.common.init()?;

    let usage = session::extract_tokens(&args.session_file, &config.session)?;

    let json = if args.metrics {
        serde_json::to_string_pretty(&usage.to_metric_record())?
    } else {
        serde_json::to_string_pretty(&usage)?
    };

    match &args.output {
        Some(output) => {
            std::fs::write(output, format!("{json}\n")).with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote token counts to {}", output.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
