//! Aggregate per-run token counts into `summary.md` and `comparison.json`.
//!
//! Expected structure:
//!
//! ```text
//! results-dir/
//!     flat-10-json/token-counts.json
//!     flat-10-ascii/token-counts.json
//!     ...
//! ```

use clap::Parser;
use std::path::PathBuf;
use stele_bench::{Error, cli, loader, report};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "aggregate", version, about = "Aggregate token results into summary reports")]
struct Cli {
    /// Directory containing one `<kind>-<size>-<format>` subdirectory per run
    results_dir: PathBuf,

    #[command(flatten)]
    common: cli::CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = cli::parse_args();
    let config = args.common.init()?;

    info!("Loading results from {}...", args.results_dir.display());
    let results = loader::load_results(&args.results_dir, &config.files)?;

    if results.is_empty() {
        return Err(Error::NoResults {
            what: "valid results".to_string(),
        }
        .into());
    }
    info!("Found {} datasets", results.len());

    report::write_reports(&results, &args.results_dir, &config)?;
    info!("Done");

    Ok(())
}
