//! Compare encoded file sizes across formats.
//!
//! Expected structure:
//!
//! ```text
//! encoded-dir/
//!     flat/
//!         10.json
//!         10.stele-ascii
//!         10.stele-light
//!         10.stele-full
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stele_bench::{Error, bytes, cli};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "compare-bytes", version, about = "Compare byte sizes across all encoded formats")]
struct Cli {
    /// Directory with one subdirectory per dataset kind
    encoded_dir: PathBuf,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: cli::CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = cli::parse_args();
    let config = args.common.init()?;

    info!("Scanning {} for encoded files...", args.encoded_dir.display());
    let sizes = bytes::collect_sizes(&args.encoded_dir, &config)?;

    if sizes.is_empty() {
        return Err(Error::NoResults {
            what: "encoded files".to_string(),
        }
        .into());
    }
    info!("Found {} datasets", sizes.len());

    let report = bytes::render_report(&sizes, &config);
    print!("{report}");

    if let Some(output) = &args.output {
        std::fs::write(output, &report).with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Wrote report to {}", output.display());
    }

    Ok(())
}
