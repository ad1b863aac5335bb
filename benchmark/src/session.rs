//! Token usage extraction from session event logs.
//!
//! A session log is JSONL: one event per line. Model turns look like
//!
//! ```json
//! {"type": "message", "usage": {"input_tokens": 100, "output_tokens": 20,
//!   "cache_read_input_tokens": 0, "cache_creation_input_tokens": 0}}
//! ```
//!
//! Lines that are not valid events (including a truncated final line from an interrupted run)
//! are skipped without failing the extraction.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::config::SessionConfig;
use crate::errors::{Error, Result};
use crate::metrics::SessionUsage;

#[derive(Debug, Deserialize)]
struct SessionEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
    cache_read_input_tokens: u64,
    cache_creation_input_tokens: u64,
}

/// Accumulate usage from every model-turn event read from `reader`.
pub fn accumulate_usage<R: BufRead>(reader: R, config: &SessionConfig) -> Result<SessionUsage> {
    let mut totals = SessionUsage::default();

    // Split on raw bytes so a line of invalid UTF-8 is skipped like any other bad line
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| Error::io("read session log", e))?;
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let event: SessionEvent = match serde_json::from_slice(trimmed) {
            Ok(event) => event,
            Err(e) => {
                debug!(line = index + 1, "Skipping unparseable session event: {e}");
                continue;
            }
        };

        if event.kind.as_deref() != Some(config.message_type.as_str()) {
            continue;
        }

        let usage = event.usage.unwrap_or_default();
        totals.add(
            usage.input_tokens,
            usage.output_tokens,
            usage.cache_read_input_tokens,
            usage.cache_creation_input_tokens,
        );
    }

    Ok(totals)
}

/// Extract session totals from the log at `path`.
///
/// Fails with [`Error::NotFound`] before reading anything if the file does not exist.
pub fn extract_tokens(path: &Path, config: &SessionConfig) -> Result<SessionUsage> {
    if !path.exists() {
        return Err(Error::NotFound { path: path.to_path_buf() });
    }

    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    let usage = accumulate_usage(BufReader::new(file), config)?;
    debug!(path = %path.display(), %usage, "Extracted session usage");
    Ok(usage)
}
