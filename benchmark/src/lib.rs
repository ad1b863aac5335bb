//! # stele-bench: benchmark result aggregation
//!
//! `stele-bench` turns the raw artifacts left behind by the encoding benchmark harness into
//! comparison reports. The harness runs each model over each dataset in each encoding and
//! leaves per-run token counts, session logs and encoded fixture files on disk; these tools
//! only read those numbers back, key them by dataset and format, and present them. They never
//! run a benchmark or call a model.
//!
//! ## Tools
//!
//! | Binary           | Input                                  | Output                               |
//! |------------------|----------------------------------------|--------------------------------------|
//! | `aggregate`      | `results/<kind>-<size>-<format>/`      | `summary.md`, `comparison.json`      |
//! | `compare-bytes`  | `encoded/<kind>/<size>.{json,stele-*}` | byte-size table on stdout            |
//! | `extract-tokens` | a session `.jsonl` log                 | token totals as JSON on stdout       |
//! | `split-results`  | `results/token-counts.jsonl`           | `results/<model>-<kind>-<size>.jsonl` |
//!
//! ## Data Model
//!
//! Results are keyed by a [`DatasetKey`] (`flat/10`, `nested/deep`) and a format name (`json`,
//! `ascii`, `light`, `full`; the first configured format is the baseline). Each pair maps to a
//! [`MetricRecord`] of named counters, and the [`ResultsTable`] nests them as
//! `dataset -> format -> metrics`. Both the aggregation and the byte-size tools build that same
//! shape and render it through [`report`].
//!
//! ## Failure Handling
//!
//! Malformed entries (an unparseable directory name, a missing or corrupt metrics file, a bad
//! log line) are skipped with a warning and never abort a run; see [`loader::Entry`]. Only an
//! unreachable input root, or a run that produces nothing at all, is fatal.
//!
//! Fixed lists and file names come from [`Config`], loaded from an optional YAML file and
//! `STELE_BENCH_*` environment variables.

pub mod bytes;
pub mod cli;
pub mod config;
pub mod errors;
pub mod keys;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod session;
pub mod split;
pub mod telemetry;

#[cfg(test)]
mod test;

pub use config::Config;
pub use errors::{Error, Result};
pub use keys::{DatasetKey, FormatKey};
pub use metrics::{MetricRecord, ResultsTable, SessionUsage};
