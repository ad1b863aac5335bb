//! Splits the monolithic run log into one JSONL file per (model, dataset).
//!
//! The harness appends pretty-printed JSON objects to `results/token-counts.jsonl`, so a single
//! entry spans several physical lines and the file cannot be split line by line. It is parsed as
//! a stream of JSON values instead and every entry is re-serialized compactly, one per line:
//!
//! ```text
//! results/token-counts.jsonl  ->  results/haiku-flat-10.jsonl
//!                                 results/haiku-flat-50.jsonl
//!                                 results/opus-nested-deep.jsonl
//! ```
//!
//! The source file is never modified or deleted.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::SplitConfig;
use crate::errors::{Error, Result};
use crate::keys::compound_key;
use crate::loader::Entry;

/// Value used for a missing `model` or `dataset` field
pub const UNKNOWN: &str = "unknown";

/// One run entry from the monolithic log, with its original key order.
pub type RunEntry = Map<String, Value>;

/// Parse a stream of JSON values (pretty-printed or line-delimited) into run entries.
///
/// Top-level arrays are flattened. Values that are not objects are skipped. A syntax error
/// anywhere in the stream fails the whole parse, since the rest of the stream cannot be
/// re-synchronized.
pub fn parse_run_log(contents: &str) -> std::result::Result<Vec<Entry<RunEntry>>, serde_json::Error> {
    let mut entries = Vec::new();

    for value in serde_json::Deserializer::from_str(contents).into_iter::<Value>() {
        match value? {
            Value::Array(items) => entries.extend(items.into_iter().map(classify)),
            other => entries.push(classify(other)),
        }
    }

    Ok(entries)
}

fn classify(value: Value) -> Entry<RunEntry> {
    match value {
        Value::Object(map) => Entry::Loaded(map),
        other => Entry::skipped(truncate(&other.to_string(), 40), "run entry is not a JSON object"),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Read an identity field: strings verbatim, missing or null as [`UNKNOWN`], anything else as
/// its JSON text.
fn identity_field(entry: &RunEntry, field: &str) -> String {
    match entry.get(field) {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Compound grouping key of a run entry, e.g. `haiku-flat-10`
pub fn group_key(entry: &RunEntry) -> String {
    compound_key(&identity_field(entry, "model"), &identity_field(entry, "dataset"))
}

/// Group entries by compound key. Groups are ordered by key; entries keep their log order.
pub fn group_entries(entries: Vec<RunEntry>) -> BTreeMap<String, Vec<RunEntry>> {
    let mut groups: BTreeMap<String, Vec<RunEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(group_key(&entry)).or_default().push(entry);
    }
    groups
}

/// Render a group as compact JSONL.
pub fn render_group(entries: &[RunEntry]) -> Result<String> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }
    Ok(out)
}

/// Result of a split (or dry run): output file name to entry count, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub counts: BTreeMap<String, usize>,
    pub dry_run: bool,
}

impl SplitOutcome {
    pub fn total_entries(&self) -> usize {
        self.counts.values().sum()
    }
}

fn write_group(path: &Path, entries: &[RunEntry]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(format!("create {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_group(entries)?.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(format!("write {}", path.display()), e))
}

/// Split the configured source log.
///
/// Returns `Ok(None)` when the source log does not exist. With `dry_run` the grouping is done
/// exactly as in a real run but nothing is written.
pub fn split_results(config: &SplitConfig, dry_run: bool) -> Result<Option<SplitOutcome>> {
    let source = config.source_path();
    if !source.is_file() {
        return Ok(None);
    }

    info!("Parsing {}...", source.display());
    let contents = fs::read_to_string(&source).map_err(|e| Error::io(format!("read {}", source.display()), e))?;
    let parsed = parse_run_log(&contents).map_err(|e| Error::InvalidLog {
        path: source.clone(),
        source: e,
    })?;

    let entries: Vec<RunEntry> = parsed
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Loaded(entry) => Some(entry),
            Entry::Skipped(skip) => {
                warn!("Skipping {skip}");
                None
            }
        })
        .collect();
    info!("Found {} entries", entries.len());

    let output_dir = config.output_dir();
    let mut counts = BTreeMap::new();

    for (key, group) in group_entries(entries) {
        let filename = format!("{key}.{}", config.output_extension);
        if !dry_run {
            write_group(&output_dir.join(&filename), &group)?;
        }
        counts.insert(filename, group.len());
    }

    Ok(Some(SplitOutcome {
        source,
        output_dir,
        counts,
        dry_run,
    }))
}
