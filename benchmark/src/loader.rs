//! Results loader: turns a directory of per-run result folders into a [`ResultsTable`].
//!
//! Expected layout:
//!
//! ```text
//! results/
//!     flat-10-json/token-counts.json
//!     flat-10-ascii/token-counts.json
//!     nested-deep-full/token-counts.json
//! ```
//!
//! Scanning never fails on a single bad entry. Each subdirectory produces an [`Entry`], either
//! the parsed record or a [`Skip`] explaining why it contributes nothing, and the table is a
//! plain fold over those outcomes.

use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::FilesConfig;
use crate::errors::{Error, Result};
use crate::keys::{self, DatasetKey, FormatKey};
use crate::metrics::{MetricRecord, ResultsTable};

/// Why an entry was left out of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// Directory, file or line the entry came from
    pub name: String,
    pub reason: String,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Outcome of scanning one input entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Loaded(T),
    Skipped(Skip),
}

impl<T> Entry<T> {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Entry::Skipped(Skip {
            name: name.into(),
            reason: reason.into(),
        })
    }
}

/// One successfully read result directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResult {
    pub dataset: DatasetKey,
    pub format: FormatKey,
    pub record: MetricRecord,
}

/// Check that `path` exists and is a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound { path: path.to_path_buf() });
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory { path: path.to_path_buf() });
    }
    Ok(())
}

/// Scan the immediate subdirectories of `results_dir`, in name order.
///
/// Only failing to list `results_dir` itself is an error; everything below it degrades to a
/// skipped entry.
pub fn scan_results(results_dir: &Path, files: &FilesConfig) -> Result<Vec<Entry<LoadedResult>>> {
    ensure_dir(results_dir)?;

    let listing = fs::read_dir(results_dir).map_err(|e| Error::io(format!("list {}", results_dir.display()), e))?;

    let mut subdirs: Vec<_> = listing
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    Ok(subdirs.iter().map(|dir| load_result_dir(dir, files)).collect())
}

/// Read one `<kind>-<size>-<format>` directory.
pub fn load_result_dir(dir: &Path, files: &FilesConfig) -> Entry<LoadedResult> {
    let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let metrics_path = dir.join(&files.metrics_file);
    if !metrics_path.is_file() {
        return Entry::skipped(name, format!("no {}", files.metrics_file));
    }

    let Some((dataset, format)) = keys::parse_result_dir_name(&name) else {
        return Entry::skipped(name, "could not parse directory name");
    };

    let contents = match fs::read_to_string(&metrics_path) {
        Ok(contents) => contents,
        Err(e) => return Entry::skipped(name, format!("error reading {}: {e}", metrics_path.display())),
    };

    match serde_json::from_str::<MetricRecord>(&contents) {
        Ok(record) => Entry::Loaded(LoadedResult { dataset, format, record }),
        Err(e) => Entry::skipped(name, format!("error reading {}: {e}", metrics_path.display())),
    }
}

/// Fold scan outcomes into a table, logging each skipped entry.
pub fn fold_results(entries: Vec<Entry<LoadedResult>>) -> ResultsTable {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Loaded(result) => {
                debug!(dataset = %result.dataset, format = %result.format, "Loaded result");
                Some((result.dataset, result.format, result.record))
            }
            Entry::Skipped(skip) => {
                warn!("Skipping {skip}");
                None
            }
        })
        .collect()
}

/// Scan and fold in one step. The table may be empty; callers decide whether that is fatal.
pub fn load_results(results_dir: &Path, files: &FilesConfig) -> Result<ResultsTable> {
    Ok(fold_results(scan_results(results_dir, files)?))
}
