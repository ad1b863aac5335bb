//! Tool configuration.
//!
//! Every fixed list and naming template the tools rely on (canonical format order, the metrics
//! summarized in reports, metrics/report file names, the splitter's source location) lives in a
//! single immutable [`Config`]. Components take the config (or one of its sections) as an
//! argument rather than hard-coding literals, so tests can run them against alternate format and
//! metric sets.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **Built-in defaults** - [`Config::default`]
//! 2. **YAML config file** - optional, default `stele-bench.yaml`; a missing file is skipped
//! 3. **Environment variables** - prefixed with `STELE_BENCH_`
//!
//! For nested values use double underscores, e.g. `STELE_BENCH_SPLIT__RESULTS_DIR=out` sets
//! `split.results_dir`.
//!
//! ## Example
//!
//! ```yaml
//! formats:
//!   - name: json
//!     label: JSON
//!   - name: ascii
//!     label: ASCII
//! files:
//!   metrics_file: token-counts.json
//! split:
//!   bench_dir: /srv/bench
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};
use crate::metrics::{CACHE_CREATION_INPUT_TOKENS, CACHE_READ_INPUT_TOKENS, INPUT_TOKENS, OUTPUT_TOKENS, TOTAL_ALL, TOTAL_INPUT};

pub const DEFAULT_CONFIG_FILE: &str = "stele-bench.yaml";
pub const ENV_PREFIX: &str = "STELE_BENCH_";

/// Root configuration shared by all tools.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Encodings under comparison, in canonical column order. The first entry is the baseline.
    pub formats: Vec<FormatSpec>,
    /// Metrics rendered as markdown tables, in document order
    pub summary_metrics: Vec<SummaryMetric>,
    /// Metric names advertised in the comparison document's metadata block
    pub comparison_metrics: Vec<String>,
    pub files: FilesConfig,
    pub bytes: BytesConfig,
    pub session: SessionConfig,
    pub split: SplitConfig,
}

/// One encoding under comparison.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FormatSpec {
    /// Key used in directory names and the results table (e.g. `ascii`)
    pub name: String,
    /// Column label in the byte-size report (e.g. `ASCII`)
    pub label: String,
}

impl FormatSpec {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SummaryMetric {
    /// Metric record key, e.g. `total_all`
    pub key: String,
    /// Section heading in the markdown summary
    pub title: String,
}

impl SummaryMetric {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
        }
    }
}

/// Names of the files the aggregation tool reads and writes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Per-run metrics file expected inside each result directory
    pub metrics_file: String,
    /// Markdown summary written into the results directory
    pub summary_file: String,
    /// Structured comparison document written into the results directory
    pub comparison_file: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            metrics_file: "token-counts.json".to_string(),
            summary_file: "summary.md".to_string(),
            comparison_file: "comparison.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BytesConfig {
    /// Extension prefix of encoded variants: `<size>.<prefix><format>`
    pub encoded_prefix: String,
}

impl Default for BytesConfig {
    fn default() -> Self {
        Self {
            encoded_prefix: "stele-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// `type` value marking a model-turn event in session logs
    pub message_type: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            message_type: "message".to_string(),
        }
    }
}

/// Fixed locations used by the result splitter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Benchmark base directory
    pub bench_dir: PathBuf,
    /// Results directory, relative to `bench_dir`
    pub results_dir: PathBuf,
    /// Monolithic run log inside the results directory
    pub source_file: String,
    /// Extension of the per-group output files
    pub output_extension: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            bench_dir: PathBuf::from("."),
            results_dir: PathBuf::from("results"),
            source_file: "token-counts.jsonl".to_string(),
            output_extension: "jsonl".to_string(),
        }
    }
}

impl SplitConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.bench_dir.join(&self.results_dir)
    }

    pub fn source_path(&self) -> PathBuf {
        self.output_dir().join(&self.source_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            formats: vec![
                FormatSpec::new("json", "JSON"),
                FormatSpec::new("ascii", "ASCII"),
                FormatSpec::new("light", "Light"),
                FormatSpec::new("full", "Full"),
            ],
            summary_metrics: vec![
                SummaryMetric::new(TOTAL_ALL, "Total Tokens (All Sources)"),
                SummaryMetric::new(INPUT_TOKENS, "Input Tokens (Non-Cached)"),
                SummaryMetric::new(CACHE_READ_INPUT_TOKENS, "Cache Read Tokens"),
                SummaryMetric::new(OUTPUT_TOKENS, "Output Tokens"),
            ],
            comparison_metrics: [
                INPUT_TOKENS,
                CACHE_READ_INPUT_TOKENS,
                CACHE_CREATION_INPUT_TOKENS,
                OUTPUT_TOKENS,
                TOTAL_INPUT,
                TOTAL_ALL,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            files: FilesConfig::default(),
            bytes: BytesConfig::default(),
            session: SessionConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl Config {
    /// Load defaults, then the YAML file at `path` (if it exists), then `STELE_BENCH_*` overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            // STELE_BENCH_CONFIG names the file itself and is consumed by clap
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(invalid("at least one format is required"));
        }

        let mut seen = HashSet::new();
        for format in &self.formats {
            if format.name.is_empty() {
                return Err(invalid("format names cannot be empty"));
            }
            if !seen.insert(format.name.as_str()) {
                return Err(invalid(&format!("duplicate format '{}'", format.name)));
            }
        }

        if self.summary_metrics.is_empty() {
            return Err(invalid("summary_metrics cannot be empty"));
        }

        if self.files.metrics_file.is_empty() {
            return Err(invalid("files.metrics_file cannot be empty"));
        }

        Ok(())
    }

    /// The uncompressed reference format (first in canonical order).
    ///
    /// Panics on an empty format list, which [`Config::validate`] rejects.
    pub fn baseline(&self) -> &FormatSpec {
        &self.formats[0]
    }

    pub fn format_names(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.name.clone()).collect()
    }
}

fn invalid(message: &str) -> Error {
    figment::Error::from(format!("Config validation: {message}")).into()
}
