//! Metric records and the results table they aggregate into.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::keys::{DatasetKey, FormatKey};

pub const INPUT_TOKENS: &str = "input_tokens";
pub const OUTPUT_TOKENS: &str = "output_tokens";
pub const CACHE_READ_INPUT_TOKENS: &str = "cache_read_input_tokens";
pub const CACHE_CREATION_INPUT_TOKENS: &str = "cache_creation_input_tokens";
pub const TOTAL_INPUT: &str = "total_input";
pub const TOTAL_ALL: &str = "total_all";

/// Token-count keys a per-run metrics file may carry; each must be a non-negative integer.
pub const COUNT_METRICS: [&str; 6] = [
    INPUT_TOKENS,
    OUTPUT_TOKENS,
    CACHE_READ_INPUT_TOKENS,
    CACHE_CREATION_INPUT_TOKENS,
    TOTAL_INPUT,
    TOTAL_ALL,
];

/// Metrics for one (dataset, format) pair, e.g. token counts or a byte size.
///
/// Held as the JSON object it was read from, so fields other than the counts (`model`,
/// `dataset`, ...) pass through to the comparison document untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricRecord(Map<String, Value>);

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: &str, value: u64) -> Self {
        self.0.insert(metric.to_string(), Value::from(value));
        self
    }

    /// Read a counter; `None` when the field is missing or not a non-negative integer
    pub fn get(&self, metric: &str) -> Option<u64> {
        self.0.get(metric).and_then(Value::as_u64)
    }

    /// Any field of the record, counters included
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl<'de> Deserialize<'de> for MetricRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        for metric in COUNT_METRICS {
            if let Some(value) = fields.get(metric).filter(|value| value.as_u64().is_none()) {
                return Err(de::Error::custom(format!("{metric} must be a non-negative integer, got {value}")));
            }
        }
        Ok(Self(fields))
    }
}

impl<const N: usize> From<[(&str, u64); N]> for MetricRecord {
    fn from(entries: [(&str, u64); N]) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.to_string(), Value::from(v))).collect())
    }
}

/// `dataset -> format -> metrics`, the shape every report renders from.
///
/// Datasets only come into existence through [`ResultsTable::insert`], so every dataset present
/// has at least one format entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsTable(BTreeMap<DatasetKey, BTreeMap<FormatKey, MetricRecord>>);

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics for a pair, replacing any previous record for the same pair
    pub fn insert(&mut self, dataset: DatasetKey, format: FormatKey, record: MetricRecord) {
        self.0.entry(dataset).or_default().insert(format, record);
    }

    pub fn get(&self, dataset: &DatasetKey, format: &str) -> Option<&MetricRecord> {
        self.0.get(dataset).and_then(|formats| formats.get(format))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of datasets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Datasets in ascending canonical order
    pub fn datasets(&self) -> impl Iterator<Item = &DatasetKey> {
        self.0.keys()
    }

    /// Whether any dataset has an entry for `format`
    pub fn has_format(&self, format: &str) -> bool {
        self.0.values().any(|formats| formats.contains_key(format))
    }
}

impl FromIterator<(DatasetKey, FormatKey, MetricRecord)> for ResultsTable {
    fn from_iter<I: IntoIterator<Item = (DatasetKey, FormatKey, MetricRecord)>>(iter: I) -> Self {
        let mut table = ResultsTable::new();
        for (dataset, format, record) in iter {
            table.insert(dataset, format, record);
        }
        table
    }
}

/// Running token totals for one session log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl SessionUsage {
    pub fn add(&mut self, input: u64, output: u64, cache_read: u64, cache_creation: u64) {
        self.input_tokens = self.input_tokens.saturating_add(input);
        self.output_tokens = self.output_tokens.saturating_add(output);
        self.cache_read_tokens = self.cache_read_tokens.saturating_add(cache_read);
        self.cache_creation_tokens = self.cache_creation_tokens.saturating_add(cache_creation);
    }

    /// Input tokens from every source: fresh, cache reads and cache writes
    pub fn total_input(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.cache_read_tokens)
            .saturating_add(self.cache_creation_tokens)
    }

    pub fn total_all(&self) -> u64 {
        self.total_input().saturating_add(self.output_tokens)
    }

    /// The per-run metrics file shape consumed by the results loader
    pub fn to_metric_record(&self) -> MetricRecord {
        MetricRecord::from([
            (INPUT_TOKENS, self.input_tokens),
            (OUTPUT_TOKENS, self.output_tokens),
            (CACHE_READ_INPUT_TOKENS, self.cache_read_tokens),
            (CACHE_CREATION_INPUT_TOKENS, self.cache_creation_tokens),
            (TOTAL_INPUT, self.total_input()),
            (TOTAL_ALL, self.total_all()),
        ])
    }
}

impl fmt::Display for SessionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input={} output={} cache_read={} cache_creation={}",
            self.input_tokens, self.output_tokens, self.cache_read_tokens, self.cache_creation_tokens
        )
    }
}
