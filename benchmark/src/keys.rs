//! Key/name codec.
//!
//! Result directories are named `<kind>-<size>-<format...>`, e.g. `flat-10-json` or
//! `nested-deep-stele-ascii`. The first two hyphen-delimited segments name the dataset and
//! everything after them (re-joined with hyphens) names the format. Run entries in the
//! monolithic log are grouped under the compound key `<model>-<kind>-<size>`.
//!
//! Neither direction guards against ambiguity. Model `a-b` with dataset `c/d` and model `a` with
//! dataset `b/c-d` share the compound key `a-b-c-d`, and a kind containing `-` cannot
//! round-trip through a directory name.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Identifier of an encoding under test (`json`, `ascii`, ...).
pub type FormatKey = String;

/// Identifies a benchmark fixture, rendered canonically as `<kind>/<size>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    kind: String,
    size: String,
}

impl DatasetKey {
    pub fn new(kind: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            size: size.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    fn canonical_bytes(&self) -> impl Iterator<Item = &u8> {
        self.kind.as_bytes().iter().chain(b"/").chain(self.size.as_bytes())
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.size)
    }
}

// Ordered by the canonical string so report rows sort the way `"<kind>/<size>"` does. Keys whose
// canonical strings coincide (`a/b` + `c` vs `a` + `b/c`) fall back to the fields, keeping the
// order consistent with `Eq`.
impl Ord for DatasetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_bytes()
            .cmp(other.canonical_bytes())
            .then_with(|| (&self.kind, &self.size).cmp(&(&other.kind, &other.size)))
    }
}

impl PartialOrd for DatasetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dataset key must look like '<kind>/<size>', got '{0}'")]
pub struct ParseDatasetKeyError(String);

impl FromStr for DatasetKey {
    type Err = ParseDatasetKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((kind, size)) if !kind.is_empty() && !size.is_empty() => Ok(DatasetKey::new(kind, size)),
            _ => Err(ParseDatasetKeyError(s.to_string())),
        }
    }
}

impl Serialize for DatasetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DatasetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Split a result directory name into its dataset and format.
///
/// Returns `None` when the name has fewer than three hyphen-delimited segments or any of kind,
/// size or format is empty. Callers skip such entries rather than failing the run.
pub fn parse_result_dir_name(name: &str) -> Option<(DatasetKey, FormatKey)> {
    let mut parts = name.splitn(3, '-');
    let kind = parts.next()?;
    let size = parts.next()?;
    let format = parts.next()?;

    if kind.is_empty() || size.is_empty() || format.is_empty() {
        return None;
    }

    Some((DatasetKey::new(kind, size), format.to_string()))
}

/// Inverse of [`parse_result_dir_name`]: `flat/10` + `ascii` -> `flat-10-ascii`
pub fn result_dir_name(dataset: &DatasetKey, format: &str) -> String {
    format!("{}-{}-{}", dataset.kind, dataset.size, format)
}

/// Grouping key for run entries: `haiku` + `flat/10` -> `haiku-flat-10`
pub fn compound_key(model: &str, dataset: &str) -> String {
    format!("{}-{}", model, dataset.replace('/', "-"))
}
