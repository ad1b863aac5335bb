//! Report rendering: the markdown summary and the structured comparison document.
//!
//! Both renderings only need the `dataset -> format -> metrics` shape of a [`ResultsTable`];
//! they never recompute anything.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::metrics::ResultsTable;

/// Placeholder for a missing cell or an undefined reduction
pub const PLACEHOLDER: &str = "-";

/// Format a count with comma thousands separators: `1234567` -> `1,234,567`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed percentage reduction of `compressed` relative to `baseline`, one decimal place.
///
/// A smaller `compressed` gives a positive value (`1000 -> 400` is `+60.0%`). A zero baseline
/// has no defined reduction and renders as [`PLACEHOLDER`].
pub fn format_reduction(baseline: u64, compressed: u64) -> String {
    if baseline == 0 {
        return PLACEHOLDER.to_string();
    }
    let reduction = (baseline as f64 - compressed as f64) / baseline as f64 * 100.0;
    format!("{reduction:+.1}%")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Render one metric as a markdown table.
///
/// Rows are datasets in ascending order; columns are the entries of `formats` that appear for
/// at least one dataset, in the given order. A pair with no record shows [`PLACEHOLDER`]; a
/// record without `metric` shows `0`.
pub fn markdown_table(table: &ResultsTable, metric: &str, formats: &[String]) -> String {
    if table.is_empty() {
        return "No results found.\n".to_string();
    }

    let columns: Vec<&String> = formats.iter().filter(|f| table.has_format(f)).collect();
    if columns.is_empty() {
        return "No format data found.\n".to_string();
    }

    let mut lines = Vec::with_capacity(table.len() + 2);

    let headers: Vec<String> = columns.iter().map(|f| capitalize(f)).collect();
    lines.push(format!("| Dataset | {} |", headers.join(" | ")));
    lines.push(format!("|---------|{}|", vec!["--------"; columns.len()].join("|")));

    for dataset in table.datasets() {
        let mut row = vec![dataset.to_string()];
        for format in &columns {
            let cell = match table.get(dataset, format) {
                Some(record) => format_number(record.get(metric).unwrap_or(0)),
                None => PLACEHOLDER.to_string(),
            };
            row.push(cell);
        }
        lines.push(format!("| {} |", row.join(" | ")));
    }

    lines.join("\n")
}

/// Render the full markdown summary: one section per configured summary metric.
pub fn render_summary(table: &ResultsTable, config: &Config) -> String {
    let formats = config.format_names();
    let mut sections = vec!["# Token Usage Comparison".to_string(), String::new()];

    for metric in &config.summary_metrics {
        sections.push(format!("## {}", metric.title));
        sections.push(String::new());
        sections.push(markdown_table(table, &metric.key, &formats));
        sections.push(String::new());
    }

    sections.join("\n")
}

/// Machine-readable re-shape of a results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDocument {
    pub datasets: ResultsTable,
    pub summary: ComparisonMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetadata {
    pub formats: Vec<String>,
    pub metrics: Vec<String>,
}

impl ComparisonDocument {
    pub fn new(table: &ResultsTable, config: &Config) -> Self {
        Self {
            datasets: table.clone(),
            summary: ComparisonMetadata {
                formats: config.format_names(),
                metrics: config.comparison_metrics.clone(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Where [`write_reports`] put its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub comparison: PathBuf,
}

/// Render both reports and write them into `results_dir`.
///
/// An empty table is rejected before anything is written. Both documents are staged next to
/// their targets first and only moved into place once every staging write has succeeded, so a
/// failed write leaves neither report behind.
pub fn write_reports(table: &ResultsTable, results_dir: &Path, config: &Config) -> Result<ReportPaths> {
    if table.is_empty() {
        return Err(Error::NoResults {
            what: "valid results".to_string(),
        });
    }

    let summary_md = render_summary(table, config);
    let comparison_json = ComparisonDocument::new(table, config).to_json()?;

    let paths = ReportPaths {
        summary: results_dir.join(&config.files.summary_file),
        comparison: results_dir.join(&config.files.comparison_file),
    };
    let outputs = [
        ("summary", paths.summary.clone(), summary_md),
        ("comparison", paths.comparison.clone(), comparison_json),
    ];

    let mut staged: Vec<(&str, PathBuf, PathBuf)> = Vec::with_capacity(outputs.len());
    for (label, target, contents) in outputs {
        let staging = staging_path(&target);
        if let Err(e) = fs::write(&staging, contents) {
            discard_staged(staged.iter().map(|(_, _, path)| path.as_path()));
            return Err(Error::io(format!("write {}", staging.display()), e));
        }
        staged.push((label, target, staging));
    }

    for (label, target, staging) in &staged {
        fs::rename(staging, target).map_err(|e| Error::io(format!("rename {} to {}", staging.display(), target.display()), e))?;
        info!("Wrote {label} to {}", target.display());
    }

    Ok(paths)
}

/// `<target>.tmp`, next to the target
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard_staged<'a>(paths: impl Iterator<Item = &'a Path>) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove staged report {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatSpec;
    use crate::keys::DatasetKey;
    use crate::metrics::{INPUT_TOKENS, MetricRecord, TOTAL_ALL};
    use rstest::rstest;

    fn sample_table() -> ResultsTable {
        let mut table = ResultsTable::new();
        let flat = DatasetKey::new("flat", "10");
        let nested = DatasetKey::new("nested", "deep");
        table.insert(flat.clone(), "json".into(), MetricRecord::from([(TOTAL_ALL, 1_500), (INPUT_TOKENS, 12)]));
        table.insert(flat, "ascii".into(), MetricRecord::from([(TOTAL_ALL, 300)]));
        table.insert(nested, "json".into(), MetricRecord::from([(TOTAL_ALL, 2_000_000)]));
        table
    }

    fn formats() -> Vec<String> {
        Config::default().format_names()
    }

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1000, "1,000")]
    #[case(123456, "123,456")]
    #[case(1234567, "1,234,567")]
    fn formats_numbers_with_separators(#[case] n: u64, #[case] expected: &str) {
        assert_eq!(format_number(n), expected);
    }

    #[rstest]
    #[case(1000, 1000, "+0.0%")]
    #[case(1000, 0, "+100.0%")]
    #[case(1000, 400, "+60.0%")]
    #[case(1000, 1500, "-50.0%")]
    #[case(3, 2, "+33.3%")]
    #[case(0, 10, "-")]
    #[case(0, 0, "-")]
    fn reductions(#[case] baseline: u64, #[case] compressed: u64, #[case] expected: &str) {
        assert_eq!(format_reduction(baseline, compressed), expected);
    }

    #[test]
    fn table_uses_present_formats_in_canonical_order() {
        let rendered = markdown_table(&sample_table(), TOTAL_ALL, &formats());
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "| Dataset | Json | Ascii |",
                "|---------|--------|--------|",
                "| flat/10 | 1,500 | 300 |",
                "| nested/deep | 2,000,000 | - |",
            ]
        );
    }

    #[test]
    fn missing_metric_in_existing_record_renders_zero() {
        let rendered = markdown_table(&sample_table(), INPUT_TOKENS, &formats());
        assert!(rendered.contains("| flat/10 | 12 | 0 |"));
        assert!(rendered.contains("| nested/deep | 0 | - |"));
    }

    #[test]
    fn empty_table_degrades_to_message() {
        assert_eq!(markdown_table(&ResultsTable::new(), TOTAL_ALL, &formats()), "No results found.\n");
    }

    #[test]
    fn unknown_formats_only_degrades_to_message() {
        let mut table = ResultsTable::new();
        table.insert(DatasetKey::new("flat", "10"), "yaml".into(), MetricRecord::from([(TOTAL_ALL, 1)]));
        assert_eq!(markdown_table(&table, TOTAL_ALL, &formats()), "No format data found.\n");
    }

    #[test]
    fn summary_has_one_section_per_metric() {
        let summary = render_summary(&sample_table(), &Config::default());

        assert!(summary.starts_with("# Token Usage Comparison\n\n## Total Tokens (All Sources)\n\n| Dataset |"));
        let headings: Vec<&str> = summary.lines().filter(|l| l.starts_with("## ")).collect();
        assert_eq!(
            headings,
            vec![
                "## Total Tokens (All Sources)",
                "## Input Tokens (Non-Cached)",
                "## Cache Read Tokens",
                "## Output Tokens",
            ]
        );
        assert!(summary.ends_with("|\n"));
    }

    #[test]
    fn summary_follows_configured_formats() {
        let config = Config {
            formats: vec![FormatSpec::new("ascii", "ASCII"), FormatSpec::new("json", "JSON")],
            ..Config::default()
        };
        let summary = render_summary(&sample_table(), &config);
        assert!(summary.contains("| Dataset | Ascii | Json |"));
        assert!(summary.contains("| flat/10 | 300 | 1,500 |"));
    }

    #[test]
    fn comparison_document_is_lossless() {
        let table = sample_table();
        let json = ComparisonDocument::new(&table, &Config::default()).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["datasets"]["flat/10"]["ascii"]["total_all"], 300);
        assert_eq!(value["summary"]["formats"], serde_json::json!(["json", "ascii", "light", "full"]));
        assert_eq!(value["summary"]["metrics"].as_array().map(Vec::len), Some(6));

        let parsed: ComparisonDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.datasets, table);
    }

    #[test]
    fn write_reports_rejects_empty_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = write_reports(&ResultsTable::new(), dir.path(), &Config::default()).unwrap_err();

        assert!(matches!(err, Error::NoResults { .. }));
        assert!(!dir.path().join("summary.md").exists());
        assert!(!dir.path().join("comparison.json").exists());
    }

    #[test_log::test]
    fn failed_write_leaves_no_partial_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        // The comparison target's parent directory does not exist, so its staging write fails
        config.files.comparison_file = "missing/comparison.json".to_string();

        let err = write_reports(&sample_table(), dir.path(), &config).unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(!dir.path().join("summary.md").exists());
        assert!(!dir.path().join("summary.md.tmp").exists());
    }

    #[test]
    fn successful_write_leaves_no_staging_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = write_reports(&sample_table(), dir.path(), &Config::default()).unwrap();

        assert!(paths.summary.exists());
        assert!(paths.comparison.exists());
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["comparison.json", "summary.md"]);
    }
}
