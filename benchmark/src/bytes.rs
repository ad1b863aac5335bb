//! Byte-size comparison across encodings.
//!
//! Expected layout, one directory per dataset kind:
//!
//! ```text
//! encoded/
//!     flat/
//!         10.json
//!         10.stele-ascii
//!         10.stele-light
//!         10.stele-full
//! ```
//!
//! Every `<size>.json` baseline defines a dataset `<kind>/<size>`; sibling files for the other
//! formats are looked up by name. Missing and empty files are both treated as absent.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::keys::DatasetKey;
use crate::loader::ensure_dir;
use crate::metrics::{MetricRecord, ResultsTable};
use crate::report::{PLACEHOLDER, format_number, format_reduction};

/// Metric name under which byte sizes are stored in the table
pub const BYTES: &str = "bytes";

/// Size of the file at `path`, or `None` when it is missing or empty.
fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len()).filter(|&len| len > 0)
}

/// Collect per-format byte sizes for every baseline file under `encoded_dir`.
pub fn collect_sizes(encoded_dir: &Path, config: &Config) -> Result<ResultsTable> {
    ensure_dir(encoded_dir)?;

    let baseline = &config.baseline().name;
    let listing = fs::read_dir(encoded_dir).map_err(|e| Error::io(format!("list {}", encoded_dir.display()), e))?;

    let mut table = ResultsTable::new();

    for kind_dir in listing.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
        if !kind_dir.is_dir() {
            continue;
        }
        let Some(kind) = kind_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let files = match fs::read_dir(&kind_dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", kind_dir.display());
                continue;
            }
        };

        for path in files.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some(baseline.as_str()) {
                continue;
            }
            let Some(size_name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let dataset = DatasetKey::new(kind.as_str(), size_name.as_str());
            for format in &config.formats {
                let file = if format.name == *baseline {
                    path.clone()
                } else {
                    kind_dir.join(format!("{size_name}.{}{}", config.bytes.encoded_prefix, format.name))
                };

                if let Some(bytes) = file_size(&file) {
                    debug!(dataset = %dataset, format = %format.name, bytes, "Found encoded file");
                    table.insert(dataset.clone(), format.name.clone(), MetricRecord::new().with(BYTES, bytes));
                }
            }
        }
    }

    Ok(table)
}

fn size_of(table: &ResultsTable, dataset: &DatasetKey, format: &str) -> Option<u64> {
    table.get(dataset, format).and_then(|record| record.get(BYTES))
}

/// Render the per-dataset size table.
///
/// The baseline column shows the raw size; every other column shows `size (reduction)`.
pub fn render_table(sizes: &ResultsTable, config: &Config) -> String {
    if sizes.is_empty() {
        return "No data found.\n".to_string();
    }

    let baseline = &config.baseline().name;
    let mut lines = Vec::with_capacity(sizes.len() + 2);

    let labels: Vec<&str> = config.formats.iter().map(|f| f.label.as_str()).collect();
    lines.push(format!("| Dataset | {} |", labels.join(" | ")));
    let rules: Vec<String> = labels.iter().map(|l| "-".repeat(l.chars().count() + 2)).collect();
    lines.push(format!("|---------|{}|", rules.join("|")));

    for dataset in sizes.datasets() {
        let baseline_size = size_of(sizes, dataset, baseline).unwrap_or(0);
        let mut row = vec![dataset.to_string()];

        for format in &config.formats {
            let cell = match size_of(sizes, dataset, &format.name) {
                Some(size) if format.name == *baseline => format_number(size),
                Some(size) => format!("{} ({})", format_number(size), format_reduction(baseline_size, size)),
                None => PLACEHOLDER.to_string(),
            };
            row.push(cell);
        }
        lines.push(format!("| {} |", row.join(" | ")));
    }

    lines.join("\n")
}

/// Truncated mean size per format, over the datasets where that format is present.
pub fn average_sizes(sizes: &ResultsTable, config: &Config) -> Vec<(String, u64)> {
    config
        .formats
        .iter()
        .filter_map(|format| {
            let present: Vec<u64> = sizes.datasets().filter_map(|d| size_of(sizes, d, &format.name)).collect();
            if present.is_empty() {
                return None;
            }
            let mean = present.iter().map(|&s| s as u128).sum::<u128>() / present.len() as u128;
            Some((format.name.clone(), mean as u64))
        })
        .collect()
}

/// Render the summary block.
///
/// Reductions compare each format's mean size with the mean baseline size. This is not the
/// mean of per-dataset reductions; the two diverge when dataset sizes vary widely.
pub fn render_summary(sizes: &ResultsTable, config: &Config) -> String {
    if sizes.is_empty() {
        return String::new();
    }

    let baseline = &config.baseline().name;
    let averages = average_sizes(sizes, config);
    let baseline_avg = averages.iter().find(|(name, _)| name == baseline).map(|(_, avg)| *avg).unwrap_or(0);

    let mut lines = vec![
        String::new(),
        "## Summary Statistics".to_string(),
        String::new(),
        "Average file sizes:".to_string(),
        String::new(),
    ];
    for (name, avg) in &averages {
        let mut line = format!("- **{}**: {} bytes", name.to_uppercase(), format_number(*avg));
        if name != baseline {
            line.push_str(&format!(" ({} vs {})", format_reduction(baseline_avg, *avg), baseline.to_uppercase()));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// The complete report printed by `compare-bytes`.
pub fn render_report(sizes: &ResultsTable, config: &Config) -> String {
    format!(
        "# Byte Size Comparison\n\n{}\n{}\n",
        render_table(sizes, config),
        render_summary(sizes, config)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sized(dir: &Path, name: &str, len: usize) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), vec![b'x'; len]).unwrap();
    }

    fn fixture() -> TempDir {
        let root = TempDir::new().unwrap();
        let flat = root.path().join("flat");
        write_sized(&flat, "10.json", 1000);
        write_sized(&flat, "10.stele-ascii", 800);
        write_sized(&flat, "10.stele-light", 400);
        write_sized(&flat, "10.stele-full", 0);
        let nested = root.path().join("nested");
        write_sized(&nested, "deep.json", 3000);
        write_sized(&nested, "deep.stele-light", 1500);
        // Encoded file without a baseline is not a dataset
        write_sized(&nested, "orphan.stele-light", 10);
        fs::write(root.path().join("notes.txt"), "ignored").unwrap();
        root
    }

    #[test_log::test]
    fn collects_present_non_empty_files() {
        let root = fixture();
        let sizes = collect_sizes(root.path(), &Config::default()).unwrap();

        let flat = DatasetKey::new("flat", "10");
        assert_eq!(sizes.len(), 2);
        assert_eq!(size_of(&sizes, &flat, "json"), Some(1000));
        assert_eq!(size_of(&sizes, &flat, "light"), Some(400));
        // Zero-length is absent, not zero
        assert_eq!(size_of(&sizes, &flat, "full"), None);
        assert_eq!(size_of(&sizes, &DatasetKey::new("nested", "deep"), "ascii"), None);
    }

    #[test]
    fn empty_baseline_only_dataset_is_omitted() {
        let root = TempDir::new().unwrap();
        write_sized(&root.path().join("flat"), "10.json", 0);

        let sizes = collect_sizes(root.path(), &Config::default()).unwrap();
        assert!(sizes.is_empty());
    }

    #[test]
    fn table_shows_sizes_and_reductions() {
        let root = fixture();
        let config = Config::default();
        let table = render_table(&collect_sizes(root.path(), &config).unwrap(), &config);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "| Dataset | JSON | ASCII | Light | Full |");
        assert_eq!(lines[1], "|---------|------|-------|-------|------|");
        assert_eq!(lines[2], "| flat/10 | 1,000 | 800 (+20.0%) | 400 (+60.0%) | - |");
        assert_eq!(lines[3], "| nested/deep | 3,000 | - | 1,500 (+50.0%) | - |");
    }

    #[test]
    fn missing_baseline_yields_placeholder_reduction() {
        let mut sizes = ResultsTable::new();
        sizes.insert(DatasetKey::new("flat", "10"), "light".into(), MetricRecord::new().with(BYTES, 400));

        let table = render_table(&sizes, &Config::default());
        assert!(table.contains("| flat/10 | - | - | 400 (-) | - |"));
    }

    #[test]
    fn summary_reduces_mean_sizes_not_mean_reductions() {
        let mut sizes = ResultsTable::new();
        let small = DatasetKey::new("flat", "10");
        let large = DatasetKey::new("flat", "1000");
        sizes.insert(small.clone(), "json".into(), MetricRecord::new().with(BYTES, 100));
        sizes.insert(small, "light".into(), MetricRecord::new().with(BYTES, 10));
        sizes.insert(large.clone(), "json".into(), MetricRecord::new().with(BYTES, 10_000));
        sizes.insert(large, "light".into(), MetricRecord::new().with(BYTES, 9_000));

        // Per-dataset reductions are 90% and 10% (mean 50%); the means are 5,050 and 4,505.
        let summary = render_summary(&sizes, &Config::default());
        assert!(summary.contains("- **JSON**: 5,050 bytes\n"));
        assert!(summary.contains("- **LIGHT**: 4,505 bytes (+10.8% vs JSON)"));
        assert!(!summary.contains("ASCII"));
    }

    #[test]
    fn summary_lists_one_line_per_format() {
        let mut sizes = ResultsTable::new();
        let flat = DatasetKey::new("flat", "10");
        sizes.insert(flat.clone(), "json".into(), MetricRecord::new().with(BYTES, 100));
        sizes.insert(flat, "light".into(), MetricRecord::new().with(BYTES, 10));

        assert_eq!(
            render_summary(&sizes, &Config::default()),
            "\n## Summary Statistics\n\nAverage file sizes:\n\n- **JSON**: 100 bytes\n- **LIGHT**: 10 bytes (+90.0% vs JSON)"
        );
    }

    #[test]
    fn summary_truncates_means() {
        let mut sizes = ResultsTable::new();
        sizes.insert(DatasetKey::new("a", "1"), "json".into(), MetricRecord::new().with(BYTES, 3));
        sizes.insert(DatasetKey::new("a", "2"), "json".into(), MetricRecord::new().with(BYTES, 4));

        assert_eq!(average_sizes(&sizes, &Config::default()), vec![("json".to_string(), 3)]);
    }

    #[test]
    fn full_report_layout() {
        let root = fixture();
        let config = Config::default();
        let report = render_report(&collect_sizes(root.path(), &config).unwrap(), &config);

        assert!(report.starts_with("# Byte Size Comparison\n\n| Dataset | JSON |"));
        assert!(report.contains("\n\n## Summary Statistics\n\nAverage file sizes:\n\n- **JSON**: 2,000 bytes\n"));
        assert!(report.contains("- **LIGHT**: 950 bytes (+52.5% vs JSON)"));
    }

    #[test]
    fn empty_report_sections() {
        assert_eq!(render_table(&ResultsTable::new(), &Config::default()), "No data found.\n");
        assert_eq!(render_summary(&ResultsTable::new(), &Config::default()), "");
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            collect_sizes(&root.path().join("missing"), &Config::default()),
            Err(Error::NotFound { .. })
        ));
    }
}
