//! End-to-end pipeline tests: artifacts on disk in, reports on disk out.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::Config;
use crate::keys::DatasetKey;
use crate::metrics::TOTAL_ALL;
use crate::report::{self, ComparisonDocument};
use crate::{bytes, loader, session, split};

fn write_run(root: &Path, dir: &str, contents: &str) {
    let run = root.join(dir);
    fs::create_dir_all(&run).unwrap();
    fs::write(run.join("token-counts.json"), contents).unwrap();
}

#[test_log::test]
fn aggregate_end_to_end() {
    let results = TempDir::new().unwrap();
    write_run(results.path(), "flat-10-json", r#"{"total_all": 500}"#);
    write_run(
        results.path(),
        "flat-10-ascii",
        r#"{"model": "haiku", "dataset": "flat/10", "input_tokens": 120, "total_all": 300}"#,
    );
    write_run(results.path(), "broken", r#"{"total_all": 1}"#);
    let config = Config::default();

    let table = loader::load_results(results.path(), &config.files).unwrap();
    let paths = report::write_reports(&table, results.path(), &config).unwrap();

    let summary = fs::read_to_string(&paths.summary).unwrap();
    let total_all_section = summary
        .split("## ")
        .find(|section| section.starts_with("Total Tokens (All Sources)"))
        .expect("total_all section");
    assert!(total_all_section.contains("| Dataset | Json | Ascii |"));
    assert!(total_all_section.contains("| flat/10 | 500 | 300 |"));
    assert!(summary.contains("| flat/10 | 0 | 120 |"));

    let comparison: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.comparison).unwrap()).unwrap();
    assert_eq!(comparison["datasets"]["flat/10"]["ascii"]["total_all"], 300);
    assert_eq!(comparison["datasets"]["flat/10"]["json"]["total_all"], 500);
    // Descriptive fields of the run pass through untouched
    assert_eq!(comparison["datasets"]["flat/10"]["ascii"]["model"], "haiku");
    assert_eq!(comparison["datasets"]["flat/10"]["ascii"]["dataset"], "flat/10");

    // The structured document round-trips to the same table
    let document: ComparisonDocument = serde_json::from_value(comparison).unwrap();
    assert_eq!(document.datasets, table);
}

#[test]
fn extracted_session_feeds_the_loader() {
    let work = TempDir::new().unwrap();
    let log = work.path().join("session.jsonl");
    fs::write(
        &log,
        concat!(
            r#"{"type": "message", "usage": {"input_tokens": 100, "output_tokens": 20, "cache_read_input_tokens": 5}}"#,
            "\n",
            r#"{"type": "message", "usage": {"input_tokens": 1"#,
        ),
    )
    .unwrap();

    let config = Config::default();
    let usage = session::extract_tokens(&log, &config.session).unwrap();

    let results = work.path().join("results");
    write_run(&results, "nested-deep-light", &serde_json::to_string(&usage.to_metric_record()).unwrap());

    let table = loader::load_results(&results, &config.files).unwrap();
    let record = table.get(&DatasetKey::new("nested", "deep"), "light").unwrap();
    assert_eq!(record.get(TOTAL_ALL), Some(125));
}

#[test]
fn byte_comparison_end_to_end() {
    let encoded = TempDir::new().unwrap();
    let flat = encoded.path().join("flat");
    fs::create_dir_all(&flat).unwrap();
    fs::write(flat.join("10.json"), vec![b'{'; 1000]).unwrap();
    fs::write(flat.join("10.stele-light"), vec![b'x'; 400]).unwrap();

    let config = Config::default();
    let sizes = bytes::collect_sizes(encoded.path(), &config).unwrap();
    let report = bytes::render_report(&sizes, &config);

    assert!(report.contains("| flat/10 | 1,000 | - | 400 (+60.0%) | - |"));
    assert!(report.contains("- **LIGHT**: 400 bytes (+60.0% vs JSON)"));
}

#[test]
fn split_with_alternate_locations() {
    let bench = TempDir::new().unwrap();
    let out = bench.path().join("runs");
    fs::create_dir_all(&out).unwrap();
    fs::write(
        out.join("all.json"),
        "[\n  {\"model\": \"haiku\", \"dataset\": \"flat/10\"},\n  {\"model\": \"haiku\", \"dataset\": \"flat/50\"}\n]\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.split.bench_dir = bench.path().to_path_buf();
    config.split.results_dir = "runs".into();
    config.split.source_file = "all.json".to_string();
    config.split.output_extension = "ndjson".to_string();

    let outcome = split::split_results(&config.split, false).unwrap().unwrap();
    let files: Vec<&String> = outcome.counts.keys().collect();
    assert_eq!(files, vec!["haiku-flat-10.ndjson", "haiku-flat-50.ndjson"]);
    assert_eq!(
        fs::read_to_string(out.join("haiku-flat-50.ndjson")).unwrap(),
        "{\"model\":\"haiku\",\"dataset\":\"flat/50\"}\n"
    );
}
