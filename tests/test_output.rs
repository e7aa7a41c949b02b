use oxidized_rules::config::Config;
use oxidized_rules::finding::BatchReport;
use oxidized_rules::lint;
use oxidized_rules::output;
use oxidized_rules::output::OutputFormat;
use std::path::PathBuf;

fn broken_batch() -> BatchReport {
    colored::control::set_override(false);
    lint::run(&[PathBuf::from("tests/fixtures/broken")], &Config::default()).unwrap()
}

fn clean_batch() -> BatchReport {
    colored::control::set_override(false);
    lint::run(&[PathBuf::from("tests/fixtures/clean")], &Config::default()).unwrap()
}

#[test]
fn json_output_is_valid() {
    let batch = broken_batch();
    let json = output::format_report(&batch, &OutputFormat::Json);

    let parsed: serde_json::Value = serde_json::from_str(&json).expect("JSON should be valid");
    assert_eq!(parsed["tool"], "oxidized-rules");
    assert!(parsed["checked_at"].is_string());
    assert!(!parsed["passed"].as_bool().unwrap());
    assert_eq!(parsed["summary"]["files"], 4);
    assert_eq!(parsed["summary"]["failed"], 4);
    assert!(parsed["reports"].is_array());
    assert!(parsed["reports"][0]["findings"][0]["rule_id"].is_string());
}

#[test]
fn json_clean_batch_passes() {
    let batch = clean_batch();
    let json = output::format_report(&batch, &OutputFormat::Json);

    let parsed: serde_json::Value = serde_json::from_str(&json).expect("JSON should be valid");
    assert!(parsed["passed"].as_bool().unwrap());
    assert_eq!(parsed["summary"]["errors"], 0);
}

#[test]
fn json_reports_carry_document_kind() {
    let batch = clean_batch();
    let json = output::format_report(&batch, &OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let kinds: Vec<&str> = parsed["reports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"rule"));
    assert!(kinds.contains(&"free-form"));
}

#[test]
fn jsonl_has_one_record_per_finding_plus_summary() {
    let batch = broken_batch();
    let jsonl = output::format_report(&batch, &OutputFormat::Jsonl);

    let records: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be valid JSON"))
        .collect();
    let findings: usize = batch.reports.iter().map(|r| r.findings.len()).sum();
    assert_eq!(records.len(), findings + 1);

    for record in &records[..findings] {
        assert_eq!(record["type"], "finding");
        assert!(record["document"].is_string());
        assert!(record["rule_id"].is_string());
        assert!(record["severity"].is_string());
    }

    let summary = records.last().unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["summary"]["files"], 4);
    assert_eq!(summary["passed"], false);
}

#[test]
fn sarif_output_is_valid() {
    let batch = broken_batch();
    let sarif = output::format_report(&batch, &OutputFormat::Sarif);

    let parsed: serde_json::Value =
        serde_json::from_str(&sarif).expect("SARIF JSON should be valid");
    assert_eq!(parsed["version"], "2.1.0");
    assert!(parsed["runs"].is_array());
    assert_eq!(parsed["runs"][0]["tool"]["driver"]["name"], "oxidized-rules");
    assert!(parsed["runs"][0]["results"].is_array());
}

#[test]
fn sarif_results_point_at_documents() {
    let batch = broken_batch();
    let sarif = output::format_report(&batch, &OutputFormat::Sarif);
    let parsed: serde_json::Value = serde_json::from_str(&sarif).unwrap();

    let results = parsed["runs"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    for result in results {
        let uri = result["locations"][0]["physicalLocation"]["artifactLocation"]["uri"]
            .as_str()
            .unwrap();
        assert!(uri.starts_with("tests/fixtures/broken/"), "{uri}");
        assert_eq!(result["level"], "error");
    }

    let rules = parsed["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
    let ids: Vec<&str> = rules.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"frontmatter/unknown-key"));
    assert!(rules.iter().all(|r| r["help"]["text"].is_string()));
}

#[test]
fn text_output_has_summary_line() {
    let batch = broken_batch();
    let text = output::format_report(&batch, &OutputFormat::Text);
    assert!(text.contains("4 files checked, 0 passed, 4 failed"));
    assert!(text.contains("FAIL"));
    assert!(text.contains("frontmatter/unknown-key"));
    assert!(text.contains("tests/fixtures/broken/unknown-key.mdc:4"));
}

#[test]
fn text_output_clean_batch() {
    let batch = clean_batch();
    let text = output::format_report(&batch, &OutputFormat::Text);
    assert!(text.contains("4 files checked, 4 passed, 0 failed"));
    assert!(text.contains("PASSED"));
}
