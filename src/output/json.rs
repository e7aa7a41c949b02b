//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document containing run metadata, a summary,
//! and every document report with its findings.

use crate::finding::{BatchReport, Report, Summary};
use std::path::PathBuf;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    tool: &'static str,
    version: &'static str,
    checked_at: &'a str,
    roots: &'a [PathBuf],
    strict: bool,
    passed: bool,
    summary: Summary,
    reports: &'a [Report],
}

/// Formats a [`BatchReport`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the report cannot be serialized (should not happen with valid data).
pub fn format(batch: &BatchReport) -> String {
    let output = JsonOutput {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        checked_at: &batch.checked_at,
        roots: &batch.roots,
        strict: batch.strict,
        passed: batch.passed,
        summary: batch.summary(),
        reports: &batch.reports,
    };

    serde_json::to_string_pretty(&output).expect("JSON serialization failed")
}
