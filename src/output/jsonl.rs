//! JSON Lines output formatter.
//!
//! One compact JSON object per finding, tagged `"type": "finding"` and carrying
//! its document path, followed by a single `"type": "summary"` record holding
//! the totals. Every line parses on its own, so the output can be piped into
//! log tooling.

use crate::finding::{BatchReport, Finding, Summary};
use std::path::Path;

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Record<'a> {
    Finding {
        document: &'a Path,
        #[serde(flatten)]
        finding: &'a Finding,
    },
    Summary {
        checked_at: &'a str,
        strict: bool,
        passed: bool,
        summary: Summary,
    },
}

/// Formats a [`BatchReport`] as newline-delimited JSON.
///
/// # Panics
///
/// Panics if a record cannot be serialized (should not happen with valid data).
pub fn format(batch: &BatchReport) -> String {
    let findings = batch.reports.iter().flat_map(|report| {
        report.findings.iter().map(move |finding| Record::Finding {
            document: &report.document,
            finding,
        })
    });
    let summary = Record::Summary {
        checked_at: &batch.checked_at,
        strict: batch.strict,
        passed: batch.passed,
        summary: batch.summary(),
    };

    let mut out = String::new();
    for record in findings.chain(std::iter::once(summary)) {
        out.push_str(&serde_json::to_string(&record).expect("JSON serialization failed"));
        out.push('\n');
    }
    out
}
