//! Human-readable colored text formatter.
//!
//! Produces a terminal-friendly report with ANSI color codes: one block per
//! document with its findings and source lines, then a summary.

use crate::finding::{BatchReport, CheckStatus, Report, Severity};
use colored::Colorize;

/// Formats a [`BatchReport`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Header**: checked roots, timestamp, and mode.
/// 2. **Documents**: per-document status followed by its findings.
/// 3. **Summary**: file counts, then severity totals.
pub fn format(batch: &BatchReport) -> String {
    let mut out = String::new();

    let roots = batch
        .roots
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "\n{}\n",
        format!("  Rule Check: {roots}  ").bold().on_blue().white()
    ));
    out.push_str(&format!("  Timestamp: {}\n", batch.checked_at));
    if batch.strict {
        out.push_str(&format!("  Mode:      {}\n", "strict".bold()));
    }
    out.push('\n');

    for report in &batch.reports {
        format_document(report, &mut out);
    }

    let summary = batch.summary();
    let status_str = if batch.passed {
        "PASSED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    };
    out.push_str(&format!(
        "{} files checked, {} passed, {} failed\n",
        summary.files, summary.passed, summary.failed
    ));
    out.push_str(&format!(
        "Result: {status_str}  |  {} errors, {} warnings, {} info\n",
        summary.errors, summary.warnings, summary.info,
    ));

    out
}

fn format_document(report: &Report, out: &mut String) {
    let icon = match report.status() {
        CheckStatus::Passed => "PASS".green().bold().to_string(),
        CheckStatus::Warning => "WARN".yellow().bold().to_string(),
        CheckStatus::Failed => "FAIL".red().bold().to_string(),
    };
    out.push_str(&format!(
        "[{icon}] {}\n",
        report.document.display().to_string().bold()
    ));

    for finding in &report.findings {
        let severity_str = match finding.severity {
            Severity::Error => "ERROR".red().bold().to_string(),
            Severity::Warning => " WARN".yellow().bold().to_string(),
            Severity::Info => " INFO".blue().to_string(),
        };

        out.push_str(&format!(
            "  [{severity_str}] {rule_id:<40} {message}\n",
            rule_id = finding.rule_id.dimmed(),
            message = finding.message,
        ));

        let location = match (finding.line, finding.end_line) {
            (Some(start), Some(end)) => format!("{}:{start}-{end}", report.document.display()),
            (Some(line), None) => format!("{}:{line}", report.document.display()),
            _ => String::new(),
        };
        if !location.is_empty() {
            out.push_str(&format!("          {}\n", location.dimmed()));
        }
        if let Some(ref snippet) = finding.snippet {
            out.push_str(&format!("          > {}\n", snippet.dimmed()));
        }
    }
    out.push('\n');
}
