//! Output formatting for batch reports.
//!
//! Four formats are supported:
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Text`](OutputFormat::Text)   | [`pretty`] | Terminal / human review |
//! | [`Json`](OutputFormat::Json)   | [`json`]   | Automation / scripting  |
//! | [`Jsonl`](OutputFormat::Jsonl) | [`jsonl`]  | Streaming / log ingestion |
//! | [`Sarif`](OutputFormat::Sarif) | [`sarif`]  | CI/CD integration       |
//!
//! Use [`format_report`] to render a [`BatchReport`] in any of the above
//! formats.

pub mod json;
pub mod jsonl;
pub mod pretty;
pub mod sarif;

use crate::finding::BatchReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text with a summary line.
    #[value(alias = "pretty")]
    Text,
    /// Machine-readable JSON.
    Json,
    /// One JSON record per finding, then a summary record.
    Jsonl,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Formats a [`BatchReport`] in the requested [`OutputFormat`].
///
/// # Examples
///
/// ```rust,no_run
/// use oxidized_rules::output::{format_report, OutputFormat};
/// # use oxidized_rules::finding::BatchReport;
/// # fn example(batch: &BatchReport) {
/// let json = format_report(batch, &OutputFormat::Json);
/// println!("{json}");
/// # }
/// ```
pub fn format_report(batch: &BatchReport, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Text => pretty::format(batch),
        OutputFormat::Json => json::format(batch),
        OutputFormat::Jsonl => jsonl::format(batch),
        OutputFormat::Sarif => sarif::format(batch),
    }
}
