//! Findings and the reports they are collected into.
//!
//! A [`Finding`] is one deviation from the rule-file format. Findings for a
//! single document are merged into a [`Report`]; reports for a whole run are
//! merged into a [`BatchReport`], which decides the process exit status.

use crate::document::DocumentKind;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Finding {
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Finding {
            rule_id: rule_id.to_string(),
            message: message.into(),
            severity,
            line: None,
            end_line: None,
            snippet: None,
            remediation: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches a line range. A single-line range is stored as a plain line.
    pub fn spanning(mut self, start: usize, end: usize) -> Self {
        self.line = Some(start);
        self.end_line = (end > start).then_some(end);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }

    /// Downgrades an error to a warning; other severities are unchanged.
    pub fn demote(&mut self) {
        if self.severity == Severity::Error {
            self.severity = Severity::Warning;
        }
    }
}

/// All findings for one document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Report {
    pub document: PathBuf,
    pub kind: DocumentKind,
    pub findings: Vec<Finding>,
    pub passed: bool,
}

impl Report {
    /// Builds a report, ordering findings by source line.
    ///
    /// The sort is stable, so findings on the same line keep the order the
    /// checks emitted them in. Findings without a line sort first.
    pub fn from_findings(document: &Path, kind: DocumentKind, mut findings: Vec<Finding>) -> Self {
        findings.sort_by_key(|f| f.line.unwrap_or(0));
        let passed = !findings.iter().any(|f| f.severity == Severity::Error);

        Report {
            document: document.to_path_buf(),
            kind,
            findings,
            passed,
        }
    }

    /// Count errors, warnings, and info findings in a single pass.
    ///
    /// Returns `(errors, warnings, info)`.
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.findings
            .iter()
            .fold((0, 0, 0), |(e, w, i), f| match f.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }

    pub fn status(&self) -> CheckStatus {
        let (errors, warnings, _) = self.count_by_severity();
        if errors > 0 {
            CheckStatus::Failed
        } else if warnings > 0 {
            CheckStatus::Warning
        } else {
            CheckStatus::Passed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

/// Totals across every report in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub files: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// The result of checking a set of input roots.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchReport {
    pub roots: Vec<PathBuf>,
    pub checked_at: String,
    pub strict: bool,
    pub reports: Vec<Report>,
    pub passed: bool,
}

impl BatchReport {
    pub fn from_reports(roots: &[PathBuf], reports: Vec<Report>, strict: bool) -> Self {
        let passed = reports.iter().all(|r| r.passed);
        BatchReport {
            roots: roots.to_vec(),
            checked_at: chrono::Utc::now().to_rfc3339(),
            strict,
            reports,
            passed,
        }
    }

    pub fn summary(&self) -> Summary {
        self.reports
            .iter()
            .fold(Summary::default(), |mut acc, report| {
                let (errors, warnings, info) = report.count_by_severity();
                acc.files += 1;
                if report.passed {
                    acc.passed += 1;
                } else {
                    acc.failed += 1;
                }
                acc.errors += errors;
                acc.warnings += warnings;
                acc.info += info;
                acc
            })
    }

    /// `0` when every document passed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}
