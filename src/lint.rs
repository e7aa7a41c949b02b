//! Check orchestration.
//!
//! [`run`] discovers rule files under the given roots, checks them in
//! parallel via [rayon], and assembles a [`BatchReport`]. [`check_source`] is
//! the single-document pipeline: front-matter, then structure, then examples,
//! then the report.

use crate::checks::frontmatter::{self, FrontMatterError};
use crate::checks::{examples, structure, UNREADABLE_FILE};
use crate::config::Config;
use crate::document::{DocumentKind, RuleDocument};
use crate::error::LintError;
use crate::finding::{BatchReport, Finding, Report};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into during discovery.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// A document whose front-matter could not be delimited.
///
/// No further checks run on such a document.
#[derive(Debug, Clone)]
pub struct MalformedDocument {
    pub kind: DocumentKind,
    pub finding: Finding,
}

/// Parses `text` into a [`RuleDocument`] and collects the front-matter and
/// structure findings.
///
/// A document with no front-matter at all is accepted as free-form when it
/// has no `<rule>` root and strict mode is off; any other front-matter
/// failure is fatal.
///
/// # Errors
///
/// Returns a [`MalformedDocument`] carrying the single
/// `frontmatter/malformed` finding.
pub fn parse_document(
    path: &Path,
    text: &str,
    config: &Config,
) -> Result<(RuleDocument, Vec<Finding>), MalformedDocument> {
    let (front_matter, mut findings, body, body_start_line) =
        match frontmatter::parse(text, &config.limits) {
            Ok(parsed) => (
                Some(parsed.front_matter),
                parsed.findings,
                parsed.body,
                parsed.body_start_line,
            ),
            Err(FrontMatterError::Missing)
                if !config.is_strict() && !structure::is_rule_document(text) =>
            {
                (None, Vec::new(), text, 1)
            }
            Err(err) => {
                let kind = if structure::is_rule_document(text) {
                    DocumentKind::Rule
                } else {
                    DocumentKind::FreeForm
                };
                return Err(MalformedDocument {
                    kind,
                    finding: err.to_finding(),
                });
            }
        };

    let outcome = structure::validate(body, body_start_line, config);
    findings.extend(outcome.findings);

    let document = RuleDocument {
        path: path.to_path_buf(),
        kind: outcome.kind,
        front_matter,
        body_start_line,
        sections: outcome.sections,
        text: text.to_string(),
    };
    Ok((document, findings))
}

/// Runs every check on one document held in memory.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use oxidized_rules::{config::Config, lint};
///
/// let text = "---\ndescription: x\nglobs: \"*.ts\"\nalwaysApply: true\n---\n\
///             <rule><meta><title>T</title></meta><requirements>\
///             <requirement priority=\"high\"><description>d</description></requirement>\
///             </requirements></rule>";
/// let report = lint::check_source(Path::new("minimal.mdc"), text, &Config::default());
/// assert!(report.passed);
/// assert!(report.findings.is_empty());
/// ```
pub fn check_source(path: &Path, text: &str, config: &Config) -> Report {
    match parse_document(path, text, config) {
        Ok((document, mut findings)) => {
            findings.extend(examples::check(&document.sections, document.text(), config));
            finish(path, document.kind, findings, config)
        }
        Err(malformed) => finish(path, malformed.kind, vec![malformed.finding], config),
    }
}

/// Reads and checks one file. A file that cannot be read yields a report
/// with a single `file/unreadable` error on line 1.
pub fn check_file(path: &Path, config: &Config) -> Report {
    tracing::trace!(file = %path.display(), "checking");
    match std::fs::read_to_string(path) {
        Ok(text) => check_source(path, &text, config),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "cannot read file");
            Report::from_findings(
                path,
                DocumentKind::Unreadable,
                vec![UNREADABLE_FILE.emit(format!("Cannot read file: {e}")).at_line(1)],
            )
        }
    }
}

/// Drops disabled rules and, for free-form documents outside strict mode,
/// demotes errors to warnings.
fn finish(path: &Path, kind: DocumentKind, mut findings: Vec<Finding>, config: &Config) -> Report {
    findings.retain(|f| config.is_rule_enabled(&f.rule_id));
    if kind == DocumentKind::FreeForm && !config.is_strict() {
        findings.iter_mut().for_each(Finding::demote);
    }
    Report::from_findings(path, kind, findings)
}

/// Collects the files to check under `roots`.
///
/// A root that is a file is returned as-is regardless of its extension.
/// Directories are walked in file-name order; files are kept when their
/// extension is listed in the discovery config and no exclude pattern
/// matches their path relative to the root. Duplicates are dropped, keeping
/// the first occurrence.
///
/// # Errors
///
/// [`LintError::PathNotFound`] for a missing root,
/// [`LintError::UnreadableFile`] for a file root that is not readable UTF-8
/// text, [`LintError::Walk`] when a root directory cannot be read, and
/// [`LintError::Config`] for a bad exclude pattern.
pub fn discover(roots: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>, LintError> {
    let excludes = config.exclude_patterns()?;
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for root in roots {
        if !root.exists() {
            return Err(LintError::PathNotFound(root.clone()));
        }
        if root.is_file() {
            if let Err(source) = std::fs::read_to_string(root) {
                return Err(LintError::UnreadableFile {
                    path: root.clone(),
                    source,
                });
            }
            if seen.insert(root.clone()) {
                files.push(root.clone());
            }
            continue;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(LintError::Walk {
                        path: root.clone(),
                        source,
                    })
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !has_extension(path, &config.discovery.extensions) {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path);
            if excludes.iter().any(|p| p.matches_path(relative)) {
                tracing::debug!(file = %path.display(), "excluded");
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                files.push(path.to_path_buf());
            }
        }
    }
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

/// Checks every rule file under `roots`.
///
/// # Pipeline
///
/// 1. [`discover`] the files (sequential, deterministic order).
/// 2. Check each file **in parallel** using [rayon]. Documents share no
///    state, and results are collected in discovery order.
/// 3. Assemble the [`BatchReport`].
///
/// # Errors
///
/// Any error from [`discover`], plus [`LintError::NoFiles`] when discovery
/// finds nothing to check.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::PathBuf;
/// use oxidized_rules::{config::Config, lint};
///
/// let config = Config::load(None).unwrap();
/// let batch = lint::run(&[PathBuf::from(".cursor/rules")], &config).unwrap();
///
/// std::process::exit(batch.exit_code());
/// ```
pub fn run(roots: &[PathBuf], config: &Config) -> Result<BatchReport, LintError> {
    let files = discover(roots, config)?;
    if files.is_empty() {
        return Err(LintError::NoFiles(roots.to_vec()));
    }
    tracing::debug!(files = files.len(), strict = config.is_strict(), "checking rule files");

    let reports: Vec<Report> = files.par_iter().map(|path| check_file(path, config)).collect();

    let batch = BatchReport::from_reports(roots, reports, config.is_strict());
    tracing::info!(
        files = batch.reports.len(),
        passed = batch.passed,
        "check complete"
    );
    Ok(batch)
}
