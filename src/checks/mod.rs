//! Rule-file checks.
//!
//! A document passes through three stages in order:
//!
//! - [`frontmatter`]: parse and type-check the `---` block.
//! - [`structure`]: classify the body and validate `<rule>` nesting.
//! - [`examples`]: check every `<example>` block found by `structure`.
//!
//! Every rule a stage can report is described by a [`RuleInfo`]; use
//! [`all_rules`] to list them.

pub mod examples;
pub mod frontmatter;
pub mod structure;

use crate::finding::{Finding, Severity};

/// Metadata for a single rule.
///
/// Used by the `list-rules` and `explain` CLI commands and as the factory for
/// findings, so the rule ID and remediation text live in one place.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    /// Unique rule identifier (e.g., `"frontmatter/unknown-key"`).
    pub id: &'static str,
    /// Severity outside strict mode.
    pub severity: Severity,
    /// Check stage that reports this rule.
    pub check: &'static str,
    /// Short description of what the rule checks.
    pub message: &'static str,
    /// Guidance on how to fix a violation.
    pub remediation: &'static str,
}

impl RuleInfo {
    /// Creates a finding at this rule's default severity.
    pub fn emit(&self, message: impl Into<String>) -> Finding {
        self.emit_with(self.severity, message)
    }

    pub fn emit_with(&self, severity: Severity, message: impl Into<String>) -> Finding {
        Finding::new(self.id, severity, message).with_remediation(self.remediation)
    }
}

pub const UNREADABLE_FILE: RuleInfo = RuleInfo {
    id: "file/unreadable",
    severity: Severity::Error,
    check: "file",
    message: "File could not be read as UTF-8 text",
    remediation: "Check file permissions and make sure the file is UTF-8 encoded",
};

/// Aggregates [`RuleInfo`] from every check module.
pub fn all_rules() -> Vec<RuleInfo> {
    let mut rules = vec![UNREADABLE_FILE];
    rules.extend(frontmatter::rules());
    rules.extend(structure::rules());
    rules.extend(examples::rules());
    rules
}

/// Finds a rule by ID.
///
/// # Examples
///
/// ```
/// use oxidized_rules::checks::find_rule;
///
/// assert!(find_rule("frontmatter/unknown-key").is_some());
/// assert!(find_rule("nonexistent/rule").is_none());
/// ```
pub fn find_rule(id: &str) -> Option<RuleInfo> {
    all_rules().into_iter().find(|r| r.id == id)
}

/// Splits `inner` on commas that are not nested inside `()`, `[]`, or `{}`.
///
/// `*.ts, src/**/*.{js,jsx}` → `["*.ts", "src/**/*.{js,jsx}"]`
pub(crate) fn split_top_level(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        items.push(last);
    }
    items
}
