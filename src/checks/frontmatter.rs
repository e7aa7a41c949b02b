//! Front-matter parser and validator.
//!
//! Extracts the `---`-delimited block at the top of a rule file and builds a
//! validated [`FrontMatter`]. Only three keys are allowed.
//!
//! # Rules
//!
//! | ID | Sev | What it checks |
//! |----|-----|----------------|
//! | `frontmatter/malformed` | Error | Block is missing or never closed (fatal) |
//! | `frontmatter/unknown-key` | Error | Key outside `description`, `globs`, `alwaysApply` |
//! | `frontmatter/type-mismatch` | Error | `alwaysApply` not a boolean literal, `description` not a string |
//! | `frontmatter/duplicate-key` | Warning | Key repeated |
//! | `frontmatter/invalid-line` | Error | Top-level line that is not `key: value` |
//! | `frontmatter/invalid-glob` | Error | Glob pattern that cannot be compiled |
//! | `frontmatter/description-missing` | Warning | Description absent or empty |
//! | `frontmatter/description-too-long` | Warning | Description over the configured limit |
//!
//! # Frontmatter parsing
//!
//! Rule files commonly carry values such as `globs: *.ts` that are not valid
//! YAML (`*` starts an alias), so a lightweight subset parser is used instead
//! of a YAML crate. It supports scalar `key: value` pairs, quoted scalars,
//! block sequences (`- item`), flow sequences (`[item, item]`), comments, and
//! indented continuation lines.

use crate::checks::{split_top_level, RuleInfo};
use crate::config::LimitsConfig;
use crate::document::{FrontMatter, Globs};
use crate::finding::{Finding, Severity};

/// The only keys a rule file's front-matter may contain.
pub const ALLOWED_KEYS: &[&str] = &["description", "globs", "alwaysApply"];

pub const MALFORMED: RuleInfo = RuleInfo {
    id: "frontmatter/malformed",
    severity: Severity::Error,
    check: "frontmatter",
    message: "Front-matter block is missing or never closed",
    remediation: "Start the file with a '---' line, list the keys, and close the block with another '---' line",
};

pub const UNKNOWN_KEY: RuleInfo = RuleInfo {
    id: "frontmatter/unknown-key",
    severity: Severity::Error,
    check: "frontmatter",
    message: "Front-matter key is not one of description, globs, alwaysApply",
    remediation: "Remove the key or move the information into the rule body",
};

pub const TYPE_MISMATCH: RuleInfo = RuleInfo {
    id: "frontmatter/type-mismatch",
    severity: Severity::Error,
    check: "frontmatter",
    message: "Front-matter value has the wrong type",
    remediation: "Use a bare true/false for alwaysApply and a plain string for description",
};

pub const DUPLICATE_KEY: RuleInfo = RuleInfo {
    id: "frontmatter/duplicate-key",
    severity: Severity::Warning,
    check: "frontmatter",
    message: "Front-matter key appears more than once",
    remediation: "Keep a single entry for each key; only the first one is used",
};

pub const INVALID_LINE: RuleInfo = RuleInfo {
    id: "frontmatter/invalid-line",
    severity: Severity::Error,
    check: "frontmatter",
    message: "Front-matter line is not a 'key: value' pair",
    remediation: "Write each entry as 'key: value', or indent list items under their key",
};

pub const INVALID_GLOB: RuleInfo = RuleInfo {
    id: "frontmatter/invalid-glob",
    severity: Severity::Error,
    check: "frontmatter",
    message: "Glob pattern in 'globs' cannot be compiled",
    remediation: "Fix the pattern syntax (e.g. close every '[' character class)",
};

pub const DESCRIPTION_MISSING: RuleInfo = RuleInfo {
    id: "frontmatter/description-missing",
    severity: Severity::Warning,
    check: "frontmatter",
    message: "Missing description reduces AI rule-selection quality",
    remediation: "Add a one-line description of when the rule applies",
};

pub const DESCRIPTION_TOO_LONG: RuleInfo = RuleInfo {
    id: "frontmatter/description-too-long",
    severity: Severity::Warning,
    check: "frontmatter",
    message: "Description exceeds the recommended length",
    remediation: "Shorten the description; keep details in the rule body",
};

/// Why a document has no usable front-matter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontMatterError {
    #[error("document does not start with a '---' front-matter block")]
    Missing,
    #[error("front-matter opened on line {opened_at} is never closed with '---'")]
    Unterminated { opened_at: usize },
}

impl FrontMatterError {
    pub fn to_finding(&self) -> Finding {
        let line = match self {
            FrontMatterError::Missing => 1,
            FrontMatterError::Unterminated { opened_at } => *opened_at,
        };
        MALFORMED.emit(self.to_string()).at_line(line)
    }
}

/// A successfully delimited front-matter block and the body that follows it.
#[derive(Debug)]
pub struct ParsedFrontMatter<'a> {
    pub front_matter: FrontMatter,
    /// Non-fatal problems found while parsing the block.
    pub findings: Vec<Finding>,
    pub body: &'a str,
    /// 1-indexed line on which `body` starts.
    pub body_start_line: usize,
}

/// One top-level `key: value` entry and whatever was nested under it.
struct RawEntry<'a> {
    key: &'a str,
    value: &'a str,
    line: usize,
    items: Vec<(String, usize)>,
    continuation: Vec<&'a str>,
}

impl RawEntry<'_> {
    /// The inline value with any indented continuation lines folded in,
    /// joined by single spaces.
    fn folded_value(&self) -> String {
        std::iter::once(self.value.trim())
            .chain(self.continuation.iter().copied())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses the front-matter at the top of `text`.
///
/// # Errors
///
/// Returns [`FrontMatterError::Missing`] when the first line is not `---` and
/// [`FrontMatterError::Unterminated`] when no closing `---` follows. Every
/// other problem is reported as a finding on the returned value and parsing
/// continues with the offending entry ignored.
///
/// # Examples
///
/// ```
/// use oxidized_rules::checks::frontmatter;
/// use oxidized_rules::config::LimitsConfig;
///
/// let text = "---\ndescription: TypeScript style\nglobs: \"*.ts\"\n---\n# Body\n";
/// let parsed = frontmatter::parse(text, &LimitsConfig::default()).unwrap();
/// assert!(parsed.findings.is_empty());
/// assert_eq!(parsed.front_matter.description(), "TypeScript style");
/// assert_eq!(parsed.body_start_line, 5);
/// ```
pub fn parse<'a>(
    text: &'a str,
    limits: &LimitsConfig,
) -> Result<ParsedFrontMatter<'a>, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n').enumerate();

    let (_, first) = lines.next().ok_or(FrontMatterError::Missing)?;
    if first.trim() != "---" {
        return Err(FrontMatterError::Missing);
    }

    let mut offset = first.len();
    let mut block: Vec<(usize, &str)> = Vec::new();
    let mut closing: Option<(usize, usize)> = None;
    for (idx, raw) in lines {
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        if line.trim() == "---" {
            closing = Some((idx, offset));
            break;
        }
        block.push((idx + 1, line));
    }

    let (closing_idx, body_offset) =
        closing.ok_or(FrontMatterError::Unterminated { opened_at: 1 })?;

    let mut findings = Vec::new();
    let entries = collect_entries(&block, &mut findings);
    let front_matter = build_front_matter(&entries, limits, &mut findings);

    Ok(ParsedFrontMatter {
        front_matter,
        findings,
        body: &text[body_offset..],
        body_start_line: closing_idx + 2,
    })
}

/// Groups block lines into top-level entries with their nested lines.
fn collect_entries<'a>(block: &[(usize, &'a str)], findings: &mut Vec<Finding>) -> Vec<RawEntry<'a>> {
    let mut entries: Vec<RawEntry<'a>> = Vec::new();

    for &(line_num, line) in block {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        let list_item = trimmed == "-" || trimmed.starts_with("- ");
        if indented || list_item {
            match entries.last_mut() {
                Some(entry) if list_item => {
                    let item = unquote(trimmed[1..].trim());
                    if !item.is_empty() {
                        entry.items.push((item.to_string(), line_num));
                    }
                }
                Some(entry) => entry.continuation.push(trimmed),
                None => findings.push(
                    INVALID_LINE
                        .emit("Indented line before any front-matter key")
                        .at_line(line_num)
                        .with_snippet(trimmed),
                ),
            }
            continue;
        }

        match parse_kv(line) {
            Some((key, value)) => entries.push(RawEntry {
                key,
                value,
                line: line_num,
                items: Vec::new(),
                continuation: Vec::new(),
            }),
            None => findings.push(
                INVALID_LINE
                    .emit(format!("Front-matter line '{trimmed}' is not a 'key: value' pair"))
                    .at_line(line_num)
                    .with_snippet(trimmed),
            ),
        }
    }
    entries
}

fn build_front_matter(
    entries: &[RawEntry<'_>],
    limits: &LimitsConfig,
    findings: &mut Vec<Finding>,
) -> FrontMatter {
    let mut description: Option<(String, usize)> = None;
    let mut globs = Globs::None;
    let mut always_apply = None;
    let mut seen: Vec<&str> = Vec::new();

    for entry in entries {
        if !ALLOWED_KEYS.contains(&entry.key) {
            findings.push(
                UNKNOWN_KEY
                    .emit(format!(
                        "Unknown front-matter key '{}' (allowed: description, globs, alwaysApply)",
                        entry.key
                    ))
                    .at_line(entry.line)
                    .with_snippet(format!("{}: {}", entry.key, entry.value.trim())),
            );
            continue;
        }
        if seen.contains(&entry.key) {
            findings.push(
                DUPLICATE_KEY
                    .emit(format!("Front-matter key '{}' is repeated; the first value is used", entry.key))
                    .at_line(entry.line),
            );
            continue;
        }
        seen.push(entry.key);

        match entry.key {
            "description" => {
                if !entry.items.is_empty() || is_flow_sequence(entry.value) {
                    findings.push(
                        TYPE_MISMATCH
                            .emit("'description' must be a string, not a sequence")
                            .at_line(entry.line),
                    );
                    continue;
                }
                let mut text = unquote(entry.value.trim()).to_string();
                for extra in &entry.continuation {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(extra);
                }
                description = Some((text, entry.line));
            }
            "globs" => globs = parse_globs(entry, findings),
            "alwaysApply" => {
                let folded = entry.folded_value();
                let raw = folded.as_str();
                match raw {
                    "true" if entry.items.is_empty() => always_apply = Some(true),
                    "false" if entry.items.is_empty() => always_apply = Some(false),
                    _ => {
                        let shown = if raw.is_empty() && !entry.items.is_empty() {
                            "a sequence"
                        } else {
                            raw
                        };
                        findings.push(
                            TYPE_MISMATCH
                                .emit(format!(
                                    "'alwaysApply' must be true or false, found '{shown}'"
                                ))
                                .at_line(entry.line),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    validate_description(description.as_ref(), limits, findings);

    FrontMatter {
        description: description.map(|(d, _)| d).unwrap_or_default(),
        globs,
        always_apply,
    }
}

fn parse_globs(entry: &RawEntry<'_>, findings: &mut Vec<Finding>) -> Globs {
    let folded = entry.folded_value();
    let value = folded.as_str();
    let mut patterns: Vec<(String, usize)> = Vec::new();

    if is_flow_sequence(value) {
        let inner = &value[1..value.len() - 1];
        patterns.extend(
            split_top_level(inner)
                .into_iter()
                .map(|p| (unquote(p).to_string(), entry.line)),
        );
    } else if !value.is_empty() {
        patterns.extend(
            split_top_level(unquote(value))
                .into_iter()
                .map(|p| (unquote(p).to_string(), entry.line)),
        );
    }
    patterns.extend(entry.items.iter().cloned());
    patterns.retain(|(p, _)| !p.is_empty());

    let mut valid = Vec::with_capacity(patterns.len());
    for (pattern, line) in patterns {
        match glob::Pattern::new(&pattern) {
            Ok(_) => valid.push(pattern),
            Err(e) => findings.push(
                INVALID_GLOB
                    .emit(format!("Invalid glob pattern '{pattern}': {}", e.msg))
                    .at_line(line)
                    .with_snippet(pattern.clone()),
            ),
        }
    }

    if valid.is_empty() {
        Globs::None
    } else {
        Globs::Patterns(valid)
    }
}

fn validate_description(
    description: Option<&(String, usize)>,
    limits: &LimitsConfig,
    findings: &mut Vec<Finding>,
) {
    let (desc, line) = match description {
        Some((d, l)) if !d.trim().is_empty() => (d, *l),
        other => {
            findings.push(
                DESCRIPTION_MISSING
                    .emit("Missing description reduces AI rule-selection quality")
                    .at_line(other.map_or(1, |(_, l)| *l)),
            );
            return;
        }
    };

    let chars = desc.chars().count();
    if chars > limits.description_max_chars {
        findings.push(
            DESCRIPTION_TOO_LONG
                .emit(format!(
                    "Description is {chars} chars; recommended maximum is {}",
                    limits.description_max_chars
                ))
                .at_line(line),
        );
    }
}

/// Split a top-level `key: value` line into `(key, value)`.
///
/// The value is everything after the first `:`, with one optional leading
/// space removed.
fn parse_kv(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    let after = &line[colon_pos + 1..];
    Some((key, after.strip_prefix(' ').unwrap_or(after)))
}

fn is_flow_sequence(value: &str) -> bool {
    let value = value.trim();
    value.len() >= 2 && value.starts_with('[') && value.ends_with(']')
}

/// Strips one pair of matching single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Returns the [`RuleInfo`] catalogue for every front-matter rule.
pub fn rules() -> Vec<RuleInfo> {
    vec![
        MALFORMED,
        UNKNOWN_KEY,
        TYPE_MISMATCH,
        DUPLICATE_KEY,
        INVALID_LINE,
        INVALID_GLOB,
        DESCRIPTION_MISSING,
        DESCRIPTION_TOO_LONG,
    ]
}
