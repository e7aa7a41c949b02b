//! Example block checker.
//!
//! Runs over the [`Section::Example`] entries produced by the structure
//! validator.
//!
//! # Rules
//!
//! | ID | Sev | What it checks |
//! |----|-----|----------------|
//! | `example/empty` | Warning (Error in strict) | `<example>` has no demonstration |
//! | `example/incomplete` | Warning (strict only) | Missing counterpart or `conditions`/`expected-result` |
//! | `example/multiline-without-cdata` | Warning (strict only) | Multiline content not in CDATA |
//! | `example/unbalanced-fence` | Error | Code fence never closed |

use crate::checks::RuleInfo;
use crate::config::Config;
use crate::document::{ExampleBlock, Section};
use crate::finding::{Finding, Severity};
use crate::markup::fenced_blocks;

/// Attributes every demonstration must carry in strict mode.
pub const REQUIRED_ATTRIBUTES: &[&str] = &["conditions", "expected-result"];

pub const EMPTY: RuleInfo = RuleInfo {
    id: "example/empty",
    severity: Severity::Warning,
    check: "examples",
    message: "<example> has neither a correct nor an incorrect demonstration (error in strict mode)",
    remediation: "Add a <correct-example> and an <incorrect-example>, or remove the block",
};

pub const INCOMPLETE: RuleInfo = RuleInfo {
    id: "example/incomplete",
    severity: Severity::Warning,
    check: "examples",
    message: "<example> lacks a counterpart demonstration or required attributes (strict mode)",
    remediation: "Pair every <correct-example> with an <incorrect-example> and give both conditions and expected-result attributes",
};

pub const MULTILINE_WITHOUT_CDATA: RuleInfo = RuleInfo {
    id: "example/multiline-without-cdata",
    severity: Severity::Warning,
    check: "examples",
    message: "Multiline demonstration is not wrapped in CDATA (strict mode)",
    remediation: "Wrap the content in <![CDATA[ … ]]> so markup inside it is not parsed",
};

pub const UNBALANCED_FENCE: RuleInfo = RuleInfo {
    id: "example/unbalanced-fence",
    severity: Severity::Error,
    check: "examples",
    message: "Code fence inside an example is never closed",
    remediation: "Close the fence with the same marker (``` or ~~~) it was opened with",
};

/// Checks every example section. `source` is the full file text, used to
/// scan fences by absolute line number.
pub fn check(sections: &[Section], source: &str, config: &Config) -> Vec<Finding> {
    let lines: Vec<&str> = source.lines().collect();
    let mut findings = Vec::new();

    for block in sections.iter().filter_map(|s| match s {
        Section::Example(block) => Some(block),
        _ => None,
    }) {
        check_block(block, config.is_strict(), &mut findings);
        check_fences(block, &lines, &mut findings);
    }
    findings
}

fn check_block(block: &ExampleBlock, strict: bool, findings: &mut Vec<Finding>) {
    let (start, end) = (block.span.start, block.span.end);

    if block.is_empty() {
        let severity = if strict {
            Severity::Error
        } else {
            Severity::Warning
        };
        findings.push(
            EMPTY
                .emit_with(
                    severity,
                    "<example> has neither a <correct-example> nor an <incorrect-example>",
                )
                .spanning(start, end),
        );
        return;
    }

    if !strict {
        return;
    }

    let mut gaps: Vec<String> = Vec::new();
    if block.correct.is_empty() {
        gaps.push("no <correct-example>".to_string());
    }
    if block.incorrect.is_empty() {
        gaps.push("no <incorrect-example>".to_string());
    }
    for demo in block.correct.iter().chain(&block.incorrect) {
        let missing: Vec<&str> = REQUIRED_ATTRIBUTES
            .iter()
            .copied()
            .filter(|a| !demo.attributes.contains_key(*a))
            .collect();
        if !missing.is_empty() {
            gaps.push(format!(
                "<{}> on line {} lacks {}",
                demo.kind.tag(),
                demo.span.start,
                missing.join(" and ")
            ));
        }
    }
    if !gaps.is_empty() {
        findings.push(
            INCOMPLETE
                .emit(format!("Incomplete example: {}", gaps.join("; ")))
                .spanning(start, end),
        );
    }

    for demo in block.correct.iter().chain(&block.incorrect) {
        if !demo.cdata && demo.content.lines().count() > 1 {
            findings.push(
                MULTILINE_WITHOUT_CDATA
                    .emit(format!(
                        "Multiline <{}> content is not wrapped in CDATA",
                        demo.kind.tag()
                    ))
                    .spanning(demo.span.start, demo.span.end),
            );
        }
    }
}

fn check_fences(block: &ExampleBlock, lines: &[&str], findings: &mut Vec<Finding>) {
    let start = block.span.start.max(1);
    let end = block.span.end.min(lines.len());
    if start > end {
        return;
    }

    let text = lines[start - 1..end].join("\n");
    for fence in fenced_blocks(&text) {
        if fence.close_line.is_none() {
            let line = start + fence.open_line;
            findings.push(
                UNBALANCED_FENCE
                    .emit(format!(
                        "Code fence opened on line {line} is never closed inside this example"
                    ))
                    .spanning(line, end),
            );
        }
    }
}

/// Returns the [`RuleInfo`] catalogue for every example rule.
pub fn rules() -> Vec<RuleInfo> {
    vec![EMPTY, INCOMPLETE, MULTILINE_WITHOUT_CDATA, UNBALANCED_FENCE]
}
