//! Body structure validator.
//!
//! Classifies a document body as a `<rule>` document or a free-form guide and,
//! for rule documents, checks the nesting
//! `<rule><meta>…</meta><requirements>…</requirements></rule>` with optional
//! `<grammar>`, `<context>`, and `<references>` blocks. The result is an
//! ordered list of typed [`Section`]s that the example checker consumes.
//!
//! # Rules
//!
//! | ID | Sev | What it checks |
//! |----|-----|----------------|
//! | `structure/free-form` | Info | No `<rule>` root; schema checks skipped |
//! | `structure/missing-rule-root` | Error | No `<rule>` root in strict mode |
//! | `structure/missing-title` | Error | `<meta><title>` absent or empty |
//! | `structure/missing-requirements` | Error | `<requirements>` absent |
//! | `structure/empty-requirements` | Warning | `<requirements>` holds no requirement |
//! | `structure/unbalanced-tag` | Error | Unclosed, stray, or unterminated markup |
//! | `structure/section-order` | Warning | `<requirements>` before `<meta>` |
//! | `structure/non-negotiable-priority` | Warning | `<non-negotiable>` not `priority="critical"` |
//! | `structure/missing-priority` | Warning | `<requirement>` without `priority` |
//! | `structure/invalid-priority` | Error | Priority outside low/medium/high/critical |
//! | `structure/empty-requirement-description` | Error | Requirement description empty |
//! | `structure/compound-requirement` | Info | Description spans several sentences |
//! | `structure/requirement-without-example` | Warning | No correct example (strict only) |
//! | `structure/invalid-grammar-pattern` | Warning | `<pattern>` is not a valid regex |
//! | `structure/unknown-section` | Info | Schema element in an unexpected place |

use crate::checks::RuleInfo;
use crate::config::Config;
use crate::document::{
    Demonstration, DemonstrationKind, DocumentKind, ExampleBlock, Priority, Requirement,
    RequirementTag, Section, Span,
};
use crate::finding::{Finding, Severity};
use crate::markup::{self, Element};
use regex::Regex;
use std::sync::LazyLock;

static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap());

pub const FREE_FORM: RuleInfo = RuleInfo {
    id: "structure/free-form",
    severity: Severity::Info,
    check: "structure",
    message: "Free-form document; schema checks skipped",
    remediation: "Wrap the rule in <rule>…</rule> to opt into schema checks",
};

pub const MISSING_RULE_ROOT: RuleInfo = RuleInfo {
    id: "structure/missing-rule-root",
    severity: Severity::Error,
    check: "structure",
    message: "Document has no <rule> root element (strict mode)",
    remediation: "Convert the guide into a <rule> document or check it without --strict",
};

pub const MISSING_TITLE: RuleInfo = RuleInfo {
    id: "structure/missing-title",
    severity: Severity::Error,
    check: "structure",
    message: "Rule has no <meta><title>",
    remediation: "Add <meta><title>Short rule name</title></meta> at the top of the rule",
};

pub const MISSING_REQUIREMENTS: RuleInfo = RuleInfo {
    id: "structure/missing-requirements",
    severity: Severity::Error,
    check: "structure",
    message: "Rule has no <requirements> block",
    remediation: "Add a <requirements> block with at least one <requirement>",
};

pub const EMPTY_REQUIREMENTS: RuleInfo = RuleInfo {
    id: "structure/empty-requirements",
    severity: Severity::Warning,
    check: "structure",
    message: "<requirements> block contains no requirement",
    remediation: "Add <requirement> or <non-negotiable> entries to the block",
};

pub const UNBALANCED_TAG: RuleInfo = RuleInfo {
    id: "structure/unbalanced-tag",
    severity: Severity::Error,
    check: "structure",
    message: "Schema tag is unclosed, stray, or a CDATA section is unterminated",
    remediation: "Close every schema tag in the order it was opened and end CDATA with ]]>",
};

pub const SECTION_ORDER: RuleInfo = RuleInfo {
    id: "structure/section-order",
    severity: Severity::Warning,
    check: "structure",
    message: "<requirements> appears before <meta>",
    remediation: "Move <meta> to the top of the <rule> element",
};

pub const NON_NEGOTIABLE_PRIORITY: RuleInfo = RuleInfo {
    id: "structure/non-negotiable-priority",
    severity: Severity::Warning,
    check: "structure",
    message: "<non-negotiable> should declare priority=\"critical\"",
    remediation: "Add priority=\"critical\" to the <non-negotiable> element",
};

pub const MISSING_PRIORITY: RuleInfo = RuleInfo {
    id: "structure/missing-priority",
    severity: Severity::Warning,
    check: "structure",
    message: "<requirement> has no priority attribute",
    remediation: "Add priority=\"low|medium|high|critical\" to the requirement",
};

pub const INVALID_PRIORITY: RuleInfo = RuleInfo {
    id: "structure/invalid-priority",
    severity: Severity::Error,
    check: "structure",
    message: "Requirement priority is not low, medium, high, or critical",
    remediation: "Use one of: low, medium, high, critical",
};

pub const EMPTY_REQUIREMENT_DESCRIPTION: RuleInfo = RuleInfo {
    id: "structure/empty-requirement-description",
    severity: Severity::Error,
    check: "structure",
    message: "Requirement has an empty description",
    remediation: "State the requirement in one sentence inside <description>",
};

pub const COMPOUND_REQUIREMENT: RuleInfo = RuleInfo {
    id: "structure/compound-requirement",
    severity: Severity::Info,
    check: "structure",
    message: "Requirement description spans several sentences",
    remediation: "Split unrelated statements into separate requirements",
};

pub const REQUIREMENT_WITHOUT_EXAMPLE: RuleInfo = RuleInfo {
    id: "structure/requirement-without-example",
    severity: Severity::Warning,
    check: "structure",
    message: "Requirement has no correct example (strict mode)",
    remediation: "Add an <example> with a <correct-example> under the requirement",
};

pub const INVALID_GRAMMAR_PATTERN: RuleInfo = RuleInfo {
    id: "structure/invalid-grammar-pattern",
    severity: Severity::Warning,
    check: "structure",
    message: "<grammar><pattern> is not a valid regular expression",
    remediation: "Fix the pattern so it compiles as a regular expression",
};

pub const UNKNOWN_SECTION: RuleInfo = RuleInfo {
    id: "structure/unknown-section",
    severity: Severity::Info,
    check: "structure",
    message: "Schema element in an unexpected position",
    remediation: "Move the element under the block the schema expects it in",
};

/// Sections and findings produced for one document body.
#[derive(Debug)]
pub struct StructureOutcome {
    pub kind: DocumentKind,
    pub sections: Vec<Section>,
    pub findings: Vec<Finding>,
}

/// Returns `true` when `body` has a top-level `<rule>` element.
pub fn is_rule_document(body: &str) -> bool {
    markup::parse(body, 1).roots.iter().any(|e| e.name == "rule")
}

/// Validates a document body. `body_start_line` is the file line on which
/// `body` begins.
pub fn validate(body: &str, body_start_line: usize, config: &Config) -> StructureOutcome {
    let markup = markup::parse(body, body_start_line);

    let Some(rule) = markup.roots.iter().find(|e| e.name == "rule") else {
        let finding = if config.is_strict() {
            MISSING_RULE_ROOT.emit(
                "Document has no <rule> root element; strict mode requires the full rule schema",
            )
        } else {
            FREE_FORM.emit("Free-form document; schema checks skipped")
        };
        return StructureOutcome {
            kind: DocumentKind::FreeForm,
            sections: Vec::new(),
            findings: vec![finding.at_line(body_start_line)],
        };
    };

    let mut walker = RuleWalker {
        config,
        sections: Vec::new(),
        findings: markup
            .errors
            .iter()
            .map(|e| UNBALANCED_TAG.emit(e.message()).at_line(e.line()))
            .collect(),
    };
    walker.rule(rule);

    StructureOutcome {
        kind: DocumentKind::Rule,
        sections: walker.sections,
        findings: walker.findings,
    }
}

struct RuleWalker<'c> {
    config: &'c Config,
    sections: Vec<Section>,
    findings: Vec<Finding>,
}

impl RuleWalker<'_> {
    fn rule(&mut self, rule: &Element) {
        let mut meta: Option<&Element> = None;
        let mut requirements_line: Option<usize> = None;
        let mut has_title = false;

        for child in &rule.children {
            let span = span_of(child);
            match child.name.as_str() {
                "meta" => {
                    meta.get_or_insert(child);
                    if let Some(title) = child.child("title") {
                        let text = collapse_whitespace(title.trimmed_text());
                        if !text.is_empty() {
                            has_title = true;
                            self.sections.push(Section::Title {
                                text,
                                span: span_of(title),
                            });
                        }
                    }
                }
                "requirements" => {
                    requirements_line.get_or_insert(child.start_line);
                    self.requirements(child);
                }
                "context" => self.sections.push(Section::Context {
                    text: child.trimmed_text().to_string(),
                    span,
                }),
                "grammar" => self.grammar(child),
                "references" => self.references(child),
                other => self.unknown(child, &format!("<{other}> is not expected directly inside <rule>")),
            }
        }

        if !has_title {
            let (line, message) = match meta {
                Some(m) if m.child("title").is_some() => (m.start_line, "<meta><title> is empty"),
                Some(m) => (m.start_line, "<meta> has no <title>"),
                None => (rule.start_line, "Rule has no <meta><title>"),
            };
            self.findings.push(MISSING_TITLE.emit(message).at_line(line));
        }

        match (meta, requirements_line) {
            (_, None) => self.findings.push(
                MISSING_REQUIREMENTS
                    .emit("Rule has no <requirements> block")
                    .spanning(rule.start_line, rule.end_line),
            ),
            (Some(m), Some(req_line)) if req_line < m.start_line => self.findings.push(
                SECTION_ORDER
                    .emit("<requirements> appears before <meta>")
                    .at_line(req_line),
            ),
            _ => {}
        }
    }

    fn requirements(&mut self, block: &Element) {
        let mut count = 0;
        for child in &block.children {
            match child.name.as_str() {
                "requirement" | "non-negotiable" => {
                    count += 1;
                    self.requirement(child);
                }
                other => self.unknown(child, &format!("<{other}> is not expected inside <requirements>")),
            }
        }
        if count == 0 {
            self.findings.push(
                EMPTY_REQUIREMENTS
                    .emit("<requirements> block contains no requirement")
                    .spanning(block.start_line, block.end_line),
            );
        }
    }

    fn requirement(&mut self, el: &Element) {
        let tag = if el.name == "non-negotiable" {
            RequirementTag::NonNegotiable
        } else {
            RequirementTag::Requirement
        };

        let priority = match el.attr("priority") {
            Some(raw) => match raw.parse::<Priority>() {
                Ok(p) => Some(p),
                Err(msg) => {
                    self.findings
                        .push(INVALID_PRIORITY.emit(msg).at_line(el.start_line));
                    None
                }
            },
            None => {
                if tag == RequirementTag::Requirement {
                    self.findings.push(
                        MISSING_PRIORITY
                            .emit("<requirement> has no priority attribute")
                            .at_line(el.start_line),
                    );
                }
                None
            }
        };

        if tag == RequirementTag::NonNegotiable && priority != Some(Priority::Critical) {
            self.findings.push(
                NON_NEGOTIABLE_PRIORITY
                    .emit("<non-negotiable> should declare priority=\"critical\"")
                    .at_line(el.start_line),
            );
        }

        let description = collapse_whitespace(
            el.child("description")
                .map_or_else(|| el.trimmed_text(), Element::trimmed_text),
        );
        if description.is_empty() {
            self.findings.push(
                EMPTY_REQUIREMENT_DESCRIPTION
                    .emit(format!("<{}> has an empty description", el.name))
                    .at_line(el.start_line),
            );
        } else {
            let sentences = sentence_count(&description);
            let max = self.config.limits.requirement_max_sentences;
            if sentences > max {
                self.findings.push(
                    COMPOUND_REQUIREMENT
                        .emit(format!(
                            "Requirement description has {sentences} sentences (more than {max}); it may combine unrelated statements"
                        ))
                        .at_line(el.start_line),
                );
            }
        }

        let blocks: Vec<ExampleBlock> = el
            .children_named("examples")
            .flat_map(|e| e.children_named("example"))
            .chain(el.children_named("example"))
            .map(example_block)
            .collect();
        let examples: Vec<_> = blocks.iter().filter_map(ExampleBlock::pair).collect();

        if self.config.is_strict() && examples.is_empty() {
            self.findings.push(
                REQUIREMENT_WITHOUT_EXAMPLE
                    .emit("Requirement has no <correct-example>")
                    .at_line(el.start_line),
            );
        }

        self.sections.push(Section::Requirement(Requirement {
            tag,
            priority,
            description,
            examples,
            span: span_of(el),
        }));
        self.sections.extend(blocks.into_iter().map(Section::Example));
    }

    fn grammar(&mut self, el: &Element) {
        let mut patterns = Vec::new();
        for pattern in el.children_named("pattern") {
            let text = pattern.trimmed_text();
            if text.is_empty() {
                continue;
            }
            if let Err(e) = Regex::new(text) {
                // regex errors are multi-line; the last line names the problem
                let detail = e.to_string().lines().last().unwrap_or_default().to_string();
                self.findings.push(
                    INVALID_GRAMMAR_PATTERN
                        .emit(format!("Grammar pattern does not compile: {detail}"))
                        .at_line(pattern.start_line)
                        .with_snippet(text),
                );
            }
            patterns.push(text.to_string());
        }
        self.sections.push(Section::Grammar {
            patterns,
            span: span_of(el),
        });
    }

    fn references(&mut self, el: &Element) {
        let mut any = false;
        for reference in el.children_named("reference") {
            any = true;
            self.sections.push(Section::Reference {
                href: reference.attr("href").map(str::to_string),
                text: reference.trimmed_text().to_string(),
                span: span_of(reference),
            });
        }
        if !any {
            self.sections.push(Section::Reference {
                href: None,
                text: el.trimmed_text().to_string(),
                span: span_of(el),
            });
        }
    }

    fn unknown(&mut self, el: &Element, message: &str) {
        let span = span_of(el);
        self.findings
            .push(UNKNOWN_SECTION.emit(message).spanning(span.start, span.end));
        self.sections.push(Section::Unknown {
            tag: el.name.clone(),
            span,
        });

        let mut misplaced = Vec::new();
        collect_examples(el, &mut misplaced);
        self.sections
            .extend(misplaced.into_iter().map(|ex| Section::Example(example_block(ex))));
    }
}

/// Collects `el` when it is an `<example>`, otherwise every `<example>` below
/// it. Examples are not searched for further examples.
fn collect_examples<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    if el.name == "example" {
        out.push(el);
        return;
    }
    for child in &el.children {
        collect_examples(child, out);
    }
}

fn example_block(el: &Element) -> ExampleBlock {
    ExampleBlock {
        title: el.attr("title").map(str::to_string),
        correct: el
            .children_named("correct-example")
            .map(|d| demonstration(d, DemonstrationKind::Correct))
            .collect(),
        incorrect: el
            .children_named("incorrect-example")
            .map(|d| demonstration(d, DemonstrationKind::Incorrect))
            .collect(),
        span: span_of(el),
    }
}

fn demonstration(el: &Element, kind: DemonstrationKind) -> Demonstration {
    Demonstration {
        kind,
        attributes: el.attributes.clone(),
        content: el.trimmed_text().to_string(),
        cdata: el.cdata,
        span: span_of(el),
    }
}

fn span_of(el: &Element) -> Span {
    Span {
        start: el.start_line,
        end: el.end_line,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sentence_count(text: &str) -> usize {
    RE_SENTENCE_END
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Returns the [`RuleInfo`] catalogue for every structure rule.
pub fn rules() -> Vec<RuleInfo> {
    vec![
        FREE_FORM,
        MISSING_RULE_ROOT,
        MISSING_TITLE,
        MISSING_REQUIREMENTS,
        EMPTY_REQUIREMENTS,
        UNBALANCED_TAG,
        SECTION_ORDER,
        NON_NEGOTIABLE_PRIORITY,
        MISSING_PRIORITY,
        INVALID_PRIORITY,
        EMPTY_REQUIREMENT_DESCRIPTION,
        COMPOUND_REQUIREMENT,
        REQUIREMENT_WITHOUT_EXAMPLE,
        INVALID_GRAMMAR_PATTERN,
        UNKNOWN_SECTION,
    ]
}
