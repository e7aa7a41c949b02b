//! Parsed representation of a rule file.
//!
//! Values in this module are only produced by the parsers in
//! [`checks`](crate::checks); downstream code never sees an unvalidated
//! front-matter map or an untyped element tree.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Whether a document follows the `<rule>` schema or is a free-form guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Rule,
    FreeForm,
    /// The file could not be read, so its kind is unknown.
    Unreadable,
}

/// Inclusive 1-indexed line range within the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// The `globs` front-matter value.
///
/// An empty value means the rule attaches to no files, which is not the same
/// as a wildcard pattern such as `**/*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Globs {
    None,
    Patterns(Vec<String>),
}

impl Globs {
    pub fn patterns(&self) -> &[String] {
        match self {
            Globs::None => &[],
            Globs::Patterns(p) => p,
        }
    }
}

/// Validated front-matter. Only [`checks::frontmatter::parse`](crate::checks::frontmatter::parse)
/// constructs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub(crate) description: String,
    pub(crate) globs: Globs,
    pub(crate) always_apply: Option<bool>,
}

impl FrontMatter {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn globs(&self) -> &Globs {
        &self.globs
    }

    pub fn always_apply(&self) -> Option<bool> {
        self.always_apply
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!(
                "unknown priority '{other}' (expected low, medium, high, or critical)"
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemonstrationKind {
    Correct,
    Incorrect,
}

impl DemonstrationKind {
    pub fn tag(self) -> &'static str {
        match self {
            DemonstrationKind::Correct => "correct-example",
            DemonstrationKind::Incorrect => "incorrect-example",
        }
    }
}

/// A `<correct-example>` or `<incorrect-example>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demonstration {
    pub kind: DemonstrationKind,
    pub attributes: BTreeMap<String, String>,
    pub content: String,
    pub cdata: bool,
    pub span: Span,
}

/// An `<example>` element and the demonstrations nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleBlock {
    pub title: Option<String>,
    pub correct: Vec<Demonstration>,
    pub incorrect: Vec<Demonstration>,
    pub span: Span,
}

impl ExampleBlock {
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty() && self.incorrect.is_empty()
    }

    /// The first correct demonstration paired with the first incorrect one.
    pub fn pair(&self) -> Option<ExamplePair> {
        let correct = self.correct.first()?.clone();
        Some(ExamplePair {
            correct,
            incorrect: self.incorrect.first().cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamplePair {
    pub correct: Demonstration,
    pub incorrect: Option<Demonstration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementTag {
    Requirement,
    NonNegotiable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub tag: RequirementTag,
    pub priority: Option<Priority>,
    pub description: String,
    pub examples: Vec<ExamplePair>,
    pub span: Span,
}

/// One structural block of a `<rule>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Title { text: String, span: Span },
    Context { text: String, span: Span },
    Requirement(Requirement),
    Example(ExampleBlock),
    Grammar { patterns: Vec<String>, span: Span },
    Reference { href: Option<String>, text: String, span: Span },
    Unknown { tag: String, span: Span },
}

impl Section {
    pub fn span(&self) -> Span {
        match self {
            Section::Title { span, .. }
            | Section::Context { span, .. }
            | Section::Grammar { span, .. }
            | Section::Reference { span, .. }
            | Section::Unknown { span, .. } => *span,
            Section::Requirement(r) => r.span,
            Section::Example(e) => e.span,
        }
    }
}

/// A fully parsed rule file.
#[derive(Debug, Clone)]
pub struct RuleDocument {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub front_matter: Option<FrontMatter>,
    /// 1-indexed line on which the body starts.
    pub body_start_line: usize,
    pub sections: Vec<Section>,
    pub(crate) text: String,
}

impl RuleDocument {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn title(&self) -> Option<&str> {
        self.sections.iter().find_map(|s| match s {
            Section::Title { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.sections.iter().filter_map(|s| match s {
            Section::Requirement(r) => Some(r),
            _ => None,
        })
    }

    pub fn examples(&self) -> impl Iterator<Item = &ExampleBlock> {
        self.sections.iter().filter_map(|s| match s {
            Section::Example(e) => Some(e),
            _ => None,
        })
    }
}
