//! XML-like markup used in the body of `.mdc` rule files.
//!
//! Rule bodies mix Markdown with a small, closed vocabulary of tags
//! (`<rule>`, `<meta>`, `<requirements>`, …). This is not a general XML
//! parser: only tags from [`SCHEMA_TAGS`] open or close elements, everything
//! else (JSX in examples, HTML snippets, generics like `Vec<T>`) is text.
//! CDATA sections and comments are opaque.
//!
//! Fenced code blocks are also scanned here because two consumers need them:
//! the element parser ignores tags inside top-level fences, and the example
//! checker reports fences that are never closed.

use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

/// Tags recognised as structure.
pub const SCHEMA_TAGS: &[&str] = &[
    "rule",
    "meta",
    "title",
    "description",
    "created-at",
    "version",
    "author",
    "applies-to",
    "file-matcher",
    "action-matcher",
    "requirements",
    "requirement",
    "non-negotiable",
    "examples",
    "example",
    "correct-example",
    "incorrect-example",
    "grammar",
    "pattern",
    "context",
    "references",
    "reference",
];

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<(/)?([A-Za-z][A-Za-z0-9_-]*)((?:\s+[A-Za-z_:][A-Za-z0-9_:.-]*\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/)?>"#,
    )
    .unwrap()
});

static RE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub start_line: usize,
    pub end_line: usize,
    pub children: Vec<Element>,
    /// Direct text content, including CDATA payloads, untrimmed.
    pub text: String,
    /// `true` when any of the direct text came from a CDATA section.
    pub cdata: bool,
}

impl Element {
    fn open(name: &str, attributes: BTreeMap<String, String>, line: usize) -> Self {
        Element {
            name: name.to_string(),
            attributes,
            start_line: line,
            end_line: line,
            children: Vec::new(),
            text: String::new(),
            cdata: false,
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    Unclosed { name: String, line: usize },
    Stray { name: String, line: usize },
    UnterminatedCdata { line: usize },
}

impl MarkupError {
    pub fn line(&self) -> usize {
        match self {
            MarkupError::Unclosed { line, .. }
            | MarkupError::Stray { line, .. }
            | MarkupError::UnterminatedCdata { line } => *line,
        }
    }

    pub fn message(&self) -> String {
        match self {
            MarkupError::Unclosed { name, .. } => format!("<{name}> is never closed"),
            MarkupError::Stray { name, .. } => {
                format!("</{name}> has no matching opening tag")
            }
            MarkupError::UnterminatedCdata { .. } => {
                "CDATA section is never terminated with ]]>".to_string()
            }
        }
    }
}

/// Top-level elements plus any nesting errors found while building them.
#[derive(Debug, Default)]
pub struct Markup {
    pub roots: Vec<Element>,
    pub errors: Vec<MarkupError>,
}

/// Maps byte offsets to 1-indexed line numbers.
struct LineIndex {
    starts: Vec<usize>,
    first_line: usize,
    line_count: usize,
}

impl LineIndex {
    fn new(text: &str, first_line: usize) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex {
            starts,
            first_line,
            line_count: text.lines().count().max(1),
        }
    }

    fn line_of(&self, byte: usize) -> usize {
        self.first_line + self.starts.partition_point(|&s| s <= byte) - 1
    }

    fn last_line(&self) -> usize {
        self.first_line + self.line_count - 1
    }
}

/// Parses `source` into an element tree. `first_line` is the file line on
/// which `source` begins.
///
/// Tags inside inline code spans are text. So are tags inside fenced blocks
/// that are not nested in any element.
pub fn parse(source: &str, first_line: usize) -> Markup {
    let index = LineIndex::new(source, first_line);
    let top_level_fences: Vec<Range<usize>> =
        fenced_blocks(source).into_iter().map(|f| f.bytes).collect();
    let code_spans = inline_code_spans(source);

    let mut stack: Vec<Element> = Vec::new();
    let mut markup = Markup::default();
    let mut pos = 0;

    while let Some(rel) = source[pos..].find('<') {
        let at = pos + rel;
        push_text(&mut stack, &source[pos..at]);
        let rest = &source[at..];

        if let Some(payload) = rest.strip_prefix("<![CDATA[") {
            match payload.find("]]>") {
                Some(end) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&payload[..end]);
                        top.cdata = true;
                    }
                    pos = at + "<![CDATA[".len() + end + "]]>".len();
                }
                None => {
                    markup.errors.push(MarkupError::UnterminatedCdata {
                        line: index.line_of(at),
                    });
                    pos = source.len();
                }
            }
            continue;
        }

        if let Some(comment) = rest.strip_prefix("<!--") {
            pos = match comment.find("-->") {
                Some(end) => at + "<!--".len() + end + "-->".len(),
                None => source.len(),
            };
            continue;
        }

        let Some(caps) = RE_TAG.captures(rest) else {
            push_text(&mut stack, "<");
            pos = at + 1;
            continue;
        };
        let name = &caps[2];
        let in_top_level_fence =
            stack.is_empty() && top_level_fences.iter().any(|r| r.contains(&at));
        let in_code_span = code_spans.iter().any(|r| r.contains(&at));
        if !SCHEMA_TAGS.contains(&name) || in_top_level_fence || in_code_span {
            push_text(&mut stack, "<");
            pos = at + 1;
            continue;
        }

        let len = caps.get(0).map_or(1, |m| m.len());
        let line = index.line_of(at);

        if caps.get(1).is_some() {
            close_element(&mut stack, &mut markup, name, line);
        } else {
            let attributes = caps.get(3).map(|m| parse_attributes(m.as_str())).unwrap_or_default();
            let mut element = Element::open(name, attributes, line);
            if caps.get(4).is_some() {
                element.end_line = index.line_of(at + len - 1);
                attach(&mut stack, &mut markup.roots, element);
            } else {
                stack.push(element);
            }
        }
        pos = at + len;
    }
    push_text(&mut stack, &source[pos..]);

    let last_line = index.last_line();
    while let Some(mut element) = stack.pop() {
        markup.errors.push(MarkupError::Unclosed {
            name: element.name.clone(),
            line: element.start_line,
        });
        element.end_line = last_line;
        attach(&mut stack, &mut markup.roots, element);
    }

    markup.errors.sort_by_key(MarkupError::line);
    markup
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(top) = stack.last_mut() {
        top.text.push_str(text);
    }
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Closes the innermost open element called `name`. Elements opened inside
/// it and never closed are reported and closed on the same line.
fn close_element(stack: &mut Vec<Element>, markup: &mut Markup, name: &str, line: usize) {
    let Some(idx) = stack.iter().rposition(|el| el.name == name) else {
        markup.errors.push(MarkupError::Stray {
            name: name.to_string(),
            line,
        });
        return;
    };

    while stack.len() > idx {
        let Some(mut element) = stack.pop() else {
            break;
        };
        if stack.len() > idx {
            markup.errors.push(MarkupError::Unclosed {
                name: element.name.clone(),
                line: element.start_line,
            });
        }
        element.end_line = line;
        attach(stack, &mut markup.roots, element);
    }
}

fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    RE_ATTR
        .captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
            (c[1].to_string(), value.to_string())
        })
        .collect()
}

/// A fenced code block. Line numbers are 0-indexed relative to the scanned
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub open_line: usize,
    /// `None` when the fence runs to the end of the text.
    pub close_line: Option<usize>,
    pub bytes: Range<usize>,
}

/// Finds fenced code blocks opened with three or more backticks or tildes.
///
/// A closing fence uses the same character, is at least as long as the
/// opener, and carries no info string. Indentation is ignored since fences
/// inside CDATA payloads are commonly indented.
pub fn fenced_blocks(text: &str) -> Vec<Fence> {
    let mut fences = Vec::new();
    let mut open: Option<(char, usize, usize, usize)> = None;
    let mut offset = 0;

    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();
        let trimmed = raw.trim();
        let Some(marker) = trimmed.chars().next().filter(|c| *c == '`' || *c == '~') else {
            continue;
        };
        let run = trimmed.chars().take_while(|c| *c == marker).count();
        if run < 3 {
            continue;
        }
        let info = &trimmed[run..];

        match open {
            Some((ch, len, open_line, start)) => {
                if marker == ch && run >= len && info.trim().is_empty() {
                    fences.push(Fence {
                        open_line,
                        close_line: Some(idx),
                        bytes: start..offset,
                    });
                    open = None;
                }
            }
            None => {
                if marker == '`' && info.contains('`') {
                    continue;
                }
                open = Some((marker, run, idx, line_start));
            }
        }
    }

    if let Some((_, _, open_line, start)) = open {
        fences.push(Fence {
            open_line,
            close_line: None,
            bytes: start..text.len(),
        });
    }
    fences
}

/// Byte ranges of inline code spans. A run of backticks opens a span that
/// closes at the next run of the same length on the same line.
fn inline_code_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let bytes = line.as_bytes();
        let mut open: Option<(usize, usize)> = None;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'`' {
                i += 1;
                continue;
            }
            let start = i;
            while i < bytes.len() && bytes[i] == b'`' {
                i += 1;
            }
            let run = i - start;
            match open {
                Some((len, opened_at)) if len == run => {
                    spans.push(offset + opened_at..offset + i);
                    open = None;
                }
                Some(_) => {}
                None => open = Some((run, start)),
            }
        }
        offset += line.len();
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::new("a\nbb\nccc", 5);
        assert_eq!(index.line_of(0), 5);
        assert_eq!(index.line_of(2), 6);
        assert_eq!(index.line_of(5), 7);
        assert_eq!(index.last_line(), 7);
    }

    #[test]
    fn nested_elements_get_line_spans() {
        let markup = parse("<rule>\n<meta>\n<title>T</title>\n</meta>\n</rule>\n", 1);
        assert!(markup.errors.is_empty());
        let rule = &markup.roots[0];
        assert_eq!((rule.start_line, rule.end_line), (1, 5));
        let title = rule.child("meta").and_then(|m| m.child("title")).unwrap();
        assert_eq!(title.trimmed_text(), "T");
        assert_eq!(title.start_line, 3);
    }

    #[test]
    fn unknown_tags_are_text() {
        let markup = parse("<rule><context>use <div> and Vec<T></context></rule>", 1);
        assert!(markup.errors.is_empty());
        let ctx = markup.roots[0].child("context").unwrap();
        assert_eq!(ctx.trimmed_text(), "use <div> and Vec<T>");
    }

    #[test]
    fn cdata_is_opaque() {
        let markup = parse(
            "<example><correct-example><![CDATA[</example> <rule>]]></correct-example></example>",
            1,
        );
        assert!(markup.errors.is_empty());
        let demo = markup.roots[0].child("correct-example").unwrap();
        assert!(demo.cdata);
        assert_eq!(demo.text, "</example> <rule>");
    }

    #[test]
    fn attributes_are_parsed() {
        let markup = parse(
            "<requirement priority=\"high\" id='r1'>\n</requirement>",
            1,
        );
        let req = &markup.roots[0];
        assert_eq!(req.attr("priority"), Some("high"));
        assert_eq!(req.attr("id"), Some("r1"));
    }

    #[test]
    fn unclosed_and_stray_tags_are_reported() {
        let markup = parse("<rule>\n<meta>\n</rule>\n</context>\n", 1);
        assert_eq!(
            markup.errors,
            vec![
                MarkupError::Unclosed {
                    name: "meta".into(),
                    line: 2
                },
                MarkupError::Stray {
                    name: "context".into(),
                    line: 4
                },
            ]
        );
    }

    #[test]
    fn tags_in_top_level_fences_are_ignored() {
        let markup = parse("# Guide\n```xml\n<rule>\n```\n", 1);
        assert!(markup.roots.is_empty());
        assert!(markup.errors.is_empty());
    }

    #[test]
    fn tags_in_inline_code_are_text() {
        let markup = parse("Wrap each rule in a `<rule>` element.\n", 1);
        assert!(markup.roots.is_empty());
        assert!(markup.errors.is_empty());

        let markup = parse("<rule>Use ``<meta>`` first.</rule>\n", 1);
        assert_eq!(markup.roots.len(), 1);
        assert!(markup.roots[0].children.is_empty());
        assert_eq!(markup.roots[0].trimmed_text(), "Use ``<meta>`` first.");
    }

    #[test]
    fn unpaired_backtick_does_not_hide_tags() {
        let markup = parse("<rule>it`s</rule>\n", 1);
        assert_eq!(markup.roots.len(), 1);
        assert!(markup.errors.is_empty());
    }

    #[test]
    fn fences_pair_by_marker_and_length() {
        let fences = fenced_blocks("````md\n```ts\n```\n````\n~~~\n");
        assert_eq!(fences.len(), 2);
        assert_eq!(fences[0].open_line, 0);
        assert_eq!(fences[0].close_line, Some(3));
        assert_eq!(fences[1].open_line, 4);
        assert_eq!(fences[1].close_line, None);
    }

    #[test]
    fn inline_triple_backticks_do_not_open_a_fence() {
        assert!(fenced_blocks("```code``` inline\n").is_empty());
    }
}
