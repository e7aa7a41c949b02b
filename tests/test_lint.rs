use std::fs;
use std::path::{Path, PathBuf};

use oxidized_rules::config::Config;
use oxidized_rules::document::DocumentKind;
use oxidized_rules::error::LintError;
use oxidized_rules::finding::{Report, Severity};
use oxidized_rules::lint;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MINIMAL: &str = "---\ndescription: x\nglobs: \"*.ts\"\nalwaysApply: true\n---\n<rule><meta><title>T</title></meta><requirements><requirement priority=\"high\"><description>d</description></requirement></requirements></rule>";

fn check(text: &str) -> Report {
    lint::check_source(Path::new("doc.mdc"), text, &Config::default())
}

fn check_strict(text: &str) -> Report {
    let mut config = Config::default();
    config.strict.enabled = true;
    lint::check_source(Path::new("doc.mdc"), text, &config)
}

fn rule_ids(report: &Report) -> Vec<&str> {
    report.findings.iter().map(|f| f.rule_id.as_str()).collect()
}

fn fixture(path: &str) -> Report {
    lint::check_file(&Path::new("tests/fixtures").join(path), &Config::default())
}

fn fixture_strict(path: &str) -> Report {
    let mut config = Config::default();
    config.strict.enabled = true;
    lint::check_file(&Path::new("tests/fixtures").join(path), &config)
}

fn touch(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Single documents
// ---------------------------------------------------------------------------

#[test]
fn minimal_document_passes_cleanly() {
    let report = check(MINIMAL);
    assert_eq!(report.kind, DocumentKind::Rule);
    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert!(report.passed);
}

#[test]
fn parse_document_exposes_sections() {
    let (document, findings) =
        lint::parse_document(Path::new("doc.mdc"), MINIMAL, &Config::default()).unwrap();
    assert!(findings.is_empty());
    assert_eq!(document.title(), Some("T"));
    assert_eq!(document.requirements().count(), 1);
    assert_eq!(document.body_start_line, 6);
    assert_eq!(
        document.front_matter.as_ref().map(|fm| fm.description()),
        Some("x")
    );
}

#[test]
fn unterminated_front_matter_is_the_only_finding() {
    let report = check("---\ndescription: x\n<rule>\n<meta></meta>\n</rule>\n");
    assert_eq!(rule_ids(&report), vec!["frontmatter/malformed"]);
    assert_eq!(report.findings[0].severity, Severity::Error);
    assert!(!report.passed);
}

#[test]
fn rule_without_front_matter_is_malformed() {
    let report = check("<rule>\n<meta><title>T</title></meta>\n</rule>\n");
    assert_eq!(rule_ids(&report), vec!["frontmatter/malformed"]);
    assert_eq!(report.kind, DocumentKind::Rule);
    assert!(!report.passed);
}

#[test]
fn guide_without_front_matter_is_free_form() {
    let report = check("# Guide\n\nProse only.\n");
    assert_eq!(report.kind, DocumentKind::FreeForm);
    assert_eq!(rule_ids(&report), vec!["structure/free-form"]);
    assert!(report.passed);

    let report = check_strict("# Guide\n\nProse only.\n");
    assert_eq!(rule_ids(&report), vec!["frontmatter/malformed"]);
    assert!(!report.passed);
}

#[test]
fn free_form_errors_are_demoted_outside_strict_mode() {
    let text = "---\ndescription: Guide\nauthor: someone\nalwaysApply: maybe\n---\n# Guide\n";
    let report = check(text);
    assert_eq!(
        rule_ids(&report),
        vec![
            "frontmatter/unknown-key",
            "frontmatter/type-mismatch",
            "structure/free-form"
        ]
    );
    assert!(report.findings.iter().all(|f| f.severity != Severity::Error));
    assert!(report.passed);

    let report = check_strict(text);
    assert!(!report.passed);
    assert!(rule_ids(&report).contains(&"structure/missing-rule-root"));
}

#[test]
fn unterminated_guide_is_demoted_outside_strict_mode() {
    let report = check("---\ndescription: x\n# Guide\n");
    assert_eq!(rule_ids(&report), vec!["frontmatter/malformed"]);
    assert_eq!(report.findings[0].severity, Severity::Warning);
    assert!(report.passed);
}

#[test]
fn disabled_rules_are_dropped() {
    let text = "---\ndescription: x\npriority: high\n---\n# Guide\n";
    let mut config = Config::default();
    config.rules.disabled = vec![
        "frontmatter/unknown-key".to_string(),
        "structure/free-form".to_string(),
    ];
    let report = lint::check_source(Path::new("doc.md"), text, &config);
    assert!(report.findings.is_empty(), "{:?}", report.findings);
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[test]
fn canonical_rules_file_is_clean_in_strict_mode() {
    let report = fixture_strict("clean/rules.mdc");
    assert_eq!(report.kind, DocumentKind::Rule);
    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert!(report.passed);
}

#[test]
fn clean_fixtures_pass() {
    for name in [
        "clean/rules.mdc",
        "clean/typescript-standards.mdc",
        "clean/hooks-usage.md",
        "clean/state-management.md",
    ] {
        let report = fixture(name);
        assert!(report.passed, "{name}: {:?}", report.findings);
        assert!(
            report.findings.iter().all(|f| f.severity == Severity::Info),
            "{name}: {:?}",
            report.findings
        );
    }
}

#[test]
fn guide_showing_a_rule_in_a_fence_is_free_form() {
    let report = fixture("clean/state-management.md");
    assert_eq!(report.kind, DocumentKind::FreeForm);
    assert_eq!(rule_ids(&report), vec!["structure/free-form"]);
}

#[test]
fn broken_fixtures_fail_with_expected_rule() {
    for (name, rule) in [
        ("broken/unterminated.mdc", "frontmatter/malformed"),
        ("broken/unknown-key.mdc", "frontmatter/unknown-key"),
        ("broken/missing-requirements.mdc", "structure/missing-requirements"),
        ("broken/unbalanced-fence.mdc", "example/unbalanced-fence"),
    ] {
        let report = fixture(name);
        assert!(!report.passed, "{name} should fail");
        assert_eq!(rule_ids(&report), vec![rule], "{name}");
    }
}

#[test]
fn unknown_key_fixture_names_the_key() {
    let report = fixture("broken/unknown-key.mdc");
    assert!(report.findings[0].message.contains("'priority'"));
    assert_eq!(report.findings[0].line, Some(4));
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[test]
fn discovery_filters_by_extension_and_skips_vendor_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "b.mdc", MINIMAL);
    touch(root, "a.md", "# Guide\n");
    touch(root, "notes.txt", "ignored");
    touch(root, "nested/c.MDC", MINIMAL);
    touch(root, "node_modules/pkg/readme.md", "# vendored\n");
    touch(root, ".git/info.md", "# git\n");
    touch(root, "target/out.md", "# build\n");

    let files = lint::discover(&[root.to_path_buf()], &Config::default()).unwrap();
    let relative: Vec<_> = files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        relative,
        vec![
            PathBuf::from("a.md"),
            PathBuf::from("b.mdc"),
            PathBuf::from("nested/c.MDC"),
        ]
    );
}

#[test]
fn exclude_patterns_match_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "keep.mdc", MINIMAL);
    touch(root, "drafts/wip.mdc", MINIMAL);

    let mut config = Config::default();
    config.discovery.exclude = vec!["drafts/**".to_string()];
    let files = lint::discover(&[root.to_path_buf()], &config).unwrap();
    assert_eq!(files, vec![root.join("keep.mdc")]);
}

#[test]
fn explicit_files_are_always_checked() {
    let dir = tempfile::tempdir().unwrap();
    let file = touch(dir.path(), "rules.txt", MINIMAL);

    let files = lint::discover(&[file.clone(), file.clone()], &Config::default()).unwrap();
    assert_eq!(files, vec![file]);
}

#[test]
fn missing_root_is_an_error() {
    let err = lint::discover(&[PathBuf::from("tests/fixtures/nope")], &Config::default())
        .unwrap_err();
    assert!(matches!(err, LintError::PathNotFound(_)));
}

#[test]
fn bad_exclude_pattern_is_an_error() {
    let mut config = Config::default();
    config.discovery.exclude = vec!["[".to_string()];
    let err = lint::discover(&[PathBuf::from("tests/fixtures")], &config).unwrap_err();
    assert!(matches!(err, LintError::Config(_)));
}

// ---------------------------------------------------------------------------
// Batch runs
// ---------------------------------------------------------------------------

#[test]
fn runs_are_idempotent() {
    let roots = [PathBuf::from("tests/fixtures")];
    let first = lint::run(&roots, &Config::default()).unwrap();
    let second = lint::run(&roots, &Config::default()).unwrap();
    assert_eq!(first.reports, second.reports);
    assert_eq!(first.reports.len(), 8);
}

#[test]
fn unreadable_file_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "good.mdc", MINIMAL);
    fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let batch = lint::run(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    assert_eq!(batch.reports.len(), 2);
    assert!(!batch.passed);

    let unreadable = &batch.reports[0];
    assert_eq!(unreadable.kind, DocumentKind::Unreadable);
    assert_eq!(rule_ids(unreadable), vec!["file/unreadable"]);
    assert_eq!(unreadable.findings[0].line, Some(1));
    assert!(batch.reports[1].passed);
}

#[test]
fn unreadable_file_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("binary.mdc");
    fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

    let err = lint::run(&[binary.clone()], &Config::default()).unwrap_err();
    assert!(matches!(&err, LintError::UnreadableFile { path, .. } if *path == binary));
    assert!(err.to_string().starts_with("cannot read"));
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = lint::run(&[dir.path().to_path_buf()], &Config::default()).unwrap_err();
    assert!(matches!(err, LintError::NoFiles(_)));
}
