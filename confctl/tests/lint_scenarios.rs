//! CLI-level integration test for `confctl lint` against an on-disk
//! fixture tree, mirroring `confctl-lint`'s own in-memory rule tests but
//! exercising the wiring `lint::run` does on top (`FileTree::from_dir`,
//! `LintOptions` construction, severity/exit-code derivation).

mod common;

use common::fixture_path;

use confctl::lint::{run, RunOptions};
use confctl_lint::Severity;

fn options() -> RunOptions {
    RunOptions {
        dir: fixture_path("lint_demo"),
        rule_filter: None,
        errors_only: false,
        max_messages: None,
    }
}

#[test]
fn lint_demo_flags_all_three_sample_rules() {
    let (diagnostics, has_errors) = run(&options()).expect("lint::run succeeds");

    assert!(diagnostics.iter().any(|d| d.rule == "unused-config-value" && d.path == "unused"));
    assert!(diagnostics.iter().any(|d| d.rule == "duplicate-value" && d.path == "region"));
    assert!(diagnostics.iter().any(|d| d.rule == "unencrypted-secret" && d.severity == Severity::Error));
    assert!(has_errors);
}

#[test]
fn errors_only_filter_drops_warnings() {
    let mut opts = options();
    opts.errors_only = true;
    let (diagnostics, _) = run(&opts).expect("lint::run succeeds");
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn rule_filter_narrows_to_matching_rule_names() {
    let mut opts = options();
    opts.rule_filter = Some("duplicate-value".to_string());
    let (diagnostics, _) = run(&opts).expect("lint::run succeeds");
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| d.rule == "duplicate-value"));
}
