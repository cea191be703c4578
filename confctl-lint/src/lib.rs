//! Discovery & Linter (C7): walks every (installation, app) pair once to
//! build a path cross-reference graph, then runs an ordered battery of
//! lint rules over it (§4.6, §4.7).

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod diagnostic;
mod discovery;
mod error;
mod rules;

pub use diagnostic::{Diagnostic, Severity};
pub use discovery::{discover, Discovery};
pub use error::{Error, ErrorKind, Result, ResultExt};

use regex::Regex;

/// How `lint()` filters the rule battery (§4.7 "Filter").
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Only rules whose name matches this regex run; `None` runs everything.
    pub rule_filter: Option<String>,
    pub errors_only: bool,
    /// Caps the number of emitted messages; `None` is unbounded.
    pub max_messages: Option<usize>,
}

pub fn lint(tree: &confctl_filetree::FileTree, opts: &LintOptions) -> Result<Vec<Diagnostic>> {
    let discovery = discover(tree)?;
    let mut diagnostics = rules::run_all(&discovery);

    if let Some(pattern) = &opts.rule_filter {
        let re = Regex::new(pattern).unwrap_or_else(|_| Regex::new(".^").unwrap());
        diagnostics.retain(|d| re.is_match(d.rule));
    }
    if opts.errors_only {
        diagnostics.retain(|d| d.severity == Severity::Error);
    }
    if let Some(max) = opts.max_messages {
        diagnostics.truncate(max);
    }

    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confctl_filetree::FileTree;

    fn sample_tree() -> FileTree {
        FileTree::from_files(vec![
            ("default/config.yaml", "region: eu-west-1\nunused: true\n"),
            ("default/apps/web/configmap-values.yaml.template", "region: {{ region }}\n"),
            ("installations/prod/config.yaml.patch", "region: eu-west-1\n"),
            ("installations/prod/secrets.yaml", "password: plaintext-oops\n"),
            ("installations/staging/secrets.yaml", "password: vault:v1:AA\n"),
        ])
    }

    #[test]
    fn flags_unused_config_value() {
        let tree = sample_tree();
        let diags = lint(&tree, &LintOptions::default()).unwrap();
        assert!(diags.iter().any(|d| d.rule == "unused-config-value" && d.path == "unused"));
    }

    #[test]
    fn flags_duplicate_value() {
        let tree = sample_tree();
        let diags = lint(&tree, &LintOptions::default()).unwrap();
        assert!(diags.iter().any(|d| d.rule == "duplicate-value" && d.path == "region"));
    }

    #[test]
    fn flags_unencrypted_secret() {
        let tree = sample_tree();
        let diags = lint(&tree, &LintOptions::default()).unwrap();
        assert!(diags.iter().any(|d| d.rule == "unencrypted-secret" && d.file.contains("prod")));
        assert!(!diags.iter().any(|d| d.rule == "unencrypted-secret" && d.file.contains("staging")));
    }

    #[test]
    fn errors_only_drops_warnings() {
        let tree = sample_tree();
        let diags = lint(&tree, &LintOptions { errors_only: true, ..Default::default() }).unwrap();
        assert!(diags.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn rule_filter_narrows_to_matching_rules() {
        let tree = sample_tree();
        let diags = lint(
            &tree,
            &LintOptions { rule_filter: Some("unencrypted-secret".to_string()), ..Default::default() },
        )
        .unwrap();
        assert!(diags.iter().all(|d| d.rule == "unencrypted-secret"));
        assert!(!diags.is_empty());
    }
}
