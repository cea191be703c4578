//! `confctl lint`: runs the discovery walk and rule battery over a local
//! checkout and prints each diagnostic (§4.6, §4.7).

use confctl_filetree::FileTree;
use confctl_lint::{Diagnostic, LintOptions, Severity};

use crate::error::Result;

pub struct RunOptions {
    pub dir: String,
    pub rule_filter: Option<String>,
    pub errors_only: bool,
    pub max_messages: Option<usize>,
}

/// Returns the diagnostics and whether any `Error`-severity one fired, so
/// the caller can pick an exit code.
pub fn run(opts: &RunOptions) -> Result<(Vec<Diagnostic>, bool)> {
    let tree = FileTree::from_dir(&opts.dir)?;
    let lint_opts = LintOptions {
        rule_filter: opts.rule_filter.clone(),
        errors_only: opts.errors_only,
        max_messages: opts.max_messages,
    };
    let diagnostics = confctl_lint::lint(&tree, &lint_opts)?;
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);

    for d in &diagnostics {
        let marker = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{}: [{}] {} ({}): {}", marker, d.rule, d.file, d.path, d.message);
        if let Some(suggestion) = &d.suggestion {
            println!("  suggestion: {}", suggestion);
        }
    }

    Ok((diagnostics, has_errors))
}
