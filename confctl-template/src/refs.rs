use regex::Regex;
use tera::Context;

const KNOWN_FUNCTIONS: &[&str] = &["include", "dict", "merge", "now", "semverCompare", "range", "get_random", "throw"];

/// Find the first bare variable reference in `template` whose root segment
/// is absent from `ctx`, and return that root (§4.2/§8: undefined keys are
/// a hard error naming the missing key, e.g. `this` for `.this.key.is.missing`).
///
/// Only top-level `{{ ident(.ident)* }}` expressions are considered —
/// function calls (`ident(...)`) and literals are skipped.
pub fn missing_root_reference(template: &str, ctx: &Context) -> Option<String> {
    let re = Regex::new(r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_.]*)").unwrap();
    for caps in re.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let ident = caps.get(1).unwrap().as_str();
        let rest = &template[whole.end()..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with('(') {
            // function call, e.g. `include(name=...)` — not a variable ref
            continue;
        }
        let root = ident.split('.').next().unwrap_or(ident);
        if KNOWN_FUNCTIONS.contains(&root) {
            continue;
        }
        if ctx.get(root).is_none() {
            return Some(root.to_string());
        }
    }
    None
}

/// Extract every dotted identifier chain `{{ a.b.c }}` a template
/// references, skipping function calls (§4.6 "path cross-reference
/// graph" — discovery parses the template AST for identifier chains;
/// this is the same bare-reference scan `missing_root_reference` uses,
/// generalized to collect every match instead of stopping at the first
/// miss).
pub fn referenced_paths(template: &str) -> Vec<String> {
    let re = Regex::new(r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_.]*)").unwrap();
    let mut out = Vec::new();
    for caps in re.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let ident = caps.get(1).unwrap().as_str();
        let rest = &template[whole.end()..];
        if rest.trim_start().starts_with('(') {
            continue;
        }
        let root = ident.split('.').next().unwrap_or(ident);
        if KNOWN_FUNCTIONS.contains(&root) {
            continue;
        }
        out.push(ident.to_string());
    }
    out
}
