use confctl_decrypt::is_ciphertext;
use confctl_psy::Scalar;

use crate::diagnostic::{Diagnostic, Severity};
use crate::discovery::{default_config_paths, Discovery};

/// §4.7 rule 3: 100% overshadow is authoritative (not tunable) — an Open
/// Question the expanded spec resolves as a fixed constant.
const OVERSHADOW_MAJORITY_THRESHOLD: f64 = 0.75;

pub fn unused_config_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for path in default_config_paths(&d.default_config) {
        let rec = d.value_graph.get(&path);
        let referenced = rec.map(|r| !r.referenced_by.is_empty()).unwrap_or(false);
        let overshadowed = rec.map(|r| !r.overshadowed_by.is_empty()).unwrap_or(false);
        if !referenced && !overshadowed {
            out.push(Diagnostic::new(
                "unused-config-value",
                Severity::Warning,
                "default/config.yaml",
                &path,
                format!("'{}' is set but never referenced by a template or patch", path),
            ));
        }
    }
    out
}

pub fn duplicate_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (inst, values) in &d.patch_values {
        for (path, scalar) in values {
            if let Ok(default_scalar) = d.default_config.get(&path.as_str().into()) {
                if &default_scalar == scalar {
                    out.push(
                        Diagnostic::new(
                            "duplicate-value",
                            Severity::Warning,
                            format!("installations/{}/config.yaml.patch", inst),
                            path,
                            format!("'{}' overrides the default with an identical value", path),
                        )
                        .with_suggestion("remove this override"),
                    );
                }
            }
        }
    }
    out
}

pub fn overshadowed_by_majority(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let total = d.installations.len();
    if total == 0 {
        return out;
    }
    for (path, rec) in &d.value_graph {
        let n = rec.overshadowed_by.len();
        if n == 0 {
            continue;
        }
        let ratio = n as f64 / total as f64;
        if n == total {
            out.push(
                Diagnostic::new(
                    "overshadowed-by-majority",
                    Severity::Error,
                    "default/config.yaml",
                    path,
                    format!("'{}' is overridden by every installation", path),
                )
                .with_suggestion(format!("delete '{}' from the default and set it directly per app", path)),
            );
        } else if ratio >= OVERSHADOW_MAJORITY_THRESHOLD {
            out.push(Diagnostic::new(
                "overshadowed-by-majority",
                Severity::Warning,
                "default/config.yaml",
                path,
                format!("'{}' is overridden by {}/{} installations", path, n, total),
            ));
        }
    }
    out
}

pub fn unused_patch_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (inst, values) in &d.patch_values {
        for path in values.keys() {
            let referenced = d.value_graph.get(path).map(|r| !r.referenced_by.is_empty()).unwrap_or(false);
            if !referenced {
                out.push(Diagnostic::new(
                    "unused-patch-value",
                    Severity::Warning,
                    format!("installations/{}/config.yaml.patch", inst),
                    path,
                    format!("'{}' is set but no template references it", path),
                ));
            }
        }
    }
    out
}

fn is_defined_anywhere(d: &Discovery, path: &str) -> bool {
    if default_config_paths(&d.default_config).contains(path) {
        return true;
    }
    d.patch_values.values().any(|values| values.contains_key(path))
}

pub fn undefined_template_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (path, rec) in &d.value_graph {
        if is_defined_anywhere(d, path) {
            continue;
        }
        for file in &rec.referenced_by {
            let is_override = file.contains(".patch.template");
            let (rule, severity) = if is_override {
                ("undefined-template-patch-value", Severity::Error)
            } else {
                ("undefined-template-value", Severity::Error)
            };
            out.push(Diagnostic::new(rule, severity, file, path, format!("'{}' is referenced but never defined", path)));
        }
    }
    out
}

pub fn unused_secret_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (inst, doc) in &d.secrets {
        let graph = d.secret_graph.get(inst);
        for path in doc.all() {
            let key = path.to_string();
            let referencing_apps: std::collections::BTreeSet<String> = graph
                .and_then(|g| g.get(&key))
                .map(|rec| rec.referenced_by.iter().filter_map(|f| app_from_template_path(f)).collect())
                .unwrap_or_default();
            if referencing_apps.is_empty() {
                out.push(Diagnostic::new(
                    "unused-secret-value",
                    Severity::Warning,
                    format!("installations/{}/secrets.yaml", inst),
                    &key,
                    format!("'{}' is set but no app's secret template references it", key),
                ));
            } else if referencing_apps.len() == 1 {
                out.push(
                    Diagnostic::new(
                        "unused-secret-value",
                        Severity::Warning,
                        format!("installations/{}/secrets.yaml", inst),
                        &key,
                        format!("'{}' is only referenced by app '{}'", key, referencing_apps.iter().next().unwrap()),
                    )
                    .with_suggestion("move this secret under that app's own scope"),
                );
            }
        }
    }
    out
}

fn app_from_template_path(path: &str) -> Option<String> {
    let parts: Vec<&str> = path.split('/').collect();
    parts.iter().position(|p| *p == "apps").and_then(|i| parts.get(i + 1)).map(|s| s.to_string())
}

pub fn undefined_secret_template_value(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (inst, graph) in &d.secret_graph {
        let defined: std::collections::BTreeSet<String> =
            d.secrets.get(inst).map(|doc| doc.all().iter().map(|p| p.to_string()).collect()).unwrap_or_default();
        for (path, rec) in graph {
            if defined.contains(path) {
                continue;
            }
            for file in &rec.referenced_by {
                let is_override = file.contains(".patch.template");
                let rule = if is_override { "undefined-secret-template-patch-value" } else { "undefined-secret-template-value" };
                out.push(Diagnostic::new(
                    rule,
                    Severity::Error,
                    file,
                    path,
                    format!("'{}' is referenced but installation '{}' has no such secret", path, inst),
                ));
            }
        }
    }
    out
}

pub fn unencrypted_secret(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (inst, doc) in &d.secrets {
        for path in doc.all() {
            if let Ok(Scalar::String(s)) = doc.get(&path) {
                if !is_ciphertext(&s) {
                    out.push(Diagnostic::new(
                        "unencrypted-secret",
                        Severity::Error,
                        format!("installations/{}/secrets.yaml", inst),
                        path.to_string(),
                        format!("'{}' is a plaintext string in a secrets file", path),
                    ));
                }
            }
        }
    }
    out
}

pub fn include_hygiene(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for name in &d.include_refs {
        if !d.includes.contains(name) {
            out.push(Diagnostic::new(
                "include-hygiene",
                Severity::Error,
                "include/",
                name,
                format!("include '{}' is referenced but does not exist", name),
            ));
        }
    }
    for name in &d.includes {
        if !d.include_refs.contains(name) {
            out.push(Diagnostic::new(
                "include-hygiene",
                Severity::Warning,
                "include/",
                name,
                format!("include '{}' exists but is never referenced", name),
            ));
        }
    }
    out
}

/// Runs the full ordered battery (§4.7, rules 1-11).
pub fn run_all(d: &Discovery) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    out.extend(unused_config_value(d));
    out.extend(duplicate_value(d));
    out.extend(overshadowed_by_majority(d));
    out.extend(unused_patch_value(d));
    out.extend(undefined_template_value(d));
    out.extend(unused_secret_value(d));
    out.extend(undefined_secret_template_value(d));
    out.extend(unencrypted_secret(d));
    out.extend(include_hygiene(d));
    out
}
