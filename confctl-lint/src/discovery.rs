use std::collections::{BTreeMap, BTreeSet};

use confctl_filetree::FileTree;
use confctl_psy::{Document, Path as PsyPath, Scalar};
use regex::Regex;

use crate::error::Result;

/// Which template file(s) reference a value path, and which installation
/// patches override it — the path cross-reference graph discovery builds
/// in one walk (§4.6).
#[derive(Debug, Default)]
pub struct ValuePath {
    pub referenced_by: BTreeSet<String>,
    pub overshadowed_by: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct SecretPath {
    pub referenced_by: BTreeSet<String>,
}

/// Everything a single walk of the tree can tell the linter, before any
/// rule runs (§4.6 "Discovery").
pub struct Discovery {
    pub installations: Vec<String>,
    pub apps: Vec<String>,
    pub includes: BTreeSet<String>,
    pub include_refs: BTreeSet<String>,

    pub default_config: Document,
    /// path -> cross-reference record, across every default and override
    /// values template.
    pub value_graph: BTreeMap<String, ValuePath>,
    /// installation -> path -> scalar, from `config.yaml.patch`.
    pub patch_values: BTreeMap<String, BTreeMap<String, Scalar>>,

    /// installation -> secrets document (for per-leaf ciphertext checks).
    pub secrets: BTreeMap<String, Document>,
    /// installation -> path -> cross-reference record, across that
    /// installation's secret templates.
    pub secret_graph: BTreeMap<String, BTreeMap<String, SecretPath>>,
}

fn include_call_names(template: &str) -> Vec<String> {
    let re = Regex::new(r#"include\(\s*name\s*=\s*"([^"]+)""#).unwrap();
    re.captures_iter(template).map(|c| c[1].to_string()).collect()
}

pub fn discover(tree: &FileTree) -> Result<Discovery> {
    let installations = tree.children("installations");
    let apps = tree.children("default/apps");

    let includes: BTreeSet<String> = tree
        .children("include")
        .into_iter()
        .map(|f| f.split('.').next().unwrap_or(&f).to_string())
        .collect();

    let default_config = Document::new(tree.read("default/config.yaml")?)?;
    let mut value_graph: BTreeMap<String, ValuePath> = BTreeMap::new();
    let mut include_refs: BTreeSet<String> = BTreeSet::new();

    fn register_value_template(value_graph: &mut BTreeMap<String, ValuePath>, include_refs: &mut BTreeSet<String>, path: &str, body: &str) {
        for reference in confctl_template::referenced_paths(body) {
            value_graph.entry(reference).or_default().referenced_by.insert(path.to_string());
        }
        include_refs.extend(include_call_names(body));
    }

    for app in &apps {
        let base_path = format!("default/apps/{}/configmap-values.yaml.template", app);
        if let Ok(body) = tree.read_to_string(&base_path) {
            register_value_template(&mut value_graph, &mut include_refs, &base_path, &body);
        }
    }

    let mut patch_values: BTreeMap<String, BTreeMap<String, Scalar>> = BTreeMap::new();
    let mut secrets: BTreeMap<String, Document> = BTreeMap::new();
    let mut secret_graph: BTreeMap<String, BTreeMap<String, SecretPath>> = BTreeMap::new();

    for inst in &installations {
        let patch_path = format!("installations/{}/config.yaml.patch", inst);
        if let Ok(bytes) = tree.read(&patch_path) {
            let doc = Document::new(bytes)?;
            let mut values = BTreeMap::new();
            for p in doc.all() {
                let scalar = doc.get(&p)?;
                values.insert(p.to_string(), scalar);
            }
            patch_values.insert(inst.clone(), values);
        }

        let secrets_path = format!("installations/{}/secrets.yaml", inst);
        if let Ok(bytes) = tree.read(&secrets_path) {
            secrets.insert(inst.clone(), Document::new(bytes)?);
        }

        let mut per_inst_secret_graph: BTreeMap<String, SecretPath> = BTreeMap::new();

        for app in &apps {
            let override_path = format!("installations/{}/apps/{}/configmap-values.yaml.patch.template", inst, app);
            if let Ok(body) = tree.read_to_string(&override_path) {
                register_value_template(&mut value_graph, &mut include_refs, &override_path, &body);
            }

            let secret_base_path = format!("default/apps/{}/secret-values.yaml.template", app);
            if let Ok(body) = tree.read_to_string(&secret_base_path) {
                for reference in confctl_template::referenced_paths(&body) {
                    per_inst_secret_graph.entry(reference).or_default().referenced_by.insert(secret_base_path.clone());
                }
                include_refs.extend(include_call_names(&body));
            }

            let secret_override_path = format!("installations/{}/apps/{}/secret-values.yaml.patch.template", inst, app);
            if let Ok(body) = tree.read_to_string(&secret_override_path) {
                for reference in confctl_template::referenced_paths(&body) {
                    per_inst_secret_graph
                        .entry(reference)
                        .or_default()
                        .referenced_by
                        .insert(secret_override_path.clone());
                }
                include_refs.extend(include_call_names(&body));
            }
        }

        secret_graph.insert(inst.clone(), per_inst_secret_graph);
    }

    // overshadow: an installation's config patch defining a path overshadows that default path.
    for (inst, values) in &patch_values {
        for path in values.keys() {
            value_graph.entry(path.clone()).or_default().overshadowed_by.insert(inst.clone());
        }
    }

    Ok(Discovery {
        installations,
        apps,
        includes,
        include_refs,
        default_config,
        value_graph,
        patch_values,
        secrets,
        secret_graph,
    })
}

/// Every path the default config defines, as plain strings for set
/// comparisons against the cross-reference graph.
pub fn default_config_paths(doc: &Document) -> BTreeSet<String> {
    doc.all().iter().map(PsyPath::to_string).collect()
}
