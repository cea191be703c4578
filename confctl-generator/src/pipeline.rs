use confctl_decrypt::{decrypt_traverse, Decrypter};
use confctl_filetree::FileTree;
use confctl_psy::{patch, Document};
use confctl_template::{build_include_library, IncludeLibrary, Renderer};

use crate::error::{Error, ErrorKind, Result};

/// Loads `include/*` off a tree into the include library every renderer
/// in a pipeline run shares (§4.2 "Include library construction"). Exposed
/// here so any caller acquiring a fresh tree — the CLI or the reconciler —
/// builds the library the same way instead of duplicating the walk.
pub fn load_include_library(tree: &FileTree) -> Result<IncludeLibrary> {
    let mut files = Vec::new();
    for name in tree.children("include") {
        let contents = tree.read_to_string(&format!("include/{}", name))?;
        files.push((name, contents));
    }
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    Ok(build_include_library(borrowed)?)
}

/// Raw rendered output of the composition pipeline, before it is wrapped
/// into the name/namespace/annotations artifact pair (§3, §4.4).
pub struct RawArtifacts {
    pub values: String,
    pub secrets: String,
}

fn read(tree: &FileTree, path: &str) -> Result<Vec<u8>> {
    tree.read(path).map(|b| b.to_vec()).map_err(|_| Error::from(ErrorKind::NotFound(path.to_string())))
}

fn read_optional(tree: &FileTree, path: &str) -> Option<Vec<u8>> {
    tree.read(path).ok().map(|b| b.to_vec())
}

/// `patchIfExists(basePath, patchPath)` (§4.4): the base is mandatory, the
/// patch is optional — absence is the identity.
fn patch_if_exists(tree: &FileTree, base_path: &str, patch_path: &str) -> Result<Document> {
    let base = Document::new(&read(tree, base_path)?)?;
    match read_optional(tree, patch_path) {
        None => Ok(base),
        Some(bytes) => {
            let overlay = Document::new(&bytes)?;
            Ok(patch(&base, &overlay)?)
        }
    }
}

/// Runs the 7-step composition pipeline for one `(installation, app)` pair
/// (§4.4), producing the raw `(values, secrets)` YAML text that the
/// reconciler or CLI generator wraps into artifacts.
pub fn generate(
    tree: &FileTree,
    installation: &str,
    app: &str,
    decrypter: &dyn Decrypter,
    library: &IncludeLibrary,
) -> Result<RawArtifacts> {
    let renderer = Renderer::new(library.clone());

    // Step 1: valuesContext
    let values_context = patch_if_exists(
        tree,
        "default/config.yaml",
        &format!("installations/{}/config.yaml.patch", installation),
    )?;
    let values_ctx_yaml = values_context.value().clone();
    let ctx = Renderer::context(&values_ctx_yaml)?;

    // Step 2: valuesBase
    let base_template_path = format!("default/apps/{}/configmap-values.yaml.template", app);
    let base_template = String::from_utf8(read(tree, &base_template_path)?)
        .map_err(|_| Error::from(ErrorKind::NotFound(base_template_path.clone())))?;
    let values_base_text = renderer.render(&base_template_path, &base_template, &ctx)?;
    let values_base = Document::new(values_base_text.as_bytes())?;

    // Step 3: valuesOverride (absent is OK, empty document)
    let override_template_path = format!("installations/{}/apps/{}/configmap-values.yaml.patch.template", installation, app);
    let values_override = match read_optional(tree, &override_template_path) {
        None => Document::empty(),
        Some(bytes) => {
            let tmpl = String::from_utf8(bytes)
                .map_err(|_| Error::from(ErrorKind::NotFound(override_template_path.clone())))?;
            let rendered = renderer.render(&override_template_path, &tmpl, &ctx)?;
            Document::new(rendered.as_bytes())?
        }
    };

    // Step 4: values
    let values = patch(&values_base, &values_override)?;
    let values_text = String::from_utf8(values.bytes()?).expect("serde_yaml always emits utf8");

    // Step 5: secretsContext
    let secrets_context_path = format!("installations/{}/secrets.yaml", installation);
    let secrets_context_bytes = read(tree, &secrets_context_path)?;
    let secrets_context: serde_yaml::Value = serde_yaml::from_slice(&secrets_context_bytes)?;
    let secrets_ctx = Renderer::context(&secrets_context)?;

    // Step 6: secretsBase (absent is OK, empty text)
    let secrets_template_path = format!("default/apps/{}/secret-values.yaml.template", app);
    let secrets_base = match read_optional(tree, &secrets_template_path) {
        None => String::new(),
        Some(bytes) => String::from_utf8(bytes)
            .map_err(|_| Error::from(ErrorKind::NotFound(secrets_template_path.clone())))?,
    };

    // Step 7: secretsRendered, then decryptTraverse
    let secrets_rendered = if secrets_base.is_empty() {
        String::new()
    } else {
        renderer.render(&secrets_template_path, &secrets_base, &secrets_ctx)?
    };
    let secrets_text = if secrets_rendered.is_empty() {
        String::new()
    } else {
        let rendered_value: serde_yaml::Value = serde_yaml::from_str(&secrets_rendered)?;
        let decrypted = decrypt_traverse(&rendered_value, decrypter)?;
        String::from_utf8(serde_yaml::to_vec(&decrypted)?).expect("serde_yaml always emits utf8")
    };

    Ok(RawArtifacts { values: values_text, secrets: secrets_text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use confctl_decrypt::NullDecrypter;
    use confctl_template::build_include_library;

    #[test]
    fn full_pipeline_produces_values_and_secrets() {
        let tree = FileTree::from_files(vec![
            ("default/config.yaml", "region: eu-west-1\n"),
            ("default/apps/web/configmap-values.yaml.template", "region: {{ region }}\nreplicas: 1\n"),
            (
                "installations/prod/apps/web/configmap-values.yaml.patch.template",
                "replicas: 3\n",
            ),
            ("installations/prod/secrets.yaml", "dbPassword: vault:v1:AABB\n"),
            ("default/apps/web/secret-values.yaml.template", "password: {{ dbPassword }}\n"),
        ]);
        let library = build_include_library(Vec::<(&str, &str)>::new()).unwrap();
        let out = generate(&tree, "prod", "web", &NullDecrypter, &library).unwrap();
        assert!(out.values.contains("region: eu-west-1"));
        assert!(out.values.contains("replicas: 3"));
        assert!(out.secrets.contains("password:"));
    }

    #[test]
    fn missing_base_config_is_not_found() {
        let tree = FileTree::new();
        let library = build_include_library(Vec::<(&str, &str)>::new()).unwrap();
        let err = generate(&tree, "prod", "web", &NullDecrypter, &library).unwrap_err();
        assert!(err.to_string().contains("not-found"));
    }

    #[test]
    fn absent_secrets_template_yields_empty_secrets() {
        let tree = FileTree::from_files(vec![
            ("default/config.yaml", "region: eu-west-1\n"),
            ("default/apps/web/configmap-values.yaml.template", "region: {{ region }}\n"),
            ("installations/prod/secrets.yaml", "{}\n"),
        ]);
        let library = build_include_library(Vec::<(&str, &str)>::new()).unwrap();
        let out = generate(&tree, "prod", "web", &NullDecrypter, &library).unwrap();
        assert_eq!(out.secrets, "");
    }
}
