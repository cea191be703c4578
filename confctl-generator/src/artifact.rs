use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::pipeline::RawArtifacts;

/// One side of the artifact pair (§3 "Artifact pair"): a named, namespaced
/// object carrying a single payload entry plus labels/annotations. The
/// content-hash annotation is filled in once both sides exist, since it
/// covers the whole object including its payload key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigObject {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

impl ConfigObject {
    fn new(name: &str, namespace: &str, payload_key: &str, payload: String, labels: &BTreeMap<String, String>, extra_annotations: &BTreeMap<String, String>) -> ConfigObject {
        let mut data = BTreeMap::new();
        data.insert(payload_key.to_string(), payload);
        ConfigObject {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels: labels.clone(),
            annotations: extra_annotations.clone(),
            data,
        }
    }

    /// `sha256(json(object))` over the stable `(labels, annotations minus
    /// the hash key itself, data)` shape, independent of annotation
    /// insertion order (§4.8 "Ensure semantics").
    pub fn content_hash(&self, hash_annotation_key: &str) -> String {
        let mut annotations = self.annotations.clone();
        annotations.remove(hash_annotation_key);
        let shape = (&self.name, &self.namespace, &self.labels, &annotations, &self.data);
        let json = serde_json::to_vec(&shape).expect("BTreeMap/String shape always serializes");
        let digest = Sha256::digest(&json);
        format!("{:x}", digest)
    }

    pub fn with_content_hash(mut self, hash_annotation_key: &str) -> ConfigObject {
        let hash = self.content_hash(hash_annotation_key);
        self.annotations.insert(hash_annotation_key.to_string(), hash);
        self
    }
}

pub struct ArtifactPair {
    pub values: ConfigObject,
    pub secrets: ConfigObject,
}

/// Wraps the raw rendered strings from the 7-step pipeline into the
/// name/namespace artifact pair described in §3, with the content-hash
/// annotation the object store adapter (C9) keys its ensure-semantics on.
pub fn build_artifact_pair(
    raw: &RawArtifacts,
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    extra_annotations: &BTreeMap<String, String>,
    hash_annotation_key: &str,
) -> ArtifactPair {
    let values = ConfigObject::new(name, namespace, "configmap-values.yaml", raw.values.clone(), labels, extra_annotations)
        .with_content_hash(hash_annotation_key);
    let secrets = ConfigObject::new(name, namespace, "secret-values.yaml", raw.secrets.clone(), labels, extra_annotations)
        .with_content_hash(hash_annotation_key);
    ArtifactPair { values, secrets }
}
