//! The materialization request CRD (§3 "Request", "Request Record").

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state: which `(installation, app)` pair to materialize, and
/// where the resulting objects should land (§3 "Request").
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "confctl.example.com",
    version = "v1alpha1",
    kind = "MaterializationRequest",
    shortname = "mr",
    namespaced,
    status = "MaterializationRequestStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationRequestSpec {
    pub app: String,
    pub installation: String,
    /// Destination namespace for the materialized ConfigMap/Secret pair.
    pub namespace: String,
    #[serde(default)]
    pub extra_annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_labels: BTreeMap<String, String>,
}

/// A `(kind, namespace, name)` handle to a materialized object, narrow
/// enough to serialize into the `previousConfig` annotation (§4.8).
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

/// Both halves of a materialized artifact pair, as stored either in
/// `status.config` or in the `previousConfig` annotation (§4.8).
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ConfigRefPair {
    pub config_map: ObjectRef,
    pub secret: ObjectRef,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationRequestStatus {
    pub config_map_ref: Option<ObjectRef>,
    pub secret_ref: Option<ObjectRef>,
    pub version: Option<String>,
}

impl MaterializationRequestStatus {
    pub fn config_refs(&self) -> Option<ConfigRefPair> {
        match (&self.config_map_ref, &self.secret_ref) {
            (Some(cm), Some(sec)) => Some(ConfigRefPair { config_map: cm.clone(), secret: sec.clone() }),
            _ => None,
        }
    }
}

/// Annotation key recording the content hash C9 keys its ensure-semantics
/// on (§4.8/§4.9 "Content hash").
pub const CONTENT_HASH_ANNOTATION: &str = "confctl.example.com/content-hash";

/// Annotation key on the request record carrying the last successfully
/// materialized `status.config` (§3 "Request Record", §4.8 "Orphan cleanup").
pub const PREVIOUS_CONFIG_ANNOTATION: &str = "confctl.example.com/previous-config";

pub fn previous_config_annotation(req: &MaterializationRequest) -> Option<ConfigRefPair> {
    req.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(PREVIOUS_CONFIG_ANNOTATION))
        .and_then(|raw| serde_json::from_str(raw).ok())
}
