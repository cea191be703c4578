//! Reconciler and Object Store Adapter (C8/C9): a `kube::runtime::Controller`
//! state machine that keeps a cluster's ConfigMap/Secret pairs converged
//! with the generator's output for every live materialization request
//! (§4.8, §4.9).

mod adapter;
mod api;
mod context;
mod error;
mod metrics;
mod naming;
mod reconciler;
#[cfg(test)]
mod testing;

pub use adapter::{ensure_created, ensure_deleted, to_configmap, to_secret};
pub use api::{
    ConfigRefPair, MaterializationRequest, MaterializationRequestSpec, MaterializationRequestStatus,
    ObjectRef, CONTENT_HASH_ANNOTATION, PREVIOUS_CONFIG_ANNOTATION,
};
pub use context::Context;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use naming::destination_name;
pub use reconciler::run;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn status_config_refs_requires_both_sides() {
        let status = MaterializationRequestStatus {
            config_map_ref: Some(ObjectRef { name: "a".into(), namespace: "ns".into() }),
            secret_ref: None,
            version: None,
        };
        assert!(status.config_refs().is_none());

        let status = MaterializationRequestStatus {
            config_map_ref: Some(ObjectRef { name: "a".into(), namespace: "ns".into() }),
            secret_ref: Some(ObjectRef { name: "a".into(), namespace: "ns".into() }),
            version: Some("a".into()),
        };
        assert!(status.config_refs().is_some());
    }

    #[test]
    fn config_object_round_trips_into_configmap() {
        let obj = confctl_generator::build_artifact_pair(
            &confctl_generator::RawArtifacts { values: "a: 1".into(), secrets: "".into() },
            "svc-abc123abcd",
            "team-ns",
            &BTreeMap::new(),
            &BTreeMap::new(),
            CONTENT_HASH_ANNOTATION,
        );
        let cm = to_configmap(&obj.values);
        assert_eq!(cm.metadata.name.as_deref(), Some("svc-abc123abcd"));
        assert_eq!(cm.data.unwrap().get("configmap-values.yaml").unwrap(), "a: 1");
    }
}
