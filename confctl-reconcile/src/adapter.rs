//! Object Store Adapter (C9): translates a `ConfigObject` into the
//! ConfigMap/Secret it is ultimately stored as, and applies it with
//! content-hash-gated idempotence and bounded optimistic-concurrency retry
//! (§4.9).

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};
use kube::Resource;
use tracing::debug;

use confctl_generator::ConfigObject;

use crate::api::{MaterializationRequest, MaterializationRequestStatus, CONTENT_HASH_ANNOTATION};
use crate::error::{Error, Result};

const MAX_ATTEMPTS: u32 = 6;
const BASE_BACKOFF_MS: u64 = 150;

pub fn to_configmap(obj: &ConfigObject) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(obj),
        data: Some(obj.data.clone()),
        ..Default::default()
    }
}

pub fn to_secret(obj: &ConfigObject) -> Secret {
    let data: BTreeMap<String, ByteString> =
        obj.data.iter().map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec()))).collect();
    Secret {
        metadata: object_meta(obj),
        data: Some(data),
        ..Default::default()
    }
}

fn object_meta(obj: &ConfigObject) -> ObjectMeta {
    ObjectMeta {
        name: Some(obj.name.clone()),
        namespace: Some(obj.namespace.clone()),
        labels: Some(obj.labels.clone()),
        annotations: Some(obj.annotations.clone()),
        ..Default::default()
    }
}

fn content_hash(meta: &ObjectMeta) -> Option<&String> {
    meta.annotations.as_ref().and_then(|a| a.get(CONTENT_HASH_ANNOTATION))
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409)
}

/// Copies the live object's resourceVersion onto `desired` so a
/// subsequent replace carries the optimistic-concurrency token the
/// apiserver requires on update — without it a PUT of an existing object
/// is rejected (§4.9).
fn carry_resource_version<K: Resource>(desired: &mut K, current: &K) {
    desired.meta_mut().resource_version = current.meta().resource_version.clone();
}

/// Creates `desired` if absent; if present, replaces it only when the
/// content-hash annotation differs — a no-op write otherwise (§4.9
/// "Ensure semantics").
pub async fn ensure_created<K>(api: &Api<K>, mut desired: K) -> Result<K>
where
    K: Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
{
    let name = desired.meta().name.clone().ok_or_else(|| Error::MissingName("<object store item>".to_string()))?;

    match api.get(&name).await {
        Ok(current) => {
            if content_hash(current.meta()) == content_hash(desired.meta()) {
                debug!("content hash unchanged for {}, skipping write", name);
                return Ok(current);
            }
            carry_resource_version(&mut desired, &current);
            Ok(api.replace(&name, &PostParams::default(), &desired).await.map_err(Error::Kube)?)
        }
        Err(e) if is_not_found(&e) => Ok(api.create(&PostParams::default(), &desired).await.map_err(Error::Kube)?),
        Err(e) => Err(Error::Kube(e)),
    }
}

/// Deletes `name` if it exists; not-found is success (§4.9 "Ensure
/// semantics" — deletion is idempotent).
pub async fn ensure_deleted<K>(api: &Api<K>, name: &str) -> Result<()>
where
    K: Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.delete(name, &kube::api::DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(Error::Kube(e)),
    }
}

/// Re-fetches the request record fresh on every attempt, applies `mutate`
/// to its status, and retries on conflict with exponential backoff — a
/// 404 mid-retry is permanent, not retried (§4.9 "Retry policy").
pub async fn modify_status<F>(api: &Api<MaterializationRequest>, name: &str, mut mutate: F) -> Result<MaterializationRequest>
where
    F: FnMut(&mut MaterializationRequestStatus),
{
    let mut delay = Duration::from_millis(BASE_BACKOFF_MS);

    for attempt in 0..MAX_ATTEMPTS {
        let mut current = match api.get(name).await {
            Ok(c) => c,
            Err(e) if is_not_found(&e) => return Err(Error::NotFound(name.to_string())),
            Err(e) => return Err(Error::Kube(e)),
        };

        let mut status = current.status.clone().unwrap_or_default();
        mutate(&mut status);
        current.status = Some(status);

        let patch = serde_json::json!({ "status": current.status });
        match api
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(updated) => return Ok(updated),
            Err(e) if is_not_found(&e) => return Err(Error::NotFound(name.to_string())),
            Err(e) if is_conflict(&e) && attempt + 1 < MAX_ATTEMPTS => {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(Error::Kube(e)),
        }
    }

    Err(Error::RetriesExhausted(name.to_string()))
}

/// Merge-patches the `previousConfig` annotation with the same
/// fresh-fetch/backoff discipline as `modify_status` (§4.8 "Orphan
/// cleanup").
pub async fn set_previous_config_annotation(
    api: &Api<MaterializationRequest>,
    name: &str,
    value: &crate::api::ConfigRefPair,
) -> Result<()> {
    let encoded = serde_json::to_string(value)?;
    let patch = serde_json::json!({
        "metadata": { "annotations": { crate::api::PREVIOUS_CONFIG_ANNOTATION: encoded } }
    });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(Error::Kube)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mock_client, next_request, respond_json};
    use std::time::Duration as StdDuration;

    fn configmap_with_hash(name: &str, namespace: &str, hash: &str, resource_version: Option<&str>) -> ConfigMap {
        let mut annotations = BTreeMap::new();
        annotations.insert(CONTENT_HASH_ANNOTATION.to_string(), hash.to_string());
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: resource_version.map(str::to_string),
                annotations: Some(annotations),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn carry_resource_version_copies_from_current_to_desired() {
        let current = configmap_with_hash("cm", "ns", "h", Some("42"));
        let mut desired = configmap_with_hash("cm", "ns", "h2", None);
        carry_resource_version(&mut desired, &current);
        assert_eq!(desired.metadata.resource_version.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn ensure_created_replace_carries_resource_version() {
        let (client, mut handle) = mock_client();
        let api: Api<ConfigMap> = Api::namespaced(client, "ns");
        let desired = configmap_with_hash("cm", "ns", "new-hash", None);
        let current = configmap_with_hash("cm", "ns", "old-hash", Some("7"));

        let server = tokio::spawn({
            let current = current.clone();
            async move {
                let (req, send) = next_request(&mut handle).await;
                assert_eq!(req.method(), http::Method::GET);
                respond_json(send, &current);

                let (req, send) = next_request(&mut handle).await;
                assert_eq!(req.method(), http::Method::PUT);
                respond_json(send, &current);
            }
        });

        ensure_created(&api, desired).await.expect("replace succeeds");
        tokio::time::timeout(StdDuration::from_secs(1), server)
            .await
            .expect("apiserver mock scenario timed out")
            .expect("apiserver mock scenario task panicked");
    }

    #[tokio::test]
    async fn ensure_created_skips_write_when_hash_unchanged() {
        let (client, mut handle) = mock_client();
        let api: Api<ConfigMap> = Api::namespaced(client, "ns");
        let desired = configmap_with_hash("cm", "ns", "same-hash", None);
        let current = configmap_with_hash("cm", "ns", "same-hash", Some("3"));

        let server = tokio::spawn({
            let current = current.clone();
            async move {
                let (req, send) = next_request(&mut handle).await;
                assert_eq!(req.method(), http::Method::GET);
                respond_json(send, &current);
            }
        });

        let result = ensure_created(&api, desired).await.expect("no-op returns current");
        assert_eq!(result.metadata.resource_version.as_deref(), Some("3"));
        tokio::time::timeout(StdDuration::from_secs(1), server)
            .await
            .expect("apiserver mock scenario timed out")
            .expect("apiserver mock scenario task panicked");
    }

    #[tokio::test]
    async fn ensure_created_creates_when_absent() {
        let (client, mut handle) = mock_client();
        let api: Api<ConfigMap> = Api::namespaced(client, "ns");
        let desired = configmap_with_hash("cm", "ns", "h", None);

        let server = tokio::spawn(async move {
            let (_req, send) = next_request(&mut handle).await;
            crate::testing::respond_not_found(send);

            let (req, send) = next_request(&mut handle).await;
            assert_eq!(req.method(), http::Method::POST);
            respond_json(send, &configmap_with_hash("cm", "ns", "h", Some("1")));
        });

        ensure_created(&api, desired).await.expect("create succeeds");
        tokio::time::timeout(StdDuration::from_secs(1), server)
            .await
            .expect("apiserver mock scenario timed out")
            .expect("apiserver mock scenario task panicked");
    }

    #[tokio::test]
    async fn ensure_deleted_treats_not_found_as_success() {
        let (client, mut handle) = mock_client();
        let api: Api<ConfigMap> = Api::namespaced(client, "ns");

        let server = tokio::spawn(async move {
            let (req, send) = next_request(&mut handle).await;
            assert_eq!(req.method(), http::Method::DELETE);
            crate::testing::respond_not_found(send);
        });

        ensure_deleted(&api, "cm").await.expect("not-found delete is success");
        tokio::time::timeout(StdDuration::from_secs(1), server)
            .await
            .expect("apiserver mock scenario timed out")
            .expect("apiserver mock scenario task panicked");
    }
}
