//! Reconcile-level integration test for SPEC_FULL §8 scenario 6 (orphan
//! cleanup): drives `confctl_reconcile`'s public object-store adapter
//! functions against a mock apiserver to prove that moving a request's
//! identity from `A` to `B` creates both `B` objects and deletes both `A`
//! objects.
//!
//! `confctl_reconcile`'s own `tower_test`-backed mock harness
//! (`src/testing.rs`) is `#[cfg(test)]`-gated inside that crate and isn't
//! reachable from here, so this file restates the same harness shape
//! against the crate's public surface (`ensure_created`/`ensure_deleted`/
//! `to_configmap`/`to_secret`/`destination_name`), grounded the same way:
//! `tower_test::mock::pair` wired into `kube::Client::new`, following
//! `quay-clair-operator`'s controller test pattern.

use std::collections::BTreeMap;

use http::{Response, StatusCode};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::client::Body;
use kube::{Api, Client};
use tower_test::mock;

use confctl_generator::{build_artifact_pair, RawArtifacts};
use confctl_reconcile::{destination_name, ensure_created, ensure_deleted, to_configmap, to_secret, CONTENT_HASH_ANNOTATION};

type Handle = mock::Handle<http::Request<Body>, Response<Body>>;

fn mock_client() -> (Client, Handle) {
    let (service, handle) = mock::pair::<http::Request<Body>, Response<Body>>();
    (Client::new(service, "default"), handle)
}

async fn next_request(handle: &mut Handle) -> (http::Request<Body>, mock::SendResponse<Response<Body>>) {
    handle.next_request().await.expect("scenario expected another apiserver request")
}

fn respond_not_found(send: mock::SendResponse<Response<Body>>) {
    let body = serde_json::json!({"code": 404, "status": "Failure", "reason": "NotFound"});
    send.send_response(Response::builder().status(StatusCode::NOT_FOUND).body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap());
}

fn respond_ok<T: serde::Serialize>(send: mock::SendResponse<Response<Body>>, body: &T) {
    send.send_response(Response::builder().body(Body::from(serde_json::to_vec(body).unwrap())).unwrap());
}

#[tokio::test]
async fn orphan_cleanup_creates_new_identity_and_deletes_old_one() {
    let old_app_spec = "confctl-web@v1";
    let new_app_spec = "confctl-web@v2";
    let old_name = destination_name("demo-req", old_app_spec);
    let new_name = destination_name("demo-req", new_app_spec);
    assert_ne!(old_name, new_name);

    let labels = BTreeMap::new();
    let annotations = BTreeMap::new();
    let new_artifacts =
        build_artifact_pair(&RawArtifacts { values: "a: 1".into(), secrets: "b: 2".into() }, &new_name, "team-ns", &labels, &annotations, CONTENT_HASH_ANNOTATION);

    let desired_cm = to_configmap(&new_artifacts.values);
    let desired_secret = to_secret(&new_artifacts.secrets);

    let (client, mut handle) = mock_client();
    let cm_api: Api<ConfigMap> = Api::namespaced(client.clone(), "team-ns");
    let secret_api: Api<Secret> = Api::namespaced(client, "team-ns");

    let old_name_for_server = old_name.clone();
    let new_name_for_server = new_name.clone();
    let server = tokio::spawn(async move {
        // ensure_created(new configmap): not found, then create.
        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::GET);
        assert!(req.uri().to_string().contains(new_name_for_server.as_str()));
        respond_not_found(send);

        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::POST);
        let mut created = ConfigMap::default();
        created.metadata.name = Some(new_name_for_server.clone());
        created.metadata.namespace = Some("team-ns".to_string());
        created.metadata.resource_version = Some("1".to_string());
        respond_ok(send, &created);

        // ensure_created(new secret): not found, then create.
        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::GET);
        assert!(req.uri().to_string().contains(new_name_for_server.as_str()));
        respond_not_found(send);

        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::POST);
        let mut created = Secret::default();
        created.metadata.name = Some(new_name_for_server.clone());
        created.metadata.namespace = Some("team-ns".to_string());
        created.metadata.resource_version = Some("1".to_string());
        respond_ok(send, &created);

        // ensure_deleted(old configmap and secret): both succeed.
        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::DELETE);
        assert!(req.uri().to_string().contains(old_name_for_server.as_str()));
        respond_ok(send, &ConfigMap::default());

        let (req, send) = next_request(&mut handle).await;
        assert_eq!(req.method(), http::Method::DELETE);
        assert!(req.uri().to_string().contains(old_name_for_server.as_str()));
        respond_ok(send, &Secret::default());
    });

    let created_cm = ensure_created(&cm_api, desired_cm).await.expect("new configmap is created");
    let created_secret = ensure_created(&secret_api, desired_secret).await.expect("new secret is created");
    ensure_deleted(&cm_api, &old_name).await.expect("old configmap is deleted");
    ensure_deleted(&secret_api, &old_name).await.expect("old secret is deleted");

    assert_eq!(created_cm.metadata.name.as_deref(), Some(new_name.as_str()));
    assert_eq!(created_secret.metadata.name.as_deref(), Some(new_name.as_str()));

    tokio::time::timeout(std::time::Duration::from_secs(1), server)
        .await
        .expect("apiserver mock scenario timed out")
        .expect("apiserver mock scenario task panicked");
}
