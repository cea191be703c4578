//! Mock Kubernetes apiserver for adapter/reconciler tests, grounded on
//! `quay-clair-operator`'s `tower_test::mock`-backed controller test
//! harness: a `kube::Client` wired to a mock `tower::Service` so
//! `Api<K>` calls round-trip through real HTTP request/response framing
//! without a live cluster.

use http::{Response, StatusCode};
use kube::client::Body;
use kube::Client;
use serde::Serialize;
use tower_test::mock;

pub type ApiServerHandle = mock::Handle<http::Request<Body>, Response<Body>>;

/// Pairs a `kube::Client` with the handle a test drives its responses
/// through, namespaced the same way `clair_tests()` defaults to.
pub fn mock_client() -> (Client, ApiServerHandle) {
    let (service, handle) = mock::pair::<http::Request<Body>, Response<Body>>();
    (Client::new(service, "default"), handle)
}

/// Awaits the next request the client under test issues, panicking with
/// a clear message if the scenario expected one and none arrived.
pub async fn next_request(handle: &mut ApiServerHandle) -> (http::Request<Body>, mock::SendResponse<Response<Body>>) {
    handle.next_request().await.expect("apiserver mock: scenario expected another request")
}

pub fn respond_json<T: Serialize>(send: mock::SendResponse<Response<Body>>, body: &T) {
    let bytes = serde_json::to_vec(body).expect("response body serializes");
    send.send_response(Response::builder().body(Body::from(bytes)).unwrap());
}

pub fn respond_not_found(send: mock::SendResponse<Response<Body>>) {
    let err = serde_json::json!({
        "code": 404,
        "status": "Failure",
        "reason": "NotFound",
        "details": {"name": "unknown"},
    });
    send.send_response(
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(serde_json::to_vec(&err).unwrap()))
            .unwrap(),
    );
}
