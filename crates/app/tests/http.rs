mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use gridbroker::http_server;

use crate::common::{
    harness, provisioned, service_state, Harness, BINDING_ID, INSTANCE_ID, PASSWORD, USERNAME,
};

fn app(h: &Harness) -> Router {
    http_server::router(service_state(h))
}

fn authorized(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let token = STANDARD.encode(format!("{}:{}", USERNAME, PASSWORD));
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Basic {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn instance_uri() -> String {
    format!("/v2/service_instances/{}", INSTANCE_ID)
}

fn binding_uri() -> String {
    format!("{}/service_bindings/{}", instance_uri(), BINDING_ID)
}

#[tokio::test]
async fn test_catalog_requires_auth() {
    let h = harness();
    let request = Request::builder()
        .uri("/v2/catalog")
        .body(Body::empty())
        .unwrap();

    let response = app(&h).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_catalog_carries_documentation_url() {
    let h = harness();

    let (status, body) = send(app(&h), authorized("GET", "/v2/catalog", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["services"][0]["metadata"]["documentationUrl"],
        "https://docs.example.com"
    );
}

#[tokio::test]
async fn test_instance_lifecycle_status_codes() {
    let h = harness();
    let provision = json!({
        "service_id": "svc-1",
        "plan_id": "plan-1",
        "organization_guid": "org",
        "space_guid": "space",
        "parameters": {"buckets": [{"name": "logs"}]}
    });

    let (status, body) = send(
        app(&h),
        authorized("PUT", &instance_uri(), Some(provision.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({}));

    let (status, body) = send(app(&h), authorized("PUT", &instance_uri(), Some(provision))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyExists");

    let update = json!({"service_id": "svc-1", "parameters": {"buckets": [{"name": "data"}]}});
    let (status, _) = send(app(&h), authorized("PATCH", &instance_uri(), Some(update))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(&h),
        authorized("GET", &format!("{}/last_operation", instance_uri()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "succeeded");

    let (status, _) = send(app(&h), authorized("GET", &instance_uri(), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("{}?service_id=svc-1&plan_id=plan-1", instance_uri());
    let (status, _) = send(app(&h), authorized("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.admin.group_count(), 0);
    assert!(h.storage.bucket_names().is_empty());
}

#[tokio::test]
async fn test_update_without_buckets_is_bad_request() {
    let h = harness();
    provisioned(&h, &["logs"]).await;

    let (status, body) = send(
        app(&h),
        authorized("PATCH", &instance_uri(), Some(json!({"service_id": "svc-1"}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidParameters");
}

#[tokio::test]
async fn test_binding_lifecycle() {
    let h = harness();
    provisioned(&h, &["logs"]).await;
    let bind = json!({
        "service_id": "svc-1",
        "plan_id": "plan-1",
        "bind_resource": {"app_guid": "app-1"}
    });

    let (status, body) = send(app(&h), authorized("PUT", &binding_uri(), Some(bind))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["credentials"]["bucket"][0]["name"], "logs");
    assert_eq!(body["credentials"]["endpoint"], "https://s3.grid.test:10443");

    let (status, _) = send(app(&h), authorized("GET", &binding_uri(), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        app(&h),
        authorized("GET", &format!("{}/last_operation", binding_uri()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "succeeded");

    let (status, _) = send(app(&h), authorized("DELETE", &binding_uri(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.admin.user_count(), 0);
}

#[tokio::test]
async fn test_find_group() {
    let h = harness();
    provisioned(&h, &["logs"]).await;
    let bucket = h.storage.bucket_names().remove(0);

    let uri = format!("/admin/find-group?bucket={}", bucket);
    let (status, body) = send(app(&h), authorized("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(crate::common::GROUP_NAME));

    let (status, _) = send(
        app(&h),
        authorized("GET", "/admin/find-group?bucket=unknown-bucket", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(&h), authorized("GET", "/admin/find-group", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_routes_are_open() {
    let h = harness();

    for uri in ["/_status/livez", "/_status/version"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app(&h).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let h = harness();

    let (status, body) = send(app(&h), authorized("GET", "/v3/nothing", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["description"], "not found");
}
