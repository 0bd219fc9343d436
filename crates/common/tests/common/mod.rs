//! In-process stand-in for the tenant administration API
#![allow(dead_code)]

pub mod s3;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use url::Url;

use common::admin::{AdminClient, AdminConfig};

pub const TOKEN: &str = "token-0001";

#[derive(Debug, Default)]
pub struct MockState {
    pub logins: usize,
    /// seconds until the issued token expires, negative for already expired
    pub token_lifetime_secs: i64,
    pub group_queries: Vec<Option<String>>,
    pub unauthorized: usize,
    pub access_key_requests: Vec<Value>,
}

#[derive(Clone, Default)]
pub struct MockGrid {
    pub state: Arc<Mutex<MockState>>,
}

impl MockGrid {
    pub fn logins(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn group_queries(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().group_queries.clone()
    }

    pub fn unauthorized(&self) -> usize {
        self.state.lock().unwrap().unauthorized
    }

    pub fn access_key_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().access_key_requests.clone()
    }
}

fn envelope(data: Value) -> Value {
    json!({
        "responseTime": "2024-01-01T00:00:00.000Z",
        "status": "success",
        "apiVersion": "3.4",
        "deprecated": false,
        "data": data,
    })
}

fn authorized(grid: &MockGrid, headers: &HeaderMap) -> bool {
    let ok = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false);
    if !ok {
        grid.state.lock().unwrap().unauthorized += 1;
    }
    ok
}

async fn authorize(State(grid): State<MockGrid>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    let lifetime = {
        let mut state = grid.state.lock().unwrap();
        state.logins += 1;
        state.token_lifetime_secs
    };
    let expires = (Utc::now() + Duration::seconds(lifetime)).to_rfc2822();

    (
        StatusCode::OK,
        [(header::EXPIRES, expires)],
        Json(envelope(json!(TOKEN))),
    )
        .into_response()
}

async fn get_group(
    State(grid): State<MockGrid>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if !authorized(&grid, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if name == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "message": {"text": "not found"}})),
        )
            .into_response();
    }

    Json(envelope(json!({
        "id": "f1a2b3",
        "accountId": "12345",
        "displayName": name,
        "uniqueName": format!("group/{}", name),
        "groupURN": format!("urn:sgws:identity::12345:group/{}", name),
        "federated": false,
        "policies": {"s3": {"Statement": [{"Resource": "urn:sgws:s3:::logs-0123"}]}},
    })))
    .into_response()
}

async fn create_group(
    State(grid): State<MockGrid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&grid, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["displayName"] == "taken" {
        return (StatusCode::CONFLICT, "group already exists").into_response();
    }

    let mut group = body;
    group["id"] = json!("new-group-id");
    (StatusCode::CREATED, Json(envelope(group))).into_response()
}

async fn delete_group(State(grid): State<MockGrid>, headers: HeaderMap) -> Response {
    if !authorized(&grid, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_groups(
    State(grid): State<MockGrid>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !authorized(&grid, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    grid.state.lock().unwrap().group_queries.push(query.clone());

    let data = match query.as_deref() {
        Some(q) if q.contains("marker=") => Value::Null,
        _ => json!([
            {"id": "g-1", "displayName": "one", "uniqueName": "group/one"},
            {"id": "g-2", "displayName": "two", "uniqueName": "group/two"},
        ]),
    };
    Json(envelope(data)).into_response()
}

async fn current_user_keys(
    State(grid): State<MockGrid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&grid, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    grid.state.lock().unwrap().access_key_requests.push(body.clone());

    (
        StatusCode::CREATED,
        Json(envelope(json!({
            "id": "key-1",
            "displayName": "****ABCD",
            "expires": body["expires"],
            "accessKey": "AKIAEXAMPLE",
            "secretAccessKey": "s3cr3t/+key",
        }))),
    )
        .into_response()
}

/// Start the mock API on an ephemeral port and return its base URL
pub async fn spawn_mock_grid(token_lifetime_secs: i64) -> (MockGrid, Url) {
    let grid = MockGrid::default();
    grid.state.lock().unwrap().token_lifetime_secs = token_lifetime_secs;

    let api = Router::new()
        .route("/authorize", post(authorize))
        .route("/org/groups", get(list_groups).post(create_group))
        .route("/org/groups/group/:name", get(get_group))
        .route("/org/groups/:id", delete(delete_group))
        .route(
            "/org/users/current-user/s3-access-keys",
            post(current_user_keys),
        );
    let router = Router::new()
        .nest("/api/v3", api)
        .with_state(grid.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    (grid, url)
}

pub fn client_for(url: Url, password: &str) -> AdminClient {
    AdminClient::new(AdminConfig {
        url,
        account_id: "12345".to_string(),
        username: "broker".to_string(),
        password: password.to_string(),
        skip_tls_verify: false,
    })
    .unwrap()
}
