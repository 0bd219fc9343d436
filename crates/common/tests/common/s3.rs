//! In-process stand-in for the grid's S3 endpoint, path style only

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::Router;

const XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBucket {
    /// Empty when created without a location constraint
    pub region: String,
    pub versioning: bool,
}

#[derive(Debug, Default)]
pub struct S3State {
    pub buckets: BTreeMap<String, StoredBucket>,
    /// Access key each request was signed with
    pub signed_with: Vec<String>,
}

#[derive(Clone, Default)]
pub struct S3Stub {
    pub state: Arc<Mutex<S3State>>,
}

impl S3Stub {
    pub fn insert(&self, name: &str, region: &str, versioning: bool) {
        self.state.lock().unwrap().buckets.insert(
            name.to_string(),
            StoredBucket {
                region: region.to_string(),
                versioning,
            },
        );
    }

    pub fn bucket(&self, name: &str) -> Option<StoredBucket> {
        self.state.lock().unwrap().buckets.get(name).cloned()
    }

    pub fn signed_with(&self) -> Vec<String> {
        self.state.lock().unwrap().signed_with.clone()
    }

    fn record(&self, headers: &HeaderMap) {
        let access_key = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split("Credential=").nth(1))
            .and_then(|v| v.split('/').next())
            .unwrap_or_default()
            .to_string();
        self.state.lock().unwrap().signed_with.push(access_key);
    }
}

fn xml(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

fn s3_error(status: StatusCode, code: &str, bucket: &str) -> Response {
    xml(
        status,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{}</Code><Message>{} ({})</Message><BucketName>{}</BucketName><RequestId>req-1</RequestId></Error>",
            code, code, bucket, bucket
        ),
    )
}

fn element<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

async fn put_bucket(
    State(stub): State<S3Stub>,
    headers: HeaderMap,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    stub.record(&headers);

    if query.unwrap_or_default().contains("versioning") {
        let mut state = stub.state.lock().unwrap();
        return match state.buckets.get_mut(&bucket) {
            Some(stored) => {
                stored.versioning = element(&body, "Status") == Some("Enabled");
                StatusCode::OK.into_response()
            }
            None => s3_error(StatusCode::NOT_FOUND, "NoSuchBucket", &bucket),
        };
    }

    if stub.bucket(&bucket).is_some() {
        return s3_error(StatusCode::CONFLICT, "BucketAlreadyExists", &bucket);
    }
    let region = element(&body, "LocationConstraint").unwrap_or_default();
    stub.insert(&bucket, region, false);
    (StatusCode::OK, [(header::LOCATION, format!("/{}", bucket))]).into_response()
}

async fn delete_bucket(
    State(stub): State<S3Stub>,
    headers: HeaderMap,
    Path(bucket): Path<String>,
) -> Response {
    stub.record(&headers);

    match stub.state.lock().unwrap().buckets.remove(&bucket) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => s3_error(StatusCode::NOT_FOUND, "NoSuchBucket", &bucket),
    }
}

async fn get_bucket(
    State(stub): State<S3Stub>,
    headers: HeaderMap,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    stub.record(&headers);

    let Some(stored) = stub.bucket(&bucket) else {
        return s3_error(StatusCode::NOT_FOUND, "NoSuchBucket", &bucket);
    };
    let query = query.unwrap_or_default();

    if query.contains("location") {
        let body = if stored.region.is_empty() {
            format!("<LocationConstraint xmlns=\"{}\"/>", XMLNS)
        } else {
            format!(
                "<LocationConstraint xmlns=\"{}\">{}</LocationConstraint>",
                XMLNS, stored.region
            )
        };
        return xml(StatusCode::OK, format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", body));
    }

    if query.contains("versioning") {
        let status = if stored.versioning {
            "<Status>Enabled</Status>"
        } else {
            ""
        };
        return xml(
            StatusCode::OK,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<VersioningConfiguration xmlns=\"{}\">{}</VersioningConfiguration>",
                XMLNS, status
            ),
        );
    }

    StatusCode::NOT_IMPLEMENTED.into_response()
}

/// Start the stub on an ephemeral port and return its endpoint
pub async fn spawn_s3_stub() -> (S3Stub, String) {
    let stub = S3Stub::default();

    let bucket_routes = put(put_bucket).delete(delete_bucket).get(get_bucket);
    let router = Router::new()
        .route("/:bucket", bucket_routes.clone())
        .route("/:bucket/", bucket_routes)
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (stub, format!("http://{}", addr))
}
