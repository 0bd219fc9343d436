//! HTTP basic auth for the broker and admin routes.
//!
//! Both sides are hashed before comparing so the comparison time does not
//!  depend on where the supplied credentials first differ, or on their length.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::BrokerCredentials;
use crate::ServiceState;

const REALM: &str = r#"Basic realm="gridbroker""#;

pub async fn require_basic_auth(
    State(state): State<ServiceState>,
    request: Request,
    next: Next,
) -> Response {
    if authorized(request.headers(), state.credentials()) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "rejected unauthenticated request");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM)],
        axum::Json(serde_json::json!({"description": "unauthorized"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap, expected: &BrokerCredentials) -> bool {
    let Some((username, password)) = basic_credentials(headers) else {
        return false;
    };

    let username_ok = digest(&username).ct_eq(&digest(&expected.username));
    let password_ok = digest(&password).ct_eq(&digest(&expected.password));
    (username_ok & password_ok).into()
}

/// Pull `user:password` out of a `Basic` authorization header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
