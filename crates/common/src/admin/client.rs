use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, EXPIRES};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use super::error::AdminError;
use super::{AccessKey, AdminApi, ApiResponse, Group, User};
use crate::session::SessionCache;

/// Page size used when listing groups
pub const GROUP_PAGE_SIZE: usize = 100;

/// Path appended to the admin URL when none is configured
const DEFAULT_API_PATH: &str = "/api/v3";

/// Connection settings for the tenant administration API
#[derive(Clone)]
pub struct AdminConfig {
    pub url: Url,
    pub account_id: String,
    pub username: String,
    pub password: String,
    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("url", &self.url.as_str())
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the tenant administration API.
///
/// Holds one bearer token for the tenant account, shared by every request
///  and refreshed through the login call once the `Expires` time it was
///  issued with has passed.
#[derive(Debug)]
pub struct AdminClient {
    base: Url,
    client: Client,
    config: AdminConfig,
    token: SessionCache<String>,
}

impl AdminClient {
    pub fn new(config: AdminConfig) -> Result<Self, AdminError> {
        let mut base = config.url.clone();
        if base.path().is_empty() || base.path() == "/" {
            base.set_path(DEFAULT_API_PATH);
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;

        Ok(Self {
            base,
            client,
            config,
            token: SessionCache::new(),
        })
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, AdminError> {
        let raw = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&raw)?)
    }

    async fn login(&self) -> Result<(String, DateTime<Utc>), AdminError> {
        let body = json!({
            "accountId": self.config.account_id,
            "username": self.config.username,
            "password": self.config.password,
            "cookie": false,
            "csrfToken": false,
        });

        tracing::debug!(account = %self.config.account_id, "logging in to admin API");
        let response = self
            .client
            .post(self.endpoint("authorize")?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(AdminError::Login(format!("status {}: {}", status, text)));
        }

        let expires_at = response
            .headers()
            .get(EXPIRES)
            .ok_or_else(|| AdminError::Login("missing Expires header".to_string()))?
            .to_str()
            .map_err(|e| AdminError::Login(format!("unreadable Expires header: {}", e)))
            .and_then(|raw| {
                DateTime::parse_from_rfc2822(raw)
                    .map_err(|e| AdminError::Login(format!("invalid Expires header {}: {}", raw, e)))
            })?
            .with_timezone(&Utc);

        let envelope: ApiResponse = response.json().await?;
        let token: String = serde_json::from_value(envelope.data.unwrap_or(Value::Null))
            .map_err(|_| AdminError::Login("response carried no token".to_string()))?;

        Ok((token, expires_at))
    }

    /// Run one authenticated request and return the envelope's `data`.
    ///
    /// Any status other than `expected` becomes
    ///  [`AdminError::UnexpectedStatus`] with the raw body. An empty body on
    ///  the expected status yields `None`.
    pub async fn do_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        expected: StatusCode,
    ) -> Result<Option<Value>, AdminError> {
        let url = self.endpoint(path)?;
        let token = self.token.get_valid(|| self.login()).await?;

        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status != expected {
            tracing::debug!(%method, path, %status, "admin API returned unexpected status");
            return Err(AdminError::unexpected(
                status,
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let envelope: ApiResponse = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    fn decode<T: DeserializeOwned>(data: Option<Value>) -> Result<T, AdminError> {
        Ok(serde_json::from_value(data.unwrap_or(Value::Null))?)
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn create_group(&self, name: &str, policy: Value) -> Result<Group, AdminError> {
        let group = Group::new(name, policy);
        let body = serde_json::to_value(&group)?;
        let data = self
            .do_request(Method::POST, "org/groups", Some(&body), StatusCode::CREATED)
            .await?;
        Self::decode(data)
    }

    async fn update_group(&self, group: &Group) -> Result<Group, AdminError> {
        let body = serde_json::to_value(group)?;
        let data = self
            .do_request(
                Method::PUT,
                &format!("org/groups/{}", group.id),
                Some(&body),
                StatusCode::OK,
            )
            .await?;
        Self::decode(data)
    }

    async fn delete_group(&self, id: &str) -> Result<(), AdminError> {
        self.do_request(
            Method::DELETE,
            &format!("org/groups/{}", id),
            None,
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group, AdminError> {
        let data = self
            .do_request(
                Method::GET,
                &format!("org/groups/group/{}", name),
                None,
                StatusCode::OK,
            )
            .await?;
        Self::decode(data)
    }

    async fn list_groups(&self, marker: Option<&str>) -> Result<Vec<Group>, AdminError> {
        // the serializer is not Send, so it must not live across the await
        let query = {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            query
                .append_pair("type", "local")
                .append_pair("limit", &GROUP_PAGE_SIZE.to_string());
            if let Some(marker) = marker {
                query
                    .append_pair("marker", marker)
                    .append_pair("includeMarker", "false");
            }
            query.finish()
        };

        let data = self
            .do_request(
                Method::GET,
                &format!("org/groups?{}", query),
                None,
                StatusCode::OK,
            )
            .await?;

        match data {
            None | Some(Value::Null) => Ok(Vec::new()),
            data => Self::decode(data),
        }
    }

    async fn create_user(
        &self,
        name: &str,
        full_name: &str,
        member_of: &[String],
    ) -> Result<User, AdminError> {
        let body = json!({
            "fullName": full_name,
            "memberOf": member_of,
            "disable": false,
            "uniqueName": format!("user/{}", name),
        });
        let data = self
            .do_request(Method::POST, "org/users", Some(&body), StatusCode::CREATED)
            .await?;
        Self::decode(data)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<User, AdminError> {
        let data = self
            .do_request(
                Method::GET,
                &format!("org/users/user/{}", name),
                None,
                StatusCode::OK,
            )
            .await?;
        Self::decode(data)
    }

    async fn delete_user(&self, id: &str) -> Result<(), AdminError> {
        self.do_request(
            Method::DELETE,
            &format!("org/users/{}", id),
            None,
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    async fn create_user_access_key(&self, user_id: &str) -> Result<AccessKey, AdminError> {
        let data = self
            .do_request(
                Method::POST,
                &format!("org/users/{}/s3-access-keys", user_id),
                Some(&json!({})),
                StatusCode::CREATED,
            )
            .await?;
        Self::decode(data)
    }

    async fn create_current_user_access_key(
        &self,
        expires: DateTime<Utc>,
    ) -> Result<AccessKey, AdminError> {
        let body = json!({
            "expires": expires.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        });
        let data = self
            .do_request(
                Method::POST,
                "org/users/current-user/s3-access-keys",
                Some(&body),
                StatusCode::CREATED,
            )
            .await?;
        Self::decode(data)
    }
}
