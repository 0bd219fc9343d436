use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to decode admin API response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("login failed: {0}")]
    Login(String),
}

impl AdminError {
    /// The backend's status code, when the call got as far as a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AdminError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn unexpected(status: StatusCode, body: impl Into<String>) -> Self {
        AdminError::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }
}
