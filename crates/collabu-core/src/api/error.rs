use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// How a failed request is handled by the response stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received
    Network,
    /// 401 or 422: the session is invalid or expired
    Auth,
    /// Any other error status
    Request,
}

/// Classify a failed request by the status of its response, if any.
///
/// Whether a response exists is checked first; among responses, 401 and 422
/// are auth failures and everything else is a plain request failure.
pub fn classify(status: Option<StatusCode>) -> FailureKind {
    match status.map(|s| s.as_u16()) {
        None => FailureKind::Network,
        Some(401) | Some(422) => FailureKind::Auth,
        Some(_) => FailureKind::Request,
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Unauthorized ({status}) - session cleared")]
    Unauthorized { status: StatusCode, body: String },

    #[error("Request failed ({status}): {message}")]
    Request {
        status: StatusCode,
        message: String,
        body: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// The failure class, for errors the response stage produced
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::Network(_) => Some(FailureKind::Network),
            ApiError::Unauthorized { .. } => Some(FailureKind::Auth),
            ApiError::Request { .. } => Some(FailureKind::Request),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == Some(FailureKind::Auth)
    }
}
