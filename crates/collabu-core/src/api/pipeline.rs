//! The two stages every request passes through.
//!
//! `outbound` runs on the built request before it is dispatched and attaches
//! the bearer token. `inbound` runs on the outcome: successes pass through,
//! failures are classified with [`classify`] and reacted to (clear the
//! session and redirect, or notify the user) before being returned to the
//! caller unchanged in meaning.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::auth::CredentialStore;
use crate::navigation::{is_login_path, Navigator, LOGIN_PATH};
use crate::notify::{Notifier, NETWORK_ERROR, REQUEST_FAILED};

use super::error::{classify, ApiError, FailureKind};
use super::response::ApiResponse;

pub struct RequestPipeline {
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl RequestPipeline {
    pub fn new(
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            credentials,
            navigator,
            notifier,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Attach `Authorization: Bearer <token>` when a token is stored.
    /// An error here means the request must not be sent.
    pub fn outbound(&self, request: &mut Request) -> Result<(), ApiError> {
        let Some(token) = self.credentials.token()? else {
            trace!(url = %request.url(), "No token, sending unauthenticated");
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidRequest(format!("Stored token is not a valid header value: {}", e)))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// React to the outcome of a dispatched request.
    ///
    /// The body is read here, so a timeout or reset while it streams in is
    /// handled as a network failure like one before the headers arrived.
    pub async fn inbound(&self, outcome: Result<Response, reqwest::Error>) -> Result<ApiResponse, ApiError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return Err(self.network_failure(e)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => return Err(self.network_failure(e)),
        };

        if status.is_success() {
            Ok(ApiResponse::new(status, headers, url, body))
        } else {
            Err(self.response_failure(status, &url, &String::from_utf8_lossy(&body)))
        }
    }

    fn network_failure(&self, error: reqwest::Error) -> ApiError {
        warn!(error = %error, "No response received");
        self.notifier.error(NETWORK_ERROR);
        ApiError::Network(error)
    }

    fn response_failure(&self, status: StatusCode, url: &Url, body: &str) -> ApiError {
        match classify(Some(status)) {
            FailureKind::Auth => {
                self.invalidate_session(status);
                ApiError::Unauthorized {
                    status,
                    body: ApiError::truncate_body(body),
                }
            }
            FailureKind::Request | FailureKind::Network => {
                let message = failure_message(body);
                debug!(%status, %url, message = %message, "Request failed");
                self.notifier.error(&message);
                ApiError::Request {
                    status,
                    message,
                    body: ApiError::truncate_body(body),
                }
            }
        }
    }

    fn invalidate_session(&self, status: StatusCode) {
        warn!(%status, "Server rejected the session, clearing credentials");
        if let Err(e) = self.credentials.logout() {
            warn!(error = %e, "Failed to clear stored credentials");
        }

        let current = self.navigator.current_path();
        if is_login_path(&current) {
            debug!(path = %current, "Already on login, not redirecting");
        } else {
            self.navigator.navigate(LOGIN_PATH);
        }
    }
}

/// The server's `message` field when it holds something worth showing,
/// otherwise the generic fallback. Numbers and `true` are rendered as text;
/// empty strings, zero, `false`, null, arrays and objects fall back.
pub fn failure_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    match parsed.as_ref().and_then(|v| v.get("message")) {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => REQUEST_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_prefers_server_message() {
        assert_eq!(failure_message(r#"{"message": "server exploded"}"#), "server exploded");
        assert_eq!(
            failure_message(r#"{"message": "Username already exists", "code": 400}"#),
            "Username already exists"
        );
    }

    #[test]
    fn test_failure_message_fallback() {
        assert_eq!(failure_message(""), REQUEST_FAILED);
        assert_eq!(failure_message("<html>Bad Gateway</html>"), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"error": "nope"}"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"message": ""}"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"message": null}"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"["message"]"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"message": 0}"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"message": false}"#), REQUEST_FAILED);
        assert_eq!(failure_message(r#"{"message": {"field": "name"}}"#), REQUEST_FAILED);
    }

    #[test]
    fn test_failure_message_renders_scalars() {
        assert_eq!(failure_message(r#"{"message": 404}"#), "404");
        assert_eq!(failure_message(r#"{"message": 1.5}"#), "1.5");
        assert_eq!(failure_message(r#"{"message": true}"#), "true");
    }
}
