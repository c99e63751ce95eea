//! API client for the collabu backend.
//!
//! Every call goes through [`ApiClient::send`], which runs the request
//! pipeline around the underlying reqwest client. Call sites never handle
//! tokens or auth failures themselves.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::session::{LoginRequest, LoginResponse, MessageResponse};
use crate::auth::{CredentialStore, Registration};
use crate::navigation::Navigator;
use crate::notify::Notifier;

use super::pipeline::RequestPipeline;
use super::{ApiError, ApiResponse};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix for all API endpoints on the server
pub const API_PREFIX: &str = "/api";

/// HTTP request timeout in milliseconds. Fixed for every call.
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

/// API client for the collabu server.
/// Clone is cheap - reqwest::Client and the pipeline are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    /// Create a client for `server_url` (scheme and host, without `/api`)
    pub fn new(
        server_url: &str,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .cookie_provider(credentials.cookies())
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX);
        debug!(base_url = %base_url, "API client created");

        Ok(Self {
            client,
            base_url,
            pipeline: Arc::new(RequestPipeline::new(credentials, navigator, notifier)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.pipeline.credentials()
    }

    /// Absolute URL for an API path such as `/teams/42`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against an API path. Pass the builder to
    /// [`ApiClient::send`] to dispatch it.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Dispatch a request through the pipeline.
    ///
    /// Returns the response with its body read on success. On failure the
    /// session or user has already been dealt with and the error is
    /// returned for local handling.
    pub async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let mut request = builder
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        self.pipeline.outbound(&mut request)?;

        debug!(method = %request.method(), url = %request.url(), "Sending request");
        let outcome = self.client.execute(request).await;
        self.pipeline.inbound(outcome).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        response.json()
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::PUT, path).json(body)).await?;
        response.json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::DELETE, path)).await?;
        response.json()
    }

    // ===== Account =====

    /// Log in with a username or email, storing the token and profile.
    /// Returns the profile as sent by the server.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let auth: LoginResponse = self
            .post("/auth/login", &LoginRequest { username, password })
            .await?;

        let credentials = self.credentials();
        credentials.set_token(&auth.access_token)?;
        credentials.set_user(auth.user.clone())?;

        info!(username = username, "Logged in");
        Ok(auth.user)
    }

    /// Create an account. The session is not touched; log in afterwards.
    pub async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let resp: MessageResponse = self.post("/auth/register", registration).await?;
        Ok(resp.message.unwrap_or_default())
    }

    /// Fetch the current user's profile and store it
    pub async fn me(&self) -> Result<Value, ApiError> {
        let user: Value = self.get("/auth/me").await?;
        self.credentials().set_user(user.clone())?;
        Ok(user)
    }

    /// End the session locally. The server keeps no logout state.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.credentials().logout()?;
        info!("Logged out");
        Ok(())
    }
}
