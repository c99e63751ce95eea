use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::ApiError;

/// A successful response with its body fully read.
///
/// The pipeline buffers the body before handing the response back, so a
/// transport failure partway through the body counts as no response at all.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, url: Url, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", self.url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn response(body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Url::parse("http://localhost:5000/api/teams").unwrap(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_json_decodes_buffered_body() {
        let resp = response(r#"[{"id": 42}]"#);
        let teams: Value = resp.json().unwrap();
        assert_eq!(teams[0]["id"], 42);
        assert_eq!(resp.text(), r#"[{"id": 42}]"#);
    }

    #[test]
    fn test_json_decode_error_is_invalid_response() {
        let err = response("<html>").json::<Value>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(ref msg) if msg.contains("/api/teams")));
        assert_eq!(err.kind(), None);
    }
}
