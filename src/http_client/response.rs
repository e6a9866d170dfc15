//! HTTP response wrapper.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    /// Time from sending the request to receiving the response headers.
    pub elapsed: Duration,
    pub(crate) response: Response,
}

impl HttpResponse {
    /// Check if the response is 200 OK.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        self.response.bytes().await.map(|b| b.to_vec())
    }
}
