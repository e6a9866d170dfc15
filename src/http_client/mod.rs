//! HTTP client shared by the query tasks.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

/// HTTP client with request timing and header capture.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default ceprace user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request expecting a JSON answer.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let elapsed = start.elapsed();

        // Extract response headers
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        debug!(
            url,
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "GET completed"
        );

        Ok(HttpResponse {
            status: response.status(),
            headers,
            elapsed,
            response,
        })
    }
}
