//! A single upstream query, run as one side of a race.
//!
//! The task sleeps a random jitter, checks the shared [`CancelToken`], issues
//! the GET, classifies the status and normalizes the body. Every suspension
//! point (jitter, request, body read) also watches the token, so a task whose
//! sibling already won stops without emitting anything.

mod cancel;

pub use cancel::CancelToken;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, info, Instrument, Span};

use crate::error::QueryError;
use crate::http_client::HttpClient;
use crate::models::QueryOutcome;
use crate::services::{PostalService, ServiceKind};

/// Default upper bound of the pre-request jitter.
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(1500);

/// Random delay applied before each request so that many concurrent lookups
/// do not hit rate-limited upstreams in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    max: Duration,
}

impl Jitter {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Pick a delay in `1..=max` milliseconds, or zero when disabled.
    pub fn sample(&self) -> Duration {
        let max_ms = self.max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(1..=max_ms))
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_MAX)
    }
}

/// One service's query task.
pub struct CepQuery {
    service: Arc<dyn PostalService>,
    client: HttpClient,
    jitter: Jitter,
    span: Span,
}

impl CepQuery {
    /// `span` is the logging context every event of this query is recorded in.
    pub fn new(
        service: Arc<dyn PostalService>,
        client: HttpClient,
        jitter: Jitter,
        span: Span,
    ) -> Self {
        Self {
            service,
            client,
            jitter,
            span,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.service.kind()
    }

    /// Run the query on its own task and deliver the outcome on a
    /// single-slot channel.
    ///
    /// Nothing is sent if the task is cancelled first. A send after the
    /// receiver was dropped fails immediately. A successful task cancels
    /// `cancel` right after delivering so its sibling stops.
    pub fn spawn(self, cancel: CancelToken, code: String) -> oneshot::Receiver<QueryOutcome> {
        let (tx, rx) = oneshot::channel();
        let span = self.span.clone();

        tokio::spawn(
            async move {
                let Some(outcome) = self.run(&cancel, &code).await else {
                    return;
                };

                let succeeded = outcome.is_ok();
                match &outcome {
                    Ok(record) => info!(%record, "Query succeeded"),
                    Err(e) => info!(error = %e, "Query failed"),
                }

                if tx.send(outcome).is_err() {
                    debug!("Race already decided, discarding result");
                }
                if succeeded {
                    cancel.cancel();
                }
            }
            .instrument(span),
        );

        rx
    }

    /// Execute the query. Returns `None` when cancelled before an outcome
    /// was produced.
    pub async fn run(&self, cancel: &CancelToken, code: &str) -> Option<QueryOutcome> {
        let delay = self.jitter.sample();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Applying jitter");
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Cancelled during jitter");
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if cancel.is_cancelled() {
            info!("Cancelled before request");
            return None;
        }

        let url = match self.service.request_url(code) {
            Ok(url) => url,
            Err(e) => return Some(Err(e)),
        };

        self.fetch(cancel, url.as_str()).await
    }

    async fn fetch(&self, cancel: &CancelToken, url: &str) -> Option<QueryOutcome> {
        let response = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Cancelled during request");
                return None;
            }
            response = self.client.get(url) => response,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => return Some(Err(QueryError::from(e))),
        };

        if !response.is_ok() {
            return Some(Err(QueryError::from_status(response.status.as_u16())));
        }

        debug!(
            content_type = response.content_type().unwrap_or("unknown"),
            elapsed_ms = response.elapsed.as_millis() as u64,
            "Reading response body"
        );

        let body = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Cancelled while reading body");
                return None;
            }
            body = response.bytes() => body,
        };

        let body = match body {
            Ok(b) => b,
            Err(e) => {
                return Some(Err(QueryError::Transport(format!(
                    "Failed to read response body: {}",
                    e
                ))))
            }
        };

        if self.service.is_not_found(&body) {
            return Some(Err(QueryError::NotFound));
        }

        Some(self.service.extract_record(&body).map_err(QueryError::from))
    }
}
