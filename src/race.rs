//! Race coordinator: query both services at once and keep the first answer.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::config::Settings;
use crate::error::QueryError;
use crate::http_client::HttpClient;
use crate::models::QueryOutcome;
use crate::query::{CancelToken, CepQuery, Jitter};
use crate::services::{BrasilApiService, PostalService, ServiceKind, ViaCepService};
use crate::validation::normalize_postal_code;

/// Default deadline for a whole race.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// Which delivered outcome ends the race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    /// The first outcome delivered wins, even if it is a failure.
    #[default]
    FirstArrival,
    /// Failures are held back while the other service may still succeed.
    FirstSuccess,
}

/// Terminal state of a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceResult {
    /// A service delivered the deciding outcome.
    Won {
        service: ServiceKind,
        outcome: QueryOutcome,
    },
    /// The deadline fired before any deciding outcome.
    TimedOut,
    /// The input was rejected before any query was launched.
    Rejected(QueryError),
    /// Both queries stopped without a result because the caller cancelled.
    Cancelled,
}

impl RaceResult {
    pub fn winner(&self) -> Option<ServiceKind> {
        match self {
            RaceResult::Won { service, .. } => Some(*service),
            _ => None,
        }
    }
}

/// Launches one query per service under a shared deadline and cancellation
/// token.
pub struct RaceCoordinator {
    service_a: Arc<dyn PostalService>,
    service_b: Arc<dyn PostalService>,
    client: HttpClient,
    jitter: Jitter,
    policy: RacePolicy,
    span: Span,
}

impl RaceCoordinator {
    pub fn new(
        service_a: Arc<dyn PostalService>,
        service_b: Arc<dyn PostalService>,
        client: HttpClient,
        span: Span,
    ) -> Self {
        Self {
            service_a,
            service_b,
            client,
            jitter: Jitter::default(),
            policy: RacePolicy::default(),
            span,
        }
    }

    /// BrasilAPI against ViaCEP, configured from resolved settings.
    pub fn from_settings(settings: &Settings, client: HttpClient, span: Span) -> Self {
        let brasilapi = BrasilApiService::with_url(settings.brasilapi_url.clone());
        let viacep = ViaCepService::with_url(settings.viacep_url.clone())
            .with_state_cross_check(settings.cross_check_state);

        Self::new(Arc::new(brasilapi), Arc::new(viacep), client, span)
            .with_jitter(Jitter::new(settings.jitter_max))
            .with_policy(settings.race_policy)
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RacePolicy {
        self.policy
    }

    /// Race both services for `code`, giving up after `deadline`.
    pub async fn execute(&self, code: &str, deadline: Duration) -> RaceResult {
        self.execute_with(code, deadline, CancelToken::new()).await
    }

    /// Like [`execute`](Self::execute), with a caller-owned token so the
    /// race can also be cancelled from outside (e.g. on SIGINT).
    ///
    /// The token is always cancelled when this returns.
    pub async fn execute_with(
        &self,
        code: &str,
        deadline: Duration,
        cancel: CancelToken,
    ) -> RaceResult {
        self.race(code, deadline, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn race(&self, code: &str, deadline: Duration, cancel: CancelToken) -> RaceResult {
        let Some(code) = normalize_postal_code(code) else {
            warn!(code, "Rejecting malformed postal code");
            return RaceResult::Rejected(QueryError::MalformedInput(format!(
                "postal code {:?} must have 8 digits, optionally with '-'",
                code
            )));
        };

        let kind_a = self.service_a.kind();
        let kind_b = self.service_b.kind();
        let mut rx_a = self
            .query(&self.service_a)
            .spawn(cancel.clone(), code.clone());
        let mut rx_b = self
            .query(&self.service_b)
            .spawn(cancel.clone(), code.clone());
        info!(%code, ?deadline, policy = ?self.policy, "Race started");

        let sleep = tokio::time::sleep(deadline);
        tokio::pin!(sleep);

        let mut a_open = true;
        let mut b_open = true;
        let mut first_failure = None;

        let result = loop {
            tokio::select! {
                biased;
                delivered = &mut rx_a, if a_open => {
                    a_open = false;
                    if let Some(result) = self.settle(kind_a, delivered, &mut first_failure, b_open) {
                        break result;
                    }
                }
                delivered = &mut rx_b, if b_open => {
                    b_open = false;
                    if let Some(result) = self.settle(kind_b, delivered, &mut first_failure, a_open) {
                        break result;
                    }
                }
                _ = &mut sleep => {
                    info!("Deadline exceeded");
                    break RaceResult::TimedOut;
                }
            }
        };

        // Stop whichever query is still running; do not wait for it.
        cancel.cancel();

        if let Some(winner) = result.winner() {
            info!(%winner, "Race decided");
        }
        result
    }

    fn query(&self, service: &Arc<dyn PostalService>) -> CepQuery {
        let span = info_span!(parent: &self.span, "query", service = %service.kind());
        CepQuery::new(Arc::clone(service), self.client.clone(), self.jitter, span)
    }

    /// Decide whether a delivered outcome ends the race.
    fn settle(
        &self,
        service: ServiceKind,
        delivered: Result<QueryOutcome, oneshot::error::RecvError>,
        first_failure: &mut Option<(ServiceKind, QueryError)>,
        other_open: bool,
    ) -> Option<RaceResult> {
        match delivered {
            Ok(Ok(record)) => {
                return Some(RaceResult::Won {
                    service,
                    outcome: Ok(record),
                })
            }
            Ok(Err(err)) => match self.policy {
                RacePolicy::FirstArrival => {
                    return Some(RaceResult::Won {
                        service,
                        outcome: Err(err),
                    })
                }
                RacePolicy::FirstSuccess => {
                    debug!(%service, error = %err, "Holding failure, waiting for the other service");
                    first_failure.get_or_insert((service, err));
                }
            },
            Err(_) => debug!(%service, "Query stopped without a result"),
        }

        if other_open {
            return None;
        }

        Some(match first_failure.take() {
            Some((service, err)) => RaceResult::Won {
                service,
                outcome: Err(err),
            },
            None => RaceResult::Cancelled,
        })
    }
}
