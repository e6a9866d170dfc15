//! Race coordinator behaviour against mock upstreams.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ceprace::http_client::HttpClient;
use ceprace::{
    BrasilApiService, CancelToken, Jitter, QueryError, RaceCoordinator, RacePolicy, RaceResult,
    ServiceKind, Settings, ViaCepService,
};
use common::{MockServer, Upstream, BRASILAPI_MONTES_CLAROS, VIACEP_MONTES_CLAROS, VIACEP_NOT_FOUND};
use tracing::Span;

fn coordinator(server: &MockServer, policy: RacePolicy) -> RaceCoordinator {
    let client = HttpClient::new(Duration::from_secs(5)).unwrap();
    RaceCoordinator::new(
        Arc::new(BrasilApiService::with_url(server.brasilapi_url())),
        Arc::new(ViaCepService::with_url(server.viacep_url())),
        client,
        Span::none(),
    )
    .with_jitter(Jitter::none())
    .with_policy(policy)
}

#[tokio::test]
async fn test_fastest_success_wins() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS),
        Upstream::ok(VIACEP_MONTES_CLAROS).after(Duration::from_millis(500)),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute("39408078", Duration::from_secs(3))
        .await;

    match result {
        RaceResult::Won {
            service: ServiceKind::BrasilApi,
            outcome: Ok(record),
        } => {
            assert_eq!(record.code(), "39408078");
            assert_eq!(record.city(), "Montes Claros");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_first_arrival_reports_fast_failure() {
    // BrasilAPI succeeds late, ViaCEP fails early.
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS).after(Duration::from_millis(400)),
        Upstream::status(500).after(Duration::from_millis(50)),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute("39408078", Duration::from_secs(3))
        .await;

    assert_eq!(
        result,
        RaceResult::Won {
            service: ServiceKind::ViaCep,
            outcome: Err(QueryError::Upstream),
        }
    );
}

#[tokio::test]
async fn test_first_success_waits_past_fast_failure() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS).after(Duration::from_millis(400)),
        Upstream::status(500).after(Duration::from_millis(50)),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstSuccess)
        .execute("39408078", Duration::from_secs(3))
        .await;

    assert_eq!(result.winner(), Some(ServiceKind::BrasilApi));
    assert!(matches!(result, RaceResult::Won { outcome: Ok(_), .. }));
}

#[tokio::test]
async fn test_first_success_reports_earliest_failure_when_both_fail() {
    let server = MockServer::start(
        Upstream::status(503).after(Duration::from_millis(300)),
        Upstream::ok(VIACEP_NOT_FOUND).after(Duration::from_millis(50)),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstSuccess)
        .execute("99999999", Duration::from_secs(3))
        .await;

    assert_eq!(
        result,
        RaceResult::Won {
            service: ServiceKind::ViaCep,
            outcome: Err(QueryError::NotFound),
        }
    );
}

#[tokio::test]
async fn test_deadline_expires_and_cancels() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS).after(Duration::from_secs(10)),
        Upstream::ok(VIACEP_MONTES_CLAROS).after(Duration::from_secs(10)),
    )
    .await;

    let cancel = CancelToken::new();
    let started = Instant::now();
    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute_with("39408078", Duration::from_millis(200), cancel.clone())
        .await;

    assert_eq!(result, RaceResult::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_deadline_also_bounds_first_success() {
    let server = MockServer::start(
        Upstream::status(500),
        Upstream::ok(VIACEP_MONTES_CLAROS).after(Duration::from_secs(10)),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstSuccess)
        .execute("39408078", Duration::from_millis(300))
        .await;

    assert_eq!(result, RaceResult::TimedOut);
}

#[tokio::test]
async fn test_malformed_code_issues_no_request() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS),
        Upstream::ok(VIACEP_MONTES_CLAROS),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute("3940807", Duration::from_secs(1))
        .await;

    assert!(matches!(
        result,
        RaceResult::Rejected(QueryError::MalformedInput(_))
    ));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_dashed_input_is_normalized_for_both_services() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS).after(Duration::from_millis(300)),
        Upstream::ok(VIACEP_MONTES_CLAROS),
    )
    .await;

    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute("39408-078", Duration::from_secs(3))
        .await;

    assert_eq!(result.winner(), Some(ServiceKind::ViaCep));
    assert!(matches!(result, RaceResult::Won { outcome: Ok(_), .. }));
}

#[tokio::test]
async fn test_winner_cancels_loser() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS),
        Upstream::ok(VIACEP_MONTES_CLAROS).after(Duration::from_secs(10)),
    )
    .await;

    let cancel = CancelToken::new();
    let started = Instant::now();
    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute_with("39408078", Duration::from_secs(5), cancel.clone())
        .await;

    assert_eq!(result.winner(), Some(ServiceKind::BrasilApi));
    // Returned without waiting for the slow loser.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_external_cancel_ends_race() {
    let server = MockServer::start(
        Upstream::ok(BRASILAPI_MONTES_CLAROS).after(Duration::from_secs(10)),
        Upstream::ok(VIACEP_MONTES_CLAROS).after(Duration::from_secs(10)),
    )
    .await;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
    }

    let started = Instant::now();
    let result = coordinator(&server, RacePolicy::FirstArrival)
        .execute_with("39408078", Duration::from_secs(5), cancel)
        .await;

    assert_eq!(result, RaceResult::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_from_settings_uses_configured_endpoints() {
    let server = MockServer::start(
        Upstream::status(404),
        Upstream::ok(VIACEP_MONTES_CLAROS.replace("Minas Gerais", "Bahia").as_str())
            .after(Duration::from_millis(200)),
    )
    .await;

    let settings = Settings {
        jitter_max: Duration::ZERO,
        race_policy: RacePolicy::FirstSuccess,
        cross_check_state: true,
        brasilapi_url: server.brasilapi_url(),
        viacep_url: server.viacep_url(),
        ..Settings::default()
    };
    let client = HttpClient::new(settings.request_timeout).unwrap();
    let coordinator = RaceCoordinator::from_settings(&settings, client, Span::none());
    assert_eq!(coordinator.policy(), RacePolicy::FirstSuccess);

    let result = coordinator
        .execute("39408078", Duration::from_secs(3))
        .await;

    // Both fail: BrasilAPI first with 404, ViaCEP later on the state cross-check.
    assert_eq!(
        result,
        RaceResult::Won {
            service: ServiceKind::BrasilApi,
            outcome: Err(QueryError::NotFound),
        }
    );
}
