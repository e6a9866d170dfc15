//! In-process mock upstreams served with axum on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

pub const BRASILAPI_MONTES_CLAROS: &str = r#"{"cep":"39408078","state":"MG","city":"Montes Claros","neighborhood":"Ibituruna","street":"Avenida Herlindo Silveira","service":"open-cep"}"#;

pub const VIACEP_MONTES_CLAROS: &str = r#"{"cep":"39408-078","logradouro":"Avenida Herlindo Silveira","complemento":"","unidade":"","bairro":"Ibituruna","localidade":"Montes Claros","uf":"MG","estado":"Minas Gerais","regiao":"Sudeste","ibge":"3143302","gia":"","ddd":"38","siafi":"4865"}"#;

pub const VIACEP_NOT_FOUND: &str = r#"{"erro": "true"}"#;

/// Canned answer of one mock upstream.
#[derive(Clone)]
pub struct Upstream {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Upstream {
    pub fn ok(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    brasilapi: Upstream,
    viacep: Upstream,
    hits: Arc<AtomicUsize>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockServer {
    pub async fn start(brasilapi: Upstream, viacep: Upstream) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            brasilapi,
            viacep,
            hits: Arc::clone(&hits),
        };

        let app = Router::new()
            .route("/:service/:cep", get(respond))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn brasilapi_url(&self) -> String {
        format!("http://{}/brasilapi/{{{{cep}}}}", self.addr)
    }

    pub fn viacep_url(&self) -> String {
        format!("http://{}/viacep/{{{{cep}}}}", self.addr)
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn respond(
    State(state): State<MockState>,
    Path((service, _cep)): Path<(String, String)>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let upstream = if service == "brasilapi" {
        &state.brasilapi
    } else {
        &state.viacep
    };
    tokio::time::sleep(upstream.delay).await;
    (
        upstream.status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body.clone(),
    )
        .into_response()
}
