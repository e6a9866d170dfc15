//! ceprace - race two Brazilian postal code (CEP) lookup services.
//!
//! BrasilAPI and ViaCEP are queried concurrently for the same code. The first
//! delivered answer wins and the other query is cancelled through a shared
//! [`CancelToken`]. Each service's response schema is validated and mapped
//! into one [`PostalRecord`].

pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod query;
pub mod race;
pub mod report;
pub mod services;
pub mod validation;

pub use config::{Config, Settings};
pub use error::{QueryError, ValidationError};
pub use models::{PostalRecord, QueryOutcome};
pub use query::{CancelToken, CepQuery, Jitter};
pub use race::{RaceCoordinator, RacePolicy, RaceResult};
pub use services::{BrasilApiService, PostalService, ServiceKind, ViaCepService};
