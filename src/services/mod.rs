//! Upstream postal code services.
//!
//! Each service knows its endpoint template, how to spot its own "not found"
//! sentinel, and how to turn a raw response body into a [`PostalRecord`].

pub mod brasilapi;
pub mod viacep;

pub use brasilapi::{BrasilApiRecord, BrasilApiService, BRASILAPI_URL};
pub use viacep::{ViaCepRecord, ViaCepService, VIACEP_URL};

use std::fmt;

use url::Url;

use crate::error::{QueryError, ValidationError};
use crate::models::PostalRecord;

/// Placeholder replaced by the postal code in endpoint templates.
pub const CEP_PLACEHOLDER: &str = "{{cep}}";

/// Identifies an upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    BrasilApi,
    ViaCep,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::BrasilApi => "brasilapi",
            ServiceKind::ViaCep => "viacep",
        }
    }

    /// Human-readable service name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::BrasilApi => "BrasilAPI",
            ServiceKind::ViaCep => "ViaCEP",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capabilities a query task needs from an upstream service.
pub trait PostalService: Send + Sync {
    fn kind(&self) -> ServiceKind;

    /// Endpoint template containing [`CEP_PLACEHOLDER`].
    fn url_template(&self) -> &str;

    /// Whether a 200 response body is the service's "not found" answer.
    fn is_not_found(&self, _body: &[u8]) -> bool {
        false
    }

    /// Decode and validate a 200 response body.
    fn extract_record(&self, body: &[u8]) -> Result<PostalRecord, ValidationError>;

    /// Build the request URL for an already-normalized postal code.
    fn request_url(&self, code: &str) -> Result<Url, QueryError> {
        substitute_code(self.url_template(), code)
    }
}

/// Replace [`CEP_PLACEHOLDER`] in `template` with the URL-encoded code.
pub fn substitute_code(template: &str, code: &str) -> Result<Url, QueryError> {
    if !template.contains(CEP_PLACEHOLDER) {
        return Err(QueryError::MalformedInput(format!(
            "URL template has no {} placeholder: {}",
            CEP_PLACEHOLDER, template
        )));
    }
    let url = template.replace(CEP_PLACEHOLDER, &urlencoding::encode(code));
    Url::parse(&url).map_err(|e| QueryError::MalformedInput(format!("{}: {}", url, e)))
}
