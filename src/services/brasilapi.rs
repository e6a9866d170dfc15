//! BrasilAPI (`brasilapi.com.br`) CEP v1 endpoint.

use serde::{Deserialize, Serialize};

use super::{PostalService, ServiceKind};
use crate::error::ValidationError;
use crate::models::PostalRecord;
use crate::validation::{check_postal_code, require_non_empty, validate_state_code, DashPolicy};

pub const BRASILAPI_URL: &str = "https://brasilapi.com.br/api/cep/v1/{{cep}}";

/// Providers BrasilAPI reports in its `service` field.
pub const PROVIDERS: [&str; 5] = ["viacep", "widenet", "correios", "correios-alt", "open-cep"];

/// Raw BrasilAPI response body.
///
/// Absent fields decode as empty strings so they fail validation instead of
/// decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrasilApiRecord {
    pub cep: String,
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub service: String,
}

impl BrasilApiRecord {
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let record: Self = serde_json::from_slice(body)?;
        record.validate()?;
        Ok(record)
    }

    /// Check the BrasilAPI-specific rules: bare 8-digit CEP, short state code,
    /// known provider and non-empty address fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_postal_code(&self.cep, DashPolicy::Forbidden)?;
        if !validate_state_code(&self.state) {
            return Err(ValidationError::UnknownStateCode(self.state.clone()));
        }
        if !PROVIDERS.contains(&self.service.as_str()) {
            return Err(ValidationError::UnknownProvider(self.service.clone()));
        }
        require_non_empty("city", &self.city)?;
        require_non_empty("neighborhood", &self.neighborhood)?;
        require_non_empty("street", &self.street)?;
        Ok(())
    }
}

impl TryFrom<BrasilApiRecord> for PostalRecord {
    type Error = ValidationError;

    fn try_from(raw: BrasilApiRecord) -> Result<Self, Self::Error> {
        raw.validate()?;
        PostalRecord::new(raw.cep, raw.state, raw.city, raw.neighborhood, raw.street)
    }
}

/// BrasilAPI query capability.
#[derive(Debug, Clone)]
pub struct BrasilApiService {
    url_template: String,
}

impl BrasilApiService {
    pub fn new() -> Self {
        Self::with_url(BRASILAPI_URL)
    }

    /// Use a different endpoint template (mirrors, tests).
    pub fn with_url(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }
}

impl Default for BrasilApiService {
    fn default() -> Self {
        Self::new()
    }
}

impl PostalService for BrasilApiService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::BrasilApi
    }

    fn url_template(&self) -> &str {
        &self.url_template
    }

    fn extract_record(&self, body: &[u8]) -> Result<PostalRecord, ValidationError> {
        BrasilApiRecord::from_json(body)?.try_into()
    }
}
