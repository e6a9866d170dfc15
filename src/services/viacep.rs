//! ViaCEP (`viacep.com.br`) JSON endpoint.
//!
//! ViaCEP answers unknown codes with HTTP 200 and a body of `{"erro": "true"}`
//! (older deployments send a JSON boolean), so not-found detection happens on
//! the body rather than the status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PostalService, ServiceKind};
use crate::error::ValidationError;
use crate::models::PostalRecord;
use crate::validation::{
    check_postal_code, require_non_empty, state_name_for_code, validate_region_name,
    validate_state_code, validate_state_name, DashPolicy,
};

pub const VIACEP_URL: &str = "https://viacep.com.br/ws/{{cep}}/json/";

/// Raw ViaCEP response body, with English field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaCepRecord {
    pub cep: String,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "complemento")]
    pub complement: String,
    #[serde(rename = "unidade")]
    pub unit: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "localidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state_code: String,
    #[serde(rename = "estado")]
    pub state_name: String,
    #[serde(rename = "regiao")]
    pub region: String,
    #[serde(rename = "ibge")]
    pub city_code: String,
    #[serde(rename = "gia")]
    pub tax_code: String,
    #[serde(rename = "ddd")]
    pub area_code: String,
    #[serde(rename = "siafi")]
    pub finance_code: String,
}

impl ViaCepRecord {
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let record: Self = serde_json::from_slice(body)?;
        record.validate()?;
        Ok(record)
    }

    /// Check the ViaCEP-specific rules: dashed CEP, short and long state
    /// names, region and non-empty address fields.
    ///
    /// The short and long state names are validated independently; whether
    /// they name the same state is only checked by
    /// [`ViaCepRecord::check_state_consistency`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_postal_code(&self.cep, DashPolicy::Required)?;
        if !validate_state_code(&self.state_code) {
            return Err(ValidationError::UnknownStateCode(self.state_code.clone()));
        }
        if !validate_state_name(&self.state_name) {
            return Err(ValidationError::UnknownStateName(self.state_name.clone()));
        }
        if !validate_region_name(&self.region) {
            return Err(ValidationError::UnknownRegion(self.region.clone()));
        }
        require_non_empty("localidade", &self.city)?;
        require_non_empty("bairro", &self.neighborhood)?;
        require_non_empty("logradouro", &self.street)?;
        Ok(())
    }

    /// Fail when `uf` and `estado` refer to different states.
    pub fn check_state_consistency(&self) -> Result<(), ValidationError> {
        match state_name_for_code(&self.state_code) {
            Some(name) if name == self.state_name => Ok(()),
            _ => Err(ValidationError::StateMismatch {
                code: self.state_code.clone(),
                name: self.state_name.clone(),
            }),
        }
    }
}

impl TryFrom<ViaCepRecord> for PostalRecord {
    type Error = ValidationError;

    fn try_from(raw: ViaCepRecord) -> Result<Self, Self::Error> {
        raw.validate()?;
        PostalRecord::new(
            raw.cep,
            raw.state_code,
            raw.city,
            raw.neighborhood,
            raw.street,
        )
    }
}

/// ViaCEP query capability.
#[derive(Debug, Clone)]
pub struct ViaCepService {
    url_template: String,
    cross_check_state: bool,
}

impl ViaCepService {
    pub fn new() -> Self {
        Self::with_url(VIACEP_URL)
    }

    /// Use a different endpoint template (mirrors, tests).
    pub fn with_url(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            cross_check_state: false,
        }
    }

    /// Also require `uf` and `estado` to name the same state.
    pub fn with_state_cross_check(mut self, enabled: bool) -> Self {
        self.cross_check_state = enabled;
        self
    }
}

impl Default for ViaCepService {
    fn default() -> Self {
        Self::new()
    }
}

impl PostalService for ViaCepService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::ViaCep
    }

    fn url_template(&self) -> &str {
        &self.url_template
    }

    fn is_not_found(&self, body: &[u8]) -> bool {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return false;
        };
        match map.get("erro") {
            Some(Value::String(s)) => s == "true",
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    fn extract_record(&self, body: &[u8]) -> Result<PostalRecord, ValidationError> {
        let raw = ViaCepRecord::from_json(body)?;
        if self.cross_check_state {
            raw.check_state_consistency()?;
        }
        raw.try_into()
    }
}
