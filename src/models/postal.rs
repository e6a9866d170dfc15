//! Canonical postal record shared by every upstream service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{check_postal_code, require_non_empty, validate_state_code, DashPolicy};

/// A validated postal code lookup result.
///
/// Built once per successful query and never mutated afterwards. The
/// constructor and deserialization both apply the same field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PostalRecordFields")]
pub struct PostalRecord {
    #[serde(rename = "cep")]
    code: String,
    #[serde(rename = "state")]
    state_code: String,
    city: String,
    neighborhood: String,
    street: String,
}

#[derive(Deserialize)]
struct PostalRecordFields {
    cep: String,
    state: String,
    city: String,
    neighborhood: String,
    street: String,
}

impl TryFrom<PostalRecordFields> for PostalRecord {
    type Error = ValidationError;

    fn try_from(fields: PostalRecordFields) -> Result<Self, Self::Error> {
        PostalRecord::new(
            fields.cep,
            fields.state,
            fields.city,
            fields.neighborhood,
            fields.street,
        )
    }
}

impl PostalRecord {
    /// Create a record, validating every field.
    ///
    /// `code` may carry the dash or not; `state_code` must be one of the 27
    /// short state codes; the remaining fields must be non-empty.
    pub fn new(
        code: impl Into<String>,
        state_code: impl Into<String>,
        city: impl Into<String>,
        neighborhood: impl Into<String>,
        street: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            code: code.into(),
            state_code: state_code.into(),
            city: city.into(),
            neighborhood: neighborhood.into(),
            street: street.into(),
        };
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_postal_code(&self.code, DashPolicy::Optional)?;
        if !validate_state_code(&self.state_code) {
            return Err(ValidationError::UnknownStateCode(self.state_code.clone()));
        }
        require_non_empty("city", &self.city)?;
        require_non_empty("neighborhood", &self.neighborhood)?;
        require_non_empty("street", &self.street)?;
        Ok(())
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state_code(&self) -> &str {
        &self.state_code
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn neighborhood(&self) -> &str {
        &self.neighborhood
    }

    pub fn street(&self) -> &str {
        &self.street
    }
}

impl fmt::Display for PostalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}, {}, {}/{}",
            self.code, self.street, self.neighborhood, self.city, self.state_code
        )
    }
}
