//! Pure validators for postal codes, states and regions.
//!
//! Every function here is total: it never panics and either answers with a
//! boolean or, for the `check_*` forms, a [`ValidationError`] carrying the reason.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Brazilian states as (short code, full name) pairs.
pub const STATES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Geographic regions as reported by ViaCEP.
pub const REGIONS: [&str; 5] = ["Norte", "Nordeste", "Centro-Oeste", "Sudeste", "Sul"];

// `[0-9]` rather than `\d`: the regex crate's `\d` matches any Unicode digit.
static CEP_OPTIONAL_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("valid regex"));
static CEP_WITH_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}-[0-9]{3}$").expect("valid regex"));
static CEP_WITHOUT_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8}$").expect("valid regex"));

/// Whether the `NNNNN-NNN` separator may, must or must not appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashPolicy {
    Optional,
    Required,
    Forbidden,
}

impl DashPolicy {
    fn pattern(self) -> &'static Regex {
        match self {
            DashPolicy::Optional => &CEP_OPTIONAL_DASH,
            DashPolicy::Required => &CEP_WITH_DASH,
            DashPolicy::Forbidden => &CEP_WITHOUT_DASH,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            DashPolicy::Optional => "must have 8 digits, optionally with '-'",
            DashPolicy::Required => "must have 8 digits formatted as NNNNN-NNN",
            DashPolicy::Forbidden => "must have 8 digits without '-'",
        }
    }
}

/// Check a postal code against the given dash policy.
pub fn validate_postal_code(code: &str, policy: DashPolicy) -> bool {
    policy.pattern().is_match(code)
}

/// Like [`validate_postal_code`], but reports why the code was rejected.
pub fn check_postal_code(code: &str, policy: DashPolicy) -> Result<(), ValidationError> {
    if validate_postal_code(code, policy) {
        Ok(())
    } else {
        Err(ValidationError::PostalCode {
            code: code.to_string(),
            reason: policy.reason(),
        })
    }
}

/// Validate user input and return the bare 8 digits used in request URLs.
pub fn normalize_postal_code(code: &str) -> Option<String> {
    let code = code.trim();
    if !validate_postal_code(code, DashPolicy::Optional) {
        return None;
    }
    Some(code.chars().filter(|c| c.is_ascii_digit()).collect())
}

pub fn validate_state_code(code: &str) -> bool {
    STATES.iter().any(|(short, _)| *short == code)
}

pub fn validate_state_name(name: &str) -> bool {
    STATES.iter().any(|(_, long)| *long == name)
}

pub fn validate_region_name(name: &str) -> bool {
    REGIONS.contains(&name)
}

/// Full state name for a short state code.
pub fn state_name_for_code(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(short, _)| *short == code)
        .map(|(_, long)| *long)
}

/// Fail with [`ValidationError::MissingField`] when `value` is empty or blank.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
