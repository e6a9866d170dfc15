//! User agent handling for HTTP requests.

pub const USER_AGENT: &str = concat!(
    "ceprace/",
    env!("CARGO_PKG_VERSION"),
    " (postal code lookup)"
);

/// Resolve user agent from config value.
/// - None or blank => default ceprace user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
