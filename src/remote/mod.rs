//! Remote Rule Import
//!
//! Fetches an operator-supplied rule set over HTTP(S). Gated three ways
//! before anything is trusted: the feature flag must be on, the URL's host
//! must be on the trusted-domain whitelist, and the body must pass the same
//! validator the on-disk file does. Nothing here touches durable state; the
//! caller decides whether to merge and persist the result.

use crate::rules::{validate_rules, Rule, RuleError, StoreError};
use crate::settings::Settings;
use thiserror::Error;
use url::Url;

/// Each failure class gets its own user-facing variant so an interactive
/// caller can relay exactly what went wrong.
#[derive(Debug, Error)]
pub enum RemoteImportError {
    #[error("remote rule fetching is disabled in settings")]
    Disabled,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("host '{0}' is not in the trusted domain list")]
    UntrustedHost(String),

    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("response body is not a valid rule set: {0}")]
    Parse(String),

    #[error(transparent)]
    Invalid(#[from] RuleError),

    #[error("failed to persist imported rules: {0}")]
    Persist(#[from] StoreError),
}

/// Fetch and validate a rule set from `url`. Returns the parsed rules;
/// durable state and the live rule store are untouched.
pub async fn fetch_rules(url: &str, settings: &Settings) -> Result<Vec<Rule>, RemoteImportError> {
    if !settings.remote_fetch_enabled {
        return Err(RemoteImportError::Disabled);
    }

    let parsed = Url::parse(url).map_err(|err| RemoteImportError::InvalidUrl(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RemoteImportError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| RemoteImportError::InvalidUrl("url has no host".to_string()))?;
    if !settings.trusts(host) {
        return Err(RemoteImportError::UntrustedHost(host.to_string()));
    }

    tracing::info!(url = %parsed, "fetching remote rule set");
    let response = reqwest::get(parsed)
        .await
        .map_err(|err| RemoteImportError::Network(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteImportError::Status(status.as_u16()));
    }
    let body = response
        .text()
        .await
        .map_err(|err| RemoteImportError::Network(err.to_string()))?;

    parse_rule_body(&body)
}

/// Parse and validate a fetched body. Split from the transfer so the parse
/// and validation paths are coverable without a live server.
pub fn parse_rule_body(body: &str) -> Result<Vec<Rule>, RemoteImportError> {
    let mut doc: serde_json::Value =
        serde_json::from_str(body).map_err(|err| RemoteImportError::Parse(err.to_string()))?;
    validate_rules(&mut doc)?;
    serde_json::from_value(doc).map_err(|err| RemoteImportError::Parse(err.to_string()))
}
