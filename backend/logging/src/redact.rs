//! Log Redaction Layer
//!
//! Scrubs bearer tokens, Imgur client ids and Azure subscription keys from
//! strings before they reach the logs. Upstream error bodies often echo them.

use regex::Regex;
use std::sync::LazyLock;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static CLIENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Client-ID\s+[a-zA-Z0-9]+").unwrap());
static SUBSCRIPTION_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(ocp-apim-subscription-key["']?\s*[:=]\s*["']?)[a-z0-9]+"#).unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]");
    let redacted = CLIENT_ID_RE.replace_all(&redacted, "Client-ID [REDACTED_TOKEN]");
    SUBSCRIPTION_KEY_RE
        .replace_all(&redacted, "${1}[REDACTED_KEY]")
        .into_owned()
}
