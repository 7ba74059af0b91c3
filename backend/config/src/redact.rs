//! Config redaction: masks credentials so a config can be printed or logged.

use serde_json::Value;

/// Keys whose string values are credentials (compared case-insensitively).
static SENSITIVE_KEYS: &[&str] = &[
    "channelSecret",
    "channel_secret",
    "channelAccessToken",
    "channel_access_token",
    "clientId",
    "client_id",
    "clientSecret",
    "client_secret",
    "accessToken",
    "access_token",
    "refreshToken",
    "refresh_token",
    "key",
];

/// Copy of `value` with every sensitive string replaced by a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// First four characters of long secrets, nothing of short ones.
fn mask(s: &str) -> String {
    if s.chars().count() > 8 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if !s.is_empty() && is_sensitive_key(key) => Value::String(mask(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
