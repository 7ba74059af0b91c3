//! `${VAR_NAME}` substitution in config string values, resolved at load time.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are matched. `$${VAR}` escapes to a
//! literal `${VAR}`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// One optional escaping `$` followed by a reference.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute against the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value, MissingEnvVarError> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute against `env`. Unset and empty variables are both errors.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    substitute(value, env, "")
}

fn substitute(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    Ok(match value {
        Value::String(s) => Value::String(substitute_string(s, env, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| substitute(v, env, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), substitute(v, env, &child)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Every variable name referenced anywhere in the tree, sorted.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.extend(
                ENV_VAR_PATTERN
                    .captures_iter(s)
                    .filter(|c| c[1].is_empty())
                    .map(|c| c[2].to_string()),
            ),
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut vars = Vec::new();
    walk(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_secret() {
        let v = json!({"line": {"channelSecret": "${LINE_SECRET}"}, "port": 5000});
        let result = resolve_env_vars_with(&v, &env(&[("LINE_SECRET", "abc")])).unwrap();
        assert_eq!(result["line"]["channelSecret"], "abc");
        assert_eq!(result["port"], 5000);
    }

    #[test]
    fn substitutes_inside_larger_string() {
        let v = json!({"endpoint": "https://${AZ_REGION}.api.cognitive.microsoft.com/"});
        let result = resolve_env_vars_with(&v, &env(&[("AZ_REGION", "eastasia")])).unwrap();
        assert_eq!(result["endpoint"], "https://eastasia.api.cognitive.microsoft.com/");
    }

    #[test]
    fn missing_and_empty_vars_report_path() {
        let v = json!({"azureCv": {"key": "${CV_KEY}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        assert_eq!(err.var_name, "CV_KEY");
        assert_eq!(err.config_path, "azureCv.key");

        let err = resolve_env_vars_with(&v, &env(&[("CV_KEY", "")])).unwrap_err();
        assert_eq!(err.var_name, "CV_KEY");
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"note": "use $${NOT_A_VAR} literally"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["note"], "use ${NOT_A_VAR} literally");
        assert!(collect_referenced_vars(&v).is_empty());
    }

    #[test]
    fn lowercase_names_are_not_references() {
        let v = json!({"k": "${lower}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["k"], "${lower}");
    }

    #[test]
    fn collects_referenced_vars() {
        let v = json!({"a": "${FOO}", "b": ["${BAR}", "${FOO}"]});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
    }
}
