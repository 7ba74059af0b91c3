//! `lensbridge check-config`
//!
//! Prints the redacted, env-resolved config and its validation report.

use std::path::Path;

use anyhow::{Context, Result};
use lensbridge_config::{
    collect_referenced_vars, load_config_value, prepare_value, redact, validate, ValidationReport,
};

/// Returns whether the config is usable.
pub async fn run(path: &Path) -> Result<bool> {
    println!("\n🔍 Checking {}\n", path.display());

    let raw = load_config_value(path).await?;
    let vars = collect_referenced_vars(&raw);
    if !vars.is_empty() {
        println!("Environment variables referenced: {}", vars.join(", "));
    }

    let config = prepare_value(&raw)?;
    let effective = serde_json::to_value(&config).context("Failed to serialize config")?;
    println!("{}\n", serde_json::to_string_pretty(&redact(&effective))?);

    let report = validate(&config);
    print_report(&report);
    Ok(report.is_valid())
}

fn print_report(report: &ValidationReport) {
    for err in &report.errors {
        println!("  🔴 {}: {}", err.path, err.message);
    }
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    println!();
    if report.is_valid() {
        println!("✅ Config is valid.");
    } else {
        println!("❌ {} error(s) found. Please fix them above.", report.errors.len());
    }
}
