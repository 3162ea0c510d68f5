//! Semantic validation of a parsed [`EngineConfig`].
//!
//! Checks the constraints the type system cannot express: range checks and
//! cross-field invariants. Validation collects *all* violations before
//! returning so the caller sees the full scope of issues at once, and every
//! error message names the field path and the invalid value.

use super::EngineConfig;
use crate::rules::Trigger;

/// Errors arising from configuration parsing, validation, or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g. "economic_auditor.electricity_rate_kwh").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("io error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Validate all semantic constraints on an [`EngineConfig`].
///
/// # Returns
///
/// - `Ok(())` if all constraints pass.
/// - `Err(Vec<ConfigError>)` with every violation found.
pub fn validate(config: &EngineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Simulation dispatch ──────────────────────────────────────────
    if config.simulation.timeout_ms == 0 {
        errors.push(invalid(
            "simulation.timeout_ms",
            0,
            "must be at least 1 ms",
        ));
    }

    // ── KPI extraction ───────────────────────────────────────────────
    if config.kpi.energy_reference_ceiling_kw <= 0.0 {
        errors.push(invalid(
            "kpi.energy_reference_ceiling_kw",
            config.kpi.energy_reference_ceiling_kw,
            "must be positive",
        ));
    }

    // ── Economic auditor ─────────────────────────────────────────────
    let eco = &config.economic_auditor;
    if eco.electricity_rate_kwh <= 0.0 {
        errors.push(invalid(
            "economic_auditor.electricity_rate_kwh",
            eco.electricity_rate_kwh,
            "must be positive",
        ));
    }
    if eco.annual_operating_hours <= 0.0 {
        errors.push(invalid(
            "economic_auditor.annual_operating_hours",
            eco.annual_operating_hours,
            "must be positive",
        ));
    }
    if eco.medium_impact_threshold >= eco.high_impact_threshold {
        errors.push(invalid(
            "economic_auditor.medium_impact_threshold",
            eco.medium_impact_threshold,
            "must be below high_impact_threshold",
        ));
    }
    if eco.currency_symbol.trim().is_empty() {
        errors.push(invalid(
            "economic_auditor.currency_symbol",
            "\"\"",
            "must not be empty",
        ));
    }

    // ── Academic analyst ─────────────────────────────────────────────
    let confidence = config.academic_analyst.confidence_level;
    if !(0.0..1.0).contains(&confidence) || confidence == 0.0 {
        errors.push(invalid(
            "academic_analyst.confidence_level",
            confidence,
            "must be strictly between 0.0 and 1.0",
        ));
    }

    // ── Orchestration rules ──────────────────────────────────────────
    for (index, rule) in config.orchestration_rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            errors.push(invalid(
                &format!("orchestration_rules[{index}].id"),
                "\"\"",
                "must not be empty",
            ));
        }
        if rule.action.task_template.trim().is_empty() {
            errors.push(invalid(
                &format!("orchestration_rules[{index}].action.task_template"),
                "\"\"",
                "must not be empty",
            ));
        }
        match &rule.trigger {
            Trigger::EconomicBoom {
                min_annual_savings: Some(threshold),
            } if *threshold < 0.0 => {
                errors.push(invalid(
                    &format!("orchestration_rules[{index}].min_annual_savings"),
                    threshold,
                    "must not be negative",
                ));
            }
            Trigger::ScientificBreakthrough {
                max_p_value: Some(cutoff),
            } if !(0.0..=1.0).contains(cutoff) => {
                errors.push(invalid(
                    &format!("orchestration_rules[{index}].max_p_value"),
                    cutoff,
                    "must be between 0.0 and 1.0",
                ));
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
