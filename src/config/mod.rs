//! Engine configuration: parse, validate, and export schema.
//!
//! The whole engine is driven by one TOML document: economic rates and
//! thresholds, the academic confidence level, per-KPI extraction parameters,
//! simulation dispatch limits, and the orchestration rules. Configuration is
//! an explicitly passed struct threaded through constructors — never ambient
//! global state — so the engine stays testable and reentrant for multiple
//! concurrent experiments.
//!
//! Every field has either a required value or a documented default, and a
//! config is semantically validated before anything is simulated.

pub mod loader;
pub mod validation;

use crate::kpi::KpiConfig;
use crate::rules::OrchestrationRule;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Default value functions ──────────────────────────────────────────────

/// Default electricity rate: 0.12 per kWh.
fn default_electricity_rate() -> f64 {
    0.12
}

/// Default currency symbol.
fn default_currency_symbol() -> String {
    "USD".to_string()
}

/// Default industrial operating hours per year: 7920 (330 days × 24 h).
fn default_annual_hours() -> f64 {
    7920.0
}

/// Default annual-savings threshold for a high-impact verdict.
fn default_high_impact_threshold() -> f64 {
    10_000.0
}

/// Default annual-savings threshold for a medium-impact verdict.
fn default_medium_impact_threshold() -> f64 {
    1_000.0
}

/// Default academic confidence level: 0.95.
fn default_confidence_level() -> f64 {
    0.95
}

/// Default per-unit simulation timeout: 30 000 ms.
fn default_simulation_timeout_ms() -> u64 {
    30_000
}

/// Default bounded retries before falling back: 1.
fn default_retry_attempts() -> u32 {
    1
}

/// Default enabled state: true.
fn default_true() -> bool {
    true
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for the experiment engine.
///
/// Deserialized from a TOML file and validated before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// Simulation dispatch limits (timeout, retries).
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Per-KPI extraction parameters.
    #[serde(default)]
    pub kpi: KpiConfig,
    /// Economic Auditor parameters and verdict thresholds.
    #[serde(default)]
    pub economic_auditor: EconomicAuditorConfig,
    /// Academic Analyst parameters.
    #[serde(default)]
    pub academic_analyst: AcademicAnalystConfig,
    /// Threshold-based rules evaluated after every experiment.
    #[serde(default)]
    pub orchestration_rules: Vec<OrchestrationRule>,
}

/// Simulation dispatch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimulationConfig {
    /// Per-unit call deadline in milliseconds; expiry is treated exactly
    /// like an adapter failure (fallback substitution, never abort).
    #[serde(default = "default_simulation_timeout_ms")]
    pub timeout_ms: u64,
    /// Bounded retries per unit before the fallback substitution.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_simulation_timeout_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

/// Economic Auditor configuration.
///
/// Verdict thresholds are configuration, not hard-coded constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EconomicAuditorConfig {
    /// Whether the economic section is computed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Electricity rate, currency units per kWh.
    #[serde(default = "default_electricity_rate")]
    pub electricity_rate_kwh: f64,
    /// Currency symbol used in rendered verdict strings.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Annual operating hours used to project per-run savings.
    #[serde(default = "default_annual_hours")]
    pub annual_operating_hours: f64,
    /// Annual savings above this are a high-impact verdict.
    #[serde(default = "default_high_impact_threshold")]
    pub high_impact_threshold: f64,
    /// Annual savings above this (but below high) are medium impact.
    #[serde(default = "default_medium_impact_threshold")]
    pub medium_impact_threshold: f64,
}

impl Default for EconomicAuditorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            electricity_rate_kwh: default_electricity_rate(),
            currency_symbol: default_currency_symbol(),
            annual_operating_hours: default_annual_hours(),
            high_impact_threshold: default_high_impact_threshold(),
            medium_impact_threshold: default_medium_impact_threshold(),
        }
    }
}

/// Academic Analyst configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AcademicAnalystConfig {
    /// Whether the academic section is computed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Confidence level; the significance cutoff is `alpha = 1 − this`.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

impl AcademicAnalystConfig {
    /// Significance cutoff derived from the confidence level.
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }
}

impl Default for AcademicAnalystConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_level: default_confidence_level(),
        }
    }
}

/// Export the JSON Schema for [`EngineConfig`].
///
/// Enables IDE autocomplete when editing TOML config files.
///
/// # Errors
///
/// Returns `serde_json::Error` if schema serialization fails.
pub fn export_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(EngineConfig);
    serde_json::to_string_pretty(&schema)
}
