//! KPI selection and extraction.
//!
//! Every experiment optimizes a single scalar KPI. Extraction maps a raw
//! simulation payload into that scalar under a uniform "higher is better"
//! convention: maximization KPIs pass through, minimization KPIs are
//! inverted against an explicit per-KPI reference ceiling so downstream
//! comparisons never need to know the direction.

use crate::adapter::RawSimulationResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The scalar metric an experiment optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    /// Maximize the liquid (bio-oil) yield fraction, in %.
    BioOilYield,
    /// Maximize biochar purity, read as carbon-efficiency, in %.
    CharPurity,
    /// Minimize electrical demand, in kW. Inverted at extraction.
    EnergyDemand,
    /// Maximize the gas (syngas) yield fraction, in %.
    SyngasOutput,
}

impl Kpi {
    /// Whether this KPI is phrased as a minimization ("lower raw is better").
    pub fn is_minimization(self) -> bool {
        matches!(self, Kpi::EnergyDemand)
    }

    /// Short label for logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            Kpi::BioOilYield => "bio-oil yield",
            Kpi::CharPurity => "char purity",
            Kpi::EnergyDemand => "energy demand",
            Kpi::SyngasOutput => "syngas output",
        }
    }
}

impl std::fmt::Display for Kpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-KPI extraction parameters.
///
/// The only tunable today is the reference ceiling used to invert the
/// minimization KPI: `score = ceiling − raw_demand`. The ceiling is explicit
/// configuration rather than an inferred constant, and extraction warns when
/// a raw value exceeds it (the inverted score goes negative, which still
/// orders correctly but usually means the ceiling is set too low).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiConfig {
    /// Ceiling (kW) for inverting [`Kpi::EnergyDemand`] into a
    /// higher-is-better score.
    #[serde(default = "default_energy_ceiling_kw")]
    pub energy_reference_ceiling_kw: f64,
}

/// Default energy-inversion ceiling: 1000 kW.
fn default_energy_ceiling_kw() -> f64 {
    1000.0
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            energy_reference_ceiling_kw: default_energy_ceiling_kw(),
        }
    }
}

/// Extract the normalized KPI scalar from a raw simulation result.
///
/// Pure; higher is always better in the returned value.
pub fn extract_kpi(raw: &RawSimulationResult, kpi: Kpi, config: &KpiConfig) -> f64 {
    match kpi {
        Kpi::BioOilYield => raw.yield_fractions.liquid,
        Kpi::CharPurity => raw.figures.carbon_efficiency,
        Kpi::SyngasOutput => raw.yield_fractions.gas,
        Kpi::EnergyDemand => {
            let demand = raw.plant.electrical_demand_kw;
            let ceiling = config.energy_reference_ceiling_kw;
            if demand > ceiling {
                warn!(
                    demand_kw = demand,
                    ceiling_kw = ceiling,
                    "raw electrical demand exceeds the reference ceiling; \
                     inverted score will be negative"
                );
            }
            ceiling - demand
        }
    }
}
