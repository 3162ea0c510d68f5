//! Simulation adapter boundary and implementations.
//!
//! The engine never models reactor physics itself. It calls an external
//! collaborator behind [`SimulationAdapter`] — a deterministic model, an
//! external generative estimator, or a stub — and must tolerate its failure:
//! a failing or timed-out call is substituted with a clearly tagged
//! [`fallback_result`] drawn from a documented plausible range, so a single
//! bad simulation never aborts a multi-unit experiment.

use crate::{design::Preset, kpi::Kpi, EngineError};
use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Product split of one simulated run, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YieldFractions {
    /// Liquid (bio-oil) fraction, %.
    pub liquid: f64,
    /// Solid (biochar) fraction, %.
    pub solid: f64,
    /// Gas (syngas) fraction, %.
    pub gas: f64,
}

/// Derived process figures of one simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessFigures {
    /// Production cost of bio-oil, currency units per litre.
    pub bio_oil_cost: f64,
    /// Carbon efficiency, %.
    pub carbon_efficiency: f64,
    /// Energy efficiency, %.
    pub energy_efficiency: f64,
    /// Net emissions, kg CO₂-eq per run (negative = net sink).
    pub net_emissions: f64,
}

/// Plant-level demand figures of one simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlantFigures {
    /// Electrical demand, kW.
    pub electrical_demand_kw: f64,
    /// Thermal demand, kJ/h.
    pub thermal_demand_kj_h: f64,
}

/// Where a result came from — the adapter, or the engine's own fallback
/// substitution after an adapter failure. Reports keep the tag so a consumer
/// can distinguish measured-ish data from synthetic filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SimulationSource {
    /// Produced by the external simulation adapter.
    Adapter,
    /// Synthesized locally after the adapter failed or timed out.
    Fallback,
}

/// Opaque-ish payload returned per unit simulation call.
///
/// Created per call, consumed by KPI extraction, and retained in the final
/// report for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawSimulationResult {
    /// Product split of the run.
    pub yield_fractions: YieldFractions,
    /// Derived efficiency/cost figures.
    pub figures: ProcessFigures,
    /// Plant-level demand figures.
    pub plant: PlantFigures,
    /// Provenance tag.
    pub source: SimulationSource,
    /// Free-form notes attached by the adapter (or the fallback generator).
    #[serde(default)]
    pub notes: Vec<String>,
}

/// External simulation collaborator.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across tasks;
/// the trait is object-safe so the runner holds an `Arc<dyn SimulationAdapter>`.
/// A call **may fail or hang** — the runner wraps every call in a timeout and
/// substitutes [`fallback_result`] on failure, so implementors should report
/// errors honestly rather than papering over them.
#[async_trait]
pub trait SimulationAdapter: Send + Sync {
    /// Simulate one unit under the given preset, optimizing for `kpi`.
    async fn simulate(
        &self,
        unit_id: &str,
        preset: &Preset,
        kpi: Kpi,
    ) -> Result<RawSimulationResult, EngineError>;
}

/// Synthesize a plausible substitute result after an adapter failure.
///
/// Ranges (uniform) mirror a mid-range mixed-biomass pyrolysis run:
/// liquid 40–50 %, solid 25–35 %, gas 20–30 %; bio-oil cost 0.40–0.70;
/// carbon efficiency 80–95 %; energy efficiency 70–85 %; net emissions
/// −25…−15; electrical demand 120–200 kW. The result is tagged
/// [`SimulationSource::Fallback`] and notes the unit it stands in for.
pub fn fallback_result<R: Rng + ?Sized>(rng: &mut R, unit_id: &str) -> RawSimulationResult {
    RawSimulationResult {
        yield_fractions: YieldFractions {
            liquid: rng.gen_range(40.0..50.0),
            solid: rng.gen_range(25.0..35.0),
            gas: rng.gen_range(20.0..30.0),
        },
        figures: ProcessFigures {
            bio_oil_cost: rng.gen_range(0.4..0.7),
            carbon_efficiency: rng.gen_range(80.0..95.0),
            energy_efficiency: rng.gen_range(70.0..85.0),
            net_emissions: rng.gen_range(-25.0..-15.0),
        },
        plant: PlantFigures {
            electrical_demand_kw: rng.gen_range(120.0..200.0),
            thermal_demand_kj_h: 5000.0,
        },
        source: SimulationSource::Fallback,
        notes: vec![format!("fallback substitution for unit {unit_id}")],
    }
}

// ============================================================================
// Deterministic adapter (reference / testing)
// ============================================================================

/// Deterministic reference adapter for demos and tests.
///
/// Derives all figures from a hash of `(unit_id, preset.name)` so repeated
/// runs reproduce identical numbers without any external model. Responds
/// after a configurable delay to exercise the runner's concurrency path.
pub struct DeterministicAdapter {
    /// Simulated inference delay per call.
    pub delay: Duration,
}

impl DeterministicAdapter {
    /// Adapter with a small default delay (10 ms).
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(10),
        }
    }

    /// Adapter with an explicit delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn seed(unit_id: &str, preset: &Preset) -> u64 {
        let mut hasher = DefaultHasher::new();
        unit_id.hash(&mut hasher);
        preset.name.hash(&mut hasher);
        hasher.finish()
    }

    /// Map a hash into `[lo, hi)` deterministically.
    fn span(seed: u64, salt: u64, lo: f64, hi: f64) -> f64 {
        let mut hasher = DefaultHasher::new();
        (seed ^ salt).hash(&mut hasher);
        let unit = (hasher.finish() % 10_000) as f64 / 10_000.0;
        lo + unit * (hi - lo)
    }
}

impl Default for DeterministicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationAdapter for DeterministicAdapter {
    async fn simulate(
        &self,
        unit_id: &str,
        preset: &Preset,
        _kpi: Kpi,
    ) -> Result<RawSimulationResult, EngineError> {
        tokio::time::sleep(self.delay).await;

        let seed = Self::seed(unit_id, preset);
        // Hotter presets lean toward gas, cooler toward liquid; the spread
        // per unit comes from the hash so groups still show variance.
        let heat = ((preset.target_temp_c - 400.0) / 400.0).clamp(0.0, 1.0);
        let liquid = Self::span(seed, 1, 38.0, 52.0) - heat * 6.0;
        let gas = Self::span(seed, 2, 18.0, 28.0) + heat * 6.0;

        Ok(RawSimulationResult {
            yield_fractions: YieldFractions {
                liquid,
                solid: (100.0 - liquid - gas).max(0.0),
                gas,
            },
            figures: ProcessFigures {
                bio_oil_cost: Self::span(seed, 3, 0.35, 0.75),
                carbon_efficiency: Self::span(seed, 4, 78.0, 96.0),
                energy_efficiency: Self::span(seed, 5, 68.0, 88.0),
                net_emissions: Self::span(seed, 6, -28.0, -12.0),
            },
            plant: PlantFigures {
                electrical_demand_kw: Self::span(seed, 7, 110.0, 210.0) + heat * 40.0,
                thermal_demand_kj_h: Self::span(seed, 8, 4200.0, 6200.0),
            },
            source: SimulationSource::Adapter,
            notes: vec![format!("unit {unit_id} under preset {}", preset.name)],
        })
    }
}
