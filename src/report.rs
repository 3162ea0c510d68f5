//! The post-experiment report — the single unit of data handed to any
//! presentation layer.
//!
//! Created once per completed experiment, never mutated; re-running an
//! experiment produces a brand-new, independently addressable report.
//! Fully serializable so it can be reconstructed without re-running, and
//! degraded sections are explicitly `None` so a consumer can distinguish
//! "not computed" from "computed as zero".

use crate::academic::AcademicAnalysis;
use crate::aggregate::GroupedResults;
use crate::economics::EconomicAnalysis;
use crate::kpi::Kpi;
use crate::rules::TaskDescriptor;
use crate::stats::StatisticalAnalysis;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything a completed experiment produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PostExperimentReport {
    /// Unique report id.
    pub id: Uuid,
    /// Experiment name as configured by the caller.
    pub experiment_name: String,
    /// The KPI the experiment optimized.
    pub kpi: Kpi,
    /// Full three-group statistical verdict.
    pub statistics: StatisticalAnalysis,
    /// Economic section; `None` when fewer than 2 units ran or the auditor
    /// is disabled.
    pub economic: Option<EconomicAnalysis>,
    /// Academic section; `None` without a populated Control and Test arm or
    /// when the analyst is disabled.
    pub academic: Option<AcademicAnalysis>,
    /// Per-unit results, retained for traceability.
    pub results: GroupedResults,
    /// Follow-up task descriptors fired by the rule engine.
    pub triggered_tasks: Vec<TaskDescriptor>,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
}

impl PostExperimentReport {
    /// Render a short plain-text insight summary from the numeric fields.
    ///
    /// Deterministic over the report contents; used by CLI consumers. Chart
    /// and document rendering live outside this engine.
    pub fn insight_summary(&self) -> String {
        let stats = &self.statistics;
        let winner_mean = match stats.winner {
            crate::design::GroupKey::A => stats.group_a.mean,
            crate::design::GroupKey::B => stats.group_b.mean,
            crate::design::GroupKey::C => stats.group_c.mean,
        };
        let significance = if stats.significant {
            "differences between groups are statistically significant (approx. p < 0.05)"
        } else {
            "no sufficient evidence of significant differences between groups"
        };

        let mut lines = vec![
            format!(
                "Experiment '{}' optimizing {}: winner group {} (mean {:.2}).",
                self.experiment_name, self.kpi, stats.winner, winner_mean
            ),
            format!(
                "ANOVA: F={:.2}, approx. p={:.4}; {significance}.",
                stats.f_statistic, stats.p_value
            ),
        ];
        if let Some(economic) = &self.economic {
            lines.push(economic.verdict_text.clone());
        }
        if let Some(academic) = &self.academic {
            lines.push(academic.abstract_text.clone());
        }
        if !self.triggered_tasks.is_empty() {
            lines.push(format!(
                "{} follow-up task(s) triggered.",
                self.triggered_tasks.len()
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::design::GroupKey;
    use crate::stats::analyze;

    fn report() -> PostExperimentReport {
        use crate::adapter::{
            PlantFigures, ProcessFigures, RawSimulationResult, SimulationSource, YieldFractions,
        };
        use crate::aggregate::UnitExperimentResult;

        let make = |id: &str, group, kpi: f64| UnitExperimentResult {
            unit_id: id.to_string(),
            group,
            preset_name: "p".to_string(),
            kpi_value: kpi,
            raw: RawSimulationResult {
                yield_fractions: YieldFractions {
                    liquid: 40.0,
                    solid: 35.0,
                    gas: 25.0,
                },
                figures: ProcessFigures {
                    bio_oil_cost: 0.5,
                    carbon_efficiency: 85.0,
                    energy_efficiency: 75.0,
                    net_emissions: -20.0,
                },
                plant: PlantFigures {
                    electrical_demand_kw: 1000.0 - kpi,
                    thermal_demand_kj_h: 5000.0,
                },
                source: SimulationSource::Adapter,
                notes: vec![],
            },
        };

        let results = aggregate(vec![
            make("a1", GroupKey::A, 850.0),
            make("a2", GroupKey::A, 855.0),
            make("b1", GroupKey::B, 870.0),
            make("b2", GroupKey::B, 872.0),
        ]);
        let statistics = analyze(&results);

        PostExperimentReport {
            id: Uuid::new_v4(),
            experiment_name: "insulation trial".to_string(),
            kpi: Kpi::EnergyDemand,
            statistics,
            economic: None,
            academic: None,
            results,
            triggered_tasks: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_report_json_roundtrip_preserves_numeric_fields() {
        let report = report();
        let json = serde_json::to_string(&report).unwrap();
        let back: PostExperimentReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn test_absent_sections_serialize_as_null_not_zero() {
        let report = report();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("economic").is_some());
        assert!(value["economic"].is_null());
        assert!(value["academic"].is_null());
    }

    #[test]
    fn test_insight_summary_names_winner_and_significance() {
        let report = report();
        let summary = report.insight_summary();
        assert!(summary.contains("winner group B"));
        assert!(summary.contains("ANOVA"));
    }

    #[test]
    fn test_reports_are_independently_addressable() {
        assert_ne!(report().id, report().id);
    }
}
