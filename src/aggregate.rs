//! Per-unit results and the group partitioner.
//!
//! The aggregator is a pure partition of settled unit results by group,
//! stable in input (dispatch) order. Single ownership of a unit is
//! guaranteed upstream by the design's assignment table; the partitioner
//! warns on a duplicate id but keeps both entries.

use crate::adapter::RawSimulationResult;
use crate::design::GroupKey;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One settled simulation call: unit, group, extracted KPI, and the raw
/// payload retained for traceability. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnitExperimentResult {
    /// Unit (reactor) id.
    pub unit_id: String,
    /// Group the unit was assigned to.
    pub group: GroupKey,
    /// Name of the preset applied to the unit.
    pub preset_name: String,
    /// Normalized KPI scalar, higher = better.
    pub kpi_value: f64,
    /// Raw payload the KPI was extracted from.
    pub raw: RawSimulationResult,
}

/// Per-group partitions of an experiment run, read-only downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupedResults {
    /// Control group results, in dispatch order.
    pub group_a: Vec<UnitExperimentResult>,
    /// First test group results, in dispatch order.
    pub group_b: Vec<UnitExperimentResult>,
    /// Second test group results, in dispatch order.
    pub group_c: Vec<UnitExperimentResult>,
}

impl GroupedResults {
    /// Borrow one group's partition.
    pub fn group(&self, key: GroupKey) -> &[UnitExperimentResult] {
        match key {
            GroupKey::A => &self.group_a,
            GroupKey::B => &self.group_b,
            GroupKey::C => &self.group_c,
        }
    }

    /// Iterate all results in A → B → C order.
    pub fn all(&self) -> impl Iterator<Item = &UnitExperimentResult> {
        self.group_a
            .iter()
            .chain(self.group_b.iter())
            .chain(self.group_c.iter())
    }

    /// Total settled units across all groups.
    pub fn total_count(&self) -> usize {
        self.group_a.len() + self.group_b.len() + self.group_c.len()
    }

    /// Extracted KPI values of one group, in dispatch order.
    pub fn kpi_values(&self, key: GroupKey) -> Vec<f64> {
        self.group(key).iter().map(|r| r.kpi_value).collect()
    }
}

/// Partition settled results by group, preserving input order.
pub fn aggregate(results: Vec<UnitExperimentResult>) -> GroupedResults {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    let mut grouped = GroupedResults::default();

    for result in results {
        if !seen.insert(result.unit_id.clone()) {
            // Upstream single-ownership should make this impossible.
            warn!(unit_id = %result.unit_id, "duplicate unit id in aggregation input");
        }
        match result.group {
            GroupKey::A => grouped.group_a.push(result),
            GroupKey::B => grouped.group_b.push(result),
            GroupKey::C => grouped.group_c.push(result),
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{PlantFigures, ProcessFigures, SimulationSource, YieldFractions};

    fn unit_result(id: &str, group: GroupKey, kpi: f64) -> UnitExperimentResult {
        UnitExperimentResult {
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
                    electrical_demand_kw: kpi,
                    thermal_demand_kj_h: 5000.0,
                },
                source: SimulationSource::Adapter,
                notes: vec![],
            },
        }
    }

    #[test]
    fn test_aggregate_partitions_by_group() {
        let grouped = aggregate(vec![
            unit_result("R-01", GroupKey::A, 1.0),
            unit_result("R-02", GroupKey::B, 2.0),
            unit_result("R-03", GroupKey::C, 3.0),
            unit_result("R-04", GroupKey::B, 4.0),
        ]);
        assert_eq!(grouped.group_a.len(), 1);
        assert_eq!(grouped.group_b.len(), 2);
        assert_eq!(grouped.group_c.len(), 1);
        assert_eq!(grouped.total_count(), 4);
    }

    #[test]
    fn test_aggregate_preserves_input_order_within_groups() {
        let grouped = aggregate(vec![
            unit_result("R-03", GroupKey::B, 3.0),
            unit_result("R-01", GroupKey::B, 1.0),
            unit_result("R-02", GroupKey::B, 2.0),
        ]);
        let ids: Vec<&str> = grouped.group_b.iter().map(|r| r.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["R-03", "R-01", "R-02"]);
    }

    #[test]
    fn test_kpi_values_follow_dispatch_order() {
        let grouped = aggregate(vec![
            unit_result("R-01", GroupKey::A, 10.0),
            unit_result("R-02", GroupKey::A, 5.0),
        ]);
        assert_eq!(grouped.kpi_values(GroupKey::A), vec![10.0, 5.0]);
    }

    #[test]
    fn test_duplicate_unit_ids_are_kept_but_flagged() {
        // A duplicate is still aggregated; the warning is the signal.
        let grouped = aggregate(vec![
            unit_result("R-01", GroupKey::A, 1.0),
            unit_result("R-01", GroupKey::B, 2.0),
        ]);
        assert_eq!(grouped.total_count(), 2);
    }

    #[test]
    fn test_empty_input_gives_empty_groups() {
        let grouped = aggregate(vec![]);
        assert_eq!(grouped.total_count(), 0);
        assert!(grouped.all().next().is_none());
    }
}
