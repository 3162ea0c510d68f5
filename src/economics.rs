//! Economic Auditor: what the efficiency gap between the best and worst
//! unit is worth.
//!
//! Works directly on raw electrical energy (kWh per run) rather than the
//! direction-normalized KPI, so "lower is better" always holds here. The
//! annual projection extrapolates each simulated run as one operating hour —
//! a modelling assumption for standardized comparison, not a guaranteed
//! real-world mapping.

use crate::config::EconomicAuditorConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A unit's raw energy reading, fed into the auditor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnitEnergy {
    /// Unit id.
    pub id: String,
    /// Electrical energy of one run, kWh.
    pub energy_kwh: f64,
    /// Group the unit ran in.
    pub group: crate::design::GroupKey,
    /// Preset applied to the unit.
    pub preset_name: String,
}

/// One side of the winner/loser comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnitCost {
    /// Unit id.
    pub id: String,
    /// Electricity cost of one run, rounded to 2 decimals.
    pub cost_per_run: f64,
}

/// Impact classification of the projected annual savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EconomicVerdict {
    /// Savings justify immediate investment.
    High,
    /// Meaningful operational improvement.
    Medium,
    /// Marginal optimization.
    Low,
}

/// Full economic comparison between the best and worst performing unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EconomicAnalysis {
    /// "winner vs loser" identifier.
    pub comparison_id: String,
    /// Most efficient unit.
    pub winner: UnitCost,
    /// Least efficient unit.
    pub loser: UnitCost,
    /// Money saved per run by running the winner instead of the loser.
    pub savings_per_run: f64,
    /// Energy saved relative to the loser, %.
    pub efficiency_gain_percent: f64,
    /// Per-run savings × annual operating hours.
    pub annual_projected_savings: f64,
    /// Classification of the annual savings.
    pub verdict: EconomicVerdict,
    /// Rendered impact phrase for reports.
    pub verdict_text: String,
}

/// Round to 2 decimal places, the fixed rounding for currency figures.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The auditor itself; construction threads the configuration through
/// explicitly so multiple auditors with different rates can coexist.
pub struct EconomicAuditor {
    config: EconomicAuditorConfig,
}

impl EconomicAuditor {
    /// Build an auditor from configuration.
    pub fn new(config: &EconomicAuditorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Direct electricity cost of a single run, rounded to 2 decimals.
    pub fn run_cost(&self, energy_kwh: f64) -> f64 {
        round2(energy_kwh * self.config.electricity_rate_kwh)
    }

    /// Find the most and least efficient units by raw energy.
    ///
    /// Needs at least two results; otherwise there is nothing to compare and
    /// `None` is returned (the economic section is then omitted).
    pub fn find_winner_and_loser<'a>(
        &self,
        results: &'a [UnitEnergy],
    ) -> Option<(&'a UnitEnergy, &'a UnitEnergy)> {
        if results.len() < 2 {
            warn!(
                count = results.len(),
                "economic auditor needs at least 2 units to compare"
            );
            return None;
        }

        let mut sorted: Vec<&UnitEnergy> = results.iter().collect();
        // Lower energy is better for this comparison.
        sorted.sort_by(|a, b| {
            a.energy_kwh
                .partial_cmp(&b.energy_kwh)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match (sorted.first(), sorted.last()) {
            (Some(winner), Some(loser)) => Some((winner, loser)),
            _ => None,
        }
    }

    /// Compare winner and loser: per-run delta, efficiency gain, and the
    /// annual projection (one run ≙ one operating hour).
    pub fn analyze_efficiency_gap(
        &self,
        winner: &UnitEnergy,
        loser: &UnitEnergy,
    ) -> EconomicAnalysis {
        let cost_winner = self.run_cost(winner.energy_kwh);
        let cost_loser = self.run_cost(loser.energy_kwh);

        let energy_saved = loser.energy_kwh - winner.energy_kwh;
        let money_saved_per_run = cost_loser - cost_winner;
        let efficiency_gain = if loser.energy_kwh != 0.0 {
            energy_saved / loser.energy_kwh * 100.0
        } else {
            0.0
        };
        let annual_savings = money_saved_per_run * self.config.annual_operating_hours;

        let verdict = self.classify(annual_savings);

        EconomicAnalysis {
            comparison_id: format!("{} vs {}", winner.id, loser.id),
            winner: UnitCost {
                id: winner.id.clone(),
                cost_per_run: cost_winner,
            },
            loser: UnitCost {
                id: loser.id.clone(),
                cost_per_run: cost_loser,
            },
            savings_per_run: round2(money_saved_per_run),
            efficiency_gain_percent: round2(efficiency_gain),
            annual_projected_savings: round2(annual_savings),
            verdict,
            verdict_text: self.render_verdict(verdict, annual_savings),
        }
    }

    /// Full pass: pick extremes, analyze the gap. `None` with <2 units.
    pub fn audit(&self, results: &[UnitEnergy]) -> Option<EconomicAnalysis> {
        let (winner, loser) = self.find_winner_and_loser(results)?;
        Some(self.analyze_efficiency_gap(winner, loser))
    }

    fn classify(&self, annual_savings: f64) -> EconomicVerdict {
        if annual_savings > self.config.high_impact_threshold {
            EconomicVerdict::High
        } else if annual_savings > self.config.medium_impact_threshold {
            EconomicVerdict::Medium
        } else {
            EconomicVerdict::Low
        }
    }

    fn render_verdict(&self, verdict: EconomicVerdict, annual_savings: f64) -> String {
        let symbol = &self.config.currency_symbol;
        match verdict {
            EconomicVerdict::High => format!(
                "HIGH IMPACT: projected {symbol} {:.2}/year justifies immediate investment.",
                annual_savings
            ),
            EconomicVerdict::Medium => format!(
                "MEDIUM IMPACT: {symbol} {:.2}/year is a meaningful operational improvement.",
                annual_savings
            ),
            EconomicVerdict::Low => format!(
                "LOW IMPACT: {symbol} {:.2}/year is a marginal optimization.",
                annual_savings
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::GroupKey;

    fn unit(id: &str, energy: f64) -> UnitEnergy {
        UnitEnergy {
            id: id.to_string(),
            energy_kwh: energy,
            group: GroupKey::A,
            preset_name: "p".to_string(),
        }
    }

    fn auditor() -> EconomicAuditor {
        EconomicAuditor::new(&EconomicAuditorConfig::default())
    }

    #[test]
    fn test_run_cost_at_default_rate() {
        assert_eq!(auditor().run_cost(10.0), 1.2);
        assert_eq!(auditor().run_cost(20.0), 2.4);
    }

    #[test]
    fn test_run_cost_rounds_to_two_decimals() {
        // 7.77 kWh × 0.12 = 0.9324 → 0.93
        assert_eq!(auditor().run_cost(7.77), 0.93);
    }

    #[test]
    fn test_find_winner_and_loser_extremes() {
        let results = vec![unit("mid", 15.0), unit("best", 10.0), unit("worst", 20.0)];
        let (winner, loser) = auditor().find_winner_and_loser(&results).unwrap();
        assert_eq!(winner.id, "best");
        assert_eq!(loser.id, "worst");
    }

    #[test]
    fn test_fewer_than_two_units_yields_none() {
        assert!(auditor().find_winner_and_loser(&[unit("only", 10.0)]).is_none());
        assert!(auditor().audit(&[]).is_none());
    }

    #[test]
    fn test_worked_example_from_the_gap_analysis() {
        // winner 10 kWh, loser 20 kWh at 0.12/kWh, 7920 h/year:
        // savings/run 1.20, gain 50 %, annual 9504 → Medium.
        let analysis = auditor().analyze_efficiency_gap(&unit("W", 10.0), &unit("L", 20.0));
        assert_eq!(analysis.savings_per_run, 1.20);
        assert_eq!(analysis.efficiency_gain_percent, 50.0);
        assert_eq!(analysis.annual_projected_savings, 9504.0);
        assert_eq!(analysis.verdict, EconomicVerdict::Medium);
        assert_eq!(analysis.comparison_id, "W vs L");
    }

    #[test]
    fn test_high_verdict_above_configured_threshold() {
        // 10 vs 40 kWh: 3.60/run × 7920 = 28512 → High.
        let analysis = auditor().analyze_efficiency_gap(&unit("W", 10.0), &unit("L", 40.0));
        assert_eq!(analysis.verdict, EconomicVerdict::High);
        assert!(analysis.verdict_text.contains("HIGH IMPACT"));
        assert!(analysis.verdict_text.contains("USD"));
    }

    #[test]
    fn test_low_verdict_for_marginal_gap() {
        // 10.0 vs 10.5 kWh: 0.06/run × 7920 = 475.2 → Low.
        let analysis = auditor().analyze_efficiency_gap(&unit("W", 10.0), &unit("L", 10.5));
        assert_eq!(analysis.verdict, EconomicVerdict::Low);
    }

    #[test]
    fn test_thresholds_come_from_configuration() {
        let config = EconomicAuditorConfig {
            high_impact_threshold: 5_000.0,
            ..EconomicAuditorConfig::default()
        };
        let analysis = EconomicAuditor::new(&config)
            .analyze_efficiency_gap(&unit("W", 10.0), &unit("L", 20.0));
        // 9504 > 5000 under the custom threshold.
        assert_eq!(analysis.verdict, EconomicVerdict::High);
    }

    #[test]
    fn test_analysis_serde_roundtrip() {
        let analysis = auditor().analyze_efficiency_gap(&unit("W", 10.0), &unit("L", 20.0));
        let json = serde_json::to_string(&analysis).unwrap();
        let back: EconomicAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(analysis, back);
    }
}
