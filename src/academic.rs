//! Academic Analyst: pooled-variance two-sample t-test between the Control
//! arm and the best Test arm, plus a templated abstract.
//!
//! The p-value is a monotone step function of |t| — a coarse, table-free
//! approximation that is good enough for decision support and is labelled
//! approximate in every rendered string. The abstract is pure string
//! formatting over the numeric fields, so tests assert on structure rather
//! than exact wording.

use crate::config::AcademicAnalystConfig;
use crate::economics::UnitEnergy;
use crate::stats::{mean, std_dev};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named sample arm (group label + raw energy values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupSamples {
    /// Arm label, usually the preset name.
    pub name: String,
    /// Raw per-unit energy values, kWh.
    pub data: Vec<f64>,
}

/// Control/Test pairing extracted from flat unit results.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonArms {
    /// Control arm (group A).
    pub control: GroupSamples,
    /// Best non-empty test arm (B or C, lower mean energy preferred).
    pub test: GroupSamples,
}

/// Descriptive summary of one arm, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArmStatistics {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    /// Rendered "Mean: x (±s)" label for reports.
    pub label: String,
}

/// Complete two-arm comparison result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AcademicAnalysis {
    /// The hypothesis under test, in plain language.
    pub hypothesis: String,
    /// Control arm summary.
    pub control_stats: ArmStatistics,
    /// Test arm summary.
    pub test_stats: ArmStatistics,
    /// Mean difference (control − test), rounded to 2 decimals.
    pub delta: f64,
    /// Pooled-variance t-statistic, rounded to 4 decimals.
    pub t_statistic: f64,
    /// Approximate p-value (step table), rounded to 4 decimals.
    pub p_value: f64,
    /// `p_value < alpha`.
    pub significant: bool,
    /// Templated abstract paragraph, reproducible from the numeric fields.
    pub abstract_text: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Monotone step approximation of the two-sided t-test p-value.
///
/// Thresholds: |t| > 12.7 → 0.0001, > 6.0 → 0.005, > 4.3 → 0.01,
/// > 2.8 → 0.02, > 2.0 → 0.05, > 1.5 → 0.15, else 0.30. The degrees of
/// freedom are accepted for signature compatibility with an exact CDF but
/// do not shift the steps — another documented corner of the approximation.
pub fn approximate_p_value(t_abs: f64, _df: usize) -> f64 {
    if t_abs > 12.7 {
        0.0001
    } else if t_abs > 6.0 {
        0.005
    } else if t_abs > 4.3 {
        0.01
    } else if t_abs > 2.8 {
        0.02
    } else if t_abs > 2.0 {
        0.05
    } else if t_abs > 1.5 {
        0.15
    } else {
        0.30
    }
}

/// The analyst; alpha comes from the configured confidence level.
pub struct AcademicAnalyst {
    alpha: f64,
}

impl AcademicAnalyst {
    /// Build an analyst from configuration.
    pub fn new(config: &AcademicAnalystConfig) -> Self {
        Self {
            alpha: config.alpha(),
        }
    }

    /// Compare Control against a Test arm with an independent two-sample
    /// t-test (pooled variance, df = n1 + n2 − 2).
    ///
    /// Degenerate inputs (an empty arm, zero pooled variance, df ≤ 0)
    /// degrade to t = 0, p = 1 — "no significance", never an error.
    pub fn analyze_experiment(
        &self,
        control: &GroupSamples,
        test: &GroupSamples,
    ) -> AcademicAnalysis {
        let mean_control = mean(&control.data);
        let std_control = std_dev(&control.data, mean_control);
        let mean_test = mean(&test.data);
        let std_test = std_dev(&test.data, mean_test);

        let n1 = control.data.len();
        let n2 = test.data.len();

        let (t_stat, p_value) = if n1 + n2 < 3 || n1 == 0 || n2 == 0 {
            (0.0, 1.0)
        } else {
            let df = n1 + n2 - 2;
            let pooled_variance = ((n1 - 1) as f64 * std_control.powi(2)
                + (n2 - 1) as f64 * std_test.powi(2))
                / df as f64;
            let pooled_std = pooled_variance.sqrt();
            let scale = pooled_std * (1.0 / n1 as f64 + 1.0 / n2 as f64).sqrt();
            if scale > 0.0 {
                let t = (mean_control - mean_test) / scale;
                (t, approximate_p_value(t.abs(), df))
            } else {
                // Identical constant arms: no evidence either way.
                (0.0, 1.0)
            }
        };

        let significant = p_value < self.alpha;
        let delta = mean_control - mean_test;

        AcademicAnalysis {
            hypothesis: format!(
                "'{}' consumes less energy than '{}'",
                control.name, test.name
            ),
            control_stats: arm_statistics(mean_control, std_control),
            test_stats: arm_statistics(mean_test, std_test),
            delta: round2(delta),
            t_statistic: round4(t_stat),
            p_value: round4(p_value),
            significant,
            abstract_text: draft_abstract(&control.name, &test.name, delta, p_value, significant),
        }
    }
}

fn arm_statistics(mean: f64, std: f64) -> ArmStatistics {
    ArmStatistics {
        mean: round2(mean),
        std: round2(std),
        label: format!("Mean: {mean:.2} (±{std:.2})"),
    }
}

/// Draft the templated abstract paragraph.
///
/// Deterministic over the numeric inputs; the p-value is explicitly labelled
/// approximate.
fn draft_abstract(
    control_name: &str,
    test_name: &str,
    delta: f64,
    p_value: f64,
    significant: bool,
) -> String {
    let significance_text = if significant {
        "statistically significant"
    } else {
        "inconclusive"
    };
    format!(
        "A {significance_text} difference (approx. p={p_value:.4}) was observed in energy \
         consumption. Protocol '{control_name}' showed a mean shift of {:.2} units relative \
         to '{test_name}'. These results suggest the thermal configuration of the better \
         performing arm is effective at mitigating energy losses.",
        delta.abs()
    )
}

/// Partition flat unit results into Control/Test arms keyed by group letter.
///
/// Control is group A. The test arm is the better (lower mean energy)
/// non-empty of B and C. Returns `None` when Control or both Test arms are
/// empty — decision support is meaningless with an empty comparison arm.
pub fn create_groups(results: &[UnitEnergy]) -> Option<ComparisonArms> {
    use crate::design::GroupKey;

    let arm = |key: GroupKey| -> GroupSamples {
        let data: Vec<f64> = results
            .iter()
            .filter(|r| r.group == key)
            .map(|r| r.energy_kwh)
            .collect();
        let name = results
            .iter()
            .find(|r| r.group == key)
            .map(|r| r.preset_name.clone())
            .unwrap_or_else(|| format!("Group {key}"));
        GroupSamples { name, data }
    };

    let control = arm(GroupKey::A);
    let arm_b = arm(GroupKey::B);
    let arm_c = arm(GroupKey::C);

    if control.data.is_empty() || (arm_b.data.is_empty() && arm_c.data.is_empty()) {
        warn!("academic analyst needs a non-empty control arm and at least one test arm");
        return None;
    }

    let test = match (arm_b.data.is_empty(), arm_c.data.is_empty()) {
        (false, true) => arm_b,
        (true, false) => arm_c,
        _ => {
            // Both present: prefer the arm performing better on raw energy.
            if mean(&arm_b.data) <= mean(&arm_c.data) {
                arm_b
            } else {
                arm_c
            }
        }
    };

    Some(ComparisonArms { control, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::GroupKey;

    fn analyst() -> AcademicAnalyst {
        AcademicAnalyst::new(&AcademicAnalystConfig::default())
    }

    fn samples(name: &str, data: &[f64]) -> GroupSamples {
        GroupSamples {
            name: name.to_string(),
            data: data.to_vec(),
        }
    }

    fn unit(id: &str, group: GroupKey, energy: f64) -> UnitEnergy {
        UnitEnergy {
            id: id.to_string(),
            energy_kwh: energy,
            group,
            preset_name: format!("preset-{group}"),
        }
    }

    #[test]
    fn test_identical_arms_are_never_significant() {
        let analysis = analyst().analyze_experiment(
            &samples("control", &[10.0, 11.0, 12.0]),
            &samples("test", &[10.0, 11.0, 12.0]),
        );
        assert_eq!(analysis.t_statistic, 0.0);
        assert!(analysis.p_value >= 0.25);
        assert!(!analysis.significant);
    }

    #[test]
    fn test_identical_constant_arms_degrade_gracefully() {
        let analysis = analyst().analyze_experiment(
            &samples("control", &[5.0, 5.0, 5.0]),
            &samples("test", &[5.0, 5.0, 5.0]),
        );
        assert_eq!(analysis.t_statistic, 0.0);
        assert_eq!(analysis.p_value, 1.0);
        assert!(!analysis.significant);
    }

    #[test]
    fn test_separated_arms_are_significant() {
        let analysis = analyst().analyze_experiment(
            &samples("control", &[100.0, 101.0, 99.0, 100.5]),
            &samples("test", &[80.0, 81.0, 79.0, 80.5]),
        );
        assert!(analysis.t_statistic > 12.7);
        assert!(analysis.p_value <= 0.0001);
        assert!(analysis.significant);
    }

    #[test]
    fn test_t_statistic_worked_example() {
        // control [10, 12], test [20, 22]: pooled std = sqrt(2), scale = sqrt(2)·1,
        // t = (11 − 21) / 1.4142… ≈ −7.0711.
        let analysis = analyst()
            .analyze_experiment(&samples("c", &[10.0, 12.0]), &samples("t", &[20.0, 22.0]));
        assert!((analysis.t_statistic + 7.0711).abs() < 1e-4);
        assert_eq!(analysis.p_value, 0.005);
    }

    #[test]
    fn test_p_value_steps_are_monotone() {
        let ts = [0.5, 1.6, 2.1, 3.0, 4.5, 7.0, 13.0];
        let ps: Vec<f64> = ts.iter().map(|t| approximate_p_value(*t, 10)).collect();
        for pair in ps.windows(2) {
            assert!(pair[0] >= pair[1], "p must not increase with |t|");
        }
        assert_eq!(ps[0], 0.30);
        assert_eq!(ps[6], 0.0001);
    }

    #[test]
    fn test_degenerate_single_sample_arms() {
        let analysis = analyst()
            .analyze_experiment(&samples("c", &[10.0]), &samples("t", &[20.0]));
        assert_eq!(analysis.t_statistic, 0.0);
        assert_eq!(analysis.p_value, 1.0);
        assert!(!analysis.significant);
    }

    #[test]
    fn test_abstract_contains_group_names_and_p() {
        let analysis = analyst().analyze_experiment(
            &samples("fast-pyro", &[10.0, 12.0]),
            &samples("slow-pyro", &[20.0, 22.0]),
        );
        assert!(analysis.abstract_text.contains("fast-pyro"));
        assert!(analysis.abstract_text.contains("slow-pyro"));
        assert!(analysis.abstract_text.contains("approx. p="));
    }

    #[test]
    fn test_create_groups_requires_control_and_one_test_arm() {
        // Only control: no comparison.
        assert!(create_groups(&[unit("a1", GroupKey::A, 10.0)]).is_none());
        // Only tests: no control.
        assert!(create_groups(&[unit("b1", GroupKey::B, 10.0)]).is_none());
        // Control + one test arm works.
        let arms = create_groups(&[
            unit("a1", GroupKey::A, 10.0),
            unit("c1", GroupKey::C, 12.0),
        ])
        .unwrap();
        assert_eq!(arms.test.data, vec![12.0]);
    }

    #[test]
    fn test_create_groups_picks_better_test_arm() {
        let arms = create_groups(&[
            unit("a1", GroupKey::A, 100.0),
            unit("b1", GroupKey::B, 90.0),
            unit("c1", GroupKey::C, 70.0),
        ])
        .unwrap();
        // C has the lower mean energy → chosen as the test arm.
        assert_eq!(arms.test.data, vec![70.0]);
        assert_eq!(arms.test.name, "preset-C");
    }

    #[test]
    fn test_create_groups_uses_preset_name_for_labels() {
        let arms = create_groups(&[
            unit("a1", GroupKey::A, 10.0),
            unit("b1", GroupKey::B, 12.0),
        ])
        .unwrap();
        assert_eq!(arms.control.name, "preset-A");
        assert_eq!(arms.test.name, "preset-B");
    }

    #[test]
    fn test_analysis_serde_roundtrip() {
        let analysis = analyst()
            .analyze_experiment(&samples("c", &[10.0, 12.0]), &samples("t", &[20.0, 22.0]));
        let json = serde_json::to_string(&analysis).unwrap();
        let back: AcademicAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(analysis, back);
    }
}
