//! Descriptive and inferential statistics for three-group experiments.
//!
//! Inference here is deliberately table-based: Student-t critical values and
//! F-critical values come from finite lookup tables, and p-values are
//! bucketed into a small set of discrete bands rather than computed from a
//! continuous CDF. That is a documented accuracy/complexity tradeoff — the
//! engine needs a directionally correct, cheaply computable significance
//! signal, not publication-grade inference. Swapping in an exact CDF behind
//! the same function signatures is the intended upgrade path.

use crate::aggregate::GroupedResults;
use crate::design::GroupKey;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (Bessel-corrected, n−1 denominator).
///
/// Returns 0 for n ≤ 1, where the sample deviation is undefined.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Student-t critical values for a 95 % two-sided interval, keyed by
/// degrees of freedom. Between table keys the nearest lower entry is used
/// (conservative: wider interval); beyond 120 df the normal approximation
/// 1.96 applies.
const T_CRITICAL_95: [(usize, f64); 15] = [
    (1, 12.706),
    (2, 4.303),
    (3, 3.182),
    (4, 2.776),
    (5, 2.571),
    (6, 2.447),
    (7, 2.365),
    (8, 2.306),
    (9, 2.262),
    (10, 2.228),
    (15, 2.131),
    (20, 2.086),
    (30, 2.042),
    (60, 2.000),
    (120, 1.980),
];

/// Look up the 95 % two-sided t-critical value for `df` degrees of freedom.
fn t_critical_95(df: usize) -> f64 {
    if df > 120 {
        return 1.96;
    }
    let mut critical = 12.706;
    for (key, value) in T_CRITICAL_95 {
        if key <= df {
            critical = value;
        } else {
            break;
        }
    }
    critical
}

/// 95 % confidence interval around `mean`, via the t-table above.
///
/// For n ≤ 1 the interval degenerates to `[mean, mean]`.
pub fn confidence_interval_95(mean: f64, std_dev: f64, n: usize) -> [f64; 2] {
    if n <= 1 {
        return [mean, mean];
    }
    let standard_error = std_dev / (n as f64).sqrt();
    let margin = t_critical_95(n - 1) * standard_error;
    [mean - margin, mean + margin]
}

/// F-critical values for df1 = 2 at α = 0.05, keyed by df2 (within-group df).
/// The nearest key ≥ df2 is used; past the table, 3.0 is the floor.
const F_CRITICAL_05: [(usize, f64); 13] = [
    (3, 9.55),
    (4, 6.94),
    (5, 5.79),
    (6, 5.14),
    (7, 4.74),
    (8, 4.46),
    (9, 4.26),
    (10, 4.10),
    (15, 3.68),
    (20, 3.49),
    (30, 3.32),
    (60, 3.15),
    (120, 3.07),
];

/// F-critical values for df1 = 2 at α = 0.01, same keying as above with a
/// floor of 5.0 past the table.
const F_CRITICAL_01: [(usize, f64); 13] = [
    (3, 30.82),
    (4, 18.00),
    (5, 13.27),
    (6, 10.92),
    (7, 9.55),
    (8, 8.65),
    (9, 8.02),
    (10, 7.56),
    (15, 6.36),
    (20, 5.85),
    (30, 5.39),
    (60, 4.98),
    (120, 4.79),
];

/// Bucket an F-statistic into a discrete p-value band against the critical
/// tables: ≥ F₀.₀₁ → 0.001, ≥ F₀.₀₅ → 0.025, ≥ 0.7·F₀.₀₅ → 0.075,
/// else 0.25. Approximate by design.
fn approximate_f_p_value(f_stat: f64, df_within: usize) -> f64 {
    let mut critical_05 = 3.0;
    let mut critical_01 = 5.0;
    for i in 0..F_CRITICAL_05.len() {
        if F_CRITICAL_05[i].0 >= df_within {
            critical_05 = F_CRITICAL_05[i].1;
            critical_01 = F_CRITICAL_01[i].1;
            break;
        }
    }

    if f_stat >= critical_01 {
        0.001
    } else if f_stat >= critical_05 {
        0.025
    } else if f_stat >= critical_05 * 0.7 {
        0.075
    } else {
        0.25
    }
}

/// Outcome of a one-way ANOVA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnovaOutcome {
    /// F-statistic = (SSB/dfB) / (SSW/dfW).
    pub f_statistic: f64,
    /// Bucketed approximate p-value.
    pub p_value: f64,
}

/// One-way ANOVA across three groups.
///
/// Between-group sum of squares weights each group mean's squared deviation
/// from the grand mean by group size; within-group sum of squares sums the
/// squared deviations from each group's own mean. dfBetween = 2,
/// dfWithin = N − 3. A degenerate test (dfWithin ≤ 0) returns F = 0, p = 1 —
/// "no significance", never an error.
pub fn one_way_anova(group_a: &[f64], group_b: &[f64], group_c: &[f64]) -> AnovaOutcome {
    let n_a = group_a.len();
    let n_b = group_b.len();
    let n_c = group_c.len();
    let n_total = n_a + n_b + n_c;

    if n_total < 3 {
        return AnovaOutcome {
            f_statistic: 0.0,
            p_value: 1.0,
        };
    }

    let mean_a = mean(group_a);
    let mean_b = mean(group_b);
    let mean_c = mean(group_c);

    let grand_sum: f64 = group_a.iter().chain(group_b).chain(group_c).sum();
    let grand_mean = grand_sum / n_total as f64;

    let ss_between = n_a as f64 * (mean_a - grand_mean).powi(2)
        + n_b as f64 * (mean_b - grand_mean).powi(2)
        + n_c as f64 * (mean_c - grand_mean).powi(2);

    let within = |values: &[f64], m: f64| values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    let ss_within = within(group_a, mean_a) + within(group_b, mean_b) + within(group_c, mean_c);

    let df_between = 2.0;
    let df_within = n_total as isize - 3;
    if df_within <= 0 {
        return AnovaOutcome {
            f_statistic: 0.0,
            p_value: 1.0,
        };
    }

    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within as f64;

    let f_statistic = if ms_within > 0.0 {
        ms_between / ms_within
    } else {
        0.0
    };

    AnovaOutcome {
        f_statistic,
        p_value: approximate_f_p_value(f_statistic, df_within as usize),
    }
}

/// Pick the group with the highest mean.
///
/// Ties resolve in favour of A, then B, then C — arbitrary but deterministic,
/// and relied on by consumers for reproducible reports.
pub fn identify_winner(mean_a: f64, mean_b: f64, mean_c: f64) -> GroupKey {
    if mean_a >= mean_b && mean_a >= mean_c {
        GroupKey::A
    } else if mean_b >= mean_c {
        GroupKey::B
    } else {
        GroupKey::C
    }
}

/// Descriptive statistics of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupStatistics {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (0 for n ≤ 1).
    pub std_dev: f64,
    /// 95 % confidence interval `[low, high]`.
    pub ci95: [f64; 2],
    /// Number of samples.
    pub count: usize,
}

impl GroupStatistics {
    /// Compute from a value slice.
    pub fn from_values(values: &[f64]) -> Self {
        let m = mean(values);
        let sd = std_dev(values, m);
        Self {
            mean: m,
            std_dev: sd,
            ci95: confidence_interval_95(m, sd, values.len()),
            count: values.len(),
        }
    }
}

/// Full statistical verdict of a three-group experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatisticalAnalysis {
    /// Control group statistics.
    pub group_a: GroupStatistics,
    /// First test group statistics.
    pub group_b: GroupStatistics,
    /// Second test group statistics.
    pub group_c: GroupStatistics,
    /// Group with the highest mean KPI (ties → A, then B, then C).
    pub winner: GroupKey,
    /// ANOVA F-statistic.
    pub f_statistic: f64,
    /// Bucketed approximate ANOVA p-value.
    pub p_value: f64,
    /// `p_value < 0.05`.
    pub significant: bool,
}

/// Run the complete descriptive + inferential pass over grouped results.
pub fn analyze(results: &GroupedResults) -> StatisticalAnalysis {
    let values_a = results.kpi_values(GroupKey::A);
    let values_b = results.kpi_values(GroupKey::B);
    let values_c = results.kpi_values(GroupKey::C);

    let group_a = GroupStatistics::from_values(&values_a);
    let group_b = GroupStatistics::from_values(&values_b);
    let group_c = GroupStatistics::from_values(&values_c);

    let anova = one_way_anova(&values_a, &values_b, &values_c);
    let winner = identify_winner(group_a.mean, group_b.mean, group_c.mean);

    StatisticalAnalysis {
        group_a,
        group_b,
        group_c,
        winner,
        f_statistic: anova.f_statistic,
        p_value: anova.p_value,
        significant: anova.p_value < 0.05,
    }
}
