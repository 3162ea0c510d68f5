//! Declarative post-experiment orchestration rules.
//!
//! A rule converts analysis output into a follow-up task descriptor when its
//! threshold condition holds. Trigger kinds are a tagged enum — not strings
//! switched on at run time — so the evaluator is exhaustively checkable,
//! while an `Unknown` catch-all keeps forward-compatible configs loadable:
//! unknown kinds are skipped at evaluation, never fatal.

use crate::academic::AcademicAnalysis;
use crate::config::{AcademicAnalystConfig, EconomicAuditorConfig};
use crate::economics::EconomicAnalysis;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Priority attached to a triggered task descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Act immediately.
    High,
    /// Schedule soon.
    Medium,
    /// Backlog.
    Low,
}

/// What fires a rule. Tagged by the `kind` field in configuration.
///
/// Threshold fields are optional: `None` falls back to the corresponding
/// module configuration (the economic high-impact threshold, the academic
/// alpha), mirroring how the thresholds are owned by those modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when projected annual savings exceed the threshold.
    EconomicBoom {
        /// Explicit savings threshold; `None` uses the economic auditor's
        /// high-impact threshold.
        #[serde(default)]
        min_annual_savings: Option<f64>,
    },
    /// Fires when the academic p-value is below the threshold.
    ScientificBreakthrough {
        /// Explicit p-value cutoff; `None` uses the academic alpha.
        #[serde(default)]
        max_p_value: Option<f64>,
    },
    /// A kind this engine version does not know. Parsed, never evaluated.
    #[serde(other)]
    Unknown,
}

/// What a fired rule emits: the template a task-tracking collaborator
/// materializes into a concrete work item, plus its priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleAction {
    /// Priority of the resulting task.
    pub priority: TaskPriority,
    /// Template id resolved by the external task-tracking collaborator.
    pub task_template: String,
}

/// One configured rule. Read-only at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrchestrationRule {
    /// Stable rule id, used in logs and descriptors.
    pub id: String,
    /// Trigger condition.
    #[serde(flatten)]
    pub trigger: Trigger,
    /// Action taken when the trigger holds.
    pub action: RuleAction,
}

/// A triggered follow-up item, handed to the external task tracker.
///
/// Materialization into a concrete task (title, objective, subtasks) is a
/// templating concern outside this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskDescriptor {
    /// Rule that fired.
    pub rule_id: String,
    /// Task priority.
    pub priority: TaskPriority,
    /// Template id for the collaborator to expand.
    pub template_id: String,
}

/// Evaluate every configured rule against the analysis sections.
///
/// Missing analysis sections simply fail the conditions that need them; an
/// unknown rule kind is skipped with a warning. One bad rule never stops the
/// others from evaluating.
pub fn evaluate_rules(
    rules: &[OrchestrationRule],
    economic: Option<&EconomicAnalysis>,
    academic: Option<&AcademicAnalysis>,
    economic_config: &EconomicAuditorConfig,
    academic_config: &AcademicAnalystConfig,
) -> Vec<TaskDescriptor> {
    let mut triggered = Vec::new();

    for rule in rules {
        let fired = match &rule.trigger {
            Trigger::EconomicBoom { min_annual_savings } => {
                let threshold =
                    min_annual_savings.unwrap_or(economic_config.high_impact_threshold);
                let savings = economic.map_or(0.0, |e| e.annual_projected_savings);
                savings > threshold
            }
            Trigger::ScientificBreakthrough { max_p_value } => {
                let cutoff = max_p_value.unwrap_or_else(|| academic_config.alpha());
                let p_value = academic.map_or(1.0, |a| a.p_value);
                p_value < cutoff
            }
            Trigger::Unknown => {
                warn!(rule_id = %rule.id, "skipping rule with unknown trigger kind");
                continue;
            }
        };

        if fired {
            info!(
                rule_id = %rule.id,
                priority = ?rule.action.priority,
                template = %rule.action.task_template,
                "orchestration rule fired"
            );
            triggered.push(TaskDescriptor {
                rule_id: rule.id.clone(),
                priority: rule.action.priority,
                template_id: rule.action.task_template.clone(),
            });
        }
    }

    triggered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::{EconomicVerdict, UnitCost};

    fn economic(savings: f64) -> EconomicAnalysis {
        EconomicAnalysis {
            comparison_id: "R-01 vs R-02".to_string(),
            winner: UnitCost {
                id: "R-01".to_string(),
                cost_per_run: 1.0,
            },
            loser: UnitCost {
                id: "R-02".to_string(),
                cost_per_run: 2.0,
            },
            savings_per_run: 1.0,
            efficiency_gain_percent: 50.0,
            annual_projected_savings: savings,
            verdict: EconomicVerdict::Medium,
            verdict_text: String::new(),
        }
    }

    fn academic(p_value: f64) -> AcademicAnalysis {
        use crate::academic::ArmStatistics;
        AcademicAnalysis {
            hypothesis: "control consumes less energy than test".to_string(),
            control_stats: ArmStatistics {
                mean: 10.0,
                std: 1.0,
                label: "Mean: 10.00 (±1.00)".to_string(),
            },
            test_stats: ArmStatistics {
                mean: 12.0,
                std: 1.0,
                label: "Mean: 12.00 (±1.00)".to_string(),
            },
            delta: -2.0,
            t_statistic: -2.5,
            p_value,
            significant: p_value < 0.05,
            abstract_text: String::new(),
        }
    }

    fn boom_rule(threshold: Option<f64>) -> OrchestrationRule {
        OrchestrationRule {
            id: "rule_economic_boom".to_string(),
            trigger: Trigger::EconomicBoom {
                min_annual_savings: threshold,
            },
            action: RuleAction {
                priority: TaskPriority::High,
                task_template: "scaleup_investment".to_string(),
            },
        }
    }

    fn breakthrough_rule(cutoff: Option<f64>) -> OrchestrationRule {
        OrchestrationRule {
            id: "rule_scientific_breakthrough".to_string(),
            trigger: Trigger::ScientificBreakthrough {
                max_p_value: cutoff,
            },
            action: RuleAction {
                priority: TaskPriority::Medium,
                task_template: "draft_paper".to_string(),
            },
        }
    }

    #[test]
    fn test_economic_boom_fires_above_default_threshold() {
        let tasks = evaluate_rules(
            &[boom_rule(None)],
            Some(&economic(15_000.0)),
            None,
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].rule_id, "rule_economic_boom");
        assert_eq!(tasks[0].priority, TaskPriority::High);
    }

    #[test]
    fn test_economic_boom_holds_below_threshold() {
        let tasks = evaluate_rules(
            &[boom_rule(None)],
            Some(&economic(9_504.0)),
            None,
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_economic_boom_explicit_threshold_overrides_config() {
        let tasks = evaluate_rules(
            &[boom_rule(Some(5_000.0))],
            Some(&economic(9_504.0)),
            None,
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_breakthrough_fires_below_alpha() {
        let tasks = evaluate_rules(
            &[breakthrough_rule(None)],
            None,
            Some(&academic(0.01)),
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].template_id, "draft_paper");
    }

    #[test]
    fn test_missing_sections_fail_conditions_quietly() {
        let tasks = evaluate_rules(
            &[boom_rule(None), breakthrough_rule(None)],
            None,
            None,
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_skipped_others_still_evaluate() {
        let unknown = OrchestrationRule {
            id: "rule_future".to_string(),
            trigger: Trigger::Unknown,
            action: RuleAction {
                priority: TaskPriority::Low,
                task_template: "noop".to_string(),
            },
        };
        let tasks = evaluate_rules(
            &[unknown, boom_rule(None)],
            Some(&economic(20_000.0)),
            None,
            &EconomicAuditorConfig::default(),
            &AcademicAnalystConfig::default(),
        );
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].rule_id, "rule_economic_boom");
    }

    #[test]
    fn test_rule_toml_with_flattened_trigger() {
        let toml_str = r#"
id = "rule_economic_boom"
kind = "economic_boom"
min_annual_savings = 12000.0

[action]
priority = "high"
task_template = "scaleup_investment"
"#;
        let rule: OrchestrationRule = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            rule.trigger,
            Trigger::EconomicBoom {
                min_annual_savings: Some(t)
            } if t == 12_000.0
        ));
    }
}
