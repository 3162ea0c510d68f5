//! Post-experiment orchestrator: dispatch, join, analyze, evaluate rules.
//!
//! The runner fans one simulation task out per (unit, preset) pair and joins
//! them all before aggregation — a structured join barrier, not
//! fire-and-forget accumulation. Each call carries its own deadline and a
//! bounded retry; expiry and adapter errors are treated identically, with a
//! tagged fallback result substituted so a single bad simulation never
//! blocks more than its own unit's contribution.
//!
//! Phase transitions (`Idle → Running → Aggregating → Analyzing →
//! Completed`, or `Failed`/`Cancelled`) are observable through a `watch`
//! channel so a caller can drive progress display without polling.

use crate::academic::{create_groups, AcademicAnalyst};
use crate::adapter::{fallback_result, RawSimulationResult, SimulationAdapter};
use crate::aggregate::{aggregate, GroupedResults, UnitExperimentResult};
use crate::config::EngineConfig;
use crate::design::{ExperimentDesign, GroupKey, Preset};
use crate::economics::{EconomicAuditor, UnitEnergy};
use crate::kpi::{extract_kpi, Kpi};
use crate::report::PostExperimentReport;
use crate::rules::evaluate_rules;
use crate::stats::analyze;
use crate::EngineError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Observable lifecycle of one experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentPhase {
    /// No run in flight.
    Idle,
    /// Unit simulations dispatched, awaiting settlement.
    Running,
    /// All calls settled; partitioning results.
    Aggregating,
    /// Statistics, economic and academic passes, rule evaluation.
    Analyzing,
    /// Report emitted.
    Completed,
    /// Unrecoverable dispatch error (rare given the fallback contract).
    Failed,
    /// Caller cancelled before settlement; partial work discarded.
    Cancelled,
}

/// What to run: a named experiment over a design, optimizing one KPI.
#[derive(Debug, Clone)]
pub struct ExperimentSpec {
    /// Experiment name for the report.
    pub name: String,
    /// KPI to optimize.
    pub kpi: Kpi,
    /// Group/preset/unit assignment table.
    pub design: ExperimentDesign,
}

/// The orchestrator. Holds configuration and the simulation adapter; every
/// `run` call is independent, so one runner can serve experiments
/// back-to-back or concurrently.
pub struct ExperimentRunner {
    config: EngineConfig,
    adapter: Arc<dyn SimulationAdapter>,
    phase_tx: watch::Sender<ExperimentPhase>,
}

impl ExperimentRunner {
    /// Build a runner from configuration and an adapter.
    pub fn new(config: EngineConfig, adapter: Arc<dyn SimulationAdapter>) -> Self {
        let (phase_tx, _) = watch::channel(ExperimentPhase::Idle);
        Self {
            config,
            adapter,
            phase_tx,
        }
    }

    /// Subscribe to phase transitions of runs on this runner.
    pub fn phase(&self) -> watch::Receiver<ExperimentPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: ExperimentPhase) {
        info!(?phase, "experiment phase transition");
        // `send_replace` stores the value even when no receiver is
        // subscribed yet; plain `send` would silently drop it.
        self.phase_tx.send_replace(phase);
    }

    /// Run an experiment to completion.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunnable`] when no group has both a preset and a
    /// unit (nothing is simulated); [`EngineError::Join`] if a dispatched
    /// task cannot be joined.
    pub async fn run(&self, spec: &ExperimentSpec) -> Result<PostExperimentReport, EngineError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with_cancel(spec, cancel_rx).await
    }

    /// Run an experiment with a cancellation channel.
    ///
    /// Sending `true` stops new dispatches and discards unsettled calls; the
    /// run then returns [`EngineError::Cancelled`] and never reaches the
    /// `Completed` phase. Partial state is dropped, nothing is corrupted.
    pub async fn run_with_cancel(
        &self,
        spec: &ExperimentSpec,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> Result<PostExperimentReport, EngineError> {
        if !spec.design.is_runnable() {
            return Err(EngineError::NotRunnable(
                "no group has both a preset and at least one unit".to_string(),
            ));
        }

        // ── Dispatch ─────────────────────────────────────────────────────
        self.set_phase(ExperimentPhase::Running);

        let dispatches = self.collect_dispatches(&spec.design);
        info!(
            experiment = %spec.name,
            kpi = %spec.kpi,
            units = dispatches.len(),
            "dispatching unit simulations"
        );

        let mut handles = Vec::with_capacity(dispatches.len());
        for (index, dispatch) in dispatches.into_iter().enumerate() {
            if *cancel_rx.borrow() {
                return self.cancelled();
            }
            let adapter = Arc::clone(&self.adapter);
            let timeout = Duration::from_millis(self.config.simulation.timeout_ms);
            let retries = self.config.simulation.retry_attempts;
            let kpi = spec.kpi;
            handles.push(tokio::spawn(async move {
                let raw = settle_unit(adapter, &dispatch, kpi, timeout, retries).await;
                (index, dispatch, raw)
            }));
        }

        // ── Join barrier ─────────────────────────────────────────────────
        // Aggregation must not begin until every dispatched call settled.
        let mut settled: Vec<(usize, UnitDispatch, RawSimulationResult)> =
            Vec::with_capacity(handles.len());
        let mut cancel_closed = false;
        for mut handle in handles {
            let joined = loop {
                if cancel_closed {
                    break (&mut handle).await;
                }
                tokio::select! {
                    joined = &mut handle => break joined,
                    changed = cancel_rx.changed() => match changed {
                        Ok(()) if *cancel_rx.borrow() => return self.cancelled(),
                        Ok(()) => {}
                        // Sender dropped: cancellation can no longer arrive.
                        Err(_) => cancel_closed = true,
                    },
                }
            };
            match joined {
                Ok(entry) => settled.push(entry),
                Err(e) => {
                    self.set_phase(ExperimentPhase::Failed);
                    return Err(EngineError::Join(e.to_string()));
                }
            }
        }
        // Dispatch order, not completion order, for reproducible results.
        settled.sort_by_key(|(index, _, _)| *index);

        // ── Aggregate ────────────────────────────────────────────────────
        self.set_phase(ExperimentPhase::Aggregating);
        let unit_results: Vec<UnitExperimentResult> = settled
            .into_iter()
            .map(|(_, dispatch, raw)| {
                let kpi_value = extract_kpi(&raw, spec.kpi, &self.config.kpi);
                UnitExperimentResult {
                    unit_id: dispatch.unit_id,
                    group: dispatch.group,
                    preset_name: dispatch.preset.name,
                    kpi_value,
                    raw,
                }
            })
            .collect();
        let grouped = aggregate(unit_results);

        // ── Analyze ──────────────────────────────────────────────────────
        self.set_phase(ExperimentPhase::Analyzing);
        let report = self.analyze_and_report(spec, grouped);

        self.set_phase(ExperimentPhase::Completed);
        Ok(report)
    }

    fn cancelled(&self) -> Result<PostExperimentReport, EngineError> {
        // Returning drops the remaining handles, which detaches in-flight
        // calls; their results are discarded without touching shared state.
        warn!("experiment cancelled before settlement");
        self.set_phase(ExperimentPhase::Cancelled);
        Err(EngineError::Cancelled)
    }

    fn collect_dispatches(&self, design: &ExperimentDesign) -> Vec<UnitDispatch> {
        let mut dispatches = Vec::new();
        for (group, assignment) in design.runnable_groups() {
            let Some(preset) = assignment.preset.clone() else {
                continue;
            };
            for unit_id in &assignment.units {
                dispatches.push(UnitDispatch {
                    unit_id: unit_id.clone(),
                    group,
                    preset: preset.clone(),
                });
            }
        }
        dispatches
    }

    fn analyze_and_report(
        &self,
        spec: &ExperimentSpec,
        grouped: GroupedResults,
    ) -> PostExperimentReport {
        let statistics = analyze(&grouped);

        // Economic and academic passes work on raw electrical energy, not
        // the direction-normalized KPI.
        let energies: Vec<UnitEnergy> = grouped
            .all()
            .map(|r| UnitEnergy {
                id: r.unit_id.clone(),
                energy_kwh: r.raw.plant.electrical_demand_kw,
                group: r.group,
                preset_name: r.preset_name.clone(),
            })
            .collect();

        let economic = if self.config.economic_auditor.enabled {
            let auditor = EconomicAuditor::new(&self.config.economic_auditor);
            auditor.audit(&energies)
        } else {
            None
        };
        if let Some(e) = &economic {
            info!(verdict = ?e.verdict, annual = e.annual_projected_savings, "economic analysis");
        }

        let academic = if self.config.academic_analyst.enabled {
            create_groups(&energies).map(|arms| {
                AcademicAnalyst::new(&self.config.academic_analyst)
                    .analyze_experiment(&arms.control, &arms.test)
            })
        } else {
            None
        };
        if let Some(a) = &academic {
            info!(p_value = a.p_value, significant = a.significant, "academic analysis");
        }

        let triggered_tasks = evaluate_rules(
            &self.config.orchestration_rules,
            economic.as_ref(),
            academic.as_ref(),
            &self.config.economic_auditor,
            &self.config.academic_analyst,
        );

        PostExperimentReport {
            id: Uuid::new_v4(),
            experiment_name: spec.name.clone(),
            kpi: spec.kpi,
            statistics,
            economic,
            academic,
            results: grouped,
            triggered_tasks,
            timestamp: Utc::now(),
        }
    }
}

/// One (unit, preset) pair queued for simulation.
#[derive(Debug, Clone)]
struct UnitDispatch {
    unit_id: String,
    group: GroupKey,
    preset: Preset,
}

/// Drive one unit call to a settled result: timeout-bounded attempts, then
/// the fallback substitution. This function never fails — that is the
/// robustness contract of the adapter boundary.
async fn settle_unit(
    adapter: Arc<dyn SimulationAdapter>,
    dispatch: &UnitDispatch,
    kpi: Kpi,
    timeout: Duration,
    retries: u32,
) -> RawSimulationResult {
    let attempts = retries + 1;
    for attempt in 1..=attempts {
        let call = adapter.simulate(&dispatch.unit_id, &dispatch.preset, kpi);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(raw)) => return raw,
            Ok(Err(e)) => {
                warn!(
                    unit_id = %dispatch.unit_id,
                    attempt,
                    error = %e,
                    "simulation call failed"
                );
            }
            Err(_) => {
                warn!(
                    unit_id = %dispatch.unit_id,
                    attempt,
                    timeout_ms = timeout.as_millis() as u64,
                    "simulation call timed out"
                );
            }
        }
    }

    warn!(
        unit_id = %dispatch.unit_id,
        "substituting fallback result after exhausted attempts"
    );
    fallback_result(&mut rand::thread_rng(), &dispatch.unit_id)
}
