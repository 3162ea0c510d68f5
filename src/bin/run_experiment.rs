//! Demo binary for reactor-experiment-engine
//!
//! Runs a three-group insulation trial against the deterministic adapter and
//! prints the post-experiment report.
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json` — structured JSON output (production)
//! - `RUST_LOG=info` — log level filter (default: info)
//! - `ENGINE_CONFIG` — path to a TOML config (default: config/engine.toml)

use reactor_experiment_engine::adapter::DeterministicAdapter;
use reactor_experiment_engine::config::{loader, EngineConfig};
use reactor_experiment_engine::design::{ExperimentDesign, GroupKey, Preset};
use reactor_experiment_engine::init_tracing;
use reactor_experiment_engine::kpi::Kpi;
use reactor_experiment_engine::runner::{ExperimentRunner, ExperimentSpec};
use std::sync::Arc;
use tracing::{info, warn};

fn demo_design() -> ExperimentDesign {
    let mut design = ExperimentDesign::new();

    design.assign_preset(
        GroupKey::A,
        Preset {
            name: "baseline-500".to_string(),
            target_temp_c: 500.0,
            residence_time_s: 2.0,
            inert_flow_l_min: 12.0,
            operating_mode: "continuous".to_string(),
            description: Some("Plant-standard operating point".to_string()),
        },
    );
    design.assign_preset(
        GroupKey::B,
        Preset {
            name: "hot-550".to_string(),
            target_temp_c: 550.0,
            residence_time_s: 2.0,
            inert_flow_l_min: 12.0,
            operating_mode: "continuous".to_string(),
            description: Some("Elevated bed temperature".to_string()),
        },
    );
    design.assign_preset(
        GroupKey::C,
        Preset {
            name: "hot-550-fast".to_string(),
            target_temp_c: 550.0,
            residence_time_s: 1.2,
            inert_flow_l_min: 18.0,
            operating_mode: "continuous".to_string(),
            description: Some("Elevated temperature, short residence".to_string()),
        },
    );

    for (group, label) in [(GroupKey::A, "a"), (GroupKey::B, "b"), (GroupKey::C, "c")] {
        for i in 1..=4 {
            design.assign_unit(&format!("reactor-{label}{i}"), Some(group));
        }
    }
    design
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = init_tracing();

    let config_path =
        std::env::var("ENGINE_CONFIG").unwrap_or_else(|_| "config/engine.toml".to_string());
    let config = match loader::load_from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %config_path, error = %e, "config not loaded, using defaults");
            EngineConfig::default()
        }
    };

    let runner = ExperimentRunner::new(config, Arc::new(DeterministicAdapter::new()));

    let spec = ExperimentSpec {
        name: "bed temperature trial".to_string(),
        kpi: Kpi::EnergyDemand,
        design: demo_design(),
    };

    info!(experiment = %spec.name, kpi = %spec.kpi, "starting demo experiment");
    let report = runner.run(&spec).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!();
    println!("{}", report.insight_summary());

    Ok(())
}
