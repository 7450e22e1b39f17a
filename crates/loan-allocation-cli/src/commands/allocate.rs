use clap::Args;
use serde_json::Value;
use tracing::info;

use loan_allocation_core::allocation::run_allocation;
use loan_allocation_core::allocation::summary::AllocationDecision;
use loan_allocation_core::scenarios::{self, compare_scenarios};

use super::scenario::ScenarioSource;
use crate::input;

/// Arguments for a single-scenario allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to applicants (JSON array or CSV)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub source: ScenarioSource,

    /// Also write the per-applicant decision records to this CSV file
    #[arg(long)]
    pub export: Option<String>,
}

/// Arguments for comparing scenarios
#[derive(Args)]
pub struct CompareArgs {
    /// Path to applicants (JSON array or CSV)
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated preset names
    #[arg(long, value_delimiter = ',', default_value = "expansion,asset-protection")]
    pub scenarios: Vec<String>,

    /// Scenario config files (YAML or JSON), compared after the presets
    #[arg(long = "config")]
    pub configs: Vec<String>,

    /// Total lending budget applied to every scenario
    #[arg(long)]
    pub budget: Option<f64>,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = input::load_applicants(args.input.as_deref())?;
    let config = args.source.resolve()?;
    let result = run_allocation(&records, &config)?;

    if let Some(path) = &args.export {
        export_decisions(path, &result.result.decisions)?;
        info!(path = %path, rows = result.result.decisions.len(), "decisions exported");
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = input::load_applicants(args.input.as_deref())?;

    let mut configs = Vec::with_capacity(args.scenarios.len() + args.configs.len());
    for name in args.scenarios.iter().filter(|n| !n.trim().is_empty()) {
        configs.push(scenarios::by_name(name.trim())?);
    }
    for path in &args.configs {
        configs.push(input::file::read_config(path)?);
    }
    if let Some(budget) = args.budget {
        for c in &mut configs {
            c.total_budget = budget;
        }
    }

    let result = compare_scenarios(&records, &configs)?;
    Ok(serde_json::to_value(result)?)
}

fn export_decisions(path: &str, decisions: &[AllocationDecision]) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    for d in decisions {
        wtr.serialize(d)?;
    }
    wtr.flush()?;
    Ok(())
}
