use clap::Args;
use serde_json::Value;

use loan_allocation_core::allocation::ScenarioConfig;
use loan_allocation_core::scenarios::{self, PRESET_NAMES};

use crate::input;

/// Where a scenario comes from, plus command-line overrides
#[derive(Args, Clone)]
pub struct ScenarioSource {
    /// Built-in preset: expansion, asset-protection
    #[arg(long, default_value = "expansion", conflicts_with = "config")]
    pub scenario: String,

    /// Path to a scenario config (YAML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Total lending budget
    #[arg(long)]
    pub budget: Option<f64>,

    /// Fraction of the budget that may be spent, in (0, 1]
    #[arg(long)]
    pub utilization: Option<f64>,

    /// Cap on the amount-weighted average PD
    #[arg(long)]
    pub risk_cap: Option<f64>,

    /// Loss given default; enables expected-loss and net-profit reporting
    #[arg(long)]
    pub lgd: Option<f64>,

    /// Enforce category target bands as hard LP constraints
    #[arg(long)]
    pub enforce_bands: bool,

    /// Minimum cleaned pool size
    #[arg(long)]
    pub min_pool_size: Option<usize>,
}

impl ScenarioSource {
    pub fn resolve(&self) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
        let base = match &self.config {
            Some(path) => input::file::read_config(path)?,
            None => scenarios::by_name(&self.scenario)?,
        };
        Ok(self.apply(base))
    }

    /// Apply overrides to `config`.
    pub fn apply(&self, mut config: ScenarioConfig) -> ScenarioConfig {
        if let Some(budget) = self.budget {
            config.total_budget = budget;
        }
        if let Some(fraction) = self.utilization {
            config.budget_utilization_fraction = fraction;
        }
        if let Some(cap) = self.risk_cap {
            config.risk_cap = cap;
        }
        if self.lgd.is_some() {
            config.loss_given_default = self.lgd;
        }
        if self.enforce_bands {
            config.enforce_category_bands = true;
        }
        if let Some(min) = self.min_pool_size {
            config.min_pool_size = min;
        }
        config
    }
}

/// Arguments for printing a preset
#[derive(Args)]
pub struct ScenarioArgs {
    /// Preset name; omit to list the available presets
    pub name: Option<String>,
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.name {
        Some(name) => Ok(serde_json::to_value(scenarios::by_name(&name)?)?),
        None => Ok(serde_json::json!({ "presets": PRESET_NAMES })),
    }
}
