use clap::Args;
use serde_json::Value;

use loan_allocation_core::cleaning;
use loan_allocation_core::eligibility;

use super::scenario::ScenarioSource;
use crate::input;

/// Arguments for record cleaning
#[derive(Args)]
pub struct CleanArgs {
    /// Path to applicants (JSON array or CSV)
    #[arg(long)]
    pub input: Option<String>,

    /// Emit the cleaned records instead of the cleaning report
    #[arg(long)]
    pub records: bool,
}

/// Arguments for a data-quality scan
#[derive(Args)]
pub struct ScanArgs {
    /// Path to applicants (JSON array or CSV)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for eligibility filtering
#[derive(Args)]
pub struct EligibilityArgs {
    /// Path to applicants (JSON array or CSV)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub source: ScenarioSource,
}

pub fn run_clean(args: CleanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = input::load_applicants(args.input.as_deref())?;
    let out = cleaning::clean(&records)?;
    if args.records {
        Ok(serde_json::to_value(out.records)?)
    } else {
        Ok(serde_json::to_value(out.report)?)
    }
}

pub fn run_scan(args: ScanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = input::load_applicants(args.input.as_deref())?;
    Ok(serde_json::to_value(cleaning::scan(&records))?)
}

pub fn run_eligibility(args: EligibilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = input::load_applicants(args.input.as_deref())?;
    let config = args.source.resolve()?;
    let cleaned = cleaning::clean(&records)?;
    let outcome = eligibility::filter(&cleaned.records, &config.eligibility)?;
    Ok(serde_json::json!({
        "scenario": config.name,
        "cleaned_count": cleaned.records.len(),
        "eligible_count": outcome.indices.len(),
        "stage": outcome.stage,
        "steps": outcome.steps,
        "indices": outcome.indices,
    }))
}
