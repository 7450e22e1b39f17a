use clap::Args;
use serde_json::Value;

use loan_allocation_core::synthetic::{generate_pool, SyntheticConfig};

/// Arguments for synthetic pool generation
#[derive(Args)]
pub struct SynthesizeArgs {
    /// Number of applicants
    #[arg(long, default_value_t = 1_000)]
    pub count: usize,

    /// RNG seed; the same seed always yields the same pool
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of records corrupted into implausible ones
    #[arg(long, default_value_t = 0.0)]
    pub implausible_share: f64,

    /// Share of records followed by an exact duplicate
    #[arg(long, default_value_t = 0.0)]
    pub duplicate_share: f64,
}

pub fn run_synthesize(args: SynthesizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = SyntheticConfig::new(args.count, args.seed);
    config.implausible_share = args.implausible_share;
    config.duplicate_share = args.duplicate_share;
    Ok(serde_json::to_value(generate_pool(&config)?)?)
}
