mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::allocate::{AllocateArgs, CompareArgs};
use commands::cleaning::{CleanArgs, EligibilityArgs, ScanArgs};
use commands::scenario::ScenarioArgs;
use commands::synthesize::SynthesizeArgs;

/// Loan-portfolio allocation under a budget and a risk cap
#[derive(Parser)]
#[command(
    name = "loanalloc",
    version,
    about = "Loan-portfolio allocation under a budget and a risk cap",
    long_about = "Cleans applicant records, narrows them to an eligible pool, and selects \
                  which loans to fund: an LP relaxation rounded to binary decisions, \
                  repaired by ascending-PD trimming, with deterministic fallbacks when \
                  the solver fails or selects nothing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove implausible and duplicate applicant records
    Clean(CleanArgs),
    /// Count data-quality violations without removing anything
    Scan(ScanArgs),
    /// Show which cleaned applicants a scenario's eligibility policy admits
    Eligibility(EligibilityArgs),
    /// Run the full allocation pipeline for one scenario
    Allocate(AllocateArgs),
    /// Compare several scenarios over the same applicants
    Compare(CompareArgs),
    /// Print a built-in scenario preset
    Scenario(ScenarioArgs),
    /// Generate a seeded synthetic applicant pool
    Synthesize(SynthesizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Clean(args) => commands::cleaning::run_clean(args),
        Commands::Scan(args) => commands::cleaning::run_scan(args),
        Commands::Eligibility(args) => commands::cleaning::run_eligibility(args),
        Commands::Allocate(args) => commands::allocate::run_allocate(args),
        Commands::Compare(args) => commands::allocate::run_compare(args),
        Commands::Scenario(args) => commands::scenario::run_scenario(args),
        Commands::Synthesize(args) => commands::synthesize::run_synthesize(args),
        Commands::Version => {
            println!("loanalloc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
