pub mod chain;
pub mod compliance;
pub mod config;
pub mod engine;
pub mod exposure;
pub mod fallback;
pub mod model;
pub mod simplex;
pub mod solver;
pub mod summary;
pub mod trimmer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use chain::{AllocationChain, AllocationStrategy, DeferReason, StrategyKind};
pub use config::{CountBand, FallbackConfig, RiskFormulation, ScenarioConfig, SolverFailurePolicy};
pub use engine::{run_allocation, AllocationReport};
pub use fallback::{select_fallback, FallbackReason};
pub use solver::solve;
pub use trimmer::trim;
