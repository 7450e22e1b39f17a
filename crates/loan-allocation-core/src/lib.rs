pub mod error;
pub mod types;

#[cfg(feature = "cleaning")]
pub mod cleaning;

#[cfg(feature = "eligibility")]
pub mod eligibility;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use error::AllocationError;
pub use types::*;

/// Standard result type for all allocation operations
pub type AllocationResult<T> = Result<T, AllocationError>;
