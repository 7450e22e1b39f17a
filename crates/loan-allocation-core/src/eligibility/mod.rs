pub mod criteria;
pub mod filter;
pub mod quality;

pub use criteria::EligibilityCriteria;
pub use filter::{filter, EligibilityConfig, EligibilityOutcome, EligibilityStage, StageCount};
pub use quality::QualityWeights;
