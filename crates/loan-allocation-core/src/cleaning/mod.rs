pub mod rules;
pub mod validator;

pub use rules::ValidationRule;
pub use validator::{clean, scan, verify_clean, CleaningOutput, CleaningReport, QualityScan};
