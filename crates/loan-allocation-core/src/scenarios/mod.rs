pub mod comparison;
pub mod presets;

pub use comparison::{compare_scenarios, ScenarioComparison, ScenarioResult};
pub use presets::{asset_protection, by_name, expansion, PRESET_NAMES};
