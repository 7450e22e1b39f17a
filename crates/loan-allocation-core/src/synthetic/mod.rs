pub mod generator;

pub use generator::{generate_pool, SyntheticConfig};
