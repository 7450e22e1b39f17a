pub mod allocate;
pub mod cleaning;
pub mod scenario;
pub mod synthesize;
