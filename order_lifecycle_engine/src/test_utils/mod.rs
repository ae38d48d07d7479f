//! Helpers shared by the engine's own tests and by downstream crates (enable the `test_utils` feature).
pub mod fixtures;
mod prepare_env;

pub use prepare_env::*;
