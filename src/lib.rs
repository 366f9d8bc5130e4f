pub mod constants;
pub mod engine;
pub mod levels;
pub mod narrative;
pub mod rng;
pub mod types;
