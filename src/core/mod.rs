pub mod calculators;
pub mod engine;
pub mod error;
pub mod stats;
pub mod types;

pub use error::CalcError;
