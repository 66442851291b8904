pub mod engine;
pub mod error;
pub mod types;

pub use error::BondCalcError;
pub use types::*;

/// Standard result type for all bondcalc operations
pub type BondCalcResult<T> = Result<T, BondCalcError>;
