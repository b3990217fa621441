pub mod config;
pub mod error;
pub mod invariants;
pub mod records;
pub mod types;

pub mod concentration;
pub mod delinquency;
pub mod portfolio;
pub mod scoring;

pub use config::ScoringConfig;
pub use error::LoanRiskError;
pub use records::{CustomerRecord, LoanRecord, PortfolioSnapshot, RepaymentRecord};
pub use types::*;

/// Standard result type for all loan-risk operations
pub type LoanRiskResult<T> = Result<T, LoanRiskError>;
