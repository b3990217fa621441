use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios expressed as decimals (0.40 = 40%).
pub type Rate = Decimal;

/// Percentages on the 0-100 scale.
pub type Percent = Decimal;

/// Risk scores and sub-scores on the 0-100 scale.
pub type Score = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// `part / total * 100`, or zero when there is nothing to divide by.
pub fn pct_of(part: Decimal, total: Decimal) -> Percent {
    if total <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        part / total * dec!(100)
    }
}

/// Clamp a score into [0, 100].
pub fn clamp_score(score: Decimal) -> Score {
    score.clamp(Decimal::ZERO, dec!(100))
}

/// Round a final score to one decimal place, half away from zero.
pub fn round_score(score: Decimal) -> Score {
    score.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
