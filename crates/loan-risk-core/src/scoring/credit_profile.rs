//! Credit profile sub-score.
//!
//! Blends bureau-score risk and debt-to-income risk, each read from a tier
//! table, into a single 0-100 sub-score.

use rust_decimal::Decimal;

use crate::config::CreditProfileConfig;
use crate::types::{clamp_score, Percent, Score};

/// Credit profile sub-score for a borrower.
pub fn credit_profile_score(credit_score: u16, dti_ratio: Percent, config: &CreditProfileConfig) -> Score {
    let credit_risk = config.credit_score_tiers.lookup(Decimal::from(credit_score));
    let dti_risk = config.dti_tiers.lookup(dti_ratio);
    clamp_score(credit_risk * config.credit_score_weight + dti_risk * config.dti_weight)
}
