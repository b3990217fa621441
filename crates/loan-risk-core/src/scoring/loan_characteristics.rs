//! Loan characteristics sub-score.
//!
//! Starts from how much of the principal is still outstanding, adds the
//! sector's fixed risk weight, credits seasoned well-performing loans and
//! penalises NPA and restructured status.

use serde::{Deserialize, Serialize};

use crate::config::LoanCharacteristicsConfig;
use crate::records::{LoanStatus, Sector};
use crate::types::{clamp_score, Rate, Score};

/// Attributes of a loan relevant to this sub-score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCharacteristics {
    /// Outstanding / principal, 0-1.
    pub outstanding_ratio: Rate,
    pub sector: Sector,
    pub age_months: u32,
    /// The loan's delinquency sub-score.
    pub delinquency_score: Score,
    pub status: LoanStatus,
}

pub fn loan_characteristics_score(loan: &LoanCharacteristics, config: &LoanCharacteristicsConfig) -> Score {
    let mut score = loan.outstanding_ratio * config.outstanding_ratio_weight;
    score += config.sector_weights.weight(loan.sector);

    if loan.age_months > config.seasoned_after_months
        && loan.delinquency_score < config.seasoned_max_delinquency
    {
        score -= config.seasoning_credit;
    }

    match loan.status {
        LoanStatus::Npa => score += config.npa_penalty,
        LoanStatus::Restructured => score += config.restructured_penalty,
        LoanStatus::Active | LoanStatus::Closed => {}
    }

    clamp_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn loan(sector: Sector, status: LoanStatus, age: u32, delinquency: Score) -> LoanCharacteristics {
        LoanCharacteristics {
            outstanding_ratio: dec!(0.5),
            sector,
            age_months: age,
            delinquency_score: delinquency,
            status,
        }
    }

    fn cfg() -> LoanCharacteristicsConfig {
        LoanCharacteristicsConfig::default()
    }

    #[test]
    fn test_fresh_it_loan() {
        // 0.5 * 30 + 10
        let s = loan_characteristics_score(&loan(Sector::It, LoanStatus::Active, 6, dec!(5)), &cfg());
        assert_eq!(s, dec!(25));
    }

    #[test]
    fn test_seasoning_credit_requires_age_and_clean_history() {
        let seasoned = loan(Sector::Retail, LoanStatus::Active, 13, dec!(10));
        assert_eq!(loan_characteristics_score(&seasoned, &cfg()), dec!(40));

        let exactly_twelve = loan(Sector::Retail, LoanStatus::Active, 12, dec!(10));
        assert_eq!(loan_characteristics_score(&exactly_twelve, &cfg()), dec!(50));

        let delinquent = loan(Sector::Retail, LoanStatus::Active, 24, dec!(20));
        assert_eq!(loan_characteristics_score(&delinquent, &cfg()), dec!(50));
    }

    #[test]
    fn test_status_penalties() {
        let npa = loan(Sector::Agriculture, LoanStatus::Npa, 6, dec!(95));
        // 15 + 45 + 50 = 110 -> clamped
        assert_eq!(loan_characteristics_score(&npa, &cfg()), dec!(100));

        let restructured = loan(Sector::Healthcare, LoanStatus::Restructured, 6, dec!(50));
        // 15 + 15 + 30
        assert_eq!(loan_characteristics_score(&restructured, &cfg()), dec!(60));
    }

    #[test]
    fn test_never_negative() {
        let mut l = loan(Sector::It, LoanStatus::Active, 48, Decimal::ZERO);
        l.outstanding_ratio = Decimal::ZERO;
        // 0 + 10 - 10
        assert_eq!(loan_characteristics_score(&l, &cfg()), Decimal::ZERO);
    }
}
