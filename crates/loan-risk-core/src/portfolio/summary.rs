//! Portfolio statistics aggregator.
//!
//! Covers:
//! 1. **Book counts** -- total, active, NPA, restructured, closed; NPA rate.
//! 2. **Risk mix** -- mean risk score and loans per category.
//! 3. **At-risk exposure** -- outstanding of HIGH-category loans.
//! 4. **High-risk list** -- HIGH assessments ranked by score.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ScoringConfig;
use crate::records::{LoanRecord, LoanStatus, PortfolioSnapshot};
use crate::scoring::composite::{RiskAssessment, RiskCategory};
use crate::scoring::engine::{index_assessments, score_portfolio};
use crate::types::{pct_of, with_metadata, ComputationOutput, Money, Percent, Score};
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl CategoryCounts {
    fn add(&mut self, category: RiskCategory) {
        match category {
            RiskCategory::Low => self.low += 1,
            RiskCategory::Medium => self.medium += 1,
            RiskCategory::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_loans: u64,
    pub active_loans: u64,
    pub npa_loans: u64,
    pub restructured_loans: u64,
    pub closed_loans: u64,
    /// NPA loans / total loans, percent.
    pub npa_rate: Percent,
    pub assessed_loans: u64,
    /// Mean of the assessed scores, two decimals.
    pub mean_risk_score: Score,
    pub category_counts: CategoryCounts,
    /// Outstanding of non-closed loans.
    pub total_exposure: Money,
    /// Outstanding of non-closed loans assessed HIGH.
    pub at_risk_exposure: Money,
    pub at_risk_pct: Percent,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Roll assessments, each matched to its loan by id, into book statistics.
/// Loans without an assessment count towards the book but not the risk mix.
pub fn summarize_portfolio(loans: &[LoanRecord], assessments: &[RiskAssessment]) -> PortfolioSummary {
    let by_loan = index_assessments(assessments);

    let mut active_loans = 0u64;
    let mut npa_loans = 0u64;
    let mut restructured_loans = 0u64;
    let mut closed_loans = 0u64;
    let mut total_exposure = Decimal::ZERO;
    let mut at_risk_exposure = Decimal::ZERO;

    for loan in loans {
        match loan.status {
            LoanStatus::Active => active_loans += 1,
            LoanStatus::Npa => npa_loans += 1,
            LoanStatus::Restructured => restructured_loans += 1,
            LoanStatus::Closed => closed_loans += 1,
        }
        if loan.is_closed() || loan.outstanding < Money::ZERO {
            continue;
        }
        total_exposure += loan.outstanding;
        if by_loan
            .get(loan.id.as_str())
            .is_some_and(|a| a.risk_category == RiskCategory::High)
        {
            at_risk_exposure += loan.outstanding;
        }
    }

    let mut category_counts = CategoryCounts::default();
    for a in assessments {
        category_counts.add(a.risk_category);
    }

    let total_loans = loans.len() as u64;

    PortfolioSummary {
        total_loans,
        active_loans,
        npa_loans,
        restructured_loans,
        closed_loans,
        npa_rate: pct_of(Decimal::from(npa_loans), Decimal::from(total_loans)),
        assessed_loans: assessments.len() as u64,
        mean_risk_score: mean_risk_score(assessments).round_dp(2),
        category_counts,
        total_exposure,
        at_risk_exposure,
        at_risk_pct: pct_of(at_risk_exposure, total_exposure),
    }
}

/// Arithmetic mean of the risk scores; zero for no assessments.
pub fn mean_risk_score(assessments: &[RiskAssessment]) -> Score {
    if assessments.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = assessments.iter().map(|a| a.risk_score).sum();
    total / Decimal::from(assessments.len() as u64)
}

/// HIGH-category assessments, highest score first (ties by loan id).
pub fn high_risk_loans(assessments: &[RiskAssessment], limit: usize) -> Vec<&RiskAssessment> {
    let mut high: Vec<&RiskAssessment> = assessments.iter().filter(|a| a.is_high_risk()).collect();
    high.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.loan_id.cmp(&b.loan_id))
    });
    high.truncate(limit);
    high
}

/// Score the snapshot and summarise it.
pub fn analyze_portfolio(
    snapshot: &PortfolioSnapshot,
    config: &ScoringConfig,
    assessed_at: DateTime<Utc>,
) -> LoanRiskResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let scored = score_portfolio(snapshot, config, assessed_at)?;
    let summary = summarize_portfolio(&snapshot.loans, &scored.result.assessments);

    let mut warnings = scored.warnings;
    if summary.total_loans == 0 {
        warnings.push("Portfolio has no loans.".into());
    }

    let assumptions = serde_json::json!({
        "npa_rate": "NPA loans / all loans",
        "at_risk_exposure": "outstanding of HIGH-category loans",
        "exposure_measure": "outstanding amount of non-closed loans",
    });

    Ok(with_metadata(
        "Portfolio risk summary over composite assessments",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delinquency::analyzer::analyze_delinquency;
    use crate::config::DelinquencyConfig;
    use crate::records::{RepaymentRecord, Sector};
    use crate::scoring::composite::{ComponentScores, RiskFlags};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn loan(id: &str, status: LoanStatus, outstanding: Money) -> LoanRecord {
        LoanRecord {
            id: id.into(),
            customer_id: "C1".into(),
            principal: dec!(1_000),
            outstanding,
            disbursement_date: NaiveDate::from_ymd_opt(2022, 5, 1).unwrap(),
            tenure_months: 48,
            interest_rate: dec!(14),
            sector: Sector::Manufacturing,
            status,
            product: None,
        }
    }

    fn assessment(id: &str, score: Score, category: RiskCategory) -> RiskAssessment {
        RiskAssessment {
            loan_id: id.into(),
            customer_id: "C1".into(),
            risk_score: score,
            risk_category: category,
            components: ComponentScores::default(),
            flags: RiskFlags::default(),
            recommendations: vec![],
            delinquency: analyze_delinquency::<RepaymentRecord>(&[], &DelinquencyConfig::default()),
            sector_share_pct: Decimal::ZERO,
            geography_share_pct: Decimal::ZERO,
            assessed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_summary_counts_and_exposure() {
        let loans = vec![
            loan("L1", LoanStatus::Active, dec!(600)),
            loan("L2", LoanStatus::Npa, dec!(300)),
            loan("L3", LoanStatus::Restructured, dec!(100)),
            loan("L4", LoanStatus::Closed, dec!(0)),
        ];
        let assessments = vec![
            assessment("L1", dec!(20), RiskCategory::Low),
            assessment("L2", dec!(80), RiskCategory::High),
            assessment("L3", dec!(50), RiskCategory::Medium),
            assessment("L4", dec!(10), RiskCategory::Low),
        ];
        let s = summarize_portfolio(&loans, &assessments);
        assert_eq!(s.total_loans, 4);
        assert_eq!(s.active_loans, 1);
        assert_eq!(s.npa_loans, 1);
        assert_eq!(s.closed_loans, 1);
        assert_eq!(s.npa_rate, dec!(25));
        assert_eq!(s.mean_risk_score, dec!(40));
        assert_eq!(
            s.category_counts,
            CategoryCounts {
                low: 2,
                medium: 1,
                high: 1
            }
        );
        assert_eq!(s.total_exposure, dec!(1_000));
        assert_eq!(s.at_risk_exposure, dec!(300));
        assert_eq!(s.at_risk_pct, dec!(30));
    }

    #[test]
    fn test_empty_summary() {
        let s = summarize_portfolio(&[], &[]);
        assert_eq!(s.total_loans, 0);
        assert_eq!(s.npa_rate, Decimal::ZERO);
        assert_eq!(s.mean_risk_score, Decimal::ZERO);
        assert_eq!(s.at_risk_pct, Decimal::ZERO);
    }

    #[test]
    fn test_high_risk_list_ordering_and_limit() {
        let assessments = vec![
            assessment("L3", dec!(72.5), RiskCategory::High),
            assessment("L1", dec!(90), RiskCategory::High),
            assessment("L2", dec!(72.5), RiskCategory::High),
            assessment("L4", dec!(60), RiskCategory::Medium),
        ];
        let top: Vec<&str> = high_risk_loans(&assessments, 10)
            .iter()
            .map(|a| a.loan_id.as_str())
            .collect();
        assert_eq!(top, vec!["L1", "L2", "L3"]);
        assert_eq!(high_risk_loans(&assessments, 1).len(), 1);
        assert!(high_risk_loans(&assessments, 0).is_empty());
    }
}
