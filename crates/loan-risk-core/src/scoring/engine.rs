//! Batch scoring pipeline.
//!
//! Covers:
//! 1. **Validation** -- each loan is checked on its own; a malformed loan is
//!    reported as unscoreable and never aborts the batch.
//! 2. **Context** -- portfolio exposure totals built once from the valid,
//!    non-closed loans.
//! 3. **Fan-out** -- delinquency, credit profile, loan characteristics and
//!    concentration penalty per loan, combined by the composite scorer.
//!
//! With the `parallel` feature the fan-out runs on rayon; output order always
//! follows input order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::concentration::context::PortfolioContext;
use crate::concentration::penalty::concentration_penalty;
use crate::config::ScoringConfig;
use crate::delinquency::analyzer::analyze_delinquency;
use crate::error::LoanRiskError;
use crate::records::{CustomerRecord, LoanRecord, PortfolioSnapshot, RepaymentRecord};
use crate::scoring::composite::{compose_assessment, CompositeInput, RiskAssessment};
use crate::scoring::credit_profile::credit_profile_score;
use crate::scoring::loan_characteristics::{loan_characteristics_score, LoanCharacteristics};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::LoanRiskResult;

const MIN_CREDIT_SCORE: u16 = 300;
const MAX_CREDIT_SCORE: u16 = 850;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A loan that could not be scored, reported next to the scored ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscoreableLoan {
    pub loan_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioScoringOutput {
    pub context: PortfolioContext,
    pub assessments: Vec<RiskAssessment>,
    pub unscoreable: Vec<UnscoreableLoan>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score every loan of a snapshot.
///
/// Returns `InvalidInput` only for a bad configuration. Per-loan problems
/// land in `unscoreable`.
pub fn score_portfolio(
    snapshot: &PortfolioSnapshot,
    config: &ScoringConfig,
    assessed_at: DateTime<Utc>,
) -> LoanRiskResult<ComputationOutput<PortfolioScoringOutput>> {
    let start = Instant::now();
    config.validate()?;

    info!(loans = snapshot.loans.len(), as_of = %snapshot.as_of, "scoring portfolio");

    let customers = snapshot.customer_index();
    let repayments = snapshot.repayments_by_loan();

    let (valid, unscoreable) = partition_loans(snapshot, &customers);

    let context = PortfolioContext::build(
        valid.iter().map(|(loan, _)| *loan).filter(|loan| !loan.is_closed()),
        &customers,
    );

    let score_one = |&(loan, customer): &(&LoanRecord, &CustomerRecord)| {
        let history = repayments
            .get(loan.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        assess_loan(loan, customer, history, &context, config, snapshot.as_of, assessed_at)
    };

    #[cfg(feature = "parallel")]
    let assessments: Vec<RiskAssessment> = valid.par_iter().map(score_one).collect();
    #[cfg(not(feature = "parallel"))]
    let assessments: Vec<RiskAssessment> = valid.iter().map(score_one).collect();

    info!(
        loans = snapshot.loans.len(),
        scored = assessments.len(),
        unscoreable = unscoreable.len(),
        "portfolio scored"
    );

    let mut warnings = Vec::new();
    if !unscoreable.is_empty() {
        warnings.push(format!("{} loan(s) could not be scored", unscoreable.len()));
    }
    if context.is_empty() {
        warnings.push("No open exposure; concentration penalties are zero.".into());
    }

    let assumptions = serde_json::json!({
        "weights": config.weights,
        "categories": config.categories,
        "as_of": snapshot.as_of,
        "context": "valid non-closed loans, outstanding amount",
    });

    Ok(with_metadata(
        "Weighted composite of delinquency, credit profile, loan characteristics and concentration sub-scores",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        PortfolioScoringOutput {
            context,
            assessments,
            unscoreable,
        },
    ))
}

/// Score one loan against the context of its whole snapshot.
pub fn score_loan(
    snapshot: &PortfolioSnapshot,
    loan_id: &str,
    config: &ScoringConfig,
    assessed_at: DateTime<Utc>,
) -> LoanRiskResult<RiskAssessment> {
    config.validate()?;
    if !snapshot.loans.iter().any(|l| l.id == loan_id) {
        return Err(LoanRiskError::invalid(
            "loan_id",
            format!("no loan '{loan_id}' in snapshot"),
        ));
    }

    let customers = snapshot.customer_index();
    let (valid, unscoreable) = partition_loans(snapshot, &customers);

    let (loan, customer) = match valid.iter().find(|(l, _)| l.id == loan_id) {
        Some(&pair) => pair,
        None => {
            let reason = unscoreable
                .into_iter()
                .find(|u| u.loan_id == loan_id)
                .map(|u| u.reason)
                .unwrap_or_else(|| "loan could not be scored".into());
            return Err(LoanRiskError::malformed(loan_id, reason));
        }
    };

    let context = PortfolioContext::build(
        valid.iter().map(|(l, _)| *l).filter(|l| !l.is_closed()),
        &customers,
    );

    let repayments = snapshot.repayments_by_loan();
    let history = repayments
        .get(loan.id.as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    Ok(assess_loan(loan, customer, history, &context, config, snapshot.as_of, assessed_at))
}

/// Run the per-loan pipeline for an already validated loan.
pub fn assess_loan(
    loan: &LoanRecord,
    customer: &CustomerRecord,
    repayments: &[&RepaymentRecord],
    context: &PortfolioContext,
    config: &ScoringConfig,
    as_of: NaiveDate,
    assessed_at: DateTime<Utc>,
) -> RiskAssessment {
    let delinquency = analyze_delinquency(repayments, &config.delinquency);
    let credit_profile = credit_profile_score(customer.credit_score, customer.dti_ratio, &config.credit);
    let loan_characteristics = loan_characteristics_score(
        &LoanCharacteristics {
            outstanding_ratio: loan.outstanding_ratio(),
            sector: loan.sector,
            age_months: loan.age_months(as_of),
            delinquency_score: delinquency.score,
            status: loan.status,
        },
        &config.loan,
    );
    let concentration = concentration_penalty(loan.sector, &customer.geography, context, &config.concentration);

    let assessment = compose_assessment(
        CompositeInput {
            loan,
            customer,
            delinquency,
            credit_profile,
            loan_characteristics,
            concentration,
        },
        config,
        assessed_at,
    );

    debug!(
        loan_id = %assessment.loan_id,
        risk_score = %assessment.risk_score,
        category = %assessment.risk_category,
        "loan scored"
    );
    assessment
}

/// Split a snapshot into scoreable loans (with their customers) and
/// unscoreable ones. Only the first occurrence of a loan id is considered.
fn partition_loans<'a>(
    snapshot: &'a PortfolioSnapshot,
    customers: &HashMap<&str, &'a CustomerRecord>,
) -> (Vec<(&'a LoanRecord, &'a CustomerRecord)>, Vec<UnscoreableLoan>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut valid = Vec::new();
    let mut unscoreable = Vec::new();

    for loan in &snapshot.loans {
        let checked = if seen.insert(loan.id.as_str()) {
            validate_loan(loan, customers.get(loan.customer_id.as_str()).copied())
        } else {
            Err(LoanRiskError::malformed(&loan.id, "duplicate loan id"))
        };
        match checked {
            Ok(customer) => valid.push((loan, customer)),
            Err(e) => {
                let reason = match e {
                    LoanRiskError::MalformedInput { reason, .. } => reason,
                    other => other.to_string(),
                };
                warn!(loan_id = %loan.id, reason = %reason, "loan is unscoreable");
                unscoreable.push(UnscoreableLoan {
                    loan_id: loan.id.clone(),
                    reason,
                });
            }
        }
    }
    (valid, unscoreable)
}

/// Check a single loan's data quality and resolve its customer.
pub fn validate_loan<'a>(
    loan: &LoanRecord,
    customer: Option<&'a CustomerRecord>,
) -> LoanRiskResult<&'a CustomerRecord> {
    let customer = customer.ok_or_else(|| {
        LoanRiskError::malformed(&loan.id, format!("customer '{}' not found", loan.customer_id))
    })?;

    if loan.principal <= Money::ZERO {
        return Err(LoanRiskError::malformed(&loan.id, "principal must be positive"));
    }
    if loan.outstanding < Money::ZERO {
        return Err(LoanRiskError::malformed(&loan.id, "outstanding amount is negative"));
    }
    if loan.outstanding > loan.principal {
        return Err(LoanRiskError::malformed(
            &loan.id,
            format!(
                "outstanding {} exceeds principal {}",
                loan.outstanding, loan.principal
            ),
        ));
    }
    if loan.interest_rate < Percent::ZERO {
        return Err(LoanRiskError::malformed(&loan.id, "interest rate is negative"));
    }
    if loan.is_closed() && loan.outstanding > Money::ZERO {
        return Err(LoanRiskError::malformed(&loan.id, "closed loan has an outstanding balance"));
    }
    if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&customer.credit_score) {
        return Err(LoanRiskError::malformed(
            &loan.id,
            format!("credit score {} outside 300-850", customer.credit_score),
        ));
    }
    if customer.dti_ratio < Percent::ZERO || customer.dti_ratio > Percent::ONE_HUNDRED {
        return Err(LoanRiskError::malformed(
            &loan.id,
            format!("DTI {} outside 0-100", customer.dti_ratio),
        ));
    }
    Ok(customer)
}

/// Assessments keyed by loan id.
pub fn index_assessments(assessments: &[RiskAssessment]) -> HashMap<&str, &RiskAssessment> {
    assessments.iter().map(|a| (a.loan_id.as_str(), a)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EmploymentStatus, LoanStatus, PaymentStatus, Sector};
    use crate::scoring::composite::RiskCategory;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn customer(id: &str, city: &str, credit_score: u16, dti: Percent) -> CustomerRecord {
        CustomerRecord {
            id: id.into(),
            credit_score,
            dti_ratio: dti,
            employment_status: EmploymentStatus::Salaried,
            geography: city.into(),
            age: 38,
            monthly_income: dec!(120_000),
        }
    }

    fn loan(id: &str, cust: &str, sector: Sector, principal: Money, outstanding: Money) -> LoanRecord {
        LoanRecord {
            id: id.into(),
            customer_id: cust.into(),
            principal,
            outstanding,
            disbursement_date: NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(),
            tenure_months: 36,
            interest_rate: dec!(12),
            sector,
            status: LoanStatus::Active,
            product: None,
        }
    }

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot {
            loans: vec![
                loan("L1", "C1", Sector::Retail, dec!(1_000_000), dec!(500_000)),
                loan("L2", "C2", Sector::It, dec!(1_000_000), dec!(500_000)),
                loan("L3", "C9", Sector::Retail, dec!(1_000_000), dec!(900_000)),
                loan("L4", "C2", Sector::Retail, dec!(100_000), dec!(200_000)),
            ],
            customers: vec![
                customer("C1", "Mumbai", 780, dec!(25)),
                customer("C2", "Pune", 640, dec!(45)),
            ],
            repayments: vec![],
            as_of: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    #[test]
    fn test_malformed_loans_do_not_abort_batch() {
        let out = score_portfolio(&snapshot(), &ScoringConfig::default(), at()).unwrap();
        let r = &out.result;
        assert_eq!(r.assessments.len(), 2);
        assert_eq!(r.unscoreable.len(), 2);
        assert_eq!(r.unscoreable[0].loan_id, "L3");
        assert!(r.unscoreable[0].reason.contains("not found"));
        assert_eq!(r.unscoreable[1].loan_id, "L4");
        assert!(r.unscoreable[1].reason.contains("exceeds principal"));
        assert_eq!(out.warnings, vec!["2 loan(s) could not be scored".to_string()]);
    }

    #[test]
    fn test_context_excludes_malformed_loans() {
        let out = score_portfolio(&snapshot(), &ScoringConfig::default(), at()).unwrap();
        assert_eq!(out.result.context.total_loans, 2);
        assert_eq!(out.result.context.total_exposure, dec!(1_000_000));
    }

    #[test]
    fn test_end_to_end_score() {
        let out = score_portfolio(&snapshot(), &ScoringConfig::default(), at()).unwrap();
        let a = &out.result.assessments[0];
        assert_eq!(a.loan_id, "L1");
        // delinquency 0, credit 10, loan chars 0.5*30 + 35 - 10 = 40,
        // concentration 50 + 30 = 80
        assert_eq!(a.components.delinquency, dec!(0));
        assert_eq!(a.components.credit_profile, dec!(10));
        assert_eq!(a.components.loan_characteristics, dec!(40));
        assert_eq!(a.components.concentration, dec!(80));
        // 0 + 3 + 8 + 8
        assert_eq!(a.risk_score, dec!(19));
        assert_eq!(a.risk_category, RiskCategory::Low);
        assert!(a.flags.sector_concentration);
        assert!(a.flags.geography_risk);
        assert_eq!(a.recommendations, vec!["Portfolio over-exposed to RETAIL sector".to_string()]);
        assert_eq!(a.sector_share_pct, dec!(50));
        assert_eq!(a.assessed_at, at());
    }

    #[test]
    fn test_duplicate_loan_id_is_unscoreable() {
        let mut s = snapshot();
        s.loans.truncate(2);
        s.loans.push(loan("L1", "C1", Sector::It, dec!(10), dec!(5)));
        let out = score_portfolio(&s, &ScoringConfig::default(), at()).unwrap();
        assert_eq!(out.result.assessments.len(), 2);
        assert_eq!(
            out.result.unscoreable,
            vec![UnscoreableLoan {
                loan_id: "L1".into(),
                reason: "duplicate loan id".into()
            }]
        );
    }

    #[test]
    fn test_validation_rules() {
        let c = customer("C1", "Mumbai", 720, dec!(30));
        let mut l = loan("L1", "C1", Sector::It, dec!(100), dec!(50));
        assert!(validate_loan(&l, Some(&c)).is_ok());

        l.status = LoanStatus::Closed;
        assert!(validate_loan(&l, Some(&c)).is_err());
        l.outstanding = dec!(0);
        assert!(validate_loan(&l, Some(&c)).is_ok());

        l.principal = dec!(0);
        assert!(validate_loan(&l, Some(&c)).is_err());

        let l = loan("L1", "C1", Sector::It, dec!(100), dec!(50));
        let bad_score = customer("C1", "Mumbai", 900, dec!(30));
        assert!(validate_loan(&l, Some(&bad_score)).is_err());
        let bad_dti = customer("C1", "Mumbai", 700, dec!(101));
        assert!(validate_loan(&l, Some(&bad_dti)).is_err());
    }

    #[test]
    fn test_repayments_flow_into_delinquency() {
        let mut s = snapshot();
        for (month, dpd) in [(1u32, 0u32), (2, 0), (3, 0), (4, 0), (5, 20), (6, 25)] {
            s.repayments.push(RepaymentRecord {
                loan_id: "L2".into(),
                due_date: NaiveDate::from_ymd_opt(2024, month, 5).unwrap(),
                emi_amount: dec!(30_000),
                payment_date: None,
                payment_amount: Some(dec!(30_000)),
                dpd,
                payment_status: if dpd == 0 {
                    PaymentStatus::Paid
                } else {
                    PaymentStatus::Delayed
                },
            });
        }
        let out = score_portfolio(&s, &ScoringConfig::default(), at()).unwrap();
        let a = &out.result.assessments[1];
        assert_eq!(a.loan_id, "L2");
        assert_eq!(a.delinquency.max_dpd, 25);
        assert_eq!(a.delinquency.consecutive_delays, 2);
        assert!(a.flags.high_dpd);
        assert!(a
            .recommendations
            .contains(&"Review repayment capacity".to_string()));
    }

    #[test]
    fn test_score_loan_matches_batch() {
        let batch = score_portfolio(&snapshot(), &ScoringConfig::default(), at()).unwrap();
        let single = score_loan(&snapshot(), "L1", &ScoringConfig::default(), at()).unwrap();
        assert_eq!(single, batch.result.assessments[0]);
    }

    #[test]
    fn test_score_loan_ignores_duplicate_exposure() {
        let mut s = snapshot();
        s.loans.truncate(2);
        s.loans.push(loan("L2", "C2", Sector::Retail, dec!(900_000), dec!(900_000)));
        let batch = score_portfolio(&s, &ScoringConfig::default(), at()).unwrap();
        let single = score_loan(&s, "L1", &ScoringConfig::default(), at()).unwrap();
        assert_eq!(single, batch.result.assessments[0]);
        let again = score_loan(&s, "L2", &ScoringConfig::default(), at()).unwrap();
        assert_eq!(again, batch.result.assessments[1]);
    }

    #[test]
    fn test_score_loan_errors() {
        let cfg = ScoringConfig::default();
        assert!(matches!(
            score_loan(&snapshot(), "L3", &cfg, at()),
            Err(LoanRiskError::MalformedInput { .. })
        ));
        assert!(matches!(
            score_loan(&snapshot(), "NOPE", &cfg, at()),
            Err(LoanRiskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.delinquency = dec!(0.5);
        assert!(score_portfolio(&snapshot(), &cfg, at()).is_err());
    }
}
