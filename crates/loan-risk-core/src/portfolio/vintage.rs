//! Vintage cohorts by disbursement quarter.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::invariants::{enforce, verify_percentage_total};
use crate::records::{latest_dpd, LoanStatus, PortfolioSnapshot};
use crate::types::{pct_of, Money, Percent};

/// Latest DPD at or above which a loan counts as delinquent in its cohort.
pub const VINTAGE_DELINQUENT_DPD: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VintageCohort {
    /// Disbursement quarter, e.g. `2023-Q2`.
    pub vintage: String,
    pub loan_count: u64,
    pub disbursed_principal: Money,
    pub outstanding: Money,
    pub npa_count: u64,
    pub delinquent_count: u64,
    /// delinquent_count / loan_count, percent.
    pub delinquency_rate: Percent,
    /// Cohort outstanding / total outstanding, percent.
    pub outstanding_share_pct: Percent,
}

#[derive(Default)]
struct CohortTotals {
    loan_count: u64,
    disbursed_principal: Money,
    outstanding: Money,
    npa_count: u64,
    delinquent_count: u64,
}

pub fn vintage_label(date: NaiveDate) -> String {
    format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1)
}

/// Group every loan with a usable outstanding amount by disbursement quarter,
/// oldest first.
pub fn vintage_analysis(snapshot: &PortfolioSnapshot) -> Vec<VintageCohort> {
    let repayments = snapshot.repayments_by_loan();
    let mut cohorts: BTreeMap<String, CohortTotals> = BTreeMap::new();
    let mut total_outstanding = Decimal::ZERO;

    for loan in snapshot.loans.iter().filter(|l| l.outstanding >= Money::ZERO) {
        let dpd = repayments
            .get(loan.id.as_str())
            .map(|h| latest_dpd(h))
            .unwrap_or(0);
        let c = cohorts.entry(vintage_label(loan.disbursement_date)).or_default();
        c.loan_count += 1;
        c.disbursed_principal += loan.principal;
        c.outstanding += loan.outstanding;
        if loan.status == LoanStatus::Npa {
            c.npa_count += 1;
        }
        if dpd >= VINTAGE_DELINQUENT_DPD {
            c.delinquent_count += 1;
        }
        total_outstanding += loan.outstanding;
    }

    let result: Vec<VintageCohort> = cohorts
        .into_iter()
        .map(|(vintage, c)| VintageCohort {
            vintage,
            loan_count: c.loan_count,
            disbursed_principal: c.disbursed_principal,
            outstanding: c.outstanding,
            npa_count: c.npa_count,
            delinquent_count: c.delinquent_count,
            delinquency_rate: pct_of(Decimal::from(c.delinquent_count), Decimal::from(c.loan_count)),
            outstanding_share_pct: pct_of(c.outstanding, total_outstanding),
        })
        .collect();

    let shares: Vec<Percent> = result.iter().map(|c| c.outstanding_share_pct).collect();
    enforce(verify_percentage_total("vintage outstanding", &shares));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{LoanRecord, PaymentStatus, RepaymentRecord, Sector};
    use rust_decimal_macros::dec;

    fn loan(id: &str, disbursed: (i32, u32), outstanding: Money, status: LoanStatus) -> LoanRecord {
        LoanRecord {
            id: id.into(),
            customer_id: "C1".into(),
            principal: dec!(1_000),
            outstanding,
            disbursement_date: NaiveDate::from_ymd_opt(disbursed.0, disbursed.1, 15).unwrap(),
            tenure_months: 36,
            interest_rate: dec!(11),
            sector: Sector::Agriculture,
            status,
            product: None,
        }
    }

    #[test]
    fn test_quarter_labels() {
        assert_eq!(vintage_label(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()), "2023-Q1");
        assert_eq!(vintage_label(NaiveDate::from_ymd_opt(2023, 6, 30).unwrap()), "2023-Q2");
        assert_eq!(vintage_label(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()), "2023-Q4");
    }

    #[test]
    fn test_cohorts() {
        let snapshot = PortfolioSnapshot {
            loans: vec![
                loan("L1", (2024, 2), dec!(900), LoanStatus::Active),
                loan("L2", (2023, 4), dec!(600), LoanStatus::Npa),
                loan("L3", (2023, 5), dec!(500), LoanStatus::Active),
                loan("L4", (2023, 5), dec!(0), LoanStatus::Closed),
            ],
            customers: vec![],
            repayments: vec![RepaymentRecord {
                loan_id: "L2".into(),
                due_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                emi_amount: dec!(40),
                payment_date: None,
                payment_amount: None,
                dpd: 62,
                payment_status: PaymentStatus::Missed,
            }],
            as_of: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        let cohorts = vintage_analysis(&snapshot);
        assert_eq!(cohorts.len(), 2);

        let q2 = &cohorts[0];
        assert_eq!(q2.vintage, "2023-Q2");
        assert_eq!(q2.loan_count, 3);
        assert_eq!(q2.disbursed_principal, dec!(3_000));
        assert_eq!(q2.outstanding, dec!(1_100));
        assert_eq!(q2.npa_count, 1);
        assert_eq!(q2.delinquent_count, 1);
        assert_eq!(q2.outstanding_share_pct, dec!(55));

        assert_eq!(cohorts[1].vintage, "2024-Q1");
        assert_eq!(cohorts[1].delinquency_rate, Decimal::ZERO);
        assert_eq!(cohorts[1].outstanding_share_pct, dec!(45));
    }
}
