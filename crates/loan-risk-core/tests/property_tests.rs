use chrono::{NaiveDate, TimeZone, Utc};
use loan_risk_core::concentration::report::concentration_report;
use loan_risk_core::config::ScoringConfig;
use loan_risk_core::portfolio::par::par_cascade;
use loan_risk_core::records::{
    CustomerRecord, EmploymentStatus, LoanRecord, LoanStatus, PaymentStatus, PortfolioSnapshot,
    RepaymentRecord, Sector,
};
use loan_risk_core::scoring::composite::categorize;
use loan_risk_core::scoring::engine::score_portfolio;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CITIES: [&str; 4] = ["Ahmedabad", "Hyderabad", "Kolkata", "Bhopal"];
const STATUSES: [LoanStatus; 4] = [
    LoanStatus::Active,
    LoanStatus::Active,
    LoanStatus::Npa,
    LoanStatus::Restructured,
];

#[derive(Debug, Clone)]
struct LoanShape {
    sector: usize,
    principal: u64,
    repaid_pct: u64,
    city: usize,
    credit_score: u16,
    dti: u32,
    status: usize,
    closed: bool,
    dpds: Vec<u32>,
}

prop_compose! {
    fn arb_loan()(
        sector in 0usize..6,
        principal in 10_000u64..5_000_000,
        repaid_pct in 0u64..=100,
        city in 0usize..4,
        credit_score in 300u16..=850,
        dti in 0u32..=100,
        status in 0usize..4,
        closed in prop::bool::weighted(0.1),
        dpds in prop::collection::vec(0u32..180, 0..10),
    ) -> LoanShape {
        LoanShape { sector, principal, repaid_pct, city, credit_score, dti, status, closed, dpds }
    }
}

prop_compose! {
    fn arb_snapshot()(shapes in prop::collection::vec(arb_loan(), 0..25)) -> PortfolioSnapshot {
        build(&shapes)
    }
}

fn build(shapes: &[LoanShape]) -> PortfolioSnapshot {
    let mut loans = Vec::new();
    let mut customers = Vec::new();
    let mut repayments = Vec::new();

    for (i, s) in shapes.iter().enumerate() {
        let principal = Decimal::from(s.principal);
        let outstanding = if s.closed {
            Decimal::ZERO
        } else {
            principal * Decimal::from(100 - s.repaid_pct) / dec!(100)
        };
        loans.push(LoanRecord {
            id: format!("L{i}"),
            customer_id: format!("C{i}"),
            principal,
            outstanding,
            disbursement_date: NaiveDate::from_ymd_opt(2021 + (i % 3) as i32, 1 + (i % 12) as u32, 10)
                .unwrap(),
            tenure_months: 12 * (1 + (i % 5) as u32),
            interest_rate: dec!(12),
            sector: Sector::ALL[s.sector],
            status: if s.closed {
                LoanStatus::Closed
            } else {
                STATUSES[s.status]
            },
            product: None,
        });
        customers.push(CustomerRecord {
            id: format!("C{i}"),
            credit_score: s.credit_score,
            dti_ratio: Decimal::from(s.dti),
            employment_status: EmploymentStatus::Salaried,
            geography: CITIES[s.city].to_string(),
            age: 40,
            monthly_income: dec!(50_000),
        });
        for (m, &dpd) in s.dpds.iter().enumerate() {
            repayments.push(RepaymentRecord {
                loan_id: format!("L{i}"),
                due_date: NaiveDate::from_ymd_opt(2024, 1 + m as u32, 1).unwrap(),
                emi_amount: dec!(10_000),
                payment_date: None,
                payment_amount: Some(dec!(10_000)),
                dpd,
                payment_status: if dpd == 0 {
                    PaymentStatus::Paid
                } else {
                    PaymentStatus::Delayed
                },
            });
        }
    }

    PortfolioSnapshot {
        loans,
        customers,
        repayments,
        as_of: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    }
}

fn within_hundred(total: Decimal) -> bool {
    total.is_zero() || (total - dec!(100)).abs() <= dec!(0.01)
}

proptest! {
    #[test]
    fn prop_scores_in_range_and_categories_consistent(snapshot in arb_snapshot()) {
        let cfg = ScoringConfig::default();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let out = score_portfolio(&snapshot, &cfg, at).unwrap();
        prop_assert_eq!(out.result.assessments.len() + out.result.unscoreable.len(), snapshot.loans.len());
        for a in &out.result.assessments {
            for s in [
                a.components.delinquency,
                a.components.credit_profile,
                a.components.loan_characteristics,
                a.components.concentration,
                a.risk_score,
            ] {
                prop_assert!(s >= Decimal::ZERO && s <= dec!(100));
            }
            prop_assert_eq!(a.risk_category, categorize(a.risk_score, &cfg.categories));
        }
    }

    #[test]
    fn prop_breakdowns_total_one_hundred(snapshot in arb_snapshot()) {
        let r = concentration_report(&snapshot, &ScoringConfig::default().concentration);
        for d in [&r.sector, &r.geography, &r.borrower.breakdown, &r.product] {
            let total: Decimal = d.buckets.iter().map(|b| b.pct).sum();
            prop_assert!(within_hundred(total), "total {}", total);
            prop_assert!(d.hhi >= Decimal::ZERO && d.hhi <= dec!(10000));
        }
    }

    #[test]
    fn prop_par_nested_and_bands_non_negative(snapshot in arb_snapshot()) {
        let c = par_cascade(&snapshot, &[1, 15, 30, 60, 90]).unwrap();
        for w in c.buckets.windows(2) {
            prop_assert!(w[0].pct >= w[1].pct);
            prop_assert!(w[0].loan_count >= w[1].loan_count);
        }
        for b in &c.bands {
            prop_assert!(b.exposure >= Decimal::ZERO);
        }
        let band_loans: u64 = c.bands.iter().map(|b| b.loan_count).sum();
        prop_assert_eq!(band_loans, c.total_loans);
    }

    #[test]
    fn prop_runs_are_idempotent(snapshot in arb_snapshot()) {
        let cfg = ScoringConfig::default();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let a = score_portfolio(&snapshot, &cfg, at).unwrap();
        let b = score_portfolio(&snapshot, &cfg, at).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a.result).unwrap(),
            serde_json::to_string(&b.result).unwrap()
        );
        let ra = concentration_report(&snapshot, &cfg.concentration);
        let rb = concentration_report(&snapshot, &cfg.concentration);
        prop_assert_eq!(serde_json::to_string(&ra).unwrap(), serde_json::to_string(&rb).unwrap());
    }
}
