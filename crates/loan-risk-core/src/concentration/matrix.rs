//! Sector x geography concentration matrix.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::concentration::report::UNKNOWN_GEOGRAPHY;
use crate::invariants::{enforce, verify_percentage_total};
use crate::records::{PortfolioSnapshot, Sector};
use crate::types::{pct_of, Money, Percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub sector: Sector,
    pub geography: String,
    pub loan_count: u64,
    pub exposure: Money,
    pub pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationMatrix {
    pub total_exposure: Money,
    pub sectors: Vec<Sector>,
    pub geographies: Vec<String>,
    /// Populated cells only, largest exposure first.
    pub cells: Vec<MatrixCell>,
}

impl ConcentrationMatrix {
    pub fn cell(&self, sector: Sector, geography: &str) -> Option<&MatrixCell> {
        self.cells
            .iter()
            .find(|c| c.sector == sector && c.geography == geography)
    }
}

/// Cross-tabulate outstanding exposure by sector and customer geography.
pub fn sector_geography_matrix(snapshot: &PortfolioSnapshot) -> ConcentrationMatrix {
    let customers = snapshot.customer_index();
    let mut grid: BTreeMap<(Sector, String), (u64, Money)> = BTreeMap::new();
    let mut total_exposure = Decimal::ZERO;

    for loan in snapshot.exposure_loans() {
        let geography = customers
            .get(loan.customer_id.as_str())
            .map(|c| c.geography.clone())
            .unwrap_or_else(|| UNKNOWN_GEOGRAPHY.to_string());
        let entry = grid.entry((loan.sector, geography)).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += loan.outstanding;
        total_exposure += loan.outstanding;
    }

    let sectors: BTreeSet<Sector> = grid.keys().map(|(s, _)| *s).collect();
    let geographies: BTreeSet<String> = grid.keys().map(|(_, g)| g.clone()).collect();

    let mut cells: Vec<MatrixCell> = grid
        .into_iter()
        .map(|((sector, geography), (loan_count, exposure))| MatrixCell {
            sector,
            geography,
            loan_count,
            exposure,
            pct: pct_of(exposure, total_exposure),
        })
        .collect();
    cells.sort_by(|a, b| {
        b.exposure
            .cmp(&a.exposure)
            .then_with(|| a.sector.cmp(&b.sector))
            .then_with(|| a.geography.cmp(&b.geography))
    });

    let pcts: Vec<Percent> = cells.iter().map(|c| c.pct).collect();
    enforce(verify_percentage_total("sector x geography", &pcts));

    ConcentrationMatrix {
        total_exposure,
        sectors: sectors.into_iter().collect(),
        geographies: geographies.into_iter().collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CustomerRecord, EmploymentStatus, LoanRecord, LoanStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn snapshot() -> PortfolioSnapshot {
        let loan = |id: &str, cust: &str, sector: Sector, amt: Money| LoanRecord {
            id: id.into(),
            customer_id: cust.into(),
            principal: amt,
            outstanding: amt,
            disbursement_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
            tenure_months: 24,
            interest_rate: dec!(13.25),
            sector,
            status: LoanStatus::Active,
            product: None,
        };
        let customer = |id: &str, city: &str| CustomerRecord {
            id: id.into(),
            credit_score: 680,
            dti_ratio: dec!(42),
            employment_status: EmploymentStatus::BusinessOwner,
            geography: city.into(),
            age: 50,
            monthly_income: dec!(75_000),
        };
        PortfolioSnapshot {
            loans: vec![
                loan("L1", "C1", Sector::Retail, dec!(400)),
                loan("L2", "C2", Sector::Retail, dec!(300)),
                loan("L3", "C1", Sector::Agriculture, dec!(200)),
                loan("L4", "C3", Sector::Retail, dec!(100)),
            ],
            customers: vec![
                customer("C1", "Indore"),
                customer("C2", "Bhopal"),
                customer("C3", "Indore"),
            ],
            repayments: vec![],
            as_of: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_matrix_cells() {
        let m = sector_geography_matrix(&snapshot());
        assert_eq!(m.total_exposure, dec!(1000));
        assert_eq!(m.cells.len(), 3);
        let cell = m.cell(Sector::Retail, "Indore").unwrap();
        assert_eq!(cell.loan_count, 2);
        assert_eq!(cell.exposure, dec!(500));
        assert_eq!(cell.pct, dec!(50));
        assert_eq!(m.cells[0].geography, "Indore");
        assert_eq!(m.geographies, vec!["Bhopal".to_string(), "Indore".to_string()]);
    }

    #[test]
    fn test_matrix_percentages_total_100() {
        let m = sector_geography_matrix(&snapshot());
        let total: Decimal = m.cells.iter().map(|c| c.pct).sum();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_empty_matrix() {
        let mut s = snapshot();
        s.loans.clear();
        let m = sector_geography_matrix(&s);
        assert!(m.cells.is_empty());
        assert_eq!(m.total_exposure, Decimal::ZERO);
    }
}
