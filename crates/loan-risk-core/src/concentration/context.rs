//! Portfolio context: exposure totals by sector and geography.
//!
//! Rebuilt from scratch on every scoring run; it has no incremental update
//! path and no identity across runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::records::{CustomerRecord, LoanRecord, PortfolioSnapshot, Sector};
use crate::types::{pct_of, Money, Percent};

/// Exposure aggregates consumed by the per-loan concentration penalty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioContext {
    pub total_loans: u64,
    pub total_exposure: Money,
    pub sector_exposure: BTreeMap<Sector, Money>,
    pub geography_exposure: BTreeMap<String, Money>,
}

impl PortfolioContext {
    /// Aggregate outstanding exposure over `loans`. A loan whose customer is
    /// not in `customers` still counts towards the total and its sector.
    pub fn build<'a, I>(loans: I, customers: &HashMap<&str, &CustomerRecord>) -> Self
    where
        I: IntoIterator<Item = &'a LoanRecord>,
    {
        let mut ctx = PortfolioContext::default();
        for loan in loans {
            ctx.total_loans += 1;
            ctx.total_exposure += loan.outstanding;
            *ctx.sector_exposure.entry(loan.sector).or_insert(Decimal::ZERO) += loan.outstanding;
            if let Some(customer) = customers.get(loan.customer_id.as_str()) {
                *ctx.geography_exposure
                    .entry(customer.geography.clone())
                    .or_insert(Decimal::ZERO) += loan.outstanding;
            }
        }
        ctx
    }

    /// Sector exposure as a percentage of total exposure.
    pub fn sector_share(&self, sector: Sector) -> Percent {
        let exposure = self.sector_exposure.get(&sector).copied().unwrap_or_default();
        pct_of(exposure, self.total_exposure)
    }

    /// Geography exposure as a percentage of total exposure.
    pub fn geography_share(&self, geography: &str) -> Percent {
        let exposure = self
            .geography_exposure
            .get(geography)
            .copied()
            .unwrap_or_default();
        pct_of(exposure, self.total_exposure)
    }

    pub fn is_empty(&self) -> bool {
        self.total_loans == 0
    }
}

/// Build the context over every non-closed loan of a snapshot.
pub fn build_portfolio_context(snapshot: &PortfolioSnapshot) -> PortfolioContext {
    PortfolioContext::build(snapshot.exposure_loans(), &snapshot.customer_index())
}
