//! Portfolio concentration report.
//!
//! Covers:
//! 1. **Ranked breakdowns** -- sector, geography, borrower and product exposure
//!    with percentage of total.
//! 2. **HHI per dimension** -- with LOW / MODERATE / HIGH classification.
//! 3. **Borrower limits** -- top-10 / top-20 share and single-name breaches.
//! 4. **Overall level** -- mean of the sector, geography and borrower levels.
//! 5. **Diversification recommendations**.
//!
//! An empty portfolio is not an error: every share and HHI is zero and all
//! levels are LOW.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::concentration::hhi::{classify_hhi, combined_level, herfindahl_index, ConcentrationLevel};
use crate::config::{ConcentrationThresholds, ScoringConfig};
use crate::invariants::{enforce, verify_hhi_range, verify_percentage_total};
use crate::records::{LoanRecord, PortfolioSnapshot};
use crate::types::{pct_of, with_metadata, ComputationOutput, Money, Percent};
use crate::LoanRiskResult;

/// Geography label for loans whose customer record is missing.
pub const UNKNOWN_GEOGRAPHY: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Exposure held in one bucket of a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureBucket {
    pub name: String,
    pub exposure: Money,
    pub pct: Percent,
    pub loan_count: u64,
}

/// Ranked breakdown of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionConcentration {
    /// Sorted by exposure, largest first.
    pub buckets: Vec<ExposureBucket>,
    pub hhi: Decimal,
    pub risk_level: ConcentrationLevel,
}

/// A borrower above the single-name limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleNameBreach {
    pub borrower_id: String,
    pub exposure: Money,
    pub pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerConcentration {
    #[serde(flatten)]
    pub breakdown: DimensionConcentration,
    pub top10_pct: Percent,
    pub top20_pct: Percent,
    pub single_name_breaches: Vec<SingleNameBreach>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationReport {
    pub total_exposure: Money,
    pub loan_count: u64,
    pub sector: DimensionConcentration,
    pub geography: DimensionConcentration,
    pub borrower: BorrowerConcentration,
    pub product: DimensionConcentration,
    pub overall_risk_level: ConcentrationLevel,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Build the concentration report over the snapshot's non-closed loans.
pub fn concentration_report(
    snapshot: &PortfolioSnapshot,
    thresholds: &ConcentrationThresholds,
) -> ConcentrationReport {
    let customers = snapshot.customer_index();
    let rows: Vec<(&LoanRecord, &str)> = snapshot
        .exposure_loans()
        .map(|loan| {
            let geography = customers
                .get(loan.customer_id.as_str())
                .map(|c| c.geography.as_str())
                .unwrap_or(UNKNOWN_GEOGRAPHY);
            (loan, geography)
        })
        .collect();

    let total_exposure: Money = rows.iter().map(|(l, _)| l.outstanding).sum();

    let sector = build_dimension("sector", &rows, total_exposure, thresholds, |l, _| {
        l.sector.to_string()
    });
    let geography = build_dimension("geography", &rows, total_exposure, thresholds, |_, g| {
        g.to_string()
    });
    let borrower_breakdown = build_dimension("borrower", &rows, total_exposure, thresholds, |l, _| {
        l.customer_id.clone()
    });
    let product = build_dimension("product", &rows, total_exposure, thresholds, |l, _| {
        l.product_label()
    });

    let borrower = borrower_limits(borrower_breakdown, thresholds);

    let overall_risk_level = combined_level(
        &[sector.risk_level, geography.risk_level, borrower.breakdown.risk_level],
        thresholds,
    );

    let recommendations = diversification_recommendations(&sector, &geography, &borrower, thresholds);

    ConcentrationReport {
        total_exposure,
        loan_count: rows.len() as u64,
        sector,
        geography,
        borrower,
        product,
        overall_risk_level,
        recommendations,
    }
}

/// Concentration report wrapped in the standard output envelope.
pub fn analyze_concentration(
    snapshot: &PortfolioSnapshot,
    config: &ScoringConfig,
) -> LoanRiskResult<ComputationOutput<ConcentrationReport>> {
    let start = Instant::now();
    config.validate()?;

    let report = concentration_report(snapshot, &config.concentration);

    let mut warnings = Vec::new();
    if report.loan_count == 0 {
        warnings.push("Portfolio has no open loans; all concentration measures are zero.".into());
    }
    if !report.borrower.single_name_breaches.is_empty() {
        warnings.push(format!(
            "{} borrower(s) breach the single-name limit.",
            report.borrower.single_name_breaches.len()
        ));
    }

    let assumptions = serde_json::json!({
        "exposure_measure": "outstanding amount of non-closed loans",
        "hhi": "sum of squared percentage shares (0-10000)",
        "overall_level": "mean of sector, geography and borrower levels",
        "missing_customer_geography": UNKNOWN_GEOGRAPHY,
    });

    Ok(with_metadata(
        "Herfindahl-Hirschman concentration analysis",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_dimension<F>(
    dimension: &str,
    rows: &[(&LoanRecord, &str)],
    total: Money,
    thresholds: &ConcentrationThresholds,
    key_fn: F,
) -> DimensionConcentration
where
    F: Fn(&LoanRecord, &str) -> String,
{
    let mut map: BTreeMap<String, (Money, u64)> = BTreeMap::new();
    for &(loan, geography) in rows {
        let entry = map.entry(key_fn(loan, geography)).or_insert((Decimal::ZERO, 0));
        entry.0 += loan.outstanding;
        entry.1 += 1;
    }
    let mut buckets: Vec<ExposureBucket> = map
        .into_iter()
        .map(|(name, (exposure, loan_count))| ExposureBucket {
            name,
            exposure,
            pct: pct_of(exposure, total),
            loan_count,
        })
        .collect();
    buckets.sort_by(|a, b| b.exposure.cmp(&a.exposure).then_with(|| a.name.cmp(&b.name)));

    let pcts: Vec<Percent> = buckets.iter().map(|b| b.pct).collect();
    enforce(verify_percentage_total(dimension, &pcts));

    let mut hhi = herfindahl_index(pcts);
    if !enforce(verify_hhi_range(dimension, hhi)) {
        hhi = hhi.clamp(Decimal::ZERO, Decimal::from(10_000));
    }

    DimensionConcentration {
        buckets,
        hhi,
        risk_level: classify_hhi(hhi, thresholds),
    }
}

fn borrower_limits(
    breakdown: DimensionConcentration,
    thresholds: &ConcentrationThresholds,
) -> BorrowerConcentration {
    let cumulative = |n: usize| -> Percent { breakdown.buckets.iter().take(n).map(|b| b.pct).sum() };
    let top10_pct = cumulative(10);
    let top20_pct = cumulative(20);
    let single_name_breaches = breakdown
        .buckets
        .iter()
        .filter(|b| b.pct > thresholds.single_name_limit_pct)
        .map(|b| SingleNameBreach {
            borrower_id: b.name.clone(),
            exposure: b.exposure,
            pct: b.pct,
        })
        .collect();
    BorrowerConcentration {
        breakdown,
        top10_pct,
        top20_pct,
        single_name_breaches,
    }
}

fn diversification_recommendations(
    sector: &DimensionConcentration,
    geography: &DimensionConcentration,
    borrower: &BorrowerConcentration,
    thresholds: &ConcentrationThresholds,
) -> Vec<String> {
    let mut recs = Vec::new();

    if sector.hhi > thresholds.hhi_high {
        recs.push(format!(
            "Sector concentration is high (HHI {}); diversify lending across sectors.",
            sector.hhi.round_dp(0)
        ));
    }
    if geography.hhi > thresholds.hhi_high {
        recs.push(format!(
            "Geographic concentration is high (HHI {}); expand lending into under-represented regions.",
            geography.hhi.round_dp(0)
        ));
    }
    if !borrower.single_name_breaches.is_empty() {
        recs.push(format!(
            "{} borrower(s) exceed the {}% single-name limit; reduce exposure to the largest names.",
            borrower.single_name_breaches.len(),
            thresholds.single_name_limit_pct
        ));
    }
    if borrower.top10_pct > thresholds.top10_limit_pct {
        recs.push(format!(
            "Top-10 borrowers hold {}% of exposure (limit {}%); broaden the borrower base.",
            borrower.top10_pct.round_dp(2),
            thresholds.top10_limit_pct
        ));
    }
    if let Some(largest) = sector.buckets.first() {
        if largest.pct > thresholds.largest_sector_limit_pct {
            recs.push(format!(
                "Largest sector {} holds {}% of exposure; cap new lending to it.",
                largest.name,
                largest.pct.round_dp(2)
            ));
        }
    }
    recs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
