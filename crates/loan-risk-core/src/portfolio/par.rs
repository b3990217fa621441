//! Portfolio-at-risk cascade.
//!
//! PAR-k is the outstanding of non-closed loans whose latest installment is
//! k or more days past due, as a share of total outstanding. The cascade
//! bands between adjacent thresholds are plain differences of the
//! cumulative values at a single point in time; they are not roll rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ScoringConfig;
use crate::error::LoanRiskError;
use crate::invariants::{enforce, verify_nested, verify_non_negative};
use crate::records::{latest_dpd, PortfolioSnapshot};
use crate::types::{pct_of, with_metadata, ComputationOutput, Money, Percent};
use crate::LoanRiskResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParBucket {
    pub threshold: u32,
    /// e.g. `PAR-30`
    pub label: String,
    pub loan_count: u64,
    pub exposure: Money,
    pub pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeBand {
    /// `current`, `1-14`, ..., `90+`
    pub label: String,
    pub loan_count: u64,
    pub exposure: Money,
    pub pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParCascade {
    pub total_loans: u64,
    pub total_exposure: Money,
    /// Cumulative, ascending threshold.
    pub buckets: Vec<ParBucket>,
    /// Disjoint, from `current` to the open top band.
    pub bands: Vec<CascadeBand>,
}

impl ParCascade {
    pub fn par(&self, threshold: u32) -> Option<&ParBucket> {
        self.buckets.iter().find(|b| b.threshold == threshold)
    }
}

/// Compute PAR-k for each threshold and the bands between them.
pub fn par_cascade(snapshot: &PortfolioSnapshot, thresholds: &[u32]) -> LoanRiskResult<ParCascade> {
    validate_thresholds(thresholds)?;

    let repayments = snapshot.repayments_by_loan();
    let book: Vec<(u32, Money)> = snapshot
        .exposure_loans()
        .map(|loan| {
            let dpd = repayments
                .get(loan.id.as_str())
                .map(|h| latest_dpd(h))
                .unwrap_or(0);
            (dpd, loan.outstanding)
        })
        .collect();

    let total_loans = book.len() as u64;
    let total_exposure: Money = book.iter().map(|(_, amt)| *amt).sum();

    let buckets: Vec<ParBucket> = thresholds
        .iter()
        .map(|&k| {
            let (loan_count, exposure) = book
                .iter()
                .filter(|(dpd, _)| *dpd >= k)
                .fold((0u64, Decimal::ZERO), |(n, e), (_, amt)| (n + 1, e + amt));
            ParBucket {
                threshold: k,
                label: format!("PAR-{k}"),
                loan_count,
                exposure,
                pct: pct_of(exposure, total_exposure),
            }
        })
        .collect();

    let cumulative_pct: Vec<Decimal> = buckets.iter().map(|b| b.pct).collect();
    let cumulative_count: Vec<Decimal> = buckets.iter().map(|b| Decimal::from(b.loan_count)).collect();
    enforce(verify_nested("PAR percentages", &cumulative_pct));
    enforce(verify_nested("PAR counts", &cumulative_count));

    let bands = cascade_bands(&buckets, total_loans, total_exposure);

    Ok(ParCascade {
        total_loans,
        total_exposure,
        buckets,
        bands,
    })
}

/// PAR cascade with the computation envelope, thresholds from config.
pub fn analyze_par(
    snapshot: &PortfolioSnapshot,
    config: &ScoringConfig,
) -> LoanRiskResult<ComputationOutput<ParCascade>> {
    let start = Instant::now();
    config.validate()?;
    let cascade = par_cascade(snapshot, &config.par_thresholds)?;

    let mut warnings = Vec::new();
    if cascade.total_exposure.is_zero() {
        warnings.push("No open exposure; all PAR values are zero.".into());
    }

    let assumptions = serde_json::json!({
        "thresholds": config.par_thresholds,
        "dpd_source": "latest installment by due date",
        "bands": "static differences of cumulative PAR values",
    });

    Ok(with_metadata(
        "Portfolio-at-risk cascade",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        cascade,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_thresholds(thresholds: &[u32]) -> LoanRiskResult<()> {
    if thresholds.is_empty() {
        return Err(LoanRiskError::invalid("par_thresholds", "at least one threshold is required"));
    }
    if thresholds[0] == 0 {
        return Err(LoanRiskError::invalid("par_thresholds", "thresholds must be positive"));
    }
    if thresholds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(LoanRiskError::invalid("par_thresholds", "thresholds must be strictly ascending"));
    }
    Ok(())
}

fn cascade_bands(buckets: &[ParBucket], total_loans: u64, total_exposure: Money) -> Vec<CascadeBand> {
    let mut bands = Vec::with_capacity(buckets.len() + 1);
    let mut upper_count = total_loans;
    let mut upper_exposure = total_exposure;
    let mut label = "current".to_string();

    for b in buckets {
        bands.push(band(&label, upper_count, b.loan_count, upper_exposure, b.exposure, total_exposure));
        label = b.threshold.to_string();
        upper_count = b.loan_count;
        upper_exposure = b.exposure;
    }
    if let Some(last) = buckets.last() {
        bands.push(CascadeBand {
            label: format!("{}+", last.threshold),
            loan_count: last.loan_count,
            exposure: last.exposure,
            pct: last.pct,
        });
    }

    // Ranges read "lower-upper", closed on both ends.
    for (band, next) in bands.iter_mut().skip(1).zip(buckets.iter().skip(1)) {
        band.label = format!("{}-{}", band.label, next.threshold - 1);
    }
    bands
}

fn band(
    label: &str,
    upper_count: u64,
    lower_count: u64,
    upper_exposure: Money,
    lower_exposure: Money,
    total_exposure: Money,
) -> CascadeBand {
    let raw_count = Decimal::from(upper_count) - Decimal::from(lower_count);
    let raw_exposure = upper_exposure - lower_exposure;
    enforce(verify_non_negative(label, raw_count));
    enforce(verify_non_negative(label, raw_exposure));

    let exposure = raw_exposure.max(Decimal::ZERO);
    CascadeBand {
        label: label.to_string(),
        loan_count: upper_count.saturating_sub(lower_count),
        exposure,
        pct: pct_of(exposure, total_exposure),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
