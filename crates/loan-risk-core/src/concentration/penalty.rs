//! Per-loan concentration penalty.
//!
//! Looks up the loan's sector and geography shares in the portfolio context
//! and adds the penalty for the highest threshold crossed in each dimension.
//! Thresholds come from the same table the portfolio report uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::concentration::context::PortfolioContext;
use crate::config::ConcentrationThresholds;
use crate::records::Sector;
use crate::types::{clamp_score, Percent, Score};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationPenalty {
    pub sector_share_pct: Percent,
    pub geography_share_pct: Percent,
    pub sector_penalty: Score,
    pub geography_penalty: Score,
    /// Sub-score, clamped to [0, 100].
    pub score: Score,
    /// Sector share is above the high threshold.
    pub sector_over_limit: bool,
    /// Geography share is above the high threshold.
    pub geography_over_limit: bool,
}

pub fn concentration_penalty(
    sector: Sector,
    geography: &str,
    context: &PortfolioContext,
    thresholds: &ConcentrationThresholds,
) -> ConcentrationPenalty {
    let sector_share_pct = context.sector_share(sector);
    let geography_share_pct = context.geography_share(geography);

    let sector_penalty = tiered_penalty(
        sector_share_pct,
        (thresholds.sector_high_pct, thresholds.sector_high_penalty),
        (thresholds.sector_elevated_pct, thresholds.sector_elevated_penalty),
    );
    let geography_penalty = tiered_penalty(
        geography_share_pct,
        (thresholds.geography_high_pct, thresholds.geography_high_penalty),
        (thresholds.geography_elevated_pct, thresholds.geography_elevated_penalty),
    );

    ConcentrationPenalty {
        sector_share_pct,
        geography_share_pct,
        sector_penalty,
        geography_penalty,
        score: clamp_score(sector_penalty + geography_penalty),
        sector_over_limit: sector_share_pct > thresholds.sector_high_pct,
        geography_over_limit: geography_share_pct > thresholds.geography_high_pct,
    }
}

/// Higher threshold wins; the two tiers never stack.
fn tiered_penalty(share: Percent, high: (Percent, Score), elevated: (Percent, Score)) -> Score {
    if share > high.0 {
        high.1
    } else if share > elevated.0 {
        elevated.1
    } else {
        Decimal::ZERO
    }
}
