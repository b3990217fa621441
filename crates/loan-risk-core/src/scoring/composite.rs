//! Composite risk score.
//!
//! Covers:
//! 1. **Weighted score** -- four clamped sub-scores combined with fixed weights.
//! 2. **Category** -- LOW / MEDIUM / HIGH on closed upper bounds.
//! 3. **Flags** -- high DPD, sector concentration, geography risk, high DTI.
//! 4. **Recommendations** -- independently gated, fixed priority order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::concentration::penalty::ConcentrationPenalty;
use crate::config::{CategoryThresholds, CompositeWeights, FlagRules, RecommendationRules, ScoringConfig};
use crate::delinquency::analyzer::DelinquencyProfile;
use crate::records::{CustomerRecord, LoanRecord, LoanStatus, Sector};
use crate::types::{clamp_score, round_score, Percent, Score};

pub const REC_URGENT_FOLLOW_UP: &str = "Urgent follow-up required";
pub const REC_PAYMENT_ARRANGEMENT: &str = "Contact customer for payment arrangement";
pub const REC_REPAYMENT_CAPACITY: &str = "Review repayment capacity";
pub const REC_ADDITIONAL_COLLATERAL: &str = "Consider additional collateral";
pub const REC_INCOME_STABILITY: &str = "Assess income stability";
pub const REC_MONITOR_CLOSELY: &str = "Monitor closely";
pub const REC_ROUTINE_MONITORING: &str = "Continue routine monitoring";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskCategory::Low => write!(f, "LOW"),
            RiskCategory::Medium => write!(f, "MEDIUM"),
            RiskCategory::High => write!(f, "HIGH"),
        }
    }
}

/// The four sub-scores, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub delinquency: Score,
    pub credit_profile: Score,
    pub loan_characteristics: Score,
    pub concentration: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub high_dpd: bool,
    pub sector_concentration: bool,
    pub geography_risk: bool,
    pub high_dti: bool,
}

/// Immutable per-loan output of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub loan_id: String,
    pub customer_id: String,
    /// 0-100, one decimal.
    pub risk_score: Score,
    pub risk_category: RiskCategory,
    pub components: ComponentScores,
    pub flags: RiskFlags,
    pub recommendations: Vec<String>,
    pub delinquency: DelinquencyProfile,
    pub sector_share_pct: Percent,
    pub geography_share_pct: Percent,
    pub assessed_at: DateTime<Utc>,
}

/// Everything the composite scorer needs for one loan.
#[derive(Debug, Clone)]
pub struct CompositeInput<'a> {
    pub loan: &'a LoanRecord,
    pub customer: &'a CustomerRecord,
    pub delinquency: DelinquencyProfile,
    pub credit_profile: Score,
    pub loan_characteristics: Score,
    pub concentration: ConcentrationPenalty,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Weighted sum of the clamped sub-scores, rounded to one decimal.
pub fn composite_score(components: &ComponentScores, weights: &CompositeWeights) -> Score {
    let weighted = clamp_score(components.delinquency) * weights.delinquency
        + clamp_score(components.credit_profile) * weights.credit_profile
        + clamp_score(components.loan_characteristics) * weights.loan_characteristics
        + clamp_score(components.concentration) * weights.concentration;
    round_score(clamp_score(weighted))
}

/// LOW <= low_max < MEDIUM <= medium_max < HIGH.
pub fn categorize(score: Score, thresholds: &CategoryThresholds) -> RiskCategory {
    if score <= thresholds.low_max {
        RiskCategory::Low
    } else if score <= thresholds.medium_max {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    }
}

pub fn derive_flags(
    delinquency: &DelinquencyProfile,
    concentration: &ConcentrationPenalty,
    dti_ratio: Percent,
    rules: &FlagRules,
) -> RiskFlags {
    RiskFlags {
        high_dpd: delinquency.max_dpd > rules.high_dpd_above,
        sector_concentration: concentration.sector_over_limit,
        geography_risk: concentration.geography_over_limit,
        high_dti: dti_ratio > rules.high_dti_above,
    }
}

/// Facts the recommendation rules read.
#[derive(Debug, Clone)]
pub struct RecommendationFacts {
    pub risk_score: Score,
    pub category: RiskCategory,
    pub max_dpd: u32,
    pub consecutive_delays: u32,
    pub credit_score: u16,
    pub dti_ratio: Percent,
    pub status: LoanStatus,
    pub sector: Sector,
    pub sector_concentration: bool,
}

/// Every rule is checked; none short-circuits another.
pub fn recommendations(facts: &RecommendationFacts, rules: &RecommendationRules) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();

    if facts.risk_score > rules.urgent_score_above {
        recs.push(REC_URGENT_FOLLOW_UP.into());
    }
    if facts.max_dpd > rules.payment_arrangement_dpd_above {
        recs.push(REC_PAYMENT_ARRANGEMENT.into());
    }
    if facts.consecutive_delays >= rules.repayment_capacity_consecutive {
        recs.push(REC_REPAYMENT_CAPACITY.into());
    }
    if facts.credit_score < rules.collateral_credit_score_below {
        recs.push(REC_ADDITIONAL_COLLATERAL.into());
    }
    if facts.dti_ratio > rules.income_stability_dti_above {
        recs.push(REC_INCOME_STABILITY.into());
    }
    if facts.status == LoanStatus::Restructured {
        recs.push(REC_MONITOR_CLOSELY.into());
    }
    if facts.sector_concentration {
        recs.push(format!("Portfolio over-exposed to {} sector", facts.sector));
    }
    if recs.is_empty() && facts.category == RiskCategory::Low {
        recs.push(REC_ROUTINE_MONITORING.into());
    }
    recs
}

/// Combine sub-scores into the final assessment for one loan.
pub fn compose_assessment(
    input: CompositeInput<'_>,
    config: &ScoringConfig,
    assessed_at: DateTime<Utc>,
) -> RiskAssessment {
    let components = ComponentScores {
        delinquency: clamp_score(input.delinquency.score),
        credit_profile: clamp_score(input.credit_profile),
        loan_characteristics: clamp_score(input.loan_characteristics),
        concentration: clamp_score(input.concentration.score),
    };
    let risk_score = composite_score(&components, &config.weights);
    let risk_category = categorize(risk_score, &config.categories);
    let flags = derive_flags(
        &input.delinquency,
        &input.concentration,
        input.customer.dti_ratio,
        &config.flags,
    );

    let facts = RecommendationFacts {
        risk_score,
        category: risk_category,
        max_dpd: input.delinquency.max_dpd,
        consecutive_delays: input.delinquency.consecutive_delays,
        credit_score: input.customer.credit_score,
        dti_ratio: input.customer.dti_ratio,
        status: input.loan.status,
        sector: input.loan.sector,
        sector_concentration: flags.sector_concentration,
    };
    let recommendations = recommendations(&facts, &config.recommendations);

    RiskAssessment {
        loan_id: input.loan.id.clone(),
        customer_id: input.customer.id.clone(),
        risk_score,
        risk_category,
        components,
        flags,
        recommendations,
        sector_share_pct: input.concentration.sector_share_pct,
        geography_share_pct: input.concentration.geography_share_pct,
        delinquency: input.delinquency,
        assessed_at,
    }
}

impl RiskAssessment {
    pub fn is_high_risk(&self) -> bool {
        self.risk_category == RiskCategory::High
    }

    /// Weighted contribution of each sub-score, in points of the final score.
    pub fn contributions(&self, weights: &CompositeWeights) -> ComponentScores {
        ComponentScores {
            delinquency: self.components.delinquency * weights.delinquency,
            credit_profile: self.components.credit_profile * weights.credit_profile,
            loan_characteristics: self.components.loan_characteristics * weights.loan_characteristics,
            concentration: self.components.concentration * weights.concentration,
        }
    }
}

impl Default for ComponentScores {
    fn default() -> Self {
        ComponentScores {
            delinquency: Decimal::ZERO,
            credit_profile: Decimal::ZERO,
            loan_characteristics: Decimal::ZERO,
            concentration: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
