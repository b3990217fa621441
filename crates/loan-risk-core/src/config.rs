//! Scoring constants table.
//!
//! Every tier boundary, weight and threshold the engine uses lives here, in one
//! serde-(de)serialisable structure injected into the scoring entry points.
//! `ScoringConfig::default()` reproduces the production model; override files
//! may set only the fields they change.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanRiskError;
use crate::records::Sector;
use crate::types::{Percent, Rate, Score};
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Tier tables
// ---------------------------------------------------------------------------

/// How a tier's bound is compared against the input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBound {
    /// value <= bound
    AtMost,
    /// value >= bound
    AtLeast,
    /// value > bound
    Above,
}

/// One row of a tier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub bound: Decimal,
    pub score: Score,
}

/// First-match lookup table mapping a value to a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    pub bound: TierBound,
    pub tiers: Vec<Tier>,
    /// Score when no tier matches.
    pub otherwise: Score,
}

impl TierTable {
    pub fn lookup(&self, value: Decimal) -> Score {
        self.tiers
            .iter()
            .find(|t| match self.bound {
                TierBound::AtMost => value <= t.bound,
                TierBound::AtLeast => value >= t.bound,
                TierBound::Above => value > t.bound,
            })
            .map(|t| t.score)
            .unwrap_or(self.otherwise)
    }

    fn tiers(bound: TierBound, rows: &[(Decimal, Decimal)], otherwise: Decimal) -> Self {
        TierTable {
            bound,
            tiers: rows
                .iter()
                .map(|&(bound, score)| Tier { bound, score })
                .collect(),
            otherwise,
        }
    }

    /// Bounds must be ordered so that first-match is meaningful.
    fn validate(&self, field: &str) -> LoanRiskResult<()> {
        let ordered = self.tiers.windows(2).all(|w| match self.bound {
            TierBound::AtMost => w[0].bound < w[1].bound,
            TierBound::AtLeast | TierBound::Above => w[0].bound > w[1].bound,
        });
        if !ordered {
            return Err(LoanRiskError::invalid(
                field,
                "Tier bounds are not ordered for first-match lookup.",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Weights of the four sub-scores in the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub delinquency: Rate,
    pub credit_profile: Rate,
    pub loan_characteristics: Rate,
    pub concentration: Rate,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        CompositeWeights {
            delinquency: dec!(0.40),
            credit_profile: dec!(0.30),
            loan_characteristics: dec!(0.20),
            concentration: dec!(0.10),
        }
    }
}

/// Closed upper bounds of the LOW and MEDIUM categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryThresholds {
    pub low_max: Score,
    pub medium_max: Score,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        CategoryThresholds {
            low_max: dec!(35),
            medium_max: dec!(65),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelinquencyConfig {
    /// Base score keyed on max DPD.
    pub dpd_tiers: TierTable,
    /// Score returned when there is no repayment history.
    pub no_history_score: Score,
    /// Most recent installments scanned for consecutive delays.
    pub consecutive_window: usize,
    /// Most recent installments scanned for partial payments.
    pub partial_payment_window: usize,
    pub consecutive_penalty_min: u32,
    pub consecutive_penalty: Score,
    pub avg_dpd_penalty_above: Decimal,
    pub avg_dpd_penalty: Score,
    pub partial_payment_penalty: Score,
    /// Flag when max DPD exceeds this.
    pub flag_max_dpd: u32,
    /// Flag when consecutive delays reach this.
    pub flag_consecutive: u32,
    pub trend_window: usize,
    pub trend_min_history: usize,
    pub improving_ratio: Rate,
    pub worsening_ratio: Rate,
    /// DPD still counted as on time by the consistency metric.
    pub on_time_dpd: u32,
}

impl Default for DelinquencyConfig {
    fn default() -> Self {
        DelinquencyConfig {
            dpd_tiers: TierTable::tiers(
                TierBound::AtMost,
                &[
                    (dec!(0), dec!(5)),
                    (dec!(5), dec!(10)),
                    (dec!(15), dec!(25)),
                    (dec!(30), dec!(50)),
                    (dec!(60), dec!(75)),
                ],
                dec!(95),
            ),
            no_history_score: Decimal::ZERO,
            consecutive_window: 6,
            partial_payment_window: 3,
            consecutive_penalty_min: 3,
            consecutive_penalty: dec!(10),
            avg_dpd_penalty_above: dec!(10),
            avg_dpd_penalty: dec!(5),
            partial_payment_penalty: dec!(10),
            flag_max_dpd: 15,
            flag_consecutive: 2,
            trend_window: 3,
            trend_min_history: 4,
            improving_ratio: dec!(0.7),
            worsening_ratio: dec!(1.3),
            on_time_dpd: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditProfileConfig {
    pub credit_score_tiers: TierTable,
    pub dti_tiers: TierTable,
    pub credit_score_weight: Rate,
    pub dti_weight: Rate,
}

impl Default for CreditProfileConfig {
    fn default() -> Self {
        CreditProfileConfig {
            credit_score_tiers: TierTable::tiers(
                TierBound::AtLeast,
                &[
                    (dec!(750), dec!(10)),
                    (dec!(700), dec!(25)),
                    (dec!(650), dec!(40)),
                    (dec!(600), dec!(60)),
                ],
                dec!(85),
            ),
            dti_tiers: TierTable::tiers(
                TierBound::Above,
                &[
                    (dec!(60), dec!(80)),
                    (dec!(50), dec!(60)),
                    (dec!(40), dec!(40)),
                    (dec!(30), dec!(20)),
                ],
                dec!(10),
            ),
            credit_score_weight: dec!(0.6),
            dti_weight: dec!(0.4),
        }
    }
}

/// Fixed additive risk per sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorRiskWeights {
    pub manufacturing: Score,
    pub retail: Score,
    pub it: Score,
    pub healthcare: Score,
    pub real_estate: Score,
    pub agriculture: Score,
}

impl SectorRiskWeights {
    pub fn weight(&self, sector: Sector) -> Score {
        match sector {
            Sector::Manufacturing => self.manufacturing,
            Sector::Retail => self.retail,
            Sector::It => self.it,
            Sector::Healthcare => self.healthcare,
            Sector::RealEstate => self.real_estate,
            Sector::Agriculture => self.agriculture,
        }
    }
}

impl Default for SectorRiskWeights {
    fn default() -> Self {
        SectorRiskWeights {
            manufacturing: dec!(30),
            retail: dec!(35),
            it: dec!(10),
            healthcare: dec!(15),
            real_estate: dec!(40),
            agriculture: dec!(45),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanCharacteristicsConfig {
    /// Multiplier on outstanding / principal.
    pub outstanding_ratio_weight: Decimal,
    pub sector_weights: SectorRiskWeights,
    /// Loans older than this many months may earn the seasoning credit.
    pub seasoned_after_months: u32,
    /// Seasoning credit applies only below this delinquency sub-score.
    pub seasoned_max_delinquency: Score,
    pub seasoning_credit: Score,
    pub npa_penalty: Score,
    pub restructured_penalty: Score,
}

impl Default for LoanCharacteristicsConfig {
    fn default() -> Self {
        LoanCharacteristicsConfig {
            outstanding_ratio_weight: dec!(30),
            sector_weights: SectorRiskWeights::default(),
            seasoned_after_months: 12,
            seasoned_max_delinquency: dec!(20),
            seasoning_credit: dec!(10),
            npa_penalty: dec!(50),
            restructured_penalty: dec!(30),
        }
    }
}

/// Shared by the per-loan concentration penalty and the portfolio report.
///
/// Shares are percentages of total exposure. Each dimension has an elevated
/// and a high threshold; only the highest one crossed contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrationThresholds {
    pub sector_high_pct: Percent,
    pub sector_high_penalty: Score,
    pub sector_elevated_pct: Percent,
    pub sector_elevated_penalty: Score,
    pub geography_high_pct: Percent,
    pub geography_high_penalty: Score,
    pub geography_elevated_pct: Percent,
    pub geography_elevated_penalty: Score,
    pub hhi_high: Decimal,
    pub hhi_moderate: Decimal,
    /// Mean of LOW=1 / MODERATE=2 / HIGH=3 levels above which the overall
    /// level is HIGH.
    pub overall_high_mean: Decimal,
    pub overall_moderate_mean: Decimal,
    pub single_name_limit_pct: Percent,
    pub top10_limit_pct: Percent,
    pub largest_sector_limit_pct: Percent,
}

impl Default for ConcentrationThresholds {
    fn default() -> Self {
        ConcentrationThresholds {
            sector_high_pct: dec!(30),
            sector_high_penalty: dec!(50),
            sector_elevated_pct: dec!(25),
            sector_elevated_penalty: dec!(30),
            geography_high_pct: dec!(35),
            geography_high_penalty: dec!(30),
            geography_elevated_pct: dec!(30),
            geography_elevated_penalty: dec!(20),
            hhi_high: dec!(2500),
            hhi_moderate: dec!(1500),
            overall_high_mean: dec!(2.5),
            overall_moderate_mean: dec!(1.5),
            single_name_limit_pct: dec!(10),
            top10_limit_pct: dec!(40),
            largest_sector_limit_pct: dec!(40),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagRules {
    pub high_dpd_above: u32,
    pub high_dti_above: Percent,
}

impl Default for FlagRules {
    fn default() -> Self {
        FlagRules {
            high_dpd_above: 15,
            high_dti_above: dec!(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    pub urgent_score_above: Score,
    pub payment_arrangement_dpd_above: u32,
    pub repayment_capacity_consecutive: u32,
    pub collateral_credit_score_below: u16,
    pub income_stability_dti_above: Percent,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        RecommendationRules {
            urgent_score_above: dec!(70),
            payment_arrangement_dpd_above: 30,
            repayment_capacity_consecutive: 2,
            collateral_credit_score_below: 600,
            income_stability_dti_above: dec!(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// The full constants table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: CompositeWeights,
    pub categories: CategoryThresholds,
    pub delinquency: DelinquencyConfig,
    pub credit: CreditProfileConfig,
    pub loan: LoanCharacteristicsConfig,
    pub concentration: ConcentrationThresholds,
    pub flags: FlagRules,
    pub recommendations: RecommendationRules,
    /// PAR-k cut-offs in days, strictly ascending.
    pub par_thresholds: Vec<u32>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weights: CompositeWeights::default(),
            categories: CategoryThresholds::default(),
            delinquency: DelinquencyConfig::default(),
            credit: CreditProfileConfig::default(),
            loan: LoanCharacteristicsConfig::default(),
            concentration: ConcentrationThresholds::default(),
            flags: FlagRules::default(),
            recommendations: RecommendationRules::default(),
            par_thresholds: vec![1, 15, 30, 60, 90],
        }
    }
}

impl ScoringConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json_str(json: &str) -> LoanRiskResult<Self> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tables the scorer cannot evaluate consistently.
    pub fn validate(&self) -> LoanRiskResult<()> {
        let w = &self.weights;
        let weights = [
            w.delinquency,
            w.credit_profile,
            w.loan_characteristics,
            w.concentration,
        ];
        if weights.iter().any(|x| *x < Decimal::ZERO) {
            return Err(LoanRiskError::invalid("weights", "Weights cannot be negative."));
        }
        let total: Decimal = weights.iter().copied().sum();
        if total != Decimal::ONE {
            return Err(LoanRiskError::invalid(
                "weights",
                format!("Composite weights must sum to 1, got {total}."),
            ));
        }

        if self.categories.low_max >= self.categories.medium_max {
            return Err(LoanRiskError::invalid(
                "categories",
                "low_max must be below medium_max.",
            ));
        }

        let cw = self.credit.credit_score_weight + self.credit.dti_weight;
        if cw != Decimal::ONE {
            return Err(LoanRiskError::invalid(
                "credit",
                format!("Credit score and DTI weights must sum to 1, got {cw}."),
            ));
        }

        self.delinquency.dpd_tiers.validate("delinquency.dpd_tiers")?;
        self.credit.credit_score_tiers.validate("credit.credit_score_tiers")?;
        self.credit.dti_tiers.validate("credit.dti_tiers")?;

        let d = &self.delinquency;
        if d.consecutive_window == 0 || d.partial_payment_window == 0 || d.trend_window == 0 {
            return Err(LoanRiskError::invalid(
                "delinquency",
                "Window sizes must be positive.",
            ));
        }
        if d.improving_ratio > d.worsening_ratio {
            return Err(LoanRiskError::invalid(
                "delinquency",
                "improving_ratio must not exceed worsening_ratio.",
            ));
        }

        let c = &self.concentration;
        if c.sector_elevated_pct >= c.sector_high_pct
            || c.geography_elevated_pct >= c.geography_high_pct
        {
            return Err(LoanRiskError::invalid(
                "concentration",
                "Elevated share thresholds must be below high thresholds.",
            ));
        }
        if c.hhi_moderate >= c.hhi_high || c.overall_moderate_mean >= c.overall_high_mean {
            return Err(LoanRiskError::invalid(
                "concentration",
                "Moderate thresholds must be below high thresholds.",
            ));
        }

        if self.par_thresholds.is_empty() {
            return Err(LoanRiskError::invalid(
                "par_thresholds",
                "At least one PAR threshold is required.",
            ));
        }
        if self.par_thresholds[0] == 0 || self.par_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LoanRiskError::invalid(
                "par_thresholds",
                "PAR thresholds must be positive and strictly ascending.",
            ));
        }
        Ok(())
    }
}
