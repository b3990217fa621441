//! Herfindahl-Hirschman index and concentration levels.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConcentrationThresholds;
use crate::types::Percent;

/// Qualitative concentration level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConcentrationLevel {
    Low,
    Moderate,
    High,
}

impl ConcentrationLevel {
    /// LOW = 1, MODERATE = 2, HIGH = 3.
    pub fn numeric(self) -> Decimal {
        match self {
            ConcentrationLevel::Low => Decimal::ONE,
            ConcentrationLevel::Moderate => dec!(2),
            ConcentrationLevel::High => dec!(3),
        }
    }
}

impl fmt::Display for ConcentrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcentrationLevel::Low => write!(f, "LOW"),
            ConcentrationLevel::Moderate => write!(f, "MODERATE"),
            ConcentrationLevel::High => write!(f, "HIGH"),
        }
    }
}

/// HHI from percentage shares: sum(pct^2), i.e. sum(share^2) * 10000.
pub fn herfindahl_index<I>(pcts: I) -> Decimal
where
    I: IntoIterator<Item = Percent>,
{
    pcts.into_iter().map(|p| p * p).sum()
}

pub fn classify_hhi(hhi: Decimal, thresholds: &ConcentrationThresholds) -> ConcentrationLevel {
    if hhi > thresholds.hhi_high {
        ConcentrationLevel::High
    } else if hhi > thresholds.hhi_moderate {
        ConcentrationLevel::Moderate
    } else {
        ConcentrationLevel::Low
    }
}

/// Classify the mean numeric value of several levels.
pub fn combined_level(
    levels: &[ConcentrationLevel],
    thresholds: &ConcentrationThresholds,
) -> ConcentrationLevel {
    if levels.is_empty() {
        return ConcentrationLevel::Low;
    }
    let total: Decimal = levels.iter().map(|l| l.numeric()).sum();
    let mean = total / Decimal::from(levels.len() as u64);
    if mean > thresholds.overall_high_mean {
        ConcentrationLevel::High
    } else if mean > thresholds.overall_moderate_mean {
        ConcentrationLevel::Moderate
    } else {
        ConcentrationLevel::Low
    }
}
