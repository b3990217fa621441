//! Delinquency trend and payment consistency.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::config::DelinquencyConfig;
use crate::delinquency::analyzer::chronological;
use crate::records::RepaymentRecord;
use crate::types::{pct_of, Percent};

pub(crate) const FULL_CONSISTENCY: Percent = dec!(100);

/// Direction of recent DPD against the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelinquencyTrend {
    Improving,
    Stable,
    Worsening,
}

impl fmt::Display for DelinquencyTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelinquencyTrend::Improving => write!(f, "improving"),
            DelinquencyTrend::Stable => write!(f, "stable"),
            DelinquencyTrend::Worsening => write!(f, "worsening"),
        }
    }
}

/// Compare mean DPD of the latest window against the preceding one.
pub fn delinquency_trend<R: Borrow<RepaymentRecord>>(
    repayments: &[R],
    config: &DelinquencyConfig,
) -> DelinquencyTrend {
    classify_trend(&chronological(repayments), config)
}

/// Percentage of installments with DPD within the on-time tolerance.
pub fn payment_consistency<R: Borrow<RepaymentRecord>>(
    repayments: &[R],
    config: &DelinquencyConfig,
) -> Percent {
    consistency_of(&chronological(repayments), config)
}

pub(crate) fn classify_trend(
    history: &[&RepaymentRecord],
    config: &DelinquencyConfig,
) -> DelinquencyTrend {
    if history.len() < config.trend_min_history {
        return DelinquencyTrend::Stable;
    }
    let window = config.trend_window;
    let split = history.len() - window.min(history.len());
    let recent = &history[split..];
    let previous = &history[split.saturating_sub(window)..split];
    if previous.is_empty() {
        return DelinquencyTrend::Stable;
    }

    let recent_avg = mean_dpd(recent);
    let previous_avg = mean_dpd(previous);

    if previous_avg.is_zero() {
        return if recent_avg > Decimal::ZERO {
            DelinquencyTrend::Worsening
        } else {
            DelinquencyTrend::Stable
        };
    }
    if recent_avg <= previous_avg * config.improving_ratio {
        DelinquencyTrend::Improving
    } else if recent_avg >= previous_avg * config.worsening_ratio {
        DelinquencyTrend::Worsening
    } else {
        DelinquencyTrend::Stable
    }
}

pub(crate) fn consistency_of(history: &[&RepaymentRecord], config: &DelinquencyConfig) -> Percent {
    if history.is_empty() {
        return FULL_CONSISTENCY;
    }
    let on_time = history.iter().filter(|r| r.dpd <= config.on_time_dpd).count();
    pct_of(
        Decimal::from(on_time as u64),
        Decimal::from(history.len() as u64),
    )
}

fn mean_dpd(window: &[&RepaymentRecord]) -> Decimal {
    if window.is_empty() {
        return Decimal::ZERO;
    }
    let total: u64 = window.iter().map(|r| u64::from(r.dpd)).sum();
    Decimal::from(total) / Decimal::from(window.len() as u64)
}
