//! Delinquency sub-score.
//!
//! Converts a loan's repayment history into:
//! 1. **Tiered base score** -- keyed on the worst DPD ever observed.
//! 2. **Behavioural penalties** -- consecutive delays, average DPD, recent
//!    partial payments.
//! 3. **Flag** -- serious delinquency or a run of delays.
//!
//! No history is not itself risky: an empty sequence scores the configured
//! `no_history_score` and is never flagged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::config::DelinquencyConfig;
use crate::delinquency::trend::{self, DelinquencyTrend};
use crate::records::RepaymentRecord;
use crate::types::{clamp_score, Percent, Score};

/// Result of analysing one loan's repayment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyProfile {
    pub score: Score,
    pub flagged: bool,
    pub max_dpd: u32,
    pub avg_dpd: Decimal,
    /// Longest run of DPD > 0 within the recent window.
    pub consecutive_delays: u32,
    /// A recent installment was paid short.
    pub recent_partial_payment: bool,
    pub trend: DelinquencyTrend,
    /// Share of installments paid within tolerance.
    pub payment_consistency: Percent,
    pub installments: u32,
}

impl DelinquencyProfile {
    fn no_history(config: &DelinquencyConfig) -> Self {
        DelinquencyProfile {
            score: config.no_history_score,
            flagged: false,
            max_dpd: 0,
            avg_dpd: Decimal::ZERO,
            consecutive_delays: 0,
            recent_partial_payment: false,
            trend: DelinquencyTrend::Stable,
            payment_consistency: trend::FULL_CONSISTENCY,
            installments: 0,
        }
    }
}

/// Analyse a repayment history. Input order is irrelevant; records are
/// ordered by due date first.
pub fn analyze_delinquency<R: Borrow<RepaymentRecord>>(
    repayments: &[R],
    config: &DelinquencyConfig,
) -> DelinquencyProfile {
    let history = chronological(repayments);
    if history.is_empty() {
        return DelinquencyProfile::no_history(config);
    }

    let max_dpd = history.iter().map(|r| r.dpd).max().unwrap_or(0);
    let total_dpd: u64 = history.iter().map(|r| u64::from(r.dpd)).sum();
    let avg_dpd = Decimal::from(total_dpd) / Decimal::from(history.len() as u64);

    let consecutive_delays = longest_delay_run(most_recent(&history, config.consecutive_window));
    let recent_partial_payment = most_recent(&history, config.partial_payment_window)
        .iter()
        .any(|r| r.is_partial());

    let mut score = config.dpd_tiers.lookup(Decimal::from(max_dpd));
    if consecutive_delays >= config.consecutive_penalty_min {
        score += config.consecutive_penalty;
    }
    if avg_dpd > config.avg_dpd_penalty_above {
        score += config.avg_dpd_penalty;
    }
    if recent_partial_payment {
        score += config.partial_payment_penalty;
    }

    let flagged = max_dpd > config.flag_max_dpd || consecutive_delays >= config.flag_consecutive;

    DelinquencyProfile {
        score: clamp_score(score),
        flagged,
        max_dpd,
        avg_dpd,
        consecutive_delays,
        recent_partial_payment,
        trend: trend::classify_trend(&history, config),
        payment_consistency: trend::consistency_of(&history, config),
        installments: history.len() as u32,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Repayments ordered by due date (stable for equal dates).
pub(crate) fn chronological<R: Borrow<RepaymentRecord>>(repayments: &[R]) -> Vec<&RepaymentRecord> {
    let mut history: Vec<&RepaymentRecord> = repayments.iter().map(|r| r.borrow()).collect();
    history.sort_by_key(|r| r.due_date);
    history
}

/// The last `n` entries of a chronological history.
pub(crate) fn most_recent<'a>(
    history: &'a [&'a RepaymentRecord],
    n: usize,
) -> &'a [&'a RepaymentRecord] {
    &history[history.len().saturating_sub(n)..]
}

fn longest_delay_run(window: &[&RepaymentRecord]) -> u32 {
    let mut longest = 0u32;
    let mut current = 0u32;
    for r in window {
        if r.dpd > 0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PaymentStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn installment(month: u32, dpd: u32) -> RepaymentRecord {
        RepaymentRecord {
            loan_id: "L001".into(),
            due_date: NaiveDate::from_ymd_opt(2023, month, 5).unwrap(),
            emi_amount: dec!(10_000),
            payment_date: None,
            payment_amount: Some(dec!(10_000)),
            dpd,
            payment_status: if dpd == 0 {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Delayed
            },
        }
    }

    fn history(dpds: &[u32]) -> Vec<RepaymentRecord> {
        dpds.iter()
            .enumerate()
            .map(|(i, d)| installment(i as u32 + 1, *d))
            .collect()
    }

    fn cfg() -> DelinquencyConfig {
        DelinquencyConfig::default()
    }

    #[test]
    fn test_no_history_scores_zero_unflagged() {
        let p = analyze_delinquency::<RepaymentRecord>(&[], &cfg());
        assert_eq!(p.score, Decimal::ZERO);
        assert!(!p.flagged);
        assert_eq!(p.trend, DelinquencyTrend::Stable);
    }

    #[test]
    fn test_clean_history_base_tier() {
        let p = analyze_delinquency(&history(&[0, 0, 0, 0]), &cfg());
        assert_eq!(p.score, dec!(5));
        assert_eq!(p.max_dpd, 0);
        assert_eq!(p.consecutive_delays, 0);
        assert!(!p.flagged);
    }

    #[test]
    fn test_three_delays_with_seasoned_history() {
        // avg DPD = 63 / 7 = 9, below the average penalty trigger
        let p = analyze_delinquency(&history(&[0, 0, 0, 0, 20, 25, 18]), &cfg());
        assert_eq!(p.max_dpd, 25);
        assert_eq!(p.consecutive_delays, 3);
        assert_eq!(p.avg_dpd, dec!(9));
        assert_eq!(p.score, dec!(60));
        assert!(p.flagged);
    }

    #[test]
    fn test_average_penalty_stacks() {
        // avg DPD = 21 > 10 adds 5 on top of 50 + 10
        let p = analyze_delinquency(&history(&[20, 25, 18]), &cfg());
        assert_eq!(p.score, dec!(65));
    }

    #[test]
    fn test_consecutive_run_only_counts_recent_window() {
        // The run of four delays is older than the six most recent entries
        let p = analyze_delinquency(&history(&[9, 9, 9, 9, 0, 0, 0, 0, 0, 0]), &cfg());
        assert_eq!(p.consecutive_delays, 0);
        assert_eq!(p.max_dpd, 9);
        assert!(!p.flagged);
    }

    #[test]
    fn test_partial_payment_in_recent_three() {
        let mut h = history(&[0, 0, 0, 0, 0]);
        h[3].payment_amount = Some(dec!(7_500));
        let p = analyze_delinquency(&h, &cfg());
        assert!(p.recent_partial_payment);
        assert_eq!(p.score, dec!(15));

        let mut old = history(&[0, 0, 0, 0, 0]);
        old[1].payment_amount = Some(dec!(7_500));
        assert!(!analyze_delinquency(&old, &cfg()).recent_partial_payment);
    }

    #[test]
    fn test_flag_on_two_consecutive_delays() {
        let p = analyze_delinquency(&history(&[0, 0, 3, 4]), &cfg());
        assert_eq!(p.consecutive_delays, 2);
        assert!(p.flagged);
        assert_eq!(p.score, dec!(10));
    }

    #[test]
    fn test_score_clamped_at_100() {
        let mut h = history(&[90, 95, 100, 120, 130, 150]);
        h[5].payment_amount = Some(dec!(1));
        let p = analyze_delinquency(&h, &cfg());
        // 95 + 10 + 5 + 10 = 120 before clamping
        assert_eq!(p.score, dec!(100));
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        let mut h = history(&[0, 0, 0, 0, 20, 25, 18]);
        h.reverse();
        let p = analyze_delinquency(&h, &cfg());
        assert_eq!(p.consecutive_delays, 3);
        assert_eq!(p.score, dec!(60));
    }
}
