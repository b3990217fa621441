//! Aggregate invariants.
//!
//! A violation here means a formula or threshold bug, not bad data. The
//! `verify_*` checks return `InvariantViolation`; internal call sites route
//! them through [`enforce`], which panics in debug builds and logs otherwise
//! so the caller can clamp and carry on.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LoanRiskError;
use crate::LoanRiskResult;

/// Allowed drift of a completed percentage breakdown from 100.
pub const PCT_TOLERANCE: Decimal = dec!(0.1);

/// Percentages of a non-empty breakdown must total 100.
pub fn verify_percentage_total(context: &str, pcts: &[Decimal]) -> LoanRiskResult<()> {
    if pcts.is_empty() {
        return Ok(());
    }
    let total: Decimal = pcts.iter().copied().sum();
    if total.is_zero() {
        // Zero exposure short-circuits every share to zero.
        return Ok(());
    }
    if (total - dec!(100)).abs() > PCT_TOLERANCE {
        return Err(LoanRiskError::InvariantViolation(format!(
            "{context}: percentages sum to {total}, expected 100"
        )));
    }
    Ok(())
}

pub fn verify_hhi_range(context: &str, hhi: Decimal) -> LoanRiskResult<()> {
    if hhi < Decimal::ZERO || hhi > dec!(10000) {
        return Err(LoanRiskError::InvariantViolation(format!(
            "{context}: HHI {hhi} outside [0, 10000]"
        )));
    }
    Ok(())
}

/// Cumulative PAR values must not increase with the threshold.
pub fn verify_nested(context: &str, cumulative: &[Decimal]) -> LoanRiskResult<()> {
    if let Some(w) = cumulative.windows(2).find(|w| w[1] > w[0]) {
        return Err(LoanRiskError::InvariantViolation(format!(
            "{context}: cumulative values not nested ({} then {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

pub fn verify_non_negative(context: &str, value: Decimal) -> LoanRiskResult<()> {
    if value < Decimal::ZERO {
        return Err(LoanRiskError::InvariantViolation(format!(
            "{context}: negative value {value}"
        )));
    }
    Ok(())
}

/// Surface a violation loudly. Returns whether the invariant held.
pub(crate) fn enforce(check: LoanRiskResult<()>) -> bool {
    match check {
        Ok(()) => true,
        Err(e) => {
            debug_assert!(false, "{e}");
            tracing::error!(error = %e, "aggregate invariant violated");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_total_within_tolerance() {
        assert!(verify_percentage_total("t", &[dec!(33.33), dec!(33.33), dec!(33.34)]).is_ok());
        assert!(verify_percentage_total("t", &[]).is_ok());
        assert!(verify_percentage_total("t", &[Decimal::ZERO, Decimal::ZERO]).is_ok());
    }

    #[test]
    fn test_percentage_total_violation() {
        let err = verify_percentage_total("sector", &[dec!(60), dec!(30)]).unwrap_err();
        assert!(matches!(err, LoanRiskError::InvariantViolation(_)));
        assert!(err.to_string().contains("sector"));
    }

    #[test]
    fn test_hhi_range() {
        assert!(verify_hhi_range("h", dec!(10000)).is_ok());
        assert!(verify_hhi_range("h", dec!(10000.01)).is_err());
        assert!(verify_hhi_range("h", dec!(-1)).is_err());
    }

    #[test]
    fn test_nested_sequence() {
        assert!(verify_nested("par", &[dec!(12), dec!(8), dec!(8), dec!(1)]).is_ok());
        assert!(verify_nested("par", &[dec!(12), dec!(13)]).is_err());
    }

    #[test]
    fn test_enforce_passes_through_ok() {
        assert!(enforce(Ok(())));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_enforce_panics_in_debug() {
        enforce(verify_non_negative("band", dec!(-1)));
    }
}
