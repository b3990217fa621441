//! Append-only assessment history.
//!
//! Each scoring run is kept as an immutable, timestamped snapshot. Nothing is
//! overwritten, so trend queries read recorded runs only and never
//! interpolate between them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanRiskError;
use crate::portfolio::summary::mean_risk_score;
use crate::scoring::composite::{RiskAssessment, RiskCategory};
use crate::types::Score;
use crate::LoanRiskResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSnapshot {
    pub assessed_at: DateTime<Utc>,
    pub assessments: Vec<RiskAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub assessed_at: DateTime<Utc>,
    pub risk_score: Score,
    pub risk_category: RiskCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPoint {
    pub assessed_at: DateTime<Utc>,
    pub loans_assessed: u64,
    pub mean_risk_score: Score,
    pub high_risk_count: u64,
    /// Portfolio quality index, 100 - mean risk score.
    pub pqi: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordedRuns")]
pub struct RiskHistory {
    snapshots: Vec<AssessmentSnapshot>,
}

/// Serialized form of a history; replayed through `record` on load.
#[derive(Deserialize)]
struct RecordedRuns {
    snapshots: Vec<AssessmentSnapshot>,
}

impl TryFrom<RecordedRuns> for RiskHistory {
    type Error = LoanRiskError;

    fn try_from(runs: RecordedRuns) -> LoanRiskResult<Self> {
        let mut history = RiskHistory::new();
        for run in runs.snapshots {
            history.record(run.assessed_at, run.assessments)?;
        }
        Ok(history)
    }
}

impl RiskHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run. Rejects a run stamped before the latest recorded one.
    pub fn record(
        &mut self,
        assessed_at: DateTime<Utc>,
        assessments: Vec<RiskAssessment>,
    ) -> LoanRiskResult<()> {
        if let Some(latest) = self.latest() {
            if assessed_at < latest.assessed_at {
                return Err(LoanRiskError::invalid(
                    "assessed_at",
                    format!(
                        "{assessed_at} is earlier than the latest snapshot at {}",
                        latest.assessed_at
                    ),
                ));
            }
        }
        self.snapshots.push(AssessmentSnapshot {
            assessed_at,
            assessments,
        });
        Ok(())
    }

    pub fn latest(&self) -> Option<&AssessmentSnapshot> {
        self.snapshots.last()
    }

    pub fn snapshots(&self) -> &[AssessmentSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Score and category of one loan in every run that assessed it.
    pub fn loan_trajectory(&self, loan_id: &str) -> Vec<TrajectoryPoint> {
        self.snapshots
            .iter()
            .filter_map(|s| {
                s.assessments
                    .iter()
                    .find(|a| a.loan_id == loan_id)
                    .map(|a| TrajectoryPoint {
                        assessed_at: s.assessed_at,
                        risk_score: a.risk_score,
                        risk_category: a.risk_category,
                    })
            })
            .collect()
    }

    /// One quality point per recorded run, oldest first.
    pub fn portfolio_quality_trend(&self) -> Vec<QualityPoint> {
        self.snapshots
            .iter()
            .map(|s| {
                let mean = mean_risk_score(&s.assessments).round_dp(2);
                QualityPoint {
                    assessed_at: s.assessed_at,
                    loans_assessed: s.assessments.len() as u64,
                    mean_risk_score: mean,
                    high_risk_count: s.assessments.iter().filter(|a| a.is_high_risk()).count() as u64,
                    pqi: dec!(100) - mean,
                }
            })
            .collect()
    }

    /// PQI change from the first to the latest run; `None` with fewer than two.
    pub fn pqi_change(&self) -> Option<Decimal> {
        if self.snapshots.len() < 2 {
            return None;
        }
        let trend = self.portfolio_quality_trend();
        match (trend.first(), trend.last()) {
            (Some(first), Some(last)) => Some(last.pqi - first.pqi),
            _ => None,
        }
    }
}
