use clap::Args;
use serde_json::Value;

use loan_risk_core::portfolio::summary::high_risk_loans;
use loan_risk_core::scoring::engine::{score_loan, score_portfolio};

use crate::commands::ScoringRunArgs;
use crate::input;

/// Arguments for portfolio or single-loan scoring
#[derive(Args)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub run: ScoringRunArgs,

    /// Score only this loan (against the whole snapshot's context)
    #[arg(long)]
    pub loan: Option<String>,
}

/// Arguments for the high-risk loan list
#[derive(Args)]
pub struct HighRiskArgs {
    #[command(flatten)]
    pub run: ScoringRunArgs,

    /// Maximum number of loans to list
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.run.snapshot.input.as_deref())?;
    let config = input::load_config(args.run.snapshot.config.as_deref())?;

    if let Some(ref loan_id) = args.loan {
        let assessment = score_loan(&snapshot, loan_id, &config, args.run.timestamp())?;
        return Ok(serde_json::to_value(assessment)?);
    }

    let result = score_portfolio(&snapshot, &config, args.run.timestamp())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_high_risk(args: HighRiskArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.run.snapshot.input.as_deref())?;
    let config = input::load_config(args.run.snapshot.config.as_deref())?;

    let scored = score_portfolio(&snapshot, &config, args.run.timestamp())?;
    let loans = high_risk_loans(&scored.result.assessments, args.limit);
    Ok(serde_json::json!({
        "result": {
            "high_risk_count": loans.len(),
            "loans": loans,
        },
        "warnings": scored.warnings,
    }))
}
