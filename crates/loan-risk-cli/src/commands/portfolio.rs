use clap::Args;
use serde_json::Value;

use loan_risk_core::portfolio::par::analyze_par;
use loan_risk_core::portfolio::summary::analyze_portfolio;
use loan_risk_core::portfolio::vintage::vintage_analysis;

use crate::commands::{ScoringRunArgs, SnapshotArgs};
use crate::input;

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub run: ScoringRunArgs,
}

/// Arguments for the PAR cascade
#[derive(Args)]
pub struct ParArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// PAR cut-offs in days, overriding the config (e.g. --thresholds 30,60,90)
    #[arg(long, value_delimiter = ',')]
    pub thresholds: Option<Vec<u32>>,
}

/// Arguments for vintage cohorts
#[derive(Args)]
pub struct VintageArgs {
    /// Path to a JSON portfolio snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.run.snapshot.input.as_deref())?;
    let config = input::load_config(args.run.snapshot.config.as_deref())?;
    let result = analyze_portfolio(&snapshot, &config, args.run.timestamp())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_par(args: ParArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.snapshot.input.as_deref())?;
    let mut config = input::load_config(args.snapshot.config.as_deref())?;
    if let Some(thresholds) = args.thresholds {
        config.par_thresholds = thresholds;
    }
    let result = analyze_par(&snapshot, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_vintage(args: VintageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.input.as_deref())?;
    let cohorts = vintage_analysis(&snapshot);
    Ok(serde_json::json!({ "result": cohorts }))
}
