use clap::Args;
use serde_json::Value;

use loan_risk_core::concentration::matrix::sector_geography_matrix;
use loan_risk_core::concentration::report::analyze_concentration;

use crate::commands::SnapshotArgs;
use crate::input;

/// Arguments for the concentration report
#[derive(Args)]
pub struct ConcentrationArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
}

/// Arguments for the sector x geography matrix
#[derive(Args)]
pub struct MatrixArgs {
    /// Path to a JSON portfolio snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_concentration(args: ConcentrationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.snapshot.input.as_deref())?;
    let config = input::load_config(args.snapshot.config.as_deref())?;
    let result = analyze_concentration(&snapshot, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_matrix(args: MatrixArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.input.as_deref())?;
    let matrix = sector_geography_matrix(&snapshot);
    Ok(serde_json::json!({ "result": matrix }))
}
