use clap::Args;
use serde_json::Value;

use crate::input;

/// Arguments for printing the scoring constants table
#[derive(Args)]
pub struct ConfigArgs {
    /// Validate and print this override (JSON or YAML) instead of the defaults
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_config(args: ConfigArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = input::load_config(args.config.as_deref())?;
    Ok(serde_json::to_value(config)?)
}
