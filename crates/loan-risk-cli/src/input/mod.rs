pub mod file;
pub mod stdin;

use loan_risk_core::{PortfolioSnapshot, ScoringConfig};

/// Snapshot from `--input`, or from piped stdin.
pub fn load_snapshot(path: Option<&str>) -> Result<PortfolioSnapshot, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err("a portfolio snapshot is required (use --input or pipe JSON on stdin)".into()),
    }
}

/// Scoring constants from `--config` (JSON or YAML), defaults otherwise.
pub fn load_config(path: Option<&str>) -> Result<ScoringConfig, Box<dyn std::error::Error>> {
    let config: ScoringConfig = match path {
        None => return Ok(ScoringConfig::default()),
        Some(p) if file::is_yaml(p) => file::read_yaml(p)?,
        Some(p) => file::read_json(p)?,
    };
    config.validate()?;
    Ok(config)
}
