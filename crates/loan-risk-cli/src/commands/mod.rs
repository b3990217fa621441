pub mod concentration;
pub mod config;
pub mod portfolio;
pub mod scoring;

use chrono::{DateTime, Utc};
use clap::Args;

/// Arguments shared by every command that reads a snapshot.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Path to a JSON portfolio snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON or YAML scoring config override
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for commands that run the scorer.
#[derive(Args, Debug)]
pub struct ScoringRunArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Assessment timestamp (RFC 3339); defaults to now
    #[arg(long)]
    pub assessed_at: Option<DateTime<Utc>>,
}

impl ScoringRunArgs {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.assessed_at.unwrap_or_else(Utc::now)
    }
}
