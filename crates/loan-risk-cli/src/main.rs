mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::concentration::{ConcentrationArgs, MatrixArgs};
use commands::config::ConfigArgs;
use commands::portfolio::{ParArgs, SummaryArgs, VintageArgs};
use commands::scoring::{HighRiskArgs, ScoreArgs};

/// Loan risk scoring and portfolio concentration analytics
#[derive(Parser)]
#[command(
    name = "lrisk",
    version,
    about = "Loan risk scoring and portfolio concentration analytics",
    long_about = "A CLI for scoring a lender's loan book with decimal precision. \
                  Reads a JSON portfolio snapshot (loans, customers, repayments) and \
                  reports composite risk scores, concentration (HHI), portfolio-at-risk \
                  cascades and vintage cohorts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every loan (or one loan with --loan)
    Score(ScoreArgs),
    /// Sector, geography, borrower and product concentration report
    Concentration(ConcentrationArgs),
    /// Sector x geography exposure matrix
    Matrix(MatrixArgs),
    /// Portfolio summary: counts, NPA rate, risk mix, at-risk exposure
    Summary(SummaryArgs),
    /// Portfolio-at-risk cascade (PAR-k and bands)
    Par(ParArgs),
    /// Vintage cohorts by disbursement quarter
    Vintage(VintageArgs),
    /// HIGH-risk loans ranked by score
    HighRisk(HighRiskArgs),
    /// Print the scoring constants table
    Config(ConfigArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Score(args) => commands::scoring::run_score(args),
        Commands::Concentration(args) => commands::concentration::run_concentration(args),
        Commands::Matrix(args) => commands::concentration::run_matrix(args),
        Commands::Summary(args) => commands::portfolio::run_summary(args),
        Commands::Par(args) => commands::portfolio::run_par(args),
        Commands::Vintage(args) => commands::portfolio::run_vintage(args),
        Commands::HighRisk(args) => commands::scoring::run_high_risk(args),
        Commands::Config(args) => commands::config::run_config(args),
        Commands::Version => {
            println!("lrisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
