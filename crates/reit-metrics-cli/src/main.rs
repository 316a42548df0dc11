mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::metrics::{CheckFieldsArgs, MetricsArgs};
use commands::risk::BurnRateArgs;
use commands::waterfall::AfcfArgs;
use commands::RecordArgs;
use reit_metrics_core::MetricsConfig;

/// REIT credit metrics from disclosed financial statements
#[derive(Parser)]
#[command(
    name = "reitm",
    version,
    about = "REIT credit metrics from disclosed financial statements",
    long_about = "Computes leverage, interest coverage, FFO/AFFO, ACFO, AFCF, burn rate, \
                  cash runway, liquidity risk and dilution from a REIT financial record \
                  (JSON or YAML), with decimal precision and reported-vs-calculated checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Threshold configuration file (JSON or YAML); defaults apply otherwise
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every metric the record supports
    Metrics(MetricsArgs),
    /// Debt ratios from the balance sheet
    Leverage(RecordArgs),
    /// FFO and AFFO from REALPAC adjustments
    FfoAffo(RecordArgs),
    /// Adjusted cash flow from operations
    Acfo(RecordArgs),
    /// Adjusted free cash flow and obligation coverage
    Afcf(AfcfArgs),
    /// NOI interest coverage
    Coverage(RecordArgs),
    /// Burn rate, cash runway and liquidity risk
    BurnRate(BurnRateArgs),
    /// Unit dilution materiality
    Dilution(RecordArgs),
    /// List required fields absent from a record
    CheckFields(CheckFieldsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<MetricsConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => input::file::read_document(p),
        None => Ok(MetricsConfig::default()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::metrics::run_metrics(args, &config),
        Commands::Leverage(args) => commands::risk::run_leverage(args),
        Commands::FfoAffo(args) => commands::waterfall::run_ffo_affo(args, &config),
        Commands::Acfo(args) => commands::waterfall::run_acfo(args, &config),
        Commands::Afcf(args) => commands::waterfall::run_afcf(args, &config),
        Commands::Coverage(args) => commands::risk::run_coverage(args),
        Commands::BurnRate(args) => commands::risk::run_burn_rate(args, &config),
        Commands::Dilution(args) => commands::risk::run_dilution(args, &config),
        Commands::CheckFields(args) => commands::metrics::run_check_fields(args),
        Commands::Version => {
            println!("reitm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
