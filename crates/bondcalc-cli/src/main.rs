mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bond::{CalculateArgs, MetricsArgs};

/// Bond schedule and yield calculations
#[derive(Parser)]
#[command(
    name = "bondcalc",
    version,
    about = "Amortization schedules and yields for inflation-indexed American-method bonds",
    long_about = "Computes the full amortization schedule, valuation (price, duration, \
                  convexity), and annualized yields (issuer TCEA, holder TREA) for bonds \
                  issued under the American repayment method with inflation-indexed \
                  principal and configurable grace periods. Inputs are JSON, from a file \
                  or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full amortization schedule plus all metrics
    Calculate(CalculateArgs),
    /// Compute the headline metrics without the schedule
    Metrics(MetricsArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::bond::run_calculate(args),
        Commands::Metrics(args) => commands::bond::run_metrics(args),
        Commands::Version => {
            println!("bondcalc {}", env!("CARGO_PKG_VERSION"));
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
