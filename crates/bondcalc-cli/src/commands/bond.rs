use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bondcalc_core::engine::calculator::{self, CalculationInputs};
use bondcalc_core::types::PrecisionConfig;

use crate::input;

/// Arguments for the full schedule calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to JSON input file (stdin is used when omitted)
    #[arg(long)]
    pub input: Option<String>,
    /// Decimal places kept on schedule and metric figures
    #[arg(long)]
    pub decimals: Option<u32>,
    /// Yield solver convergence tolerance
    #[arg(long)]
    pub tolerance: Option<Decimal>,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(&args.input)?;
    let config = precision_from(args.decimals, args.tolerance);
    let result = calculator::calculate(&inputs, &config)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the metrics-only calculation
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input file (stdin is used when omitted)
    #[arg(long)]
    pub input: Option<String>,
    /// Decimal places kept on metric figures
    #[arg(long)]
    pub decimals: Option<u32>,
    /// Yield solver convergence tolerance
    #[arg(long)]
    pub tolerance: Option<Decimal>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(&args.input)?;
    let config = precision_from(args.decimals, args.tolerance);
    let result = calculator::calculate_quick_metrics(&inputs, &config)?;
    Ok(serde_json::to_value(result)?)
}

fn load_inputs(path: &Option<String>) -> Result<CalculationInputs, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        input::file::read_json(path)
    } else if let Some(inputs) = input::stdin::read_json()? {
        Ok(inputs)
    } else {
        Err("--input <file.json> or piped stdin required".into())
    }
}

fn precision_from(decimals: Option<u32>, tolerance: Option<Decimal>) -> PrecisionConfig {
    let mut config = PrecisionConfig::default();
    if let Some(places) = decimals {
        config.decimal_places = places;
    }
    if let Some(tolerance) = tolerance {
        config.tolerance = tolerance;
    }
    config
}
