use napi::Result as NapiResult;
use napi_derive::napi;

use bondcalc_core::engine::calculator;
use bondcalc_core::types::PrecisionConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_precision(config_json: Option<String>) -> NapiResult<PrecisionConfig> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(PrecisionConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Bond calculation
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: calculator::CalculationInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let precision = parse_precision(config_json)?;
    let output = calculator::calculate(&input, &precision).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_quick_metrics(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let input: calculator::CalculationInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let precision = parse_precision(config_json)?;
    let output =
        calculator::calculate_quick_metrics(&input, &precision).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
