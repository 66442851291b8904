//! Public entry points: full calculation and quick metrics.
//!
//! Validates inputs, derives schedule parameters, runs the recurrence,
//! aggregates the valuation, and solves issuer/holder yields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::rates::{self, DayCountBasis, Frequency, RateType, ScheduleParams};
use crate::engine::schedule::{self, CashFlowPeriod, Grace};
use crate::engine::valuation::{self, ValuationSummary};
use crate::engine::yields::{self, RateSolution};
use crate::error::BondCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, PrecisionConfig, Rate, Years};
use crate::BondCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for one bond calculation. Immutable once constructed.
///
/// `inflation_series` and `grace_series` are year-granular: one entry per
/// year of the term. The engine expands them to period granularity itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInputs {
    /// Face value repaid at maturity (before indexation)
    pub nominal_value: Money,
    /// Price paid at issuance
    pub commercial_value: Money,
    /// Term in whole years
    pub term_years: u32,
    /// Coupon payment frequency
    pub coupon_frequency: Frequency,
    /// 360 or 365 day basis
    pub day_count_basis: DayCountBasis,
    /// Whether `annual_rate` is effective or nominal
    pub rate_type: RateType,
    /// Capitalization frequency; required when `rate_type` is nominal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capitalization_frequency: Option<Frequency>,
    /// Stated annual coupon rate
    pub annual_rate: Rate,
    /// Annual market/discount rate for valuation
    pub discount_rate: Rate,
    /// Income tax rate driving the issuer's coupon tax shield
    pub income_tax_rate: Rate,
    /// Redemption premium paid at maturity, as a share of nominal value
    pub premium_rate: Rate,
    /// Issuance date; period dates are offset from it in fixed-day steps
    pub issuance_date: NaiveDate,
    /// Issuer-side structuring cost, as a share of commercial value
    pub structuring_cost_rate: Rate,
    /// Issuer-side placement cost, as a share of commercial value
    pub placement_cost_rate: Rate,
    /// Issuer share of the flotation cost
    pub flotation_cost_rate: Rate,
    /// Issuer share of the custody cost
    pub custody_cost_rate: Rate,
    /// Regulatory cap on the flotation cost; the holder pays the residual
    pub flotation_cap_rate: Rate,
    /// Regulatory cap on the custody cost; the holder pays the residual
    pub custody_cap_rate: Rate,
    /// Annual inflation rate per year of the term
    pub inflation_series: Vec<Rate>,
    /// Grace marker per year of the term
    pub grace_series: Vec<Grace>,
}

/// Solver diagnostics for one yield figure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverDiagnostics {
    pub converged: bool,
    pub iterations: u32,
}

impl From<&RateSolution> for SolverDiagnostics {
    fn from(solution: &RateSolution) -> Self {
        Self {
            converged: solution.converged,
            iterations: solution.iterations,
        }
    }
}

/// Aggregated valuation and yield figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialMetrics {
    /// Present value of the holder flows
    pub price: Money,
    /// Price minus the issuer's net proceeds
    pub gain_loss: Money,
    /// Macaulay duration in years
    pub duration: Years,
    /// Duration / (1 + periodic discount rate)
    pub modified_duration: Decimal,
    /// Second-order price sensitivity
    pub convexity: Decimal,
    /// Duration plus convexity, reported as a single screening figure
    pub decision_ratio: Decimal,
    /// Annualized effective issuer cost, gross of the tax shield
    pub tcea: Rate,
    /// Annualized effective issuer cost, net of the tax shield
    pub tcea_with_shield: Rate,
    /// Annualized effective holder return
    pub trea: Rate,
    /// Newton-Raphson diagnostics for the three yield figures
    pub tcea_diagnostics: SolverDiagnostics,
    pub tcea_with_shield_diagnostics: SolverDiagnostics,
    pub trea_diagnostics: SolverDiagnostics,
}

/// Full calculation result: the schedule plus the aggregate metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub schedule: Vec<CashFlowPeriod>,
    pub params: ScheduleParams,
    pub metrics: FinancialMetrics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full pipeline and return the schedule together with all metrics.
pub fn calculate(
    inputs: &CalculationInputs,
    precision: &PrecisionConfig,
) -> BondCalcResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (periods, params, metrics) = run_pipeline(inputs, precision, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "American (bullet) amortization with inflation-indexed principal",
        inputs,
        warnings,
        elapsed,
        CalculationResult {
            schedule: periods,
            params,
            metrics,
        },
    ))
}

/// Same pipeline as [`calculate`]; the schedule is simply not retained.
///
/// Price, duration, and the yield figures all depend on the full recurrence,
/// so there is no cheaper path — this exists for callers that only display
/// headline figures.
pub fn calculate_quick_metrics(
    inputs: &CalculationInputs,
    precision: &PrecisionConfig,
) -> BondCalcResult<ComputationOutput<FinancialMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (_, _, metrics) = run_pipeline(inputs, precision, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "American (bullet) amortization with inflation-indexed principal — metrics only",
        inputs,
        warnings,
        elapsed,
        metrics,
    ))
}

/// validate → derive → build → value → solve, shared by both entry points.
fn run_pipeline(
    inputs: &CalculationInputs,
    precision: &PrecisionConfig,
    warnings: &mut Vec<String>,
) -> BondCalcResult<(Vec<CashFlowPeriod>, ScheduleParams, FinancialMetrics)> {
    validate_inputs(inputs)?;

    let params = rates::derive_params(inputs)?;
    let mut periods = schedule::build_schedule(inputs, &params, precision)?;
    let summary = valuation::value_schedule(
        &mut periods,
        &params,
        inputs.day_count_basis,
        precision,
    )?;
    let metrics = solve_metrics(inputs, &params, &periods, &summary, precision, warnings);

    Ok((periods, params, metrics))
}

// ---------------------------------------------------------------------------
// Yield solving
// ---------------------------------------------------------------------------

fn solve_metrics(
    inputs: &CalculationInputs,
    params: &ScheduleParams,
    periods: &[CashFlowPeriod],
    summary: &ValuationSummary,
    precision: &PrecisionConfig,
    warnings: &mut Vec<String>,
) -> FinancialMetrics {
    let issuer_gross: Vec<Decimal> = periods.iter().map(|p| p.issuer_flow).collect();
    let issuer_shielded: Vec<Decimal> = periods.iter().map(|p| p.issuer_flow_with_shield).collect();
    let holder: Vec<Decimal> = periods.iter().map(|p| p.holder_flow).collect();

    let tolerance = precision.tolerance;
    let tcea = solve_annualized(&issuer_gross, inputs, params, tolerance, "TCEA", warnings);
    let tcea_with_shield = solve_annualized(
        &issuer_shielded,
        inputs,
        params,
        tolerance,
        "TCEA with tax shield",
        warnings,
    );
    let trea = solve_annualized(&holder, inputs, params, tolerance, "TREA", warnings);

    let net_proceeds = inputs.commercial_value - params.issuer_initial_costs;

    FinancialMetrics {
        price: precision.round(summary.price),
        gain_loss: precision.round(summary.price - net_proceeds),
        duration: precision.round(summary.duration),
        modified_duration: precision.round(summary.modified_duration),
        convexity: precision.round(summary.convexity),
        decision_ratio: precision.round(summary.duration + summary.convexity),
        tcea: precision.round(tcea.0),
        tcea_with_shield: precision.round(tcea_with_shield.0),
        trea: precision.round(trea.0),
        tcea_diagnostics: tcea.1,
        tcea_with_shield_diagnostics: tcea_with_shield.1,
        trea_diagnostics: trea.1,
    }
}

fn solve_annualized(
    flows: &[Decimal],
    inputs: &CalculationInputs,
    params: &ScheduleParams,
    tolerance: Decimal,
    label: &str,
    warnings: &mut Vec<String>,
) -> (Rate, SolverDiagnostics) {
    let solution = yields::solve_periodic_rate(flows, tolerance);
    if !solution.converged {
        warnings.push(format!(
            "{label} solver did not converge after {} iterations; best estimate reported",
            solution.iterations
        ));
    }
    let annual = yields::annualized_rate(solution.rate, params.period_days, inputs.day_count_basis);
    (annual, SolverDiagnostics::from(&solution))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, reason: &str) -> BondCalcError {
    BondCalcError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn check_rate(value: Rate, field: &str) -> BondCalcResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(field, "Rate must be between 0 and 1"));
    }
    Ok(())
}

fn validate_inputs(inputs: &CalculationInputs) -> BondCalcResult<()> {
    if inputs.nominal_value <= Decimal::ZERO {
        return Err(invalid("nominal_value", "Nominal value must be positive"));
    }
    if inputs.commercial_value <= Decimal::ZERO {
        return Err(invalid(
            "commercial_value",
            "Commercial value must be positive",
        ));
    }
    if inputs.term_years == 0 {
        return Err(invalid("term_years", "Term must be at least one year"));
    }
    if inputs.rate_type == RateType::Nominal && inputs.capitalization_frequency.is_none() {
        return Err(invalid(
            "capitalization_frequency",
            "Required when rate_type is nominal",
        ));
    }

    check_rate(inputs.annual_rate, "annual_rate")?;
    check_rate(inputs.discount_rate, "discount_rate")?;
    check_rate(inputs.income_tax_rate, "income_tax_rate")?;
    check_rate(inputs.premium_rate, "premium_rate")?;
    check_rate(inputs.structuring_cost_rate, "structuring_cost_rate")?;
    check_rate(inputs.placement_cost_rate, "placement_cost_rate")?;
    check_rate(inputs.flotation_cost_rate, "flotation_cost_rate")?;
    check_rate(inputs.custody_cost_rate, "custody_cost_rate")?;
    check_rate(inputs.flotation_cap_rate, "flotation_cap_rate")?;
    check_rate(inputs.custody_cap_rate, "custody_cap_rate")?;

    if inputs.flotation_cost_rate > inputs.flotation_cap_rate {
        return Err(invalid(
            "flotation_cost_rate",
            "Issuer share exceeds the regulatory cap",
        ));
    }
    if inputs.custody_cost_rate > inputs.custody_cap_rate {
        return Err(invalid(
            "custody_cost_rate",
            "Issuer share exceeds the regulatory cap",
        ));
    }

    let years = inputs.term_years as usize;
    if inputs.inflation_series.len() != years {
        return Err(invalid(
            "inflation_series",
            "Length must equal term_years (one entry per year)",
        ));
    }
    if inputs.grace_series.len() != years {
        return Err(invalid(
            "grace_series",
            "Length must equal term_years (one entry per year)",
        ));
    }
    if inputs
        .inflation_series
        .iter()
        .any(|r| *r <= Decimal::NEGATIVE_ONE || *r > Decimal::ONE)
    {
        return Err(invalid(
            "inflation_series",
            "Annual inflation must be greater than -100% and at most 100%",
        ));
    }

    Ok(())
}
