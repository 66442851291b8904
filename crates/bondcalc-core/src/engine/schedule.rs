//! Period-by-period cash flow recurrence for the American (bullet) method.
//!
//! Walks periods `0..=total`, carrying forward the previous period's indexed
//! balance, amortization, and grace marker. Grace and inflation inputs are
//! year-granular; this module owns their expansion to period granularity.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::calculator::CalculationInputs;
use crate::engine::rates::{periodic_rate, ScheduleParams};
use crate::error::BondCalcError;
use crate::types::{Money, PrecisionConfig, Rate};
use crate::BondCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Grace marker for one year of the schedule.
///
/// `Total` defers both interest and principal (nothing is paid), `Partial`
/// pays interest only, `None` pays in full under the bullet rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grace {
    None,
    Partial,
    Total,
}

/// One row of the amortization schedule.
///
/// Flows are signed from the issuer's perspective: coupon, amortization, and
/// premium are outflows and therefore negative. Holder flows mirror issuer
/// flows. Period 0 carries only the initial proceeds/outlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// Period index, 0..=total
    pub period: u32,
    /// Issuance date plus `period × period_days` calendar days
    pub date: NaiveDate,
    /// Grace marker applying to this period (absent for period 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace: Option<Grace>,
    /// Inflation for this period, compounded down from the annual series value
    pub inflation: Rate,
    /// Principal balance before indexation
    pub capital: Money,
    /// Capital × (1 + period inflation)
    pub indexed_capital: Money,
    /// Interest on the indexed balance (negative)
    pub coupon: Money,
    /// Principal repayment (negative; nonzero only at the final period
    /// without grace)
    pub amortization: Money,
    /// Amount actually paid this period under the grace rules
    pub installment: Money,
    /// Redemption premium (negative; final period only)
    pub premium: Money,
    /// Coupon × income tax rate (positive; reduces the issuer's outflow)
    pub tax_shield: Money,
    /// Issuer cash flow before the tax shield
    pub issuer_flow: Money,
    /// Issuer cash flow after the tax shield
    pub issuer_flow_with_shield: Money,
    /// Sign-mirrored issuer flow (period 0 additionally carries holder costs)
    pub holder_flow: Money,
    /// Holder flow discounted at the periodic discount rate (filled by
    /// valuation)
    pub discounted_flow: Money,
    /// Discounted flow × period × year fraction (filled by valuation)
    pub weighted_term: Decimal,
    /// Discounted flow × n × (n + 1) (filled by valuation)
    pub convexity_factor: Decimal,
}

// ---------------------------------------------------------------------------
// Yearly series expansion
// ---------------------------------------------------------------------------

/// Map a 1-based period index to the year of the schedule it belongs to.
///
/// Uses `floor((period - 1) / periods_per_year)` so the last period of a
/// year stays in that year; the index is clamped so that trailing periods of
/// an unevenly divided schedule reuse the final year's marker.
pub(crate) fn year_index(period: u32, periods_per_year: Decimal, years: usize) -> usize {
    let idx = (Decimal::from(period - 1) / periods_per_year)
        .floor()
        .to_usize()
        .unwrap_or(0);
    idx.min(years.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// Build the full schedule, one record per period `0..=total_periods`.
///
/// Inputs must already be validated; series lengths are trusted to equal
/// `term_years` here.
pub fn build_schedule(
    inputs: &CalculationInputs,
    params: &ScheduleParams,
    precision: &PrecisionConfig,
) -> BondCalcResult<Vec<CashFlowPeriod>> {
    let total = params.total_periods;
    let years = inputs.term_years as usize;
    let mut periods = Vec::with_capacity(total as usize + 1);

    let issuer_proceeds = inputs.commercial_value - params.issuer_initial_costs;
    let holder_outlay = -(inputs.commercial_value + params.holder_initial_costs);

    periods.push(CashFlowPeriod {
        period: 0,
        date: inputs.issuance_date,
        grace: None,
        inflation: Decimal::ZERO,
        capital: Decimal::ZERO,
        indexed_capital: Decimal::ZERO,
        coupon: Decimal::ZERO,
        amortization: Decimal::ZERO,
        installment: Decimal::ZERO,
        premium: Decimal::ZERO,
        tax_shield: Decimal::ZERO,
        issuer_flow: precision.round(issuer_proceeds),
        issuer_flow_with_shield: precision.round(issuer_proceeds),
        holder_flow: precision.round(holder_outlay),
        discounted_flow: Decimal::ZERO,
        weighted_term: Decimal::ZERO,
        convexity_factor: Decimal::ZERO,
    });

    // State carried across periods; kept at full precision so rounding never
    // feeds back into the recurrence.
    let mut prev_indexed = Decimal::ZERO;
    let mut prev_amortization = Decimal::ZERO;
    let mut prev_grace = Grace::None;

    for n in 1..=total {
        let offset = i64::from(params.period_days) * i64::from(n);
        let date = inputs
            .issuance_date
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| {
                BondCalcError::DateError(format!("Period {n} date overflows the calendar"))
            })?;

        let year = year_index(n, params.periods_per_year, years);
        let grace = inputs.grace_series[year];
        let inflation = periodic_rate(
            inputs.inflation_series[year],
            params.period_days,
            inputs.day_count_basis,
        );

        let capital = if n == 1 {
            inputs.nominal_value
        } else if prev_grace == Grace::Total {
            // Total grace defers payment but never reduces the balance
            prev_indexed
        } else {
            prev_indexed + prev_amortization
        };
        // Indexation compounds the balance every period; a long enough term
        // exhausts Decimal's range, which must surface as an error rather
        // than a panic.
        let indexed = capital
            .checked_mul(Decimal::ONE + inflation)
            .ok_or_else(|| BondCalcError::Overflow {
                context: format!("indexed balance at period {n}"),
            })?;
        let coupon = indexed
            .checked_mul(params.periodic_coupon_rate)
            .map(|c| -c)
            .ok_or_else(|| BondCalcError::Overflow {
                context: format!("coupon at period {n}"),
            })?;

        let is_final = n == total;
        let amortization = match grace {
            Grace::Total | Grace::Partial => Decimal::ZERO,
            Grace::None if is_final => -indexed,
            Grace::None => Decimal::ZERO,
        };
        let installment = match grace {
            Grace::Total => Decimal::ZERO,
            Grace::Partial => coupon,
            Grace::None => coupon + amortization,
        };
        let premium = if is_final {
            -inputs.premium_rate * inputs.nominal_value
        } else {
            Decimal::ZERO
        };
        let tax_shield = -coupon * inputs.income_tax_rate;
        let issuer_flow = installment + premium;

        periods.push(CashFlowPeriod {
            period: n,
            date,
            grace: Some(grace),
            inflation: precision.round(inflation),
            capital: precision.round(capital),
            indexed_capital: precision.round(indexed),
            coupon: precision.round(coupon),
            amortization: precision.round(amortization),
            installment: precision.round(installment),
            premium: precision.round(premium),
            tax_shield: precision.round(tax_shield),
            issuer_flow: precision.round(issuer_flow),
            issuer_flow_with_shield: precision.round(issuer_flow + tax_shield),
            holder_flow: precision.round(-issuer_flow),
            discounted_flow: Decimal::ZERO,
            weighted_term: Decimal::ZERO,
            convexity_factor: Decimal::ZERO,
        });

        prev_indexed = indexed;
        prev_amortization = amortization;
        prev_grace = grace;
    }

    Ok(periods)
}
