//! Price, duration, and convexity aggregation over a completed schedule.
//!
//! Every sum here runs over periods 1..=N only. Period 0 is the initial
//! outlay, not a return; letting it into the sums silently corrupts
//! duration and convexity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::rates::{DayCountBasis, ScheduleParams};
use crate::engine::schedule::CashFlowPeriod;
use crate::error::BondCalcError;
use crate::types::{Money, PrecisionConfig, Years};
use crate::BondCalcResult;

/// Aggregate valuation figures, unrounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSummary {
    /// Present value of holder flows for periods >= 1
    pub price: Money,
    /// Macaulay duration in years
    pub duration: Years,
    /// Duration / (1 + periodic discount rate)
    pub modified_duration: Decimal,
    /// Second-order price sensitivity
    pub convexity: Decimal,
}

/// Discount the holder flows and aggregate price, duration, and convexity.
///
/// Fills `discounted_flow`, `weighted_term`, and `convexity_factor` on each
/// period in place. Uses iterative discount-factor multiplication for full
/// decimal precision.
pub fn value_schedule(
    periods: &mut [CashFlowPeriod],
    params: &ScheduleParams,
    basis: DayCountBasis,
    precision: &PrecisionConfig,
) -> BondCalcResult<ValuationSummary> {
    let one_plus = Decimal::ONE + params.periodic_discount_rate;
    let year_fraction = Decimal::from(params.period_days) / Decimal::from(basis.days());

    // Period 0 is already at present value
    if let Some(initial) = periods.first_mut() {
        initial.discounted_flow = initial.holder_flow;
    }

    let mut discount = Decimal::ONE;
    let mut price = Decimal::ZERO;
    let mut weighted_sum = Decimal::ZERO;
    let mut convexity_sum = Decimal::ZERO;

    for p in periods.iter_mut().skip(1) {
        discount *= one_plus;
        if discount.is_zero() {
            return Err(BondCalcError::DivisionByZero {
                context: format!("discount factor at period {}", p.period),
            });
        }
        let n = Decimal::from(p.period);
        let discounted = p.holder_flow / discount;
        let weighted = discounted * n * year_fraction;
        let convexity_factor = discounted * n * (n + Decimal::ONE);

        p.discounted_flow = precision.round(discounted);
        p.weighted_term = precision.round(weighted);
        p.convexity_factor = precision.round(convexity_factor);

        price += discounted;
        weighted_sum += weighted;
        convexity_sum += convexity_factor;
    }

    if price.is_zero() {
        return Err(BondCalcError::DivisionByZero {
            context: "duration: discounted flow sum is zero".into(),
        });
    }

    let duration = weighted_sum / price;
    let modified_duration = duration / one_plus;
    let periods_per_year = Decimal::from(basis.days()) / Decimal::from(params.period_days);
    let convexity =
        convexity_sum / (one_plus * one_plus * price * periods_per_year * periods_per_year);

    Ok(ValuationSummary {
        price,
        duration,
        modified_duration,
        convexity,
    })
}
