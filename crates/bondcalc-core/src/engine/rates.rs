//! Rate and period normalization.
//!
//! Converts heterogeneous rate inputs (effective or nominal annual, any
//! capitalization frequency) into per-period coupon and discount rates on a
//! fixed commercial-day basis, and derives the schedule parameters shared by
//! the rest of the engine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::engine::calculator::CalculationInputs;
use crate::error::BondCalcError;
use crate::types::{Money, Rate};
use crate::BondCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Payment or capitalization frequency.
///
/// Period lengths are fixed commercial-day periods (30/60/90/120/180/360),
/// not calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Bimonthly,
    Quarterly,
    FourMonthly,
    Semiannual,
    Annual,
}

impl Frequency {
    /// Fixed length of one period in days.
    pub fn period_days(self) -> u32 {
        match self {
            Frequency::Monthly => 30,
            Frequency::Bimonthly => 60,
            Frequency::Quarterly => 90,
            Frequency::FourMonthly => 120,
            Frequency::Semiannual => 180,
            Frequency::Annual => 360,
        }
    }
}

/// Day count basis for annualizing periodic rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountBasis {
    #[serde(rename = "360")]
    Days360,
    #[serde(rename = "365")]
    Days365,
}

impl DayCountBasis {
    pub fn days(self) -> u32 {
        match self {
            DayCountBasis::Days360 => 360,
            DayCountBasis::Days365 => 365,
        }
    }
}

/// Whether the stated annual rate is effective or nominal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Effective,
    Nominal,
}

/// Derived schedule parameters, computed once per calculation and read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Length of one coupon period in days
    pub period_days: u32,
    /// Coupon periods per year (basis / period days; fractional under a
    /// 365-day basis)
    pub periods_per_year: Decimal,
    /// Total coupon periods over the bond's life (period 0 excluded)
    pub total_periods: u32,
    /// Coupon rate re-expressed for one period
    pub periodic_coupon_rate: Rate,
    /// Discount rate re-expressed for one period
    pub periodic_discount_rate: Rate,
    /// Absolute issuer-side initial costs
    pub issuer_initial_costs: Money,
    /// Absolute holder-side initial costs (regulatory cap minus issuer share)
    pub holder_initial_costs: Money,
}

// ---------------------------------------------------------------------------
// Rate conversions
// ---------------------------------------------------------------------------

/// Convert a stated annual rate to an effective annual rate.
///
/// Nominal rates compound `m` times per year where
/// `m = basis / capitalization period days`:
/// `TEA = (1 + j/m)^m - 1`.
pub fn effective_annual_rate(
    rate_type: RateType,
    annual_rate: Rate,
    capitalization: Option<Frequency>,
    basis: DayCountBasis,
) -> BondCalcResult<Rate> {
    match rate_type {
        RateType::Effective => Ok(annual_rate),
        RateType::Nominal => {
            let cap = capitalization.ok_or_else(|| BondCalcError::InvalidInput {
                field: "capitalization_frequency".into(),
                reason: "Required when rate_type is nominal".into(),
            })?;
            let m = Decimal::from(basis.days()) / Decimal::from(cap.period_days());
            Ok((Decimal::ONE + annual_rate / m).powd(m) - Decimal::ONE)
        }
    }
}

/// Re-express an effective annual rate over one coupon period:
/// `(1 + TEA)^(period days / basis) - 1`.
pub fn periodic_rate(effective_annual: Rate, period_days: u32, basis: DayCountBasis) -> Rate {
    let exponent = Decimal::from(period_days) / Decimal::from(basis.days());
    (Decimal::ONE + effective_annual).powd(exponent) - Decimal::ONE
}

// ---------------------------------------------------------------------------
// Parameter derivation
// ---------------------------------------------------------------------------

/// Derive the per-period rates, period counts, and absolute initial costs
/// from validated calculation inputs.
pub fn derive_params(inputs: &CalculationInputs) -> BondCalcResult<ScheduleParams> {
    let period_days = inputs.coupon_frequency.period_days();
    let basis = inputs.day_count_basis;

    let periods_per_year = Decimal::from(basis.days()) / Decimal::from(period_days);
    let total_periods = (periods_per_year * Decimal::from(inputs.term_years))
        .floor()
        .to_u32()
        .ok_or_else(|| BondCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term produces an unrepresentable period count".into(),
        })?;

    let effective = effective_annual_rate(
        inputs.rate_type,
        inputs.annual_rate,
        inputs.capitalization_frequency,
        basis,
    )?;

    let issuer_cost_rate = inputs.structuring_cost_rate
        + inputs.placement_cost_rate
        + inputs.flotation_cost_rate
        + inputs.custody_cost_rate;
    let holder_cost_rate = (inputs.flotation_cap_rate - inputs.flotation_cost_rate)
        + (inputs.custody_cap_rate - inputs.custody_cost_rate);

    Ok(ScheduleParams {
        period_days,
        periods_per_year,
        total_periods,
        periodic_coupon_rate: periodic_rate(effective, period_days, basis),
        periodic_discount_rate: periodic_rate(inputs.discount_rate, period_days, basis),
        issuer_initial_costs: issuer_cost_rate * inputs.commercial_value,
        holder_initial_costs: holder_cost_rate * inputs.commercial_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_effective_rate_passthrough() {
        let tea = effective_annual_rate(
            RateType::Effective,
            dec!(0.08),
            None,
            DayCountBasis::Days360,
        )
        .unwrap();
        assert_eq!(tea, dec!(0.08));
    }

    #[test]
    fn test_nominal_to_effective_bimonthly() {
        // 8% nominal, bimonthly capitalization on 360: m = 6
        // (1 + 0.08/6)^6 - 1 ≈ 8.2715%
        let tea = effective_annual_rate(
            RateType::Nominal,
            dec!(0.08),
            Some(Frequency::Bimonthly),
            DayCountBasis::Days360,
        )
        .unwrap();
        assert!((tea - dec!(0.0827145)).abs() < dec!(0.000001), "got {tea}");
    }

    #[test]
    fn test_nominal_to_effective_monthly() {
        // (1 + 0.08/12)^12 - 1 ≈ 8.3000%
        let tea = effective_annual_rate(
            RateType::Nominal,
            dec!(0.08),
            Some(Frequency::Monthly),
            DayCountBasis::Days360,
        )
        .unwrap();
        assert!((tea - dec!(0.0829995)).abs() < dec!(0.000001), "got {tea}");
    }

    #[test]
    fn test_nominal_requires_capitalization() {
        let err = effective_annual_rate(
            RateType::Nominal,
            dec!(0.08),
            None,
            DayCountBasis::Days360,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BondCalcError::InvalidInput { ref field, .. } if field == "capitalization_frequency"
        ));
    }

    #[test]
    fn test_periodic_rate_semiannual() {
        // (1.08)^(180/360) - 1 ≈ 3.9230%
        let rate = periodic_rate(dec!(0.08), 180, DayCountBasis::Days360);
        assert!(
            (rate - dec!(0.0392305)).abs() < dec!(0.0000001),
            "got {rate}"
        );
    }

    #[test]
    fn test_periodic_rate_annual_is_identity() {
        let rate = periodic_rate(dec!(0.08), 360, DayCountBasis::Days360);
        assert!((rate - dec!(0.08)).abs() < dec!(0.0000001), "got {rate}");
    }

    #[test]
    fn test_frequency_days() {
        assert_eq!(Frequency::Monthly.period_days(), 30);
        assert_eq!(Frequency::Bimonthly.period_days(), 60);
        assert_eq!(Frequency::Quarterly.period_days(), 90);
        assert_eq!(Frequency::FourMonthly.period_days(), 120);
        assert_eq!(Frequency::Semiannual.period_days(), 180);
        assert_eq!(Frequency::Annual.period_days(), 360);
    }
}
