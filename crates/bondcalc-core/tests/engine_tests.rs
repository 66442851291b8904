use bondcalc_core::engine::calculator::{calculate, calculate_quick_metrics, CalculationInputs};
use bondcalc_core::engine::rates::{DayCountBasis, Frequency, RateType};
use bondcalc_core::engine::schedule::Grace;
use bondcalc_core::types::PrecisionConfig;
use bondcalc_core::BondCalcError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

// ===========================================================================
// Reference scenario
// ===========================================================================

/// Five-year inflation-indexed bullet bond.
///
/// Nominal 1000, sold at 1050, semiannual coupons on a 360 basis, 8%
/// effective annual coupon, 4.5% discount, 10% annual indexation, 30%
/// income tax, 1% redemption premium. Issuer initial costs 3.15% of the
/// commercial value (structuring 1.50% + placement 0.90% + flotation 0.50%
/// + custody 0.25%), with the flotation/custody caps equal to the issuer
/// shares so the holder pays no initial costs.
fn reference_inputs() -> CalculationInputs {
    CalculationInputs {
        nominal_value: dec!(1000),
        commercial_value: dec!(1050),
        term_years: 5,
        coupon_frequency: Frequency::Semiannual,
        day_count_basis: DayCountBasis::Days360,
        rate_type: RateType::Effective,
        capitalization_frequency: None,
        annual_rate: dec!(0.08),
        discount_rate: dec!(0.045),
        income_tax_rate: dec!(0.30),
        premium_rate: dec!(0.01),
        issuance_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        structuring_cost_rate: dec!(0.0150),
        placement_cost_rate: dec!(0.0090),
        flotation_cost_rate: dec!(0.0050),
        custody_cost_rate: dec!(0.0025),
        flotation_cap_rate: dec!(0.0050),
        custody_cap_rate: dec!(0.0025),
        inflation_series: vec![dec!(0.10); 5],
        grace_series: vec![Grace::None; 5],
    }
}

#[test]
fn test_reference_scenario_valuation() {
    let output = calculate(&reference_inputs(), &PrecisionConfig::default()).unwrap();
    let metrics = &output.result.metrics;

    assert!(
        (metrics.price - dec!(1753.341605)).abs() < dec!(0.01),
        "price {}",
        metrics.price
    );
    assert!(
        (metrics.duration - dec!(4.446031)).abs() < dec!(0.0001),
        "duration {}",
        metrics.duration
    );
    assert!(
        (metrics.modified_duration - dec!(4.349250)).abs() < dec!(0.0001),
        "modified duration {}",
        metrics.modified_duration
    );
    assert!(
        (metrics.convexity - dec!(22.394527)).abs() < dec!(0.001),
        "convexity {}",
        metrics.convexity
    );
    assert!(
        (metrics.decision_ratio - dec!(26.840558)).abs() < dec!(0.001),
        "decision ratio {}",
        metrics.decision_ratio
    );
}

#[test]
fn test_reference_scenario_yields() {
    let output = calculate(&reference_inputs(), &PrecisionConfig::default()).unwrap();
    let metrics = &output.result.metrics;

    assert!(
        (metrics.tcea - dec!(0.184482)).abs() < dec!(0.00002),
        "TCEA {}",
        metrics.tcea
    );
    assert!(
        (metrics.tcea_with_shield - dec!(0.158098)).abs() < dec!(0.00002),
        "TCEA w/ shield {}",
        metrics.tcea_with_shield
    );
    assert!(
        (metrics.trea - dec!(0.175588)).abs() < dec!(0.00002),
        "TREA {}",
        metrics.trea
    );
    assert!(metrics.tcea_diagnostics.converged);
    assert!(metrics.tcea_with_shield_diagnostics.converged);
    assert!(metrics.trea_diagnostics.converged);
}

#[test]
fn test_reference_scenario_schedule_shape() {
    let output = calculate(&reference_inputs(), &PrecisionConfig::default()).unwrap();
    let schedule = &output.result.schedule;

    assert_eq!(schedule.len(), 11);
    // Net proceeds: 1050 less 3.15% issuer costs
    assert_eq!(schedule[0].issuer_flow, dec!(1016.9250));
    // Holder pays the commercial value only (no residual cost share)
    assert_eq!(schedule[0].holder_flow, dec!(-1050));
    // First coupon on the indexed balance
    assert!((schedule[1].indexed_capital - dec!(1048.808848)).abs() < dec!(0.000001));
    assert!((schedule[1].coupon - dec!(-41.145279)).abs() < dec!(0.000001));
    // Bullet repayment recovers the fully indexed principal: 1000 × 1.1⁵
    assert_eq!(schedule[10].amortization, dec!(-1610.510000));
    let amortization_total: Decimal = schedule[1..].iter().map(|p| p.amortization).sum();
    assert_eq!(amortization_total, dec!(-1610.510000));
    // Premium paid once, at maturity
    assert_eq!(schedule[10].premium, dec!(-10));
    assert!(schedule[1..10].iter().all(|p| p.premium == Decimal::ZERO));
}

#[test]
fn test_gain_loss_against_net_proceeds() {
    let output = calculate(&reference_inputs(), &PrecisionConfig::default()).unwrap();
    let metrics = &output.result.metrics;
    assert!(
        (metrics.gain_loss - dec!(736.416605)).abs() < dec!(0.01),
        "gain/loss {}",
        metrics.gain_loss
    );
}

// ===========================================================================
// Structural invariants
// ===========================================================================

#[test]
fn test_idempotence() {
    let inputs = reference_inputs();
    let config = PrecisionConfig::default();
    let a = calculate(&inputs, &config).unwrap();
    let b = calculate(&inputs, &config).unwrap();
    assert_eq!(
        serde_json::to_value(&a.result).unwrap(),
        serde_json::to_value(&b.result).unwrap()
    );
}

#[test]
fn test_quick_metrics_agree_with_full_run() {
    let inputs = reference_inputs();
    let config = PrecisionConfig::default();
    let full = calculate(&inputs, &config).unwrap();
    let quick = calculate_quick_metrics(&inputs, &config).unwrap();
    assert_eq!(
        serde_json::to_value(&full.result.metrics).unwrap(),
        serde_json::to_value(&quick.result).unwrap()
    );
}

#[test]
fn test_trea_discounts_holder_flows_to_zero() {
    // The solved holder rate must zero the NPV of the holder series
    let output = calculate(&reference_inputs(), &PrecisionConfig::default()).unwrap();
    let schedule = &output.result.schedule;
    let annual = output.result.metrics.trea;
    // Back out the periodic rate: (1 + annual)^(180/360) - 1, via sqrt
    let one_plus_periodic = (Decimal::ONE + annual).sqrt().unwrap();
    let mut npv = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for p in schedule.iter() {
        if p.period > 0 {
            discount *= one_plus_periodic;
        }
        npv += p.holder_flow / discount;
    }
    assert!(npv.abs() < dec!(0.01), "residual NPV {npv}");
}

#[test]
fn test_grace_year_then_bullet() {
    let mut inputs = reference_inputs();
    inputs.term_years = 2;
    inputs.inflation_series = vec![dec!(0.10), dec!(0.10)];
    inputs.grace_series = vec![Grace::Total, Grace::None];
    let output = calculate(&inputs, &PrecisionConfig::default()).unwrap();
    let schedule = &output.result.schedule;

    // Both periods of year one pay nothing
    assert_eq!(schedule[1].installment, Decimal::ZERO);
    assert_eq!(schedule[2].installment, Decimal::ZERO);
    // Year two resumes interest and ends with the bullet repayment
    assert!(schedule[3].installment < Decimal::ZERO);
    assert_eq!(schedule[4].amortization, -schedule[4].indexed_capital);
}

#[test]
fn test_extreme_term_surfaces_overflow_error() {
    // Compounded 10% indexation over 1000 annual periods exceeds Decimal's
    // range; the public entry point must return an error, never panic
    let mut inputs = reference_inputs();
    inputs.term_years = 1000;
    inputs.coupon_frequency = Frequency::Annual;
    inputs.inflation_series = vec![dec!(0.10); 1000];
    inputs.grace_series = vec![Grace::None; 1000];
    let err = calculate(&inputs, &PrecisionConfig::default()).unwrap_err();
    assert!(matches!(err, BondCalcError::Overflow { .. }));
}

#[test]
fn test_zero_coupon_bond_priced_above_par_loses() {
    // 0% coupon, no inflation, no premium: the holder pays 1050 and gets
    // 1000 back ten periods later, so TREA is slightly negative:
    // (1000/1050)^(1/10) - 1 per period, ≈ -0.97% annualized
    let mut inputs = reference_inputs();
    inputs.annual_rate = dec!(0);
    inputs.premium_rate = dec!(0);
    inputs.income_tax_rate = dec!(0);
    inputs.inflation_series = vec![dec!(0); 5];
    let output = calculate(&inputs, &PrecisionConfig::default()).unwrap();
    let metrics = &output.result.metrics;
    assert!(
        (metrics.trea - dec!(-0.009712)).abs() < dec!(0.0001),
        "TREA {}",
        metrics.trea
    );
    assert!(metrics.trea_diagnostics.converged);
}
