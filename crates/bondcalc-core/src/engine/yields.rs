//! Internal rate of return solving for signed cash-flow series.
//!
//! Newton-Raphson on the periodic rate, annualized afterwards. The solver
//! never fails: a series with no sign change yields rate 0 (a legitimate
//! degenerate outcome), and an exhausted iteration budget returns the best
//! available estimate with `converged` unset.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::rates::DayCountBasis;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_ITERATIONS: u32 = 200;
const INITIAL_GUESS: Decimal = dec!(0.05);
const DERIVATIVE_FLOOR: Decimal = dec!(0.000000000000001);
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(2.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of one root-finding run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateSolution {
    /// Periodic internal rate of return (best estimate if not converged)
    pub rate: Rate,
    /// Whether the solver met its tolerance within the iteration budget
    pub converged: bool,
    /// Iterations consumed
    pub iterations: u32,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Solve `Σ flow[n] / (1+r)^n = 0` for the periodic rate `r`.
///
/// The series is sign-normalized so that period 0 is an outflow. A series
/// with no sign change has no meaningful rate of return and resolves to 0.
pub fn solve_periodic_rate(flows: &[Money], tolerance: Decimal) -> RateSolution {
    let has_positive = flows.iter().any(|f| *f > Decimal::ZERO);
    let has_negative = flows.iter().any(|f| *f < Decimal::ZERO);
    if !has_positive || !has_negative {
        return RateSolution {
            rate: Decimal::ZERO,
            converged: true,
            iterations: 0,
        };
    }

    let mut series: Vec<Decimal> = flows.to_vec();
    if series[0] > Decimal::ZERO {
        for f in &mut series {
            *f = -*f;
        }
    }

    let mut rate = INITIAL_GUESS;
    for iteration in 0..MAX_ITERATIONS {
        let (npv, derivative) = npv_and_derivative(&series, rate);

        if npv.abs() < tolerance {
            return RateSolution {
                rate,
                converged: true,
                iterations: iteration,
            };
        }
        if derivative.abs() < DERIVATIVE_FLOOR {
            // Too flat to step safely; report the current estimate
            return RateSolution {
                rate,
                converged: false,
                iterations: iteration,
            };
        }

        let next = (rate - npv / derivative)
            .max(RATE_FLOOR)
            .min(RATE_CEILING);
        if (next - rate).abs() < tolerance {
            return RateSolution {
                rate: next,
                converged: true,
                iterations: iteration + 1,
            };
        }
        rate = next;
    }

    RateSolution {
        rate,
        converged: false,
        iterations: MAX_ITERATIONS,
    }
}

/// NPV and its derivative at `rate`, in one pass over the series.
///
/// Period 0 contributes to NPV but not to the derivative. Checked
/// arithmetic guards the running discount factor against overflow at the
/// clamp extremes; past that point further terms are negligible.
fn npv_and_derivative(series: &[Decimal], rate: Decimal) -> (Decimal, Decimal) {
    let one_plus = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, flow) in series.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus) {
                Some(d) if !d.is_zero() => d,
                _ => break,
            };
        }
        let Some(present) = flow.checked_div(discount) else {
            break;
        };
        npv += present;
        if t > 0 {
            if let Some(slope) = (Decimal::from(t as u64) * present).checked_div(one_plus) {
                derivative -= slope;
            }
        }
    }

    (npv, derivative)
}

/// Annualize a periodic rate: `(1 + r)^(basis / period days) - 1`.
pub fn annualized_rate(periodic: Rate, period_days: u32, basis: DayCountBasis) -> Rate {
    let exponent = Decimal::from(basis.days()) / Decimal::from(period_days);
    (Decimal::ONE + periodic).powd(exponent) - Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: Decimal = dec!(0.0000000001);

    #[test]
    fn test_textbook_irr() {
        // -1000 then 3×400: IRR ≈ 9.701%
        let flows = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let solution = solve_periodic_rate(&flows, TOLERANCE);
        assert!(solution.converged);
        assert!(
            (solution.rate - dec!(0.0970103)).abs() < dec!(0.000001),
            "got {}",
            solution.rate
        );
    }

    #[test]
    fn test_root_satisfies_npv() {
        let flows = vec![dec!(-1050), dec!(40), dec!(40), dec!(40), dec!(1040)];
        let solution = solve_periodic_rate(&flows, TOLERANCE);
        assert!(solution.converged);
        let (npv, _) = npv_and_derivative(&flows, solution.rate);
        assert!(npv.abs() < dec!(0.000001), "residual {npv}");
    }

    #[test]
    fn test_degenerate_all_positive() {
        let flows = vec![dec!(100), dec!(100), dec!(100)];
        let solution = solve_periodic_rate(&flows, TOLERANCE);
        assert_eq!(solution.rate, Decimal::ZERO);
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_degenerate_all_negative() {
        let flows = vec![dec!(-100), dec!(-100)];
        let solution = solve_periodic_rate(&flows, TOLERANCE);
        assert_eq!(solution.rate, Decimal::ZERO);
        assert!(solution.converged);
    }

    #[test]
    fn test_sign_normalization() {
        // Issuer perspective (first flow positive) must solve to the same
        // rate as the mirrored holder series
        let issuer = vec![dec!(1000), dec!(-400), dec!(-400), dec!(-400)];
        let holder = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let a = solve_periodic_rate(&issuer, TOLERANCE);
        let b = solve_periodic_rate(&holder, TOLERANCE);
        assert!((a.rate - b.rate).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_zero_flow_periods() {
        let flows = vec![dec!(-1000), dec!(0), dec!(0), dec!(1331)];
        let solution = solve_periodic_rate(&flows, TOLERANCE);
        assert!(solution.converged);
        // 1000 × 1.1³ = 1331
        assert!(
            (solution.rate - dec!(0.10)).abs() < dec!(0.000001),
            "got {}",
            solution.rate
        );
    }

    #[test]
    fn test_annualized_rate_semiannual() {
        // 3.9230% per 180 days on a 360 basis ≈ 8% annual
        let annual = annualized_rate(dec!(0.039230484541), 180, DayCountBasis::Days360);
        assert!((annual - dec!(0.08)).abs() < dec!(0.000001), "got {annual}");
    }

    #[test]
    fn test_annualized_rate_identity() {
        let annual = annualized_rate(dec!(0.07), 360, DayCountBasis::Days360);
        assert!((annual - dec!(0.07)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_iteration_budget_never_panics() {
        // Pathological alternating series: must return an estimate, not fail
        let flows = vec![dec!(-1), dec!(3), dec!(-3), dec!(2), dec!(-1), dec!(1)];
        let solution = solve_periodic_rate(&flows, dec!(0.000000000000000001));
        assert!(solution.iterations <= MAX_ITERATIONS);
        assert!(solution.rate >= RATE_FLOOR && solution.rate <= RATE_CEILING);
    }
}
