//! Calculation engine for American-method (bullet) bonds with
//! inflation-indexed principal and configurable grace periods.
//!
//! Pipeline: [`rates`] normalizes annual rates to the coupon period and
//! derives the schedule parameters, [`schedule`] walks the period
//! recurrence, [`valuation`] aggregates price / duration / convexity, and
//! [`yields`] solves the annualized internal rates of return (issuer TCEA,
//! holder TREA). [`calculator`] is the public entry point wiring them
//! together.
//!
//! The engine is a pure function of its inputs plus a [`PrecisionConfig`];
//! it holds no cross-invocation state and performs no I/O.
//!
//! [`PrecisionConfig`]: crate::types::PrecisionConfig

pub mod calculator;
pub mod rates;
pub mod schedule;
pub mod valuation;
pub mod yields;

pub use calculator::{
    calculate, calculate_quick_metrics, CalculationInputs, CalculationResult, FinancialMetrics,
};
pub use rates::{DayCountBasis, Frequency, RateType, ScheduleParams};
pub use schedule::{CashFlowPeriod, Grace};
pub use yields::RateSolution;
