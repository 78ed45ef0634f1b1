//! Metric trait and shared rate helpers.
//!
//! RULE: Every computation implements Metric.
//! A metric reads the store, never writes it, and owns no state beyond
//! its parameters. The engine dispatches metrics; metrics never call
//! each other.

use crate::{
    calendar::{Month, MonthSpan},
    error::{AnalyticsError, AnalyticsResult},
    store::PaymentStore,
};

/// The contract every metric must fulfill.
pub trait Metric {
    /// The result table this metric produces.
    type Output;

    /// Unique stable name, used in logs and error context.
    fn name(&self) -> &'static str;

    /// Compute the result table from a loaded store.
    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Self::Output>;
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100`, rounded to 2 dp. `None` when `whole` is zero.
pub fn pct(part: i64, whole: i64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(round2(part as f64 / whole as f64 * 100.0))
    }
}

/// Like `pct`, but a zero denominator yields 0.
pub fn pct_or_zero(part: i64, whole: i64) -> f64 {
    pct(part, whole).unwrap_or(0.0)
}

/// `months` calendar months ending at `end`. Zero months, or a range
/// reaching outside the calendar, is a Computation error for `metric`.
pub fn month_span(metric: &'static str, end: Month, months: u32) -> AnalyticsResult<MonthSpan> {
    if months == 0 {
        return Err(AnalyticsError::computation(metric, "month range must cover at least one month"));
    }
    MonthSpan::ending_at(end, months).ok_or_else(|| {
        AnalyticsError::computation(
            metric,
            format!("{months} months ending {end} fall outside the supported calendar"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_is_null_safe() {
        assert_eq!(pct(3, 0), None);
        assert_eq!(pct_or_zero(3, 0), 0.0);
        assert_eq!(pct(77, 100), Some(77.0));
        assert_eq!(pct(1, 3), Some(33.33));
    }
}
