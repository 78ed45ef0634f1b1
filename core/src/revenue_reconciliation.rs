//! Cash collected vs booked revenue, per calendar month.
//!
//! cash   = Success transaction amounts dated in the month
//! booked = MRR of Active/PastDue subscriptions started in the month
//!
//! Months are contiguous and end at the later of the anchor month and the
//! latest subscription start month; a month seen on only one side (or on
//! neither) reports zeros for the missing side.

use crate::{
    calendar::{latest_month, Month},
    config::RevenueConfig,
    error::{AnalyticsError, AnalyticsResult},
    metric::{month_span, Metric},
    model::from_cents,
    store::PaymentStore,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub month: Month,
    pub cash_collected: Decimal,
    pub booked_revenue: Decimal,
    /// `cash_collected - booked_revenue`.
    pub variance: Decimal,
    /// `variance / booked_revenue * 100`, 2 dp. `None` when nothing was booked.
    pub variance_pct: Option<f64>,
    pub successful_payments: i64,
    pub total_attempts: i64,
    pub booked_subscriptions: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct MonthTotals {
    cash_cents: i64,
    booked_cents: i64,
    successful_payments: i64,
    total_attempts: i64,
    booked_subscriptions: i64,
}

#[derive(Debug, Clone)]
pub struct RevenueReconciliation {
    pub months: u32,
}

impl RevenueReconciliation {
    pub fn new(config: &RevenueConfig) -> Self {
        Self {
            months: config.months,
        }
    }
}

impl Metric for RevenueReconciliation {
    type Output = Vec<ReconciliationRow>;

    fn name(&self) -> &'static str {
        "revenue_reconciliation"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<ReconciliationRow>> {
        let end = latest_month(store.anchor_date()?, store.max_start_date()?);
        let span = month_span(self.name(), end, self.months)?;
        let (from, to) = (span.from, span.to);

        let mut totals: BTreeMap<Month, MonthTotals> =
            span.months.iter().map(|&m| (m, MonthTotals::default())).collect();

        for day in store.daily_cash(from, to)? {
            if let Some(t) = totals.get_mut(&Month::of(day.tx_date)) {
                t.cash_cents += day.success_cents;
                t.successful_payments += day.successful_payments;
                t.total_attempts += day.total_attempts;
            }
        }
        for day in store.daily_booked(from, to)? {
            if let Some(t) = totals.get_mut(&Month::of(day.start_date)) {
                t.booked_cents += day.booked_cents;
                t.booked_subscriptions += day.subscriptions;
            }
        }

        totals
            .into_iter()
            .rev()
            .map(|(month, t)| -> AnalyticsResult<ReconciliationRow> {
                let cash_collected = from_cents(t.cash_cents);
                let booked_revenue = from_cents(t.booked_cents);
                let variance = cash_collected - booked_revenue;
                Ok(ReconciliationRow {
                    month,
                    cash_collected,
                    booked_revenue,
                    variance,
                    variance_pct: self.variance_pct(month, variance, booked_revenue)?,
                    successful_payments: t.successful_payments,
                    total_attempts: t.total_attempts,
                    booked_subscriptions: t.booked_subscriptions,
                })
            })
            .collect()
    }
}

impl RevenueReconciliation {
    fn variance_pct(
        &self,
        month: Month,
        variance: Decimal,
        booked: Decimal,
    ) -> AnalyticsResult<Option<f64>> {
        if booked.is_zero() {
            return Ok(None);
        }
        variance
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|v| v.checked_div(booked))
            .and_then(|pct| {
                pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                    .to_f64()
            })
            .map(Some)
            .ok_or_else(|| {
                AnalyticsError::computation(
                    self.name(),
                    format!("variance_pct for {month} is not representable"),
                )
            })
    }
}
