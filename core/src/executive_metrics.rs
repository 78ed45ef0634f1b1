//! Executive KPI bundle.
//!
//! Every rate here is null-safe: a zero denominator reports 0.

use crate::{
    calendar::{last_complete_month, window_start, Month},
    config::ExecutiveConfig,
    error::{AnalyticsError, AnalyticsResult},
    metric::{pct_or_zero, Metric},
    model::{from_cents, round_money},
    store::PaymentStore,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveMetrics {
    /// Snapshot anchor every trailing window is measured from.
    pub as_of: NaiveDate,
    /// Summed MRR of Active subscriptions.
    pub mrr: Decimal,
    pub active_subscriptions: i64,
    /// Success share of transactions in the trailing success window.
    pub payment_success_rate_pct: f64,
    /// All-time Success transaction amounts.
    pub total_revenue: Decimal,
    /// Churned share of subscriptions started on or before the end of
    /// `churn_reference_month`.
    pub churn_rate_pct: f64,
    pub churn_reference_month: Month,
    pub avg_transaction_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct ExecutiveSummary {
    pub success_window_days: i64,
}

impl ExecutiveSummary {
    pub fn new(config: &ExecutiveConfig) -> Self {
        Self {
            success_window_days: config.success_window_days,
        }
    }
}

impl Metric for ExecutiveSummary {
    type Output = ExecutiveMetrics;

    fn name(&self) -> &'static str {
        "executive_metrics"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<ExecutiveMetrics> {
        let as_of = store.anchor_date()?;

        let active = store.active_mrr()?;
        let revenue = store.successful_revenue()?;

        let success = store.success_ratio_since(window_start(as_of, self.success_window_days))?;

        let churn_reference_month = last_complete_month(as_of);
        let churn_through = churn_reference_month.last_day().ok_or_else(|| {
            AnalyticsError::computation(
                self.name(),
                format!("{churn_reference_month} is outside the supported calendar"),
            )
        })?;
        let churn = store.churn_ratio_through(churn_through)?;

        let total_revenue = from_cents(revenue.cents);
        let avg_transaction_value = if revenue.count == 0 {
            Decimal::ZERO
        } else {
            total_revenue
                .checked_div(Decimal::from(revenue.count))
                .map(round_money)
                .ok_or_else(|| {
                    AnalyticsError::computation(self.name(), "average transaction value overflowed")
                })?
        };

        Ok(ExecutiveMetrics {
            as_of,
            mrr: from_cents(active.cents),
            active_subscriptions: active.count,
            payment_success_rate_pct: pct_or_zero(success.hits, success.total),
            total_revenue,
            churn_rate_pct: pct_or_zero(churn.hits, churn.total),
            churn_reference_month,
            avg_transaction_value,
        })
    }
}
