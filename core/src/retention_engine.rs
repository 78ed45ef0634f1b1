//! Churn & retention engine.
//!
//! Two metrics:
//!   1. MonthlyCohortChurn: subscriptions bucketed by start month, with
//!      churn and retention rates per cohort.
//!   2. CohortRetention: users bucketed by signup month, with the share
//!      that paid successfully N months later.
//!
//! Month ranges are contiguous calendar months ending at the latest month
//! with data: the anchor month, or a later start (churn) or signup
//! (retention) month.

use crate::{
    calendar::{latest_month, Month},
    config::{ChurnConfig, RetentionConfig},
    error::{AnalyticsError, AnalyticsResult},
    metric::{month_span, pct, Metric},
    model::SubscriptionStatus,
    store::PaymentStore,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortChurnRow {
    pub cohort_month: Month,
    pub total_subs: i64,
    pub churned_subs: i64,
    pub active_subs: i64,
    pub past_due_subs: i64,
    /// `None` when the cohort is empty.
    pub churn_rate_pct: Option<f64>,
    /// `None` when the cohort is empty.
    pub retention_rate_pct: Option<f64>,
}

impl CohortChurnRow {
    fn empty(cohort_month: Month) -> Self {
        Self {
            cohort_month,
            total_subs: 0,
            churned_subs: 0,
            active_subs: 0,
            past_due_subs: 0,
            churn_rate_pct: None,
            retention_rate_pct: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRow {
    pub cohort_month: Month,
    pub months_since_signup: u32,
    pub cohort_size: i64,
    pub retained_users: i64,
    pub retention_rate_pct: f64,
    /// False when `cohort_month + months_since_signup` lies after the month
    /// of the latest transaction, i.e. the offset has not happened yet.
    pub observed: bool,
}

// ── Monthly cohort churn ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MonthlyCohortChurn {
    pub cohort_months: u32,
}

impl MonthlyCohortChurn {
    pub fn new(config: &ChurnConfig) -> Self {
        Self {
            cohort_months: config.cohort_months,
        }
    }
}

impl Metric for MonthlyCohortChurn {
    type Output = Vec<CohortChurnRow>;

    fn name(&self) -> &'static str {
        "monthly_cohort_churn"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<CohortChurnRow>> {
        let anchor = store.anchor_date()?;
        let end = latest_month(anchor, store.max_start_date()?);
        let span = month_span(self.name(), end, self.cohort_months)?;

        let mut cohorts: BTreeMap<Month, CohortChurnRow> = span
            .months
            .iter()
            .map(|&m| (m, CohortChurnRow::empty(m)))
            .collect();

        for c in store.subscription_counts_by_start_date(span.from, span.to)? {
            let Some(row) = cohorts.get_mut(&Month::of(c.start_date)) else {
                continue;
            };
            row.total_subs += c.count;
            match c.status {
                SubscriptionStatus::Active => row.active_subs += c.count,
                SubscriptionStatus::Churned => row.churned_subs += c.count,
                SubscriptionStatus::PastDue => row.past_due_subs += c.count,
            }
        }

        Ok(cohorts
            .into_values()
            .rev()
            .map(|mut row| {
                row.churn_rate_pct = pct(row.churned_subs, row.total_subs);
                row.retention_rate_pct = pct(row.active_subs, row.total_subs);
                row
            })
            .collect())
    }
}

// ── Cohort retention curve ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CohortRetention {
    pub cohort_months: u32,
    pub max_offset: u32,
}

impl CohortRetention {
    pub fn new(config: &RetentionConfig) -> Self {
        Self {
            cohort_months: config.cohort_months,
            max_offset: config.max_offset,
        }
    }
}

impl Metric for CohortRetention {
    type Output = Vec<RetentionRow>;

    fn name(&self) -> &'static str {
        "cohort_retention"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<RetentionRow>> {
        let anchor = store.anchor_date()?;
        let end = latest_month(anchor, store.max_signup_date()?);
        let span = month_span(self.name(), end, self.cohort_months)?;
        let (from, to) = (span.from, span.to);
        // Rows past the last transaction month have not happened yet.
        let observed_through = Month::of(anchor);
        let max_offset = i32::try_from(self.max_offset)
            .ok()
            .filter(|&offset| end.checked_add_months(offset).is_some())
            .ok_or_else(|| {
                AnalyticsError::computation(
                    self.name(),
                    format!("max_offset {} is out of range", self.max_offset),
                )
            })?;

        // Cohort sizes are fixed by signup month and never recomputed.
        let mut sizes: BTreeMap<Month, i64> = BTreeMap::new();
        for s in store.signup_counts(from, to)? {
            *sizes.entry(Month::of(s.signup_date)).or_default() += s.users;
        }

        let mut retained: HashMap<(Month, i32), HashSet<String>> = HashMap::new();
        for a in store.successful_user_activity(from, to)? {
            let cohort = Month::of(a.signup_date);
            let offset = Month::of(a.tx_date).months_since(cohort);
            if (0..=max_offset).contains(&offset) {
                retained.entry((cohort, offset)).or_default().insert(a.user_id);
            }
        }

        let mut rows = Vec::new();
        for (cohort, cohort_size) in sizes {
            for offset in 0..=max_offset {
                let retained_users = retained
                    .get(&(cohort, offset))
                    .map_or(0, |users| users.len() as i64);
                let retention_rate_pct = pct(retained_users, cohort_size).ok_or_else(|| {
                    AnalyticsError::computation(self.name(), format!("cohort {cohort} has no users"))
                })?;
                rows.push(RetentionRow {
                    cohort_month: cohort,
                    months_since_signup: offset as u32,
                    cohort_size,
                    retained_users,
                    retention_rate_pct,
                    observed: cohort.add_months(offset) <= observed_through,
                });
            }
        }
        Ok(rows)
    }
}
