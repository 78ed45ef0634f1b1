use super::{CountAndCents, PaymentStore, RatioCounts};
use crate::error::AnalyticsResult;
use chrono::NaiveDate;
use rusqlite::params;

impl PaymentStore {
    /// Count and summed MRR of Active subscriptions.
    pub fn active_mrr(&self) -> AnalyticsResult<CountAndCents> {
        let totals = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(mrr_cents), 0)
             FROM subscriptions
             WHERE status = 'Active'",
            [],
            |row| {
                Ok(CountAndCents {
                    count: row.get(0)?,
                    cents: row.get(1)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Count and summed amount of all Success transactions.
    pub fn successful_revenue(&self) -> AnalyticsResult<CountAndCents> {
        let totals = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount_cents), 0)
             FROM transactions
             WHERE status = 'Success'",
            [],
            |row| {
                Ok(CountAndCents {
                    count: row.get(0)?,
                    cents: row.get(1)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Success vs all transactions with `tx_date >= since`.
    pub fn success_ratio_since(&self, since: NaiveDate) -> AnalyticsResult<RatioCounts> {
        let ratio = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN status = 'Success' THEN 1 ELSE 0 END), 0), COUNT(*)
             FROM transactions
             WHERE tx_date >= ?1",
            params![since],
            |row| {
                Ok(RatioCounts {
                    hits: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )?;
        Ok(ratio)
    }

    /// Churned vs all subscriptions with `start_date <= boundary`.
    pub fn churn_ratio_through(&self, boundary: NaiveDate) -> AnalyticsResult<RatioCounts> {
        let ratio = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN status = 'Churned' THEN 1 ELSE 0 END), 0), COUNT(*)
             FROM subscriptions
             WHERE start_date <= ?1",
            params![boundary],
            |row| {
                Ok(RatioCounts {
                    hits: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )?;
        Ok(ratio)
    }
}
