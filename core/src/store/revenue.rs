use super::{DailyBookedRow, DailyCashRow, PaymentStore};
use crate::error::AnalyticsResult;
use chrono::NaiveDate;
use rusqlite::params;

impl PaymentStore {
    /// Per-day cash collected (Success amounts) and attempt counts for
    /// `tx_date` in `[from, to]`.
    pub fn daily_cash(&self, from: NaiveDate, to: NaiveDate) -> AnalyticsResult<Vec<DailyCashRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT tx_date,
                    COALESCE(SUM(CASE WHEN status = 'Success' THEN amount_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'Success' THEN 1 ELSE 0 END), 0),
                    COUNT(*)
             FROM transactions
             WHERE tx_date >= ?1 AND tx_date <= ?2
             GROUP BY tx_date
             ORDER BY tx_date ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(DailyCashRow {
                    tx_date: row.get(0)?,
                    success_cents: row.get(1)?,
                    successful_payments: row.get(2)?,
                    total_attempts: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-start-date booked MRR of Active and PastDue subscriptions with
    /// `start_date` in `[from, to]`.
    pub fn daily_booked(&self, from: NaiveDate, to: NaiveDate) -> AnalyticsResult<Vec<DailyBookedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_date, COALESCE(SUM(mrr_cents), 0), COUNT(*)
             FROM subscriptions
             WHERE status IN ('Active', 'PastDue')
               AND start_date >= ?1 AND start_date <= ?2
             GROUP BY start_date
             ORDER BY start_date ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(DailyBookedRow {
                    start_date: row.get(0)?,
                    booked_cents: row.get(1)?,
                    subscriptions: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
