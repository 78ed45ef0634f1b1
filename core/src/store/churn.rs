use super::{PaymentStore, SignupCount, StartDateStatusCount, UserActivityRow};
use crate::error::AnalyticsResult;
use chrono::NaiveDate;
use rusqlite::params;

impl PaymentStore {
    /// Subscription counts per (start_date, status) for starts in `[from, to]`.
    pub fn subscription_counts_by_start_date(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AnalyticsResult<Vec<StartDateStatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_date, status, COUNT(*)
             FROM subscriptions
             WHERE start_date >= ?1 AND start_date <= ?2
             GROUP BY start_date, status
             ORDER BY start_date ASC, status ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(StartDateStatusCount {
                    start_date: row.get(0)?,
                    status: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// User counts per signup date for signups in `[from, to]`.
    pub fn signup_counts(&self, from: NaiveDate, to: NaiveDate) -> AnalyticsResult<Vec<SignupCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT signup_date, COUNT(*)
             FROM users
             WHERE signup_date >= ?1 AND signup_date <= ?2
             GROUP BY signup_date
             ORDER BY signup_date ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(SignupCount {
                    signup_date: row.get(0)?,
                    users: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct (user, tx_date) pairs with a Success transaction, for users
    /// who signed up in `[from, to]`.
    pub fn successful_user_activity(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AnalyticsResult<Vec<UserActivityRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT u.user_id, u.signup_date, t.tx_date
             FROM transactions t
             JOIN subscriptions s ON s.sub_id = t.sub_id
             JOIN users u ON u.user_id = s.user_id
             WHERE t.status = 'Success'
               AND u.signup_date >= ?1 AND u.signup_date <= ?2
             ORDER BY u.user_id ASC, t.tx_date ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok(UserActivityRow {
                    user_id: row.get(0)?,
                    signup_date: row.get(1)?,
                    tx_date: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
