use super::PaymentStore;
use crate::{
    error::{AnalyticsError, AnalyticsResult},
    model::{to_cents, CanonicalSnapshot},
};
use rusqlite::params;
use rust_decimal::Decimal;

fn cents(amount: Decimal, what: &str, key: &str) -> AnalyticsResult<i64> {
    to_cents(amount).ok_or_else(|| {
        AnalyticsError::computation("load", format!("{what} {amount} of '{key}' exceeds the cent range"))
    })
}

impl PaymentStore {
    /// Bulk insert a validated snapshot inside one transaction.
    /// Either every row lands or none does.
    pub fn ingest(&mut self, snapshot: &CanonicalSnapshot) -> AnalyticsResult<()> {
        let batch = self.conn.transaction()?;
        {
            let mut insert_user = batch.prepare(
                "INSERT INTO users (user_id, country, signup_date, is_anonymous)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for u in &snapshot.users {
                insert_user.execute(params![u.user_id, u.country, u.signup_date, u.is_anonymous])?;
            }

            let mut insert_sub = batch.prepare(
                "INSERT INTO subscriptions (sub_id, user_id, plan_type, mrr_cents, status, start_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for s in &snapshot.subscriptions {
                insert_sub.execute(params![
                    s.sub_id,
                    s.user_id,
                    s.plan_type,
                    cents(s.mrr_amount, "mrr_amount", &s.sub_id)?,
                    s.status,
                    s.start_date,
                ])?;
            }

            let mut insert_tx = batch.prepare(
                "INSERT INTO transactions
                 (tx_id, sub_id, gateway, currency, status, error_code, tx_date, amount_cents, country)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for t in &snapshot.transactions {
                insert_tx.execute(params![
                    t.tx_id,
                    t.sub_id,
                    t.gateway,
                    t.currency,
                    t.status,
                    t.error_code,
                    t.tx_date,
                    cents(t.amount, "amount", &t.tx_id)?,
                    t.country,
                ])?;
            }
        }
        batch.commit()?;
        Ok(())
    }
}
