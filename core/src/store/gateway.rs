use super::{GatewayProfileCounts, PairErrorCount, PairStatusCount, PaymentStore};
use crate::{error::AnalyticsResult, model::Gateway};
use chrono::NaiveDate;
use rusqlite::params;

impl PaymentStore {
    /// Transaction counts per (gateway, country, status) with `tx_date >= since`.
    /// Country is returned raw; callers decide how to label nulls.
    pub fn pair_status_counts(&self, since: NaiveDate) -> AnalyticsResult<Vec<PairStatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT gateway, country, status, COUNT(*)
             FROM transactions
             WHERE tx_date >= ?1
             GROUP BY gateway, country, status",
        )?;
        let rows = stmt
            .query_map(params![since], |row| {
                Ok(PairStatusCount {
                    gateway: row.get(0)?,
                    country: row.get(1)?,
                    status: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Error-code frequencies of non-success transactions per
    /// (gateway, country) with `tx_date >= since`.
    pub fn pair_error_counts(&self, since: NaiveDate) -> AnalyticsResult<Vec<PairErrorCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT gateway, country, error_code, COUNT(*)
             FROM transactions
             WHERE tx_date >= ?1
               AND status <> 'Success'
               AND error_code IS NOT NULL
             GROUP BY gateway, country, error_code",
        )?;
        let rows = stmt
            .query_map(params![since], |row| {
                Ok(PairErrorCount {
                    gateway: row.get(0)?,
                    country: row.get(1)?,
                    error_code: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All-time volume, null-country and decline counts for one gateway.
    pub fn gateway_profile_counts(&self, gateway: Gateway) -> AnalyticsResult<GatewayProfileCounts> {
        let counts = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN country IS NULL THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status <> 'Success' THEN 1 ELSE 0 END), 0)
             FROM transactions
             WHERE gateway = ?1",
            params![gateway],
            |row| {
                Ok(GatewayProfileCounts {
                    total: row.get(0)?,
                    null_country: row.get(1)?,
                    declines: row.get(2)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// All-time error-code frequencies for one gateway, most frequent first,
    /// ties by code.
    pub fn gateway_error_counts(&self, gateway: Gateway) -> AnalyticsResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT error_code, COUNT(*) AS n
             FROM transactions
             WHERE gateway = ?1 AND error_code IS NOT NULL
             GROUP BY error_code
             ORDER BY n DESC, error_code ASC",
        )?;
        let rows = stmt
            .query_map(params![gateway], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
