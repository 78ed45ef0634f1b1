use super::{GatewayStatusCount, PaymentStore};
use crate::error::AnalyticsResult;
use rusqlite::params;

impl PaymentStore {
    /// Transaction counts per (gateway, status). With `country`, only rows
    /// whose country equals it exactly are counted (null countries never match).
    pub fn gateway_status_counts(&self, country: Option<&str>) -> AnalyticsResult<Vec<GatewayStatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT gateway, status, COUNT(*)
             FROM transactions
             WHERE ?1 IS NULL OR country = ?1
             GROUP BY gateway, status",
        )?;
        let rows = stmt
            .query_map(params![country], |row| {
                Ok(GatewayStatusCount {
                    gateway: row.get(0)?,
                    status: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct non-null transaction countries, sorted.
    pub fn distinct_countries(&self) -> AnalyticsResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT country FROM transactions
             WHERE country IS NOT NULL
             ORDER BY country ASC",
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}
