//! SQLite snapshot store.
//!
//! RULE: Only the store talks to the database.
//! Metrics call store methods and never execute SQL directly.
//!
//! The snapshot lives in a named shared-cache in-memory database so that
//! `reopen()` can hand out independent read-only connections to the same
//! data. The database disappears when the last connection is dropped.

mod churn;
mod executive;
mod funnel;
mod gateway;
mod ingest;
mod revenue;

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    model::{Gateway, SubscriptionStatus, TransactionStatus},
    types::EntityId,
};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};

pub struct PaymentStore {
    conn: Connection,
    uri: String,
}

impl PaymentStore {
    /// Create a fresh, empty snapshot database.
    pub fn open_snapshot() -> AnalyticsResult<Self> {
        let uri = format!(
            "file:payintel-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let conn = Self::connect(&uri)?;
        Ok(Self { conn, uri })
    }

    /// Open another connection to the same snapshot. The new handle is
    /// query-only: any write through it fails inside SQLite.
    pub fn reopen(&self) -> AnalyticsResult<Self> {
        let conn = Self::connect(&self.uri)?;
        conn.execute_batch("PRAGMA query_only=ON;")?;
        Ok(Self {
            conn,
            uri: self.uri.clone(),
        })
    }

    fn connect(uri: &str) -> AnalyticsResult<Connection> {
        let conn = Connection::open_with_flags(
            uri,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    /// Create the canonical tables.
    pub fn migrate(&self) -> AnalyticsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_canonical_snapshot.sql"))?;
        Ok(())
    }

    /// Build the secondary indexes. Called once, after ingestion.
    pub fn create_indexes(&self) -> AnalyticsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/002_snapshot_indexes.sql"))?;
        self.conn.execute_batch("ANALYZE;")?;
        Ok(())
    }

    // ── Anchor & summary ───────────────────────────────────────

    pub fn max_tx_date(&self) -> AnalyticsResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            self.conn
                .query_row("SELECT MAX(tx_date) FROM transactions", [], |row| row.get(0))?;
        Ok(date)
    }

    pub fn min_tx_date(&self) -> AnalyticsResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            self.conn
                .query_row("SELECT MIN(tx_date) FROM transactions", [], |row| row.get(0))?;
        Ok(date)
    }

    pub fn max_start_date(&self) -> AnalyticsResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            self.conn
                .query_row("SELECT MAX(start_date) FROM subscriptions", [], |row| row.get(0))?;
        Ok(date)
    }

    pub fn max_signup_date(&self) -> AnalyticsResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            self.conn
                .query_row("SELECT MAX(signup_date) FROM users", [], |row| row.get(0))?;
        Ok(date)
    }

    /// Reference date for every trailing window: the latest transaction
    /// date, or the latest subscription start when there are no
    /// transactions.
    pub fn anchor_date(&self) -> AnalyticsResult<NaiveDate> {
        if let Some(date) = self.max_tx_date()? {
            return Ok(date);
        }
        self.max_start_date()?.ok_or_else(|| {
            AnalyticsError::computation("anchor", "snapshot has no transactions and no subscriptions")
        })
    }

    pub fn row_counts(&self) -> AnalyticsResult<RowCounts> {
        let counts = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM subscriptions),
                    (SELECT COUNT(*) FROM transactions)",
            [],
            |row| {
                Ok(RowCounts {
                    users: row.get(0)?,
                    subscriptions: row.get(1)?,
                    transactions: row.get(2)?,
                })
            },
        )?;
        Ok(counts)
    }
}

// ── Column types ─────────────────────────────────────────────────────────────

/// Enumerations are stored as their canonical text.
macro_rules! sql_text_enum {
    ($ty:ty, $to_text:ident, $what:literal) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.$to_text()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                <$ty>::parse(text)
                    .ok_or_else(|| FromSqlError::Other(format!("unknown {} {text:?}", $what).into()))
            }
        }
    };
}

sql_text_enum!(SubscriptionStatus, as_str, "subscription status");
sql_text_enum!(TransactionStatus, as_str, "transaction status");
sql_text_enum!(Gateway, label, "gateway");

// ── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub users: i64,
    pub subscriptions: i64,
    pub transactions: i64,
}

/// Subscriptions per (start_date, status).
#[derive(Debug, Clone)]
pub struct StartDateStatusCount {
    pub start_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub count: i64,
}

/// Users per signup date.
#[derive(Debug, Clone)]
pub struct SignupCount {
    pub signup_date: NaiveDate,
    pub users: i64,
}

/// One user with at least one Success transaction on `tx_date`.
#[derive(Debug, Clone)]
pub struct UserActivityRow {
    pub user_id: EntityId,
    pub signup_date: NaiveDate,
    pub tx_date: NaiveDate,
}

/// Transactions per (gateway, raw country, status) inside a window.
#[derive(Debug, Clone)]
pub struct PairStatusCount {
    pub gateway: Gateway,
    pub country: Option<String>,
    pub status: TransactionStatus,
    pub count: i64,
}

/// Decline error codes per (gateway, raw country) inside a window.
#[derive(Debug, Clone)]
pub struct PairErrorCount {
    pub gateway: Gateway,
    pub country: Option<String>,
    pub error_code: String,
    pub count: i64,
}

/// Transactions per (gateway, status), optionally country-filtered.
#[derive(Debug, Clone)]
pub struct GatewayStatusCount {
    pub gateway: Gateway,
    pub status: TransactionStatus,
    pub count: i64,
}

/// Cash side of reconciliation for one day.
#[derive(Debug, Clone)]
pub struct DailyCashRow {
    pub tx_date: NaiveDate,
    pub success_cents: i64,
    pub successful_payments: i64,
    pub total_attempts: i64,
}

/// Booked side of reconciliation for one start date.
#[derive(Debug, Clone)]
pub struct DailyBookedRow {
    pub start_date: NaiveDate,
    pub booked_cents: i64,
    pub subscriptions: i64,
}

/// Aggregate counts and an amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountAndCents {
    pub count: i64,
    pub cents: i64,
}

/// A numerator/denominator pair for a rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatioCounts {
    pub hits: i64,
    pub total: i64,
}

/// Per-gateway privacy profile counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayProfileCounts {
    pub total: i64,
    pub null_country: i64,
    pub declines: i64,
}
