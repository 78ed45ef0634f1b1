//! Loader: turns a `TableSet` into a validated `CanonicalSnapshot`.
//!
//! Three passes, each failing fast:
//!   1. Schema: every required table and column exists (`SchemaError`).
//!   2. Coercion: every cell types to its column (`SchemaError`).
//!   3. Validation: structural invariants of the snapshot (`ValidationError`).
//!
//! Nothing here touches the store; `engine` persists the result only after
//! all three passes succeed.

use crate::{
    config::GatewayConfig,
    error::{AnalyticsResult, SchemaError, ValidationError},
    model::{
        CanonicalSnapshot, Gateway, Subscription, SubscriptionStatus, Transaction,
        TransactionStatus, User,
    },
    raw::{RawTable, TableSet},
    types::TableName,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

pub const USERS: TableName = "users";
pub const SUBSCRIPTIONS: TableName = "subscriptions";
pub const TRANSACTIONS: TableName = "transactions";

pub const USER_COLUMNS: [&str; 4] = ["user_id", "country", "signup_date", "is_anonymous"];
pub const SUBSCRIPTION_COLUMNS: [&str; 6] = [
    "sub_id",
    "user_id",
    "plan_type",
    "mrr_amount",
    "status",
    "start_date",
];
pub const TRANSACTION_COLUMNS: [&str; 9] = [
    "tx_id",
    "sub_id",
    "gateway",
    "currency",
    "status",
    "error_code",
    "tx_date",
    "amount",
    "country",
];

/// Run all three passes over `tables`.
pub fn coerce_snapshot(
    tables: &TableSet,
    gateway: &GatewayConfig,
) -> AnalyticsResult<CanonicalSnapshot> {
    let users_table = require_table(tables, USERS, &USER_COLUMNS)?;
    let subs_table = require_table(tables, SUBSCRIPTIONS, &SUBSCRIPTION_COLUMNS)?;
    let txs_table = require_table(tables, TRANSACTIONS, &TRANSACTION_COLUMNS)?;

    let snapshot = CanonicalSnapshot {
        users: coerce_users(users_table)?,
        subscriptions: coerce_subscriptions(subs_table)?,
        transactions: coerce_transactions(txs_table)?,
    };

    validate(&snapshot, gateway)?;
    Ok(snapshot)
}

// ── Pass 1: schema ───────────────────────────────────────────────────────────

fn require_table<'a>(
    tables: &'a TableSet,
    table: TableName,
    columns: &[&'static str],
) -> Result<&'a RawTable, SchemaError> {
    let raw = tables
        .get(table)
        .ok_or(SchemaError::MissingTable { table })?;
    for &column in columns {
        if raw.column_index(column).is_none() {
            return Err(SchemaError::MissingColumn { table, column });
        }
    }
    Ok(raw)
}

// ── Pass 2: coercion ─────────────────────────────────────────────────────────

/// Typed access to one raw row.
struct RowReader<'a> {
    table: TableName,
    row: usize,
    cells: &'a [Option<String>],
    index: &'a HashMap<&'static str, usize>,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: &'static str) -> Option<&'a str> {
        self.index
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .and_then(|c| c.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    fn untypeable(&self, column: &'static str, expected: &'static str) -> SchemaError {
        SchemaError::Untypeable {
            table: self.table,
            column,
            row: self.row,
            value: self.cell(column).map(str::to_string),
            expected,
        }
    }

    fn parse<T>(
        &self,
        column: &'static str,
        expected: &'static str,
        f: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SchemaError> {
        self.cell(column)
            .and_then(f)
            .ok_or_else(|| self.untypeable(column, expected))
    }

    fn text(&self, column: &'static str) -> Result<String, SchemaError> {
        self.parse(column, "non-empty text", |s| Some(s.to_string()))
    }

    fn opt_text(&self, column: &'static str) -> Option<String> {
        self.cell(column).map(str::to_string)
    }

    fn date(&self, column: &'static str) -> Result<NaiveDate, SchemaError> {
        self.parse(column, "date", parse_date)
    }

    fn decimal(&self, column: &'static str) -> Result<Decimal, SchemaError> {
        self.parse(column, "decimal", parse_decimal)
    }

    fn boolean(&self, column: &'static str) -> Result<bool, SchemaError> {
        self.parse(column, "boolean", parse_bool)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part which is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    match s.as_bytes().get(10) {
        Some(b' ') | Some(b'T') => NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok(),
        _ => None,
    }
}

pub fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Visit each row of `raw` with a `RowReader` bound to `columns`.
fn coerce_rows<T>(
    raw: &RawTable,
    table: TableName,
    columns: &[&'static str],
    mut f: impl FnMut(&RowReader<'_>) -> Result<T, SchemaError>,
) -> Result<Vec<T>, SchemaError> {
    let index: HashMap<&'static str, usize> = columns
        .iter()
        .filter_map(|&c| raw.column_index(c).map(|i| (c, i)))
        .collect();
    let width = raw.columns().len();

    raw.rows()
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let row = i + 1;
            if cells.len() != width {
                return Err(SchemaError::RaggedRow {
                    table,
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            f(&RowReader {
                table,
                row,
                cells,
                index: &index,
            })
        })
        .collect()
}

fn coerce_users(raw: &RawTable) -> Result<Vec<User>, SchemaError> {
    coerce_rows(raw, USERS, &USER_COLUMNS, |r| {
        Ok(User {
            user_id: r.text("user_id")?,
            country: r.text("country")?,
            signup_date: r.date("signup_date")?,
            is_anonymous: r.boolean("is_anonymous")?,
        })
    })
}

fn coerce_subscriptions(raw: &RawTable) -> Result<Vec<Subscription>, SchemaError> {
    coerce_rows(raw, SUBSCRIPTIONS, &SUBSCRIPTION_COLUMNS, |r| {
        Ok(Subscription {
            sub_id: r.text("sub_id")?,
            user_id: r.text("user_id")?,
            plan_type: r.text("plan_type")?,
            mrr_amount: r.decimal("mrr_amount")?,
            status: r.parse("status", "subscription status", SubscriptionStatus::parse)?,
            start_date: r.date("start_date")?,
        })
    })
}

fn coerce_transactions(raw: &RawTable) -> Result<Vec<Transaction>, SchemaError> {
    coerce_rows(raw, TRANSACTIONS, &TRANSACTION_COLUMNS, |r| {
        Ok(Transaction {
            tx_id: r.text("tx_id")?,
            sub_id: r.text("sub_id")?,
            gateway: r.parse("gateway", "gateway", Gateway::parse)?,
            currency: r.text("currency")?,
            status: r.parse("status", "transaction status", TransactionStatus::parse)?,
            error_code: r.opt_text("error_code"),
            tx_date: r.date("tx_date")?,
            amount: r.decimal("amount")?,
            country: r.opt_text("country"),
        })
    })
}

// ── Pass 3: validation ───────────────────────────────────────────────────────

fn validate(snapshot: &CanonicalSnapshot, gateway: &GatewayConfig) -> Result<(), ValidationError> {
    if snapshot.users.is_empty() {
        return Err(ValidationError::EmptyTable { table: USERS });
    }
    if snapshot.subscriptions.is_empty() {
        return Err(ValidationError::EmptyTable { table: SUBSCRIPTIONS });
    }
    if snapshot.transactions.is_empty() {
        return Err(ValidationError::EmptyTable { table: TRANSACTIONS });
    }

    let mut user_ids: HashSet<&str> = HashSet::with_capacity(snapshot.users.len());
    for u in &snapshot.users {
        if !user_ids.insert(&u.user_id) {
            return Err(ValidationError::DuplicateKey {
                table: USERS,
                key: u.user_id.clone(),
            });
        }
    }

    let mut sub_start: HashMap<&str, NaiveDate> = HashMap::with_capacity(snapshot.subscriptions.len());
    for s in &snapshot.subscriptions {
        if sub_start.insert(&s.sub_id, s.start_date).is_some() {
            return Err(ValidationError::DuplicateKey {
                table: SUBSCRIPTIONS,
                key: s.sub_id.clone(),
            });
        }
        if !user_ids.contains(s.user_id.as_str()) {
            return Err(ValidationError::OrphanedReference {
                table: SUBSCRIPTIONS,
                key: s.sub_id.clone(),
                target: USERS,
                reference: s.user_id.clone(),
            });
        }
        if s.mrr_amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                table: SUBSCRIPTIONS,
                key: s.sub_id.clone(),
                column: "mrr_amount",
                value: s.mrr_amount.to_string(),
            });
        }
    }

    let mut tx_ids: HashSet<&str> = HashSet::with_capacity(snapshot.transactions.len());
    let mut before_start = 0usize;
    let mut labelled_unknown = 0usize;
    for t in &snapshot.transactions {
        if !tx_ids.insert(&t.tx_id) {
            return Err(ValidationError::DuplicateKey {
                table: TRANSACTIONS,
                key: t.tx_id.clone(),
            });
        }
        let Some(&start_date) = sub_start.get(t.sub_id.as_str()) else {
            return Err(ValidationError::OrphanedReference {
                table: TRANSACTIONS,
                key: t.tx_id.clone(),
                target: SUBSCRIPTIONS,
                reference: t.sub_id.clone(),
            });
        };
        if t.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                table: TRANSACTIONS,
                key: t.tx_id.clone(),
                column: "amount",
                value: t.amount.to_string(),
            });
        }
        if let (TransactionStatus::Success, Some(code)) = (t.status, &t.error_code) {
            return Err(ValidationError::ErrorCodeOnSuccess {
                tx_id: t.tx_id.clone(),
                error_code: code.clone(),
            });
        }
        match &t.country {
            None if !gateway.privacy_gateways.contains(&t.gateway) => {
                return Err(ValidationError::MissingCountry {
                    tx_id: t.tx_id.clone(),
                    gateway: t.gateway.label().to_string(),
                });
            }
            Some(country) if *country == gateway.unknown_country_label => labelled_unknown += 1,
            _ => {}
        }
        if t.tx_date < start_date {
            before_start += 1;
        }
    }

    if before_start > 0 {
        log::warn!(
            "loader: {before_start} transactions are dated before their subscription start_date"
        );
    }
    if labelled_unknown > 0 {
        log::warn!(
            "loader: {labelled_unknown} transactions have country '{}', which gateway metrics also use for missing countries",
            gateway.unknown_country_label
        );
    }

    Ok(())
}
