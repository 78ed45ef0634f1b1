//! Canonical entities of the snapshot and their fixed enumerations.

use crate::types::EntityId;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Churned,
    PastDue,
}

impl SubscriptionStatus {
    /// Canonical spelling stored in the snapshot.
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Churned => "Churned",
            SubscriptionStatus::PastDue => "PastDue",
        }
    }

    /// Accepts the source spellings (`Cancelled`, `Past Due`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "churned" | "cancelled" | "canceled" => Some(SubscriptionStatus::Churned),
            "pastdue" => Some(SubscriptionStatus::PastDue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    SoftDecline,
    HardDecline,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Success => "Success",
            TransactionStatus::SoftDecline => "SoftDecline",
            TransactionStatus::HardDecline => "HardDecline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "success" => Some(TransactionStatus::Success),
            "softdecline" => Some(TransactionStatus::SoftDecline),
            "harddecline" => Some(TransactionStatus::HardDecline),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == TransactionStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gateway {
    Stripe,
    PayPal,
    #[serde(rename = "Apple Pay")]
    ApplePay,
    Bitcoin,
}

impl Gateway {
    pub const ALL: [Gateway; 4] = [
        Gateway::Stripe,
        Gateway::PayPal,
        Gateway::ApplePay,
        Gateway::Bitcoin,
    ];

    /// Display label, also used as the funnel stage name.
    pub fn label(self) -> &'static str {
        match self {
            Gateway::Stripe => "Stripe",
            Gateway::PayPal => "PayPal",
            Gateway::ApplePay => "Apple Pay",
            Gateway::Bitcoin => "Bitcoin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = normalize_label(s);
        Gateway::ALL
            .into_iter()
            .find(|g| normalize_label(g.label()) == key)
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercase with spaces, underscores and hyphens removed.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Entities ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: EntityId,
    pub country: String,
    pub signup_date: NaiveDate,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub sub_id: EntityId,
    pub user_id: EntityId,
    pub plan_type: String,
    pub mrr_amount: Decimal,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: EntityId,
    pub sub_id: EntityId,
    pub gateway: Gateway,
    pub currency: String,
    pub status: TransactionStatus,
    pub error_code: Option<String>,
    pub tx_date: NaiveDate,
    pub amount: Decimal,
    pub country: Option<String>,
}

/// The typed, validated content of one load.
#[derive(Debug, Clone, Default)]
pub struct CanonicalSnapshot {
    pub users: Vec<User>,
    pub subscriptions: Vec<Subscription>,
    pub transactions: Vec<Transaction>,
}

// ── Money ────────────────────────────────────────────────────────────────────

/// Scale of every monetary value in the engine.
pub const MONEY_SCALE: u32 = 2;

/// Round to the money scale, half away from zero.
pub fn round_money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Integer cents for exact SQL sums. `None` when the value overflows i64.
pub fn to_cents(d: Decimal) -> Option<i64> {
    (round_money(d) * Decimal::ONE_HUNDRED).to_i64()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_spellings_from_source_data() {
        assert_eq!(SubscriptionStatus::parse("Past Due"), Some(SubscriptionStatus::PastDue));
        assert_eq!(SubscriptionStatus::parse("Cancelled"), Some(SubscriptionStatus::Churned));
        assert_eq!(SubscriptionStatus::parse("churned"), Some(SubscriptionStatus::Churned));
        assert_eq!(TransactionStatus::parse("Soft Decline"), Some(TransactionStatus::SoftDecline));
        assert_eq!(TransactionStatus::parse("hard_decline"), Some(TransactionStatus::HardDecline));
        assert_eq!(TransactionStatus::parse("Refunded"), None);
    }

    #[test]
    fn gateway_labels_round_trip() {
        for g in Gateway::ALL {
            assert_eq!(Gateway::parse(g.label()), Some(g));
        }
        assert_eq!(Gateway::parse("applepay"), Some(Gateway::ApplePay));
        assert_eq!(Gateway::parse("Venmo"), None);
    }

    #[test]
    fn cents_conversion_rounds_half_away_from_zero() {
        assert_eq!(to_cents(Decimal::from_str("4.995").unwrap()), Some(500));
        assert_eq!(to_cents(Decimal::from_str("9.99").unwrap()), Some(999));
        assert_eq!(from_cents(1234), Decimal::from_str("12.34").unwrap());
    }
}
