//! Gateway acceptance & friction detector.
//!
//! Both metrics read the same trailing window, anchored to the latest
//! observed tx_date, and aggregate it per (gateway, country) pair.
//! Transactions without a country are kept under the configured unknown
//! label.
//!
//! Friction compares each pair against the global acceptance rate of the
//! whole window:
//!   variance < high_threshold            → High Friction
//!   high ≤ variance < medium_threshold   → Medium Friction
//!   otherwise                            → Normal

use crate::{
    calendar::window_start,
    config::{FrictionConfig, GatewayConfig},
    error::AnalyticsResult,
    metric::{pct, pct_or_zero, round2, Metric},
    model::{Gateway, TransactionStatus},
    store::PaymentStore,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayAcceptanceRow {
    pub gateway: Gateway,
    pub country: String,
    pub total_attempts: i64,
    pub successful_txs: i64,
    pub soft_declines: i64,
    pub hard_declines: i64,
    pub acceptance_rate_pct: f64,
    pub soft_decline_rate_pct: f64,
    pub hard_decline_rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrictionLevel {
    #[serde(rename = "High Friction")]
    High,
    #[serde(rename = "Medium Friction")]
    Medium,
    #[serde(rename = "Normal")]
    Normal,
}

impl FrictionLevel {
    pub fn label(self) -> &'static str {
        match self {
            FrictionLevel::High => "High Friction",
            FrictionLevel::Medium => "Medium Friction",
            FrictionLevel::Normal => "Normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCodeCount {
    pub error_code: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionRow {
    pub gateway: Gateway,
    pub country: String,
    pub attempts: i64,
    pub successes: i64,
    pub acceptance_rate_pct: f64,
    pub baseline_rate_pct: f64,
    /// Percentage points, `acceptance_rate_pct - baseline_rate_pct`.
    pub variance_from_baseline: f64,
    pub friction_flag: FrictionLevel,
    /// Most frequent non-success error codes, at most `top_error_codes`.
    pub top_error_codes: Vec<ErrorCodeCount>,
}

/// Variance of a pair against the baseline (2 dp) and its friction level.
/// The level is taken from the rounded variance.
pub fn classify_friction(
    pair_rate_pct: f64,
    baseline_rate_pct: f64,
    config: &FrictionConfig,
) -> (f64, FrictionLevel) {
    let variance = round2(pair_rate_pct - baseline_rate_pct);
    let level = if variance < config.high_threshold {
        FrictionLevel::High
    } else if variance < config.medium_threshold {
        FrictionLevel::Medium
    } else {
        FrictionLevel::Normal
    };
    (variance, level)
}

// ── Windowed pair aggregation ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct PairTally {
    attempts: i64,
    successes: i64,
    soft_declines: i64,
    hard_declines: i64,
}

impl PairTally {
    fn add(&mut self, status: TransactionStatus, count: i64) {
        self.attempts += count;
        match status {
            TransactionStatus::Success => self.successes += count,
            TransactionStatus::SoftDecline => self.soft_declines += count,
            TransactionStatus::HardDecline => self.hard_declines += count,
        }
    }
}

type PairKey = (Gateway, String);

struct PairWindow {
    since: NaiveDate,
    pairs: BTreeMap<PairKey, PairTally>,
    total: PairTally,
}

impl PairWindow {
    fn read(store: &PaymentStore, config: &GatewayConfig) -> AnalyticsResult<Self> {
        let since = window_start(store.anchor_date()?, config.window_days);
        let mut pairs: BTreeMap<PairKey, PairTally> = BTreeMap::new();
        let mut total = PairTally::default();
        for c in store.pair_status_counts(since)? {
            let country = label_country(c.country, config);
            pairs.entry((c.gateway, country)).or_default().add(c.status, c.count);
            total.add(c.status, c.count);
        }
        Ok(Self { since, pairs, total })
    }
}

fn label_country(country: Option<String>, config: &GatewayConfig) -> String {
    country.unwrap_or_else(|| config.unknown_country_label.clone())
}

// ── Gateway acceptance ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GatewayAcceptance {
    pub min_attempts: i64,
    pub gateway: GatewayConfig,
}

impl GatewayAcceptance {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            min_attempts: config.min_attempts,
            gateway: config.clone(),
        }
    }
}

impl Metric for GatewayAcceptance {
    type Output = Vec<GatewayAcceptanceRow>;

    fn name(&self) -> &'static str {
        "gateway_acceptance"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<GatewayAcceptanceRow>> {
        let window = PairWindow::read(store, &self.gateway)?;
        let mut rows: Vec<GatewayAcceptanceRow> = window
            .pairs
            .into_iter()
            .filter(|(_, t)| t.attempts >= self.min_attempts && t.attempts > 0)
            .map(|((gateway, country), t)| GatewayAcceptanceRow {
                gateway,
                country,
                total_attempts: t.attempts,
                successful_txs: t.successes,
                soft_declines: t.soft_declines,
                hard_declines: t.hard_declines,
                acceptance_rate_pct: pct_or_zero(t.successes, t.attempts),
                soft_decline_rate_pct: pct_or_zero(t.soft_declines, t.attempts),
                hard_decline_rate_pct: pct_or_zero(t.hard_declines, t.attempts),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_attempts
                .cmp(&a.total_attempts)
                .then(a.acceptance_rate_pct.total_cmp(&b.acceptance_rate_pct))
                .then(a.gateway.cmp(&b.gateway))
                .then_with(|| a.country.cmp(&b.country))
        });
        Ok(rows)
    }
}

// ── Friction detection ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GatewayFriction {
    pub min_attempts: i64,
    pub gateway: GatewayConfig,
    pub friction: FrictionConfig,
}

impl GatewayFriction {
    pub fn new(gateway: &GatewayConfig, friction: &FrictionConfig) -> Self {
        Self {
            min_attempts: friction.min_attempts,
            gateway: gateway.clone(),
            friction: friction.clone(),
        }
    }
}

impl Metric for GatewayFriction {
    type Output = Vec<FrictionRow>;

    fn name(&self) -> &'static str {
        "gateway_friction"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<FrictionRow>> {
        let window = PairWindow::read(store, &self.gateway)?;
        let Some(baseline) = pct(window.total.successes, window.total.attempts) else {
            return Ok(Vec::new());
        };

        let mut codes: BTreeMap<PairKey, Vec<ErrorCodeCount>> = BTreeMap::new();
        for e in store.pair_error_counts(window.since)? {
            let country = label_country(e.country, &self.gateway);
            codes.entry((e.gateway, country)).or_default().push(ErrorCodeCount {
                error_code: e.error_code,
                count: e.count,
            });
        }

        let mut rows = Vec::new();
        for (key, t) in window.pairs {
            if t.attempts < self.min_attempts || t.attempts == 0 {
                continue;
            }
            let acceptance = pct_or_zero(t.successes, t.attempts);
            let (variance, level) = classify_friction(acceptance, baseline, &self.friction);

            // Codes from the merged unknown bucket may repeat; fold them first.
            let mut top = merge_codes(codes.remove(&key).unwrap_or_default());
            top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error_code.cmp(&b.error_code)));
            top.truncate(self.friction.top_error_codes);

            let (gateway, country) = key;
            rows.push(FrictionRow {
                gateway,
                country,
                attempts: t.attempts,
                successes: t.successes,
                acceptance_rate_pct: acceptance,
                baseline_rate_pct: baseline,
                variance_from_baseline: variance,
                friction_flag: level,
                top_error_codes: top,
            });
        }

        rows.sort_by(|a, b| {
            a.variance_from_baseline
                .total_cmp(&b.variance_from_baseline)
                .then(b.attempts.cmp(&a.attempts))
                .then(a.gateway.cmp(&b.gateway))
                .then_with(|| a.country.cmp(&b.country))
        });
        Ok(rows)
    }
}

fn merge_codes(codes: Vec<ErrorCodeCount>) -> Vec<ErrorCodeCount> {
    let mut merged: BTreeMap<String, i64> = BTreeMap::new();
    for c in codes {
        *merged.entry(c.error_code).or_default() += c.count;
    }
    merged
        .into_iter()
        .map(|(error_code, count)| ErrorCodeCount { error_code, count })
        .collect()
}
