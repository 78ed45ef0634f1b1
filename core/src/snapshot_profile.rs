//! Snapshot-level lookups: the country list behind the funnel region
//! filter, privacy-gateway profiles and a load summary.

use crate::{
    error::AnalyticsResult,
    friction_detector::ErrorCodeCount,
    metric::{pct_or_zero, Metric},
    model::Gateway,
    store::{PaymentStore, RowCounts},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Countries ────────────────────────────────────────────────────────────────

/// Distinct non-null transaction countries, sorted.
#[derive(Debug, Clone, Default)]
pub struct AvailableCountries;

impl Metric for AvailableCountries {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "available_countries"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<String>> {
        store.distinct_countries()
    }
}

// ── Privacy gateways ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyGatewayProfile {
    pub gateway: Gateway,
    pub total_transactions: i64,
    pub null_country: i64,
    pub null_country_pct: f64,
    pub declines: i64,
    /// All-time error codes, most frequent first.
    pub error_codes: Vec<ErrorCodeCount>,
}

#[derive(Debug, Clone)]
pub struct PrivacyGatewayProfiles {
    pub gateways: Vec<Gateway>,
}

impl PrivacyGatewayProfiles {
    pub fn new(gateways: &[Gateway]) -> Self {
        Self {
            gateways: gateways.to_vec(),
        }
    }
}

impl Metric for PrivacyGatewayProfiles {
    type Output = Vec<PrivacyGatewayProfile>;

    fn name(&self) -> &'static str {
        "privacy_gateway_profile"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<PrivacyGatewayProfile>> {
        let mut gateways = self.gateways.clone();
        gateways.sort();
        gateways.dedup();

        gateways
            .into_iter()
            .map(|gateway| -> AnalyticsResult<PrivacyGatewayProfile> {
                let counts = store.gateway_profile_counts(gateway)?;
                let error_codes = store
                    .gateway_error_counts(gateway)?
                    .into_iter()
                    .map(|(error_code, count)| ErrorCodeCount { error_code, count })
                    .collect();
                Ok(PrivacyGatewayProfile {
                    gateway,
                    total_transactions: counts.total,
                    null_country: counts.null_country,
                    null_country_pct: pct_or_zero(counts.null_country, counts.total),
                    declines: counts.declines,
                    error_codes,
                })
            })
            .collect()
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub rows: RowCounts,
    pub first_tx_date: Option<NaiveDate>,
    pub last_tx_date: Option<NaiveDate>,
    pub anchor: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotSummaryMetric;

impl Metric for SnapshotSummaryMetric {
    type Output = SnapshotSummary;

    fn name(&self) -> &'static str {
        "snapshot_summary"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<SnapshotSummary> {
        Ok(SnapshotSummary {
            rows: store.row_counts()?,
            first_tx_date: store.min_tx_date()?,
            last_tx_date: store.max_tx_date()?,
            anchor: store.anchor_date()?,
        })
    }
}
