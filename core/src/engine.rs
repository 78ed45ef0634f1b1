//! The analytics engine: one loaded snapshot plus the metrics over it.
//!
//! LIFECYCLE:
//!   1. `new(config)`       unloaded, every query returns NotLoaded
//!   2. `load(tables)`      coerce, validate, ingest, index; once only
//!   3. metric calls        pure reads over the immutable snapshot
//!   4. `reader()`          extra handle for another thread
//!
//! RULES:
//!   - Load either completes or leaves the engine unloaded.
//!   - A second load on a loaded engine is a no-op.
//!   - Metrics never write and never call each other.

use crate::{
    config::AnalyticsConfig,
    error::{AnalyticsError, AnalyticsResult},
    executive_metrics::{ExecutiveMetrics, ExecutiveSummary},
    friction_detector::{FrictionRow, GatewayAcceptance, GatewayAcceptanceRow, GatewayFriction},
    funnel_aggregator::{FunnelEdge, PaymentFunnel},
    loader::coerce_snapshot,
    metric::Metric,
    raw::TableSet,
    retention_engine::{CohortChurnRow, CohortRetention, MonthlyCohortChurn, RetentionRow},
    revenue_reconciliation::{ReconciliationRow, RevenueReconciliation},
    snapshot_profile::{
        AvailableCountries, PrivacyGatewayProfile, PrivacyGatewayProfiles, SnapshotSummary,
        SnapshotSummaryMetric,
    },
    store::{PaymentStore, RowCounts},
};

pub struct AnalyticsEngine {
    pub config: AnalyticsConfig,
    store:      Option<PaymentStore>,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config, store: None }
    }

    /// Engine with test-friendly thresholds. See `AnalyticsConfig::default_test`.
    pub fn build_test() -> Self {
        Self::new(AnalyticsConfig::default_test())
    }

    /// Load a snapshot. Returns the stored row counts.
    pub fn load(&mut self, tables: &TableSet) -> AnalyticsResult<RowCounts> {
        if let Some(store) = &self.store {
            log::debug!("Snapshot already loaded; ignoring second load");
            return store.row_counts();
        }

        let snapshot = coerce_snapshot(tables, &self.config.gateway)?;

        let mut store = PaymentStore::open_snapshot()?;
        store.migrate()?;
        store.ingest(&snapshot)?;
        store.create_indexes()?;
        let counts = store.row_counts()?;

        log::info!(
            "Snapshot loaded: {} users, {} subscriptions, {} transactions",
            counts.users,
            counts.subscriptions,
            counts.transactions
        );
        self.store = Some(store);
        Ok(counts)
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }

    /// A second engine over the same snapshot, with its own read-only
    /// connection. Handles can be moved to other threads.
    pub fn reader(&self) -> AnalyticsResult<Self> {
        let store = self.store()?.reopen()?;
        Ok(Self {
            config: self.config.clone(),
            store:  Some(store),
        })
    }

    /// Run any metric against the loaded snapshot.
    pub fn run<M: Metric>(&self, metric: &M) -> AnalyticsResult<M::Output> {
        let store = self.store()?;
        log::debug!("Computing {}", metric.name());
        metric.compute(store)
    }

    fn store(&self) -> AnalyticsResult<&PaymentStore> {
        self.store.as_ref().ok_or(AnalyticsError::NotLoaded)
    }

    // ── Churn & retention ──────────────────────────────────────

    /// Cohort churn over the last `months` start months (config default
    /// when `None`), most recent first.
    pub fn monthly_cohort_churn(&self, months: Option<u32>) -> AnalyticsResult<Vec<CohortChurnRow>> {
        let mut metric = MonthlyCohortChurn::new(&self.config.churn);
        if let Some(months) = months {
            metric.cohort_months = months;
        }
        self.run(&metric)
    }

    pub fn cohort_retention(&self) -> AnalyticsResult<Vec<RetentionRow>> {
        self.run(&CohortRetention::new(&self.config.retention))
    }

    // ── Gateways ───────────────────────────────────────────────

    pub fn gateway_acceptance(&self, min_attempts: Option<i64>) -> AnalyticsResult<Vec<GatewayAcceptanceRow>> {
        let mut metric = GatewayAcceptance::new(&self.config.gateway);
        if let Some(min_attempts) = min_attempts {
            metric.min_attempts = min_attempts;
        }
        self.run(&metric)
    }

    pub fn detect_gateway_friction(&self, min_attempts: Option<i64>) -> AnalyticsResult<Vec<FrictionRow>> {
        let mut metric = GatewayFriction::new(&self.config.gateway, &self.config.friction);
        if let Some(min_attempts) = min_attempts {
            metric.min_attempts = min_attempts;
        }
        self.run(&metric)
    }

    // ── Revenue, funnel, executive ─────────────────────────────

    pub fn revenue_reconciliation(&self) -> AnalyticsResult<Vec<ReconciliationRow>> {
        self.run(&RevenueReconciliation::new(&self.config.revenue))
    }

    /// Sankey edges, optionally restricted to one exact country.
    pub fn payment_funnel(&self, country: Option<&str>) -> AnalyticsResult<Vec<FunnelEdge>> {
        self.run(&PaymentFunnel::new(country))
    }

    pub fn executive_metrics(&self) -> AnalyticsResult<ExecutiveMetrics> {
        self.run(&ExecutiveSummary::new(&self.config.executive))
    }

    // ── Snapshot lookups ───────────────────────────────────────

    pub fn available_countries(&self) -> AnalyticsResult<Vec<String>> {
        self.run(&AvailableCountries)
    }

    pub fn privacy_gateway_profile(&self) -> AnalyticsResult<Vec<PrivacyGatewayProfile>> {
        self.run(&PrivacyGatewayProfiles::new(&self.config.gateway.privacy_gateways))
    }

    pub fn snapshot_summary(&self) -> AnalyticsResult<SnapshotSummary> {
        self.run(&SnapshotSummaryMetric)
    }
}
