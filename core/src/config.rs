use crate::model::Gateway;
use serde::{Deserialize, Serialize};

// ── Churn & retention ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Number of calendar cohort-months reported, ending at the anchor month.
    pub cohort_months: u32,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self { cohort_months: 12 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Number of signup cohorts considered, ending at the anchor month.
    pub cohort_months: u32,
    /// Largest month offset reported per cohort (inclusive).
    pub max_offset: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            cohort_months: 12,
            max_offset: 12,
        }
    }
}

// ── Gateway acceptance & friction ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Trailing window width in days, anchored to the latest tx_date.
    pub window_days: i64,
    /// Minimum attempts for a (gateway, country) pair in the acceptance table.
    pub min_attempts: i64,
    /// Label used for transactions without a country. Transactions whose
    /// country is literally this label share its bucket; the loader warns
    /// when that happens.
    pub unknown_country_label: String,
    /// Gateways allowed to omit the transaction country.
    pub privacy_gateways: Vec<Gateway>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            min_attempts: 100,
            unknown_country_label: "Unknown".into(),
            privacy_gateways: vec![Gateway::Bitcoin],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionConfig {
    /// Minimum attempts for a pair to be classified.
    pub min_attempts: i64,
    /// Variance (percentage points) strictly below which a pair is High Friction.
    pub high_threshold: f64,
    /// Variance strictly below which a pair is Medium Friction.
    pub medium_threshold: f64,
    /// Number of most frequent decline error codes attached per pair.
    pub top_error_codes: usize,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            min_attempts: 50,
            high_threshold: -10.0,
            medium_threshold: -5.0,
            top_error_codes: 3,
        }
    }
}

// ── Revenue & executive ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueConfig {
    pub months: u32,
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self { months: 12 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutiveConfig {
    pub success_window_days: i64,
}

impl Default for ExecutiveConfig {
    fn default() -> Self {
        Self {
            success_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub churn: ChurnConfig,
    pub retention: RetentionConfig,
    pub gateway: GatewayConfig,
    pub friction: FrictionConfig,
    pub revenue: RevenueConfig,
    pub executive: ExecutiveConfig,
}

impl AnalyticsConfig {
    /// Load from a JSON file. Missing sections and fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gateway.window_days <= 0 || self.executive.success_window_days <= 0 {
            anyhow::bail!("trailing windows must be at least one day wide");
        }
        if self.churn.cohort_months == 0 || self.retention.cohort_months == 0 || self.revenue.months == 0 {
            anyhow::bail!("month ranges must cover at least one month");
        }
        if self.friction.high_threshold > self.friction.medium_threshold {
            anyhow::bail!(
                "friction high_threshold ({}) must not exceed medium_threshold ({})",
                self.friction.high_threshold,
                self.friction.medium_threshold
            );
        }
        Ok(())
    }

    /// Defaults with the volume floors removed, for small test fixtures.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.gateway.min_attempts = 1;
        config.friction.min_attempts = 1;
        config
    }
}
