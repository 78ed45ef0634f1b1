//! Payment funnel as a flat Sankey edge list.
//!
//!   Attempt → <gateway>
//!   <gateway> → Authorized | Soft Decline | Hard Decline
//!   Authorized → Settled
//!
//! Settlement is unconditional on authorization, so the Settled weight is
//! the Success count of the scope. Node indices and colours belong to the
//! presentation layer.

use crate::{
    error::AnalyticsResult,
    metric::Metric,
    model::{Gateway, TransactionStatus},
    store::PaymentStore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STAGE_ATTEMPT: &str = "Attempt";
pub const STAGE_AUTHORIZED: &str = "Authorized";
pub const STAGE_SOFT_DECLINE: &str = "Soft Decline";
pub const STAGE_HARD_DECLINE: &str = "Hard Decline";
pub const STAGE_SETTLED: &str = "Settled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelEdge {
    pub source: String,
    pub target: String,
    pub weight: i64,
}

impl FunnelEdge {
    fn new(source: &str, target: &str, weight: i64) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        }
    }
}

/// Stage a transaction lands in after its gateway.
pub fn outcome_stage(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Success => STAGE_AUTHORIZED,
        TransactionStatus::SoftDecline => STAGE_SOFT_DECLINE,
        TransactionStatus::HardDecline => STAGE_HARD_DECLINE,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFunnel {
    /// Exact country filter; `None` covers every transaction.
    pub country: Option<String>,
}

impl PaymentFunnel {
    pub fn new(country: Option<&str>) -> Self {
        Self {
            country: country.map(str::to_string),
        }
    }
}

impl Metric for PaymentFunnel {
    type Output = Vec<FunnelEdge>;

    fn name(&self) -> &'static str {
        "payment_funnel"
    }

    fn compute(&self, store: &PaymentStore) -> AnalyticsResult<Vec<FunnelEdge>> {
        let mut attempts: BTreeMap<Gateway, i64> = BTreeMap::new();
        let mut outcomes: BTreeMap<(Gateway, TransactionStatus), i64> = BTreeMap::new();
        let mut settled = 0;

        for c in store.gateway_status_counts(self.country.as_deref())? {
            *attempts.entry(c.gateway).or_default() += c.count;
            *outcomes.entry((c.gateway, c.status)).or_default() += c.count;
            if c.status.is_success() {
                settled += c.count;
            }
        }

        let mut edges: Vec<FunnelEdge> = attempts
            .iter()
            .map(|(gateway, &n)| FunnelEdge::new(STAGE_ATTEMPT, gateway.label(), n))
            .chain(outcomes.iter().map(|(&(gateway, status), &n)| {
                FunnelEdge::new(gateway.label(), outcome_stage(status), n)
            }))
            .chain(std::iter::once(FunnelEdge::new(STAGE_AUTHORIZED, STAGE_SETTLED, settled)))
            .filter(|e| e.weight > 0)
            .collect();

        edges.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });
        Ok(edges)
    }
}
