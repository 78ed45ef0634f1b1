mod common;

use common::Fixture;
use payintel_core::funnel_aggregator::{FunnelEdge, STAGE_ATTEMPT, STAGE_AUTHORIZED, STAGE_SETTLED};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn funnel_fixture() -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-01")
        .sub("s1", "u1", "10.00", "Active", "2024-01-01")
        .txs(5, "s1", "Stripe", "US", "2024-02-01", "Success")
        .txs(2, "s1", "Stripe", "US", "2024-02-02", "Soft Decline:insufficient_funds")
        .txs(3, "s1", "PayPal", "DE", "2024-02-03", "Success")
        .txs(1, "s1", "PayPal", "DE", "2024-02-04", "Hard Decline:do_not_honor")
        .txs(2, "s1", "Bitcoin", "", "2024-02-05", "Success")
}

fn weight(edges: &[FunnelEdge], source: &str, target: &str) -> i64 {
    edges
        .iter()
        .filter(|e| e.source == source && e.target == target)
        .map(|e| e.weight)
        .sum()
}

fn inflow(edges: &[FunnelEdge], node: &str) -> i64 {
    edges.iter().filter(|e| e.target == node).map(|e| e.weight).sum()
}

fn outflow(edges: &[FunnelEdge], node: &str) -> i64 {
    edges.iter().filter(|e| e.source == node).map(|e| e.weight).sum()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn funnel_edges_cover_every_stage() {
    let engine = funnel_fixture().engine();
    let edges = engine.payment_funnel(None).unwrap();

    assert_eq!(weight(&edges, STAGE_ATTEMPT, "Stripe"), 7);
    assert_eq!(weight(&edges, STAGE_ATTEMPT, "PayPal"), 4);
    assert_eq!(weight(&edges, STAGE_ATTEMPT, "Bitcoin"), 2);
    assert_eq!(weight(&edges, "Stripe", "Soft Decline"), 2);
    assert_eq!(weight(&edges, "PayPal", "Hard Decline"), 1);
    assert_eq!(weight(&edges, STAGE_AUTHORIZED, STAGE_SETTLED), 10);
    assert_eq!(edges.len(), 9, "Zero-weight edges are omitted");
}

#[test]
fn funnel_conserves_flow() {
    let engine = funnel_fixture().engine();
    let edges = engine.payment_funnel(None).unwrap();

    for gateway in ["Stripe", "PayPal", "Bitcoin"] {
        assert_eq!(
            inflow(&edges, gateway),
            outflow(&edges, gateway),
            "Flow through {gateway} must be conserved"
        );
    }
    let gateway_out: i64 = ["Stripe", "PayPal", "Bitcoin"]
        .iter()
        .map(|g| outflow(&edges, g))
        .sum();
    assert_eq!(outflow(&edges, STAGE_ATTEMPT), gateway_out);
    assert_eq!(inflow(&edges, STAGE_AUTHORIZED), inflow(&edges, STAGE_SETTLED));
}

#[test]
fn funnel_edges_are_ordered_by_weight() {
    let engine = funnel_fixture().engine();
    let edges = engine.payment_funnel(None).unwrap();

    assert_eq!(edges[0].source, STAGE_AUTHORIZED);
    assert!(edges.windows(2).all(|w| w[0].weight >= w[1].weight));
}

#[test]
fn country_filter_is_exact() {
    let engine = funnel_fixture().engine();

    let de = engine.payment_funnel(Some("DE")).unwrap();
    assert_eq!(outflow(&de, STAGE_ATTEMPT), 4);
    assert_eq!(weight(&de, STAGE_AUTHORIZED, STAGE_SETTLED), 3);
    assert_eq!(weight(&de, STAGE_ATTEMPT, "Bitcoin"), 0, "Null countries never match a filter");

    assert!(engine.payment_funnel(Some("de")).unwrap().is_empty());
    assert_eq!(engine.available_countries().unwrap(), vec!["DE", "US"]);
}
