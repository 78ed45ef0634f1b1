mod common;

use common::Fixture;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Anchor 2024-03-15: the 30-day success window starts 2024-02-14 and the
/// churn reference month is 2024-02.
fn executive_fixture() -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-05")
        .user("u2", "US", "2024-01-20")
        .sub("s1", "u1", "10.00", "Active", "2024-01-05")
        .sub("s2", "u2", "20.00", "Churned", "2024-01-20")
        .sub("s3", "u1", "15.00", "Past Due", "2024-02-10")
        .sub("s4", "u2", "25.00", "Active", "2024-03-01")
        .paid("s1", "2024-01-10", "10.00")
        .paid("s1", "2024-02-20", "10.00")
        .txs(1, "s3", "PayPal", "US", "2024-02-25", "Soft Decline:insufficient_funds")
        .paid("s4", "2024-03-15", "25.00")
}

#[test]
fn executive_kpis() {
    let engine = executive_fixture().engine();
    let kpis = engine.executive_metrics().unwrap();

    assert_eq!(kpis.as_of, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(kpis.mrr, Decimal::new(3_500, 2));
    assert_eq!(kpis.active_subscriptions, 2);
    assert_eq!(kpis.payment_success_rate_pct, 66.67, "2 of 3 attempts since 2024-02-14");
    assert_eq!(kpis.total_revenue, Decimal::new(4_500, 2));
    assert_eq!(kpis.avg_transaction_value, Decimal::new(1_500, 2));
}

#[test]
fn churn_uses_most_recent_complete_month() {
    let engine = executive_fixture().engine();
    let kpis = engine.executive_metrics().unwrap();

    assert_eq!(kpis.churn_reference_month.to_string(), "2024-02");
    // s1, s2 and s3 started by 2024-02-29; s2 churned.
    assert_eq!(kpis.churn_rate_pct, 33.33);
}

#[test]
fn anchor_on_month_end_counts_that_month() {
    let engine = executive_fixture()
        .paid("s4", "2024-03-31", "25.00")
        .engine();
    let kpis = engine.executive_metrics().unwrap();

    assert_eq!(kpis.churn_reference_month.to_string(), "2024-03");
    assert_eq!(kpis.churn_rate_pct, 25.0);
}

#[test]
fn empty_denominators_report_zero() {
    // Every subscription starts in the anchor month, so nothing falls on or
    // before the end of the reference month.
    let engine = Fixture::new()
        .user("u1", "US", "2024-03-01")
        .sub("s1", "u1", "10.00", "Churned", "2024-03-02")
        .txs(1, "s1", "Stripe", "US", "2024-03-05", "Hard Decline:do_not_honor")
        .engine();
    let kpis = engine.executive_metrics().unwrap();

    assert_eq!(kpis.churn_rate_pct, 0.0);
    assert_eq!(kpis.payment_success_rate_pct, 0.0);
    assert_eq!(kpis.mrr, Decimal::ZERO);
    assert_eq!(kpis.total_revenue, Decimal::ZERO);
    assert_eq!(kpis.avg_transaction_value, Decimal::ZERO);
}
