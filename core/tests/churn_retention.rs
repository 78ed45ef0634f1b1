mod common;

use common::{minimal, Fixture};
use payintel_core::AnalyticsError;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Four users over three signup months; anchor is 2024-03-15.
fn cohort_fixture() -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-05")
        .user("u2", "US", "2024-01-20")
        .user("u3", "DE", "2024-02-10")
        .user("u4", "GB", "2024-03-01")
        .sub("s1", "u1", "10.00", "Active", "2024-01-05")
        .sub("s2", "u2", "20.00", "Churned", "2024-01-20")
        .sub("s3", "u3", "15.00", "Past Due", "2024-02-10")
        .sub("s4", "u4", "25.00", "Active", "2024-03-01")
        .paid("s1", "2024-01-10", "10.00")
        .paid("s1", "2024-02-10", "10.00")
        .paid("s1", "2024-03-10", "10.00")
        .paid("s2", "2024-01-25", "20.00")
        .txs(1, "s3", "PayPal", "DE", "2024-02-15", "Soft Decline:insufficient_funds")
        .paid("s4", "2024-03-15", "25.00")
}

// ── Monthly cohort churn ─────────────────────────────────────────────────────

#[test]
fn cohort_churn_covers_contiguous_months_most_recent_first() {
    let engine = cohort_fixture().engine();
    let rows = engine.monthly_cohort_churn(None).unwrap();

    assert_eq!(rows.len(), 12, "Default range is twelve cohort months");
    assert_eq!(rows[0].cohort_month.to_string(), "2024-03");
    assert_eq!(rows[11].cohort_month.to_string(), "2023-04");
    assert!(
        rows.windows(2).all(|w| w[0].cohort_month > w[1].cohort_month),
        "Rows must be ordered most recent first"
    );
}

#[test]
fn cohort_churn_rates_per_month() {
    let engine = cohort_fixture().engine();
    let rows = engine.monthly_cohort_churn(Some(3)).unwrap();
    assert_eq!(rows.len(), 3);

    let march = &rows[0];
    assert_eq!((march.total_subs, march.active_subs), (1, 1));
    assert_eq!(march.churn_rate_pct, Some(0.0));
    assert_eq!(march.retention_rate_pct, Some(100.0));

    let february = &rows[1];
    assert_eq!((february.total_subs, february.past_due_subs), (1, 1));
    assert_eq!(february.retention_rate_pct, Some(0.0));

    let january = &rows[2];
    assert_eq!(january.total_subs, 2);
    assert_eq!(january.churn_rate_pct, Some(50.0));
    assert_eq!(january.retention_rate_pct, Some(50.0));
}

#[test]
fn empty_cohort_months_report_null_rates() {
    let engine = cohort_fixture().engine();
    let rows = engine.monthly_cohort_churn(None).unwrap();

    let december = rows
        .iter()
        .find(|r| r.cohort_month.to_string() == "2023-12")
        .expect("2023-12 should be reported");
    assert_eq!(december.total_subs, 0);
    assert_eq!(december.churn_rate_pct, None);
    assert_eq!(december.retention_rate_pct, None);
}

#[test]
fn cohort_status_counts_never_exceed_total() {
    let engine = cohort_fixture().engine();
    for row in engine.monthly_cohort_churn(None).unwrap() {
        assert_eq!(
            row.churned_subs + row.active_subs + row.past_due_subs,
            row.total_subs,
            "Status counts must partition cohort {}",
            row.cohort_month
        );
        if row.past_due_subs == 0 && row.total_subs > 0 {
            let sum = row.churn_rate_pct.unwrap() + row.retention_rate_pct.unwrap();
            assert!((sum - 100.0).abs() < 0.02, "Churn + retention should be 100 for {}", row.cohort_month);
        }
    }
}

// ── Retention curve ──────────────────────────────────────────────────────────

#[test]
fn retention_reports_every_offset_for_populated_cohorts() {
    let engine = cohort_fixture().engine();
    let rows = engine.cohort_retention().unwrap();

    assert_eq!(rows.len(), 3 * 13, "Three cohorts with offsets 0..=12");
    assert_eq!(rows[0].cohort_month.to_string(), "2024-01");
    assert_eq!(rows[0].months_since_signup, 0);
    assert_eq!(rows[38].cohort_month.to_string(), "2024-03");
    assert_eq!(rows[38].months_since_signup, 12);
}

#[test]
fn retention_counts_distinct_paying_users_per_offset() {
    let engine = cohort_fixture().engine();
    let rows = engine.cohort_retention().unwrap();
    let at = |cohort: &str, offset: u32| {
        rows.iter()
            .find(|r| r.cohort_month.to_string() == cohort && r.months_since_signup == offset)
            .unwrap()
            .clone()
    };

    let jan0 = at("2024-01", 0);
    assert_eq!((jan0.cohort_size, jan0.retained_users), (2, 2));
    assert_eq!(jan0.retention_rate_pct, 100.0);

    let jan2 = at("2024-01", 2);
    assert_eq!(jan2.retained_users, 1);
    assert_eq!(jan2.retention_rate_pct, 50.0);
    assert!(jan2.observed);

    let jan3 = at("2024-01", 3);
    assert_eq!(jan3.retained_users, 0);
    assert!(!jan3.observed, "2024-04 lies after the anchor month");

    // A declined payment in the signup month is not retention.
    let feb0 = at("2024-02", 0);
    assert_eq!(feb0.cohort_size, 1);
    assert_eq!(feb0.retention_rate_pct, 0.0);
}

#[test]
fn retention_rates_stay_within_bounds() {
    let engine = cohort_fixture().engine();
    for row in engine.cohort_retention().unwrap() {
        assert!(
            row.retention_rate_pct.is_finite() && (0.0..=100.0).contains(&row.retention_rate_pct),
            "Retention {} out of range for {} +{}",
            row.retention_rate_pct,
            row.cohort_month,
            row.months_since_signup
        );
        assert!(row.retained_users <= row.cohort_size);
    }
}

// ── Range bounds ─────────────────────────────────────────────────────────────

/// Payments stop in March; a subscription and a user start in April.
fn late_start_fixture() -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-01")
        .user("u2", "GB", "2024-04-02")
        .sub("s1", "u1", "10.00", "Active", "2024-01-01")
        .sub("s2", "u2", "99.00", "Active", "2024-04-02")
        .paid("s1", "2024-03-31", "10.00")
}

#[test]
fn cohort_churn_includes_starts_after_last_payment() {
    let engine = late_start_fixture().engine();
    let rows = engine.monthly_cohort_churn(None).unwrap();

    assert_eq!(rows[0].cohort_month.to_string(), "2024-04");
    assert_eq!(rows[0].total_subs, 1);
    let total: i64 = rows.iter().map(|r| r.total_subs).sum();
    assert_eq!(total, 2, "Every subscription lands in a cohort");
}

#[test]
fn retention_includes_signups_after_last_payment() {
    let engine = late_start_fixture().engine();
    let rows = engine.cohort_retention().unwrap();

    let april: Vec<_> = rows
        .iter()
        .filter(|r| r.cohort_month.to_string() == "2024-04")
        .collect();
    assert_eq!(april.len(), 13);
    assert_eq!(april[0].cohort_size, 1);
    assert!(
        april.iter().all(|r| !r.observed),
        "No transaction data reaches April yet"
    );
}

#[test]
fn cohort_churn_rejects_unusable_month_counts() {
    let engine = minimal("2024-03-15").engine();

    for months in [0, 4_000_000, u32::MAX] {
        assert!(
            matches!(
                engine.monthly_cohort_churn(Some(months)),
                Err(AnalyticsError::Computation { metric: "monthly_cohort_churn", .. })
            ),
            "{months} cohort months should be rejected"
        );
    }
    assert_eq!(engine.monthly_cohort_churn(Some(1)).unwrap().len(), 1);
}

#[test]
fn retention_rejects_out_of_range_offsets() {
    let mut engine = minimal("2024-03-15").engine();
    engine.config.retention.max_offset = u32::MAX;

    assert!(matches!(
        engine.cohort_retention(),
        Err(AnalyticsError::Computation { metric: "cohort_retention", .. })
    ));
}
