mod common;

use common::Fixture;
use std::thread;

fn busy_fixture() -> Fixture {
    Fixture::new()
        .user("u1", "US", "2024-01-05")
        .user("u2", "DE", "2024-02-10")
        .sub("s1", "u1", "10.00", "Active", "2024-01-05")
        .sub("s2", "u2", "20.00", "Churned", "2024-02-10")
        .txs(40, "s1", "Stripe", "US", "2024-03-01", "Success")
        .txs(10, "s2", "PayPal", "DE", "2024-03-02", "Soft Decline:insufficient_funds")
        .txs(5, "s2", "Bitcoin", "", "2024-03-03", "Success")
}

/// Reader handles on other threads see exactly what the loading engine sees.
#[test]
fn readers_on_threads_agree_with_the_loader() {
    let engine = busy_fixture().engine();
    let expected_funnel = engine.payment_funnel(None).unwrap();
    let expected_kpis = engine.executive_metrics().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = engine.reader().unwrap();
            thread::spawn(move || {
                (
                    reader.payment_funnel(None).unwrap(),
                    reader.executive_metrics().unwrap(),
                    reader.cohort_retention().unwrap().len(),
                )
            })
        })
        .collect();

    for handle in handles {
        let (funnel, kpis, retention_rows) = handle.join().expect("reader thread panicked");
        assert_eq!(funnel, expected_funnel);
        assert_eq!(kpis, expected_kpis);
        assert_eq!(retention_rows, 2 * 13);
    }
}

#[test]
fn reader_outlives_the_loading_engine() {
    let engine = busy_fixture().engine();
    let reader = engine.reader().unwrap();
    drop(engine);

    let summary = reader.snapshot_summary().unwrap();
    assert_eq!(summary.rows.transactions, 55);
}

#[test]
fn reader_load_is_a_no_op() {
    let engine = busy_fixture().engine();
    let mut reader = engine.reader().unwrap();
    let counts = reader.load(&common::minimal("2024-05-01").tables()).unwrap();
    assert_eq!(counts.transactions, 55);
}
