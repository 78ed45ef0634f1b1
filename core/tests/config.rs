use payintel_core::model::Gateway;
use payintel_core::AnalyticsConfig;

fn write_config(name: &str, body: &str) -> String {
    let path = std::env::temp_dir().join(format!("payintel-{name}-{}.json", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn defaults_match_documented_values() {
    let cfg = AnalyticsConfig::default();
    assert_eq!(cfg.churn.cohort_months, 12);
    assert_eq!(cfg.retention.max_offset, 12);
    assert_eq!(cfg.gateway.window_days, 90);
    assert_eq!(cfg.gateway.min_attempts, 100);
    assert_eq!(cfg.gateway.privacy_gateways, vec![Gateway::Bitcoin]);
    assert_eq!(cfg.friction.min_attempts, 50);
    assert_eq!(cfg.friction.top_error_codes, 3);
    assert_eq!(cfg.revenue.months, 12);
    assert_eq!(cfg.executive.success_window_days, 30);
}

#[test]
fn partial_file_keeps_defaults() {
    let path = write_config(
        "partial",
        r#"{ "gateway": { "window_days": 30, "privacy_gateways": ["Bitcoin", "Apple Pay"] } }"#,
    );
    let cfg = AnalyticsConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.gateway.window_days, 30);
    assert_eq!(cfg.gateway.min_attempts, 100);
    assert_eq!(cfg.gateway.privacy_gateways, vec![Gateway::Bitcoin, Gateway::ApplePay]);
    assert_eq!(cfg.friction.high_threshold, -10.0);
}

#[test]
fn inverted_thresholds_are_rejected() {
    let path = write_config(
        "inverted",
        r#"{ "friction": { "high_threshold": -2.0, "medium_threshold": -8.0 } }"#,
    );
    let result = AnalyticsConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err(), "high_threshold above medium_threshold must fail validation");
}

#[test]
fn missing_file_is_an_error() {
    assert!(AnalyticsConfig::load("/nonexistent/payintel.json").is_err());
}
