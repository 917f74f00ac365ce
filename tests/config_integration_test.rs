use dinneroo_etl::config::config_check::{validate_rubric, Severity};
use dinneroo_etl::utils::validation::Validate;
use dinneroo_etl::ReportConfig;

/// 專案附帶的 dinneroo.toml 必須是乾淨的配置
#[test]
fn test_shipped_config_has_no_findings() {
    let config = ReportConfig::from_file("dinneroo.toml").unwrap();
    assert_eq!(config.pipeline.execution_order.len(), 4);
    assert_eq!(config.mvp, ReportConfig::default().mvp);
    assert_eq!(config.tiers, ReportConfig::default().tiers);

    let report = validate_rubric(&config);
    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert!(config.validate().is_ok());
}

#[test]
fn test_rubric_errors_and_warnings_are_reported_together() {
    let config = ReportConfig::from_toml_str(
        r#"
[pipeline]
name = "broken"
execution_order = ["load", "load", "publish"]

[filters]
start_date = "2024-06-01"
end_date = "2024-01-01"

[scoring.demand]
order_volume = 0.5
zone_coverage = 0.2

[tiers]
driver_cutoff = 140.0

[synthesis]
top_n = 0
"#,
    )
    .unwrap();

    let report = validate_rubric(&config);
    assert!(!report.is_valid());

    let error_fields: Vec<&str> = report.errors().map(|f| f.field.as_str()).collect();
    assert!(error_fields.contains(&"pipeline.execution_order"));
    assert!(error_fields.contains(&"filters.start_date"));
    assert!(error_fields.contains(&"tiers.driver_cutoff"));

    let demand = report
        .findings
        .iter()
        .find(|f| f.field == "scoring.demand")
        .unwrap();
    assert_eq!(demand.severity, Severity::Warning);
    assert_eq!(demand.value, "0.700");

    assert!(config.validate().is_err());
}

#[test]
fn test_missing_config_file_is_an_io_error() {
    let err = ReportConfig::from_file("does-not-exist.toml").unwrap_err();
    assert!(err.to_string().contains("IO"), "{}", err);
}
