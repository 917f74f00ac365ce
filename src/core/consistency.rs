//! Cross-artifact consistency checks.
//!
//! Re-derives what it can from the stored artifacts and the current config
//! and compares. A missing artifact fails every check that depends on it.

use crate::config::toml_config::ReportConfig;
use crate::core::rubric::{evaluate_zone, ZoneCounts};
use crate::core::synthesis::{status_counts, tier_counts, DashboardSummary, ThresholdSnapshot};
use crate::core::tiers::classify_dish;
use crate::domain::model::{DishScore, ZoneAnalysis};
use serde::{Deserialize, Serialize};

const SCORE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }

    fn from_problems(name: &str, checked: usize, problems: Vec<String>) -> Self {
        if problems.is_empty() {
            Self::pass(name, format!("{} rows checked", checked))
        } else {
            Self::fail(name, problems.join("; "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub checks: Vec<CheckOutcome>,
}

impl ConsistencyReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// 一致性檢查的輸入；None 代表檔案不存在
#[derive(Debug, Clone, Default)]
pub struct ConsistencyInputs {
    pub clean_orders: Option<usize>,
    pub dishes: Option<Vec<DishScore>>,
    pub zones: Option<Vec<ZoneAnalysis>>,
    pub summary: Option<DashboardSummary>,
}

fn missing(name: &str, what: &[&str]) -> CheckOutcome {
    CheckOutcome::fail(name, format!("missing artifact: {}", what.join(", ")))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= SCORE_TOLERANCE
}

fn check_zone_status(zones: &[ZoneAnalysis], config: &ReportConfig) -> CheckOutcome {
    let problems = zones
        .iter()
        .filter_map(|zone| {
            let outcome = evaluate_zone(&ZoneCounts::from_analysis(zone), &config.mvp);
            if outcome.status != zone.mvp_status {
                Some(format!(
                    "{}: stored '{}' but rubric gives '{}'",
                    zone.zone, zone.mvp_status, outcome.status
                ))
            } else if !close(outcome.readiness_score, zone.readiness_score) {
                Some(format!(
                    "{}: stored readiness {:.2} but rubric gives {:.2}",
                    zone.zone, zone.readiness_score, outcome.readiness_score
                ))
            } else {
                None
            }
        })
        .collect();
    CheckOutcome::from_problems("zone_status_recomputes", zones.len(), problems)
}

fn check_total(name: &str, label: &str, actual: usize, expected: usize) -> CheckOutcome {
    if actual == expected {
        CheckOutcome::pass(name, format!("{} orders", expected))
    } else {
        CheckOutcome::fail(
            name,
            format!("{} sum to {} but clean orders has {}", label, actual, expected),
        )
    }
}

fn check_scores_in_range(dishes: &[DishScore], zones: &[ZoneAnalysis]) -> CheckOutcome {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    let mut problems = Vec::new();

    for dish in dishes {
        for (label, value) in [
            ("demand", dish.demand_score),
            ("preference", dish.preference_score),
            ("overall", dish.overall_score),
            ("reorder", dish.reorder_rate),
        ] {
            if let Some(v) = value {
                if !in_range(v) {
                    problems.push(format!("{} {} = {}", dish.dish_key, label, v));
                }
            }
        }
    }
    for zone in zones {
        if !in_range(zone.readiness_score) {
            problems.push(format!("{} readiness = {}", zone.zone, zone.readiness_score));
        }
    }

    CheckOutcome::from_problems("scores_in_range", dishes.len() + zones.len(), problems)
}

fn check_tier_rules(dishes: &[DishScore], config: &ReportConfig) -> CheckOutcome {
    let problems = dishes
        .iter()
        .filter_map(|d| {
            let expected = classify_dish(
                d.order_count,
                d.demand_score,
                d.preference_score,
                &config.tiers,
            );
            (expected != d.tier).then(|| {
                format!(
                    "{}: stored '{}' but rules give '{}'",
                    d.dish_key, d.tier, expected
                )
            })
        })
        .collect();
    CheckOutcome::from_problems("tier_rules_hold", dishes.len(), problems)
}

pub fn check_consistency(inputs: &ConsistencyInputs, config: &ReportConfig) -> ConsistencyReport {
    let mut checks = Vec::new();

    checks.push(match &inputs.zones {
        Some(zones) => check_zone_status(zones, config),
        None => missing("zone_status_recomputes", &["zone_analysis"]),
    });

    checks.push(match (&inputs.zones, inputs.clean_orders) {
        (Some(zones), Some(orders)) => check_total(
            "zone_orders_match_clean",
            "zone order counts",
            zones.iter().map(|z| z.order_count).sum(),
            orders,
        ),
        _ => missing("zone_orders_match_clean", &["zone_analysis", "clean orders"]),
    });

    checks.push(match (&inputs.dishes, inputs.clean_orders) {
        (Some(dishes), Some(orders)) => check_total(
            "dish_orders_match_clean",
            "dish order counts",
            dishes.iter().map(|d| d.order_count).sum(),
            orders,
        ),
        _ => missing("dish_orders_match_clean", &["dish_scores", "clean orders"]),
    });

    checks.push(match (&inputs.dishes, &inputs.summary) {
        (Some(dishes), Some(summary)) => {
            let expected = tier_counts(dishes);
            if expected == summary.tier_counts {
                CheckOutcome::pass("tier_counts_match_summary", format!("{} dishes", dishes.len()))
            } else {
                CheckOutcome::fail(
                    "tier_counts_match_summary",
                    format!(
                        "summary {:?} but dish_scores {:?}",
                        summary.tier_counts, expected
                    ),
                )
            }
        }
        _ => missing("tier_counts_match_summary", &["dish_scores", "summary"]),
    });

    checks.push(match (&inputs.zones, &inputs.summary) {
        (Some(zones), Some(summary)) => {
            let expected = status_counts(zones);
            if expected == summary.status_counts {
                CheckOutcome::pass("status_counts_match_summary", format!("{} zones", zones.len()))
            } else {
                CheckOutcome::fail(
                    "status_counts_match_summary",
                    format!(
                        "summary {:?} but zone_analysis {:?}",
                        summary.status_counts, expected
                    ),
                )
            }
        }
        _ => missing("status_counts_match_summary", &["zone_analysis", "summary"]),
    });

    checks.push(match (&inputs.dishes, &inputs.zones) {
        (Some(dishes), Some(zones)) => check_scores_in_range(dishes, zones),
        _ => missing("scores_in_range", &["dish_scores", "zone_analysis"]),
    });

    checks.push(match &inputs.summary {
        Some(summary) => {
            let current = ThresholdSnapshot {
                mvp: config.mvp.clone(),
                tiers: config.tiers.clone(),
            };
            if summary.thresholds == current {
                CheckOutcome::pass("thresholds_match_config", "summary built with current thresholds")
            } else {
                CheckOutcome::fail(
                    "thresholds_match_config",
                    "summary was built with different thresholds than the current config",
                )
            }
        }
        None => missing("thresholds_match_config", &["summary"]),
    });

    checks.push(match &inputs.dishes {
        Some(dishes) => check_tier_rules(dishes, config),
        None => missing("tier_rules_hold", &["dish_scores"]),
    });

    for check in checks.iter().filter(|c| !c.passed) {
        tracing::warn!("❌ {}: {}", check.name, check.detail);
    }

    ConsistencyReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synthesis::build_summary;
    use crate::domain::model::{DishTier, MvpStatus};

    fn dish(key: &str, orders: usize, demand: f64, preference: f64, tier: DishTier) -> DishScore {
        DishScore {
            dish_key: key.to_string(),
            dish: key.to_string(),
            order_count: orders,
            zone_count: 1,
            partner_count: 1,
            avg_rating: None,
            survey_responses: 0,
            avg_satisfaction: None,
            reorder_rate: None,
            demand_score: Some(demand),
            preference_score: Some(preference),
            overall_score: Some((demand + preference) / 2.0),
            tier,
        }
    }

    fn zone(name: &str, partners: usize, orders: usize) -> ZoneAnalysis {
        let config = ReportConfig::default();
        let counts = ZoneCounts {
            partners,
            cuisines: 3,
            dishes: 15,
            orders,
            core_drivers: 0,
        };
        let outcome = evaluate_zone(&counts, &config.mvp);
        ZoneAnalysis {
            zone: name.to_string(),
            partner_count: partners,
            cuisine_count: 3,
            dish_count: 15,
            order_count: orders,
            core_driver_count: 0,
            avg_rating: None,
            readiness_score: outcome.readiness_score,
            mvp_status: outcome.status,
            gaps: outcome.gaps(),
        }
    }

    fn consistent_inputs(config: &ReportConfig) -> ConsistencyInputs {
        let dishes = vec![
            dish("a", 60, 90.0, 80.0, DishTier::CoreDriver),
            dish("b", 40, 30.0, 20.0, DishTier::Niche),
        ];
        let zones = vec![zone("North", 6, 70), zone("South", 4, 30)];
        let summary = build_summary(&dishes, &zones, config, "now".to_string());
        ConsistencyInputs {
            clean_orders: Some(100),
            dishes: Some(dishes),
            zones: Some(zones),
            summary: Some(summary),
        }
    }

    #[test]
    fn test_consistent_artifacts_pass() {
        let config = ReportConfig::default();
        let report = check_consistency(&consistent_inputs(&config), &config);
        assert_eq!(report.checks.len(), 8);
        assert!(report.passed(), "{:?}", report);
    }

    #[test]
    fn test_tampered_status_fails_recompute() {
        let config = ReportConfig::default();
        let mut inputs = consistent_inputs(&config);
        if let Some(zones) = inputs.zones.as_mut() {
            zones[1].mvp_status = MvpStatus::MvpReady;
        }

        let report = check_consistency(&inputs, &config);
        assert!(!report.get("zone_status_recomputes").unwrap().passed);
        // 摘要仍是舊的狀態統計
        assert!(!report.get("status_counts_match_summary").unwrap().passed);
        assert!(report.get("tier_rules_hold").unwrap().passed);
    }

    #[test]
    fn test_changed_thresholds_are_detected() {
        let config = ReportConfig::default();
        let inputs = consistent_inputs(&config);

        let mut stricter = config.clone();
        stricter.mvp.min_partners = 10;
        let report = check_consistency(&inputs, &stricter);
        assert!(!report.get("thresholds_match_config").unwrap().passed);
        assert!(!report.get("zone_status_recomputes").unwrap().passed);
    }

    #[test]
    fn test_order_totals_and_tier_rules() {
        let config = ReportConfig::default();
        let mut inputs = consistent_inputs(&config);
        inputs.clean_orders = Some(99);
        if let Some(dishes) = inputs.dishes.as_mut() {
            dishes[1].tier = DishTier::DemandDriver;
        }

        let report = check_consistency(&inputs, &config);
        assert!(!report.get("zone_orders_match_clean").unwrap().passed);
        assert!(!report.get("dish_orders_match_clean").unwrap().passed);
        assert!(!report.get("tier_rules_hold").unwrap().passed);
    }

    #[test]
    fn test_missing_artifacts_fail_dependent_checks() {
        let config = ReportConfig::default();
        let mut inputs = consistent_inputs(&config);
        inputs.summary = None;

        let report = check_consistency(&inputs, &config);
        assert_eq!(report.failed_count(), 3);
        assert!(report
            .get("thresholds_match_config")
            .unwrap()
            .detail
            .contains("missing"));
        assert!(report.get("scores_in_range").unwrap().passed);
    }

    #[test]
    fn test_out_of_range_score() {
        let config = ReportConfig::default();
        let mut inputs = consistent_inputs(&config);
        if let Some(dishes) = inputs.dishes.as_mut() {
            dishes[0].overall_score = Some(120.0);
        }
        let report = check_consistency(&inputs, &config);
        assert!(!report.get("scores_in_range").unwrap().passed);
    }
}
