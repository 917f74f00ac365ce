use crate::config::toml_config::{MvpThresholds, ReportConfig, TierConfig};
use crate::domain::model::{DishScore, DishTier, MvpStatus, ZoneAnalysis};
use crate::utils::tables::round2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub orders: usize,
    pub zones: usize,
    pub dishes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDish {
    pub dish: String,
    pub overall_score: Option<f64>,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRank {
    pub rank: usize,
    pub zone: String,
    pub readiness_score: f64,
    pub mvp_status: MvpStatus,
    pub gaps: String,
}

/// 產出時使用的門檻快照，供一致性檢查比對
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    pub mvp: MvpThresholds,
    pub tiers: TierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub pipeline: String,
    pub generated_at: String,
    pub totals: Totals,
    pub status_counts: BTreeMap<String, usize>,
    pub tier_counts: BTreeMap<String, usize>,
    pub average_readiness: f64,
    pub top_dishes: BTreeMap<String, Vec<TopDish>>,
    pub zone_ranking: Vec<ZoneRank>,
    pub thresholds: ThresholdSnapshot,
}

/// 每個等級都列出，沒有菜的等級為 0
pub fn tier_counts(dishes: &[DishScore]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = DishTier::ALL
        .iter()
        .map(|t| (t.label().to_string(), 0))
        .collect();
    for dish in dishes {
        *counts.entry(dish.tier.label().to_string()).or_default() += 1;
    }
    counts
}

pub fn status_counts(zones: &[ZoneAnalysis]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = MvpStatus::ALL
        .iter()
        .map(|s| (s.label().to_string(), 0))
        .collect();
    for zone in zones {
        *counts.entry(zone.mvp_status.label().to_string()).or_default() += 1;
    }
    counts
}

pub fn build_summary(
    dishes: &[DishScore],
    zones: &[ZoneAnalysis],
    config: &ReportConfig,
    generated_at: String,
) -> DashboardSummary {
    let top_n = config.synthesis.top_n;

    // dish_scores 已依總分排序，但重新排序以免輸入被手動修改過
    let mut ranked: Vec<&DishScore> = dishes.iter().collect();
    ranked.sort_by(|a, b| {
        b.overall_score
            .unwrap_or(f64::MIN)
            .partial_cmp(&a.overall_score.unwrap_or(f64::MIN))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.dish_key.cmp(&b.dish_key))
    });

    let top_dishes = DishTier::ALL
        .iter()
        .map(|tier| {
            let top = ranked
                .iter()
                .filter(|d| d.tier == *tier)
                .take(top_n)
                .map(|d| TopDish {
                    dish: d.dish.clone(),
                    overall_score: d.overall_score,
                    order_count: d.order_count,
                })
                .collect();
            (tier.label().to_string(), top)
        })
        .collect();

    let mut ordered_zones: Vec<&ZoneAnalysis> = zones.iter().collect();
    ordered_zones.sort_by(|a, b| {
        b.readiness_score
            .partial_cmp(&a.readiness_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.zone.cmp(&b.zone))
    });

    let zone_ranking = ordered_zones
        .iter()
        .enumerate()
        .map(|(i, z)| ZoneRank {
            rank: i + 1,
            zone: z.zone.clone(),
            readiness_score: z.readiness_score,
            mvp_status: z.mvp_status,
            gaps: z.gaps.clone(),
        })
        .collect();

    let average_readiness = if zones.is_empty() {
        0.0
    } else {
        round2(zones.iter().map(|z| z.readiness_score).sum::<f64>() / zones.len() as f64)
    };

    DashboardSummary {
        pipeline: config.pipeline.name.clone(),
        generated_at,
        totals: Totals {
            orders: zones.iter().map(|z| z.order_count).sum(),
            zones: zones.len(),
            dishes: dishes.len(),
        },
        status_counts: status_counts(zones),
        tier_counts: tier_counts(dishes),
        average_readiness,
        top_dishes,
        zone_ranking,
        thresholds: ThresholdSnapshot {
            mvp: config.mvp.clone(),
            tiers: config.tiers.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish(key: &str, score: Option<f64>, tier: DishTier) -> DishScore {
        DishScore {
            dish_key: key.to_string(),
            dish: key.to_uppercase(),
            order_count: 10,
            zone_count: 1,
            partner_count: 1,
            avg_rating: None,
            survey_responses: 0,
            avg_satisfaction: None,
            reorder_rate: None,
            demand_score: score,
            preference_score: score,
            overall_score: score,
            tier,
        }
    }

    fn zone(name: &str, readiness: f64, status: MvpStatus, orders: usize) -> ZoneAnalysis {
        ZoneAnalysis {
            zone: name.to_string(),
            partner_count: 1,
            cuisine_count: 1,
            dish_count: 1,
            order_count: orders,
            core_driver_count: 0,
            avg_rating: None,
            readiness_score: readiness,
            mvp_status: status,
            gaps: String::new(),
        }
    }

    #[test]
    fn test_counts_are_zero_filled() {
        let counts = tier_counts(&[dish("a", Some(90.0), DishTier::CoreDriver)]);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts["Core Driver"], 1);
        assert_eq!(counts["Niche"], 0);

        let counts = status_counts(&[]);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn test_build_summary() {
        let mut config = ReportConfig::default();
        config.synthesis.top_n = 1;

        let dishes = vec![
            dish("b", Some(70.0), DishTier::CoreDriver),
            dish("a", Some(95.0), DishTier::CoreDriver),
            dish("c", None, DishTier::InsufficientData),
        ];
        let zones = vec![
            zone("South", 50.0, MvpStatus::Developing, 4),
            zone("North", 100.0, MvpStatus::MvpReady, 6),
        ];

        let summary = build_summary(&dishes, &zones, &config, "2024-01-01T00:00:00Z".to_string());

        assert_eq!(summary.totals.orders, 10);
        assert_eq!(summary.totals.zones, 2);
        assert_eq!(summary.totals.dishes, 3);
        assert_eq!(summary.average_readiness, 75.0);
        assert_eq!(summary.top_dishes["Core Driver"].len(), 1);
        assert_eq!(summary.top_dishes["Core Driver"][0].dish, "A");
        assert_eq!(summary.top_dishes["Insufficient Data"][0].dish, "C");
        assert!(summary.top_dishes["Niche"].is_empty());
        assert_eq!(summary.zone_ranking[0].zone, "North");
        assert_eq!(summary.zone_ranking[1].rank, 2);
        assert_eq!(summary.status_counts["MVP Ready"], 1);
        assert_eq!(summary.thresholds.mvp, config.mvp);
    }
}
