//! Zone MVP rubric.
//!
//! A zone is scored against each active `[mvp]` threshold. The status is
//! decided from which criteria are met; the readiness score is the mean
//! fraction of each threshold achieved.

use crate::config::toml_config::MvpThresholds;
use crate::domain::model::{
    dish_key, DishScore, DishTier, MenuItem, MvpStatus, OrderRow, ZoneAnalysis,
};
use crate::utils::tables::round2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Partners,
    Cuisines,
    Dishes,
    Orders,
    CoreDrivers,
}

impl Criterion {
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Partners => "partners",
            Criterion::Cuisines => "cuisines",
            Criterion::Dishes => "dishes",
            Criterion::Orders => "orders",
            Criterion::CoreDrivers => "core drivers",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCounts {
    pub partners: usize,
    pub cuisines: usize,
    pub dishes: usize,
    pub orders: usize,
    pub core_drivers: usize,
}

impl ZoneCounts {
    pub fn from_analysis(zone: &ZoneAnalysis) -> Self {
        Self {
            partners: zone.partner_count,
            cuisines: zone.cuisine_count,
            dishes: zone.dish_count,
            orders: zone.order_count,
            core_drivers: zone.core_driver_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: Criterion,
    pub value: usize,
    pub threshold: u32,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricOutcome {
    pub criteria: Vec<CriterionResult>,
    pub readiness_score: f64,
    pub status: MvpStatus,
}

impl RubricOutcome {
    pub fn unmet(&self) -> impl Iterator<Item = &CriterionResult> {
        self.criteria.iter().filter(|c| !c.met)
    }

    /// 例如 "partners 3/5; cuisines 2/3"
    pub fn gaps(&self) -> String {
        self.unmet()
            .map(|c| format!("{} {}/{}", c.criterion.label(), c.value, c.threshold))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// 套用門檻，0 代表該條件停用
pub fn active_criteria(counts: &ZoneCounts, thresholds: &MvpThresholds) -> Vec<CriterionResult> {
    [
        (Criterion::Partners, counts.partners, thresholds.min_partners),
        (Criterion::Cuisines, counts.cuisines, thresholds.min_cuisines),
        (Criterion::Dishes, counts.dishes, thresholds.min_dishes),
        (Criterion::Orders, counts.orders, thresholds.min_orders),
        (
            Criterion::CoreDrivers,
            counts.core_drivers,
            thresholds.min_core_drivers,
        ),
    ]
    .into_iter()
    .filter(|(_, _, threshold)| *threshold > 0)
    .map(|(criterion, value, threshold)| CriterionResult {
        criterion,
        value,
        threshold,
        met: value >= threshold as usize,
    })
    .collect()
}

pub fn evaluate_zone(counts: &ZoneCounts, thresholds: &MvpThresholds) -> RubricOutcome {
    let criteria = active_criteria(counts, thresholds);

    if counts.orders == 0 && counts.dishes == 0 {
        return RubricOutcome {
            criteria,
            readiness_score: 0.0,
            status: MvpStatus::NoData,
        };
    }

    let readiness_score = if criteria.is_empty() {
        100.0
    } else {
        let achieved: f64 = criteria
            .iter()
            .map(|c| (c.value as f64 / c.threshold as f64).min(1.0))
            .sum();
        round2(100.0 * achieved / criteria.len() as f64)
    };

    let unmet: Vec<&CriterionResult> = criteria.iter().filter(|c| !c.met).collect();
    let status = if unmet.is_empty() {
        MvpStatus::MvpReady
    } else if unmet.len() <= thresholds.near_ready_max_gaps
        && unmet
            .iter()
            .all(|c| c.value as f64 >= thresholds.near_ready_ratio * c.threshold as f64)
    {
        MvpStatus::NearReady
    } else {
        MvpStatus::Developing
    };

    RubricOutcome {
        criteria,
        readiness_score,
        status,
    }
}

#[derive(Default)]
struct ZoneAccumulator {
    partners: BTreeSet<String>,
    cuisines: BTreeSet<String>,
    dishes: BTreeSet<String>,
    orders: usize,
    ratings: Vec<f64>,
}

/// 統計各區域的合作夥伴、菜系、菜色與訂單數，並套用 MVP 規則
pub fn analyze_zones(
    orders: &[OrderRow],
    menu: &[MenuItem],
    dishes: &[DishScore],
    thresholds: &MvpThresholds,
) -> Vec<ZoneAnalysis> {
    let core_drivers: HashSet<&str> = dishes
        .iter()
        .filter(|d| d.tier == DishTier::CoreDriver)
        .map(|d| d.dish_key.as_str())
        .collect();

    let mut zones: BTreeMap<String, ZoneAccumulator> = BTreeMap::new();

    for order in orders {
        let acc = zones.entry(order.zone.clone()).or_default();
        acc.partners.insert(order.partner.clone());
        acc.cuisines.insert(order.cuisine.clone());
        acc.dishes.insert(dish_key(&order.dish));
        acc.orders += 1;
        if let Some(rating) = order.rating {
            acc.ratings.push(rating);
        }
    }

    for item in menu {
        let acc = zones.entry(item.zone.clone()).or_default();
        acc.partners.insert(item.partner.clone());
        acc.cuisines.insert(item.cuisine.clone());
        acc.dishes.insert(dish_key(&item.dish));
    }

    let mut results: Vec<ZoneAnalysis> = zones
        .into_iter()
        .map(|(zone, acc)| {
            let counts = ZoneCounts {
                partners: acc.partners.len(),
                cuisines: acc.cuisines.iter().filter(|c| !c.is_empty()).count(),
                dishes: acc.dishes.len(),
                orders: acc.orders,
                core_drivers: acc
                    .dishes
                    .iter()
                    .filter(|key| core_drivers.contains(key.as_str()))
                    .count(),
            };
            let outcome = evaluate_zone(&counts, thresholds);
            let avg_rating = if acc.ratings.is_empty() {
                None
            } else {
                Some(round2(
                    acc.ratings.iter().sum::<f64>() / acc.ratings.len() as f64,
                ))
            };

            tracing::debug!(
                "Zone {}: {} (readiness {:.2})",
                zone,
                outcome.status,
                outcome.readiness_score
            );

            ZoneAnalysis {
                zone,
                partner_count: counts.partners,
                cuisine_count: counts.cuisines,
                dish_count: counts.dishes,
                order_count: counts.orders,
                core_driver_count: counts.core_drivers,
                avg_rating,
                readiness_score: outcome.readiness_score,
                mvp_status: outcome.status,
                gaps: outcome.gaps(),
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.readiness_score
            .partial_cmp(&a.readiness_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.zone.cmp(&b.zone))
    });
    results
}
