//! Dish aggregation and percentile-style scoring.
//!
//! Every metric is turned into a 0..=100 percentile rank across the dishes
//! that have it, and the ranks are combined with configured weights. When a
//! metric is missing for a dish its weight is redistributed over the metrics
//! that are present.

use crate::config::toml_config::{ScoringConfig, TierConfig};
use crate::core::tiers::classify_dish;
use crate::domain::model::{dish_key, DishScore, MenuItem, OrderRow, SurveyResponse};
use crate::utils::tables::round2;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// 與 pandas `rank(pct=True)` (average) 相同，放大到 0..=100
pub fn percentile_rank(values: &[f64], value: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|v| **v < value).count() as f64;
    let equal = values.iter().filter(|v| **v == value).count() as f64;
    100.0 * (below + (equal + 1.0) / 2.0) / values.len() as f64
}

/// 只在有值的項目之間計算百分位，缺值保持 None
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    values
        .iter()
        .map(|v| v.map(|value| percentile_rank(&present, value)))
        .collect()
}

/// 加權平均；缺值的分量會被剔除並重新正規化權重
pub fn weighted_score(components: &[(Option<f64>, f64)]) -> Option<f64> {
    let mut total_weight = 0.0;
    let mut total = 0.0;
    for (value, weight) in components {
        if let Some(value) = value {
            total += value * weight;
            total_weight += weight;
        }
    }
    if total_weight <= 0.0 {
        None
    } else {
        Some(total / total_weight)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DishMetrics {
    pub dish_key: String,
    pub dish: String,
    pub order_count: usize,
    pub zone_count: usize,
    pub partner_count: usize,
    pub avg_rating: Option<f64>,
    pub survey_responses: usize,
    pub avg_satisfaction: Option<f64>,
    pub reorder_rate: Option<f64>,
}

#[derive(Default)]
struct DishAccumulator {
    dish: String,
    orders: usize,
    zones: BTreeSet<String>,
    partners: BTreeSet<String>,
    ratings: Vec<f64>,
    responses: usize,
    satisfaction: Vec<f64>,
    reorder_yes: usize,
    reorder_answers: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// 依菜名 key 聚合訂單、菜單與問卷
///
/// 問卷中出現、但訂單與菜單都沒有的菜會被忽略。
pub fn aggregate_dishes(
    orders: &[OrderRow],
    survey: &[SurveyResponse],
    menu: &[MenuItem],
) -> Vec<DishMetrics> {
    let mut dishes: BTreeMap<String, DishAccumulator> = BTreeMap::new();

    for order in orders {
        let key = dish_key(&order.dish);
        if key.is_empty() {
            continue;
        }
        let acc = dishes.entry(key).or_default();
        if acc.dish.is_empty() {
            acc.dish = order.dish.clone();
        }
        acc.orders += 1;
        acc.zones.insert(order.zone.clone());
        acc.partners.insert(order.partner.clone());
        if let Some(rating) = order.rating {
            acc.ratings.push(rating);
        }
    }

    for item in menu {
        let key = dish_key(&item.dish);
        if key.is_empty() {
            continue;
        }
        let acc = dishes.entry(key).or_default();
        if acc.dish.is_empty() {
            acc.dish = item.dish.clone();
        }
        acc.zones.insert(item.zone.clone());
        acc.partners.insert(item.partner.clone());
    }

    for response in survey {
        let Some(acc) = dishes.get_mut(&dish_key(&response.dish)) else {
            continue;
        };
        acc.responses += 1;
        if let Some(score) = response.satisfaction {
            acc.satisfaction.push(score);
        }
        if let Some(reorder) = response.would_reorder {
            acc.reorder_answers += 1;
            if reorder {
                acc.reorder_yes += 1;
            }
        }
    }

    dishes
        .into_iter()
        .map(|(key, acc)| DishMetrics {
            dish_key: key,
            dish: acc.dish,
            order_count: acc.orders,
            zone_count: acc.zones.len(),
            partner_count: acc.partners.len(),
            avg_rating: mean(&acc.ratings).map(round2),
            survey_responses: acc.responses,
            avg_satisfaction: mean(&acc.satisfaction).map(round2),
            reorder_rate: (acc.reorder_answers > 0)
                .then(|| round2(100.0 * acc.reorder_yes as f64 / acc.reorder_answers as f64)),
        })
        .collect()
}

/// 計算需求/偏好/總分並分級，依總分由高到低排序
pub fn score_dishes(
    metrics: Vec<DishMetrics>,
    scoring: &ScoringConfig,
    tiers: &TierConfig,
) -> Vec<DishScore> {
    let volume = percentile_ranks(
        &metrics
            .iter()
            .map(|m| Some(m.order_count as f64))
            .collect::<Vec<_>>(),
    );
    let coverage = percentile_ranks(
        &metrics
            .iter()
            .map(|m| Some(m.zone_count as f64))
            .collect::<Vec<_>>(),
    );
    let rating = percentile_ranks(&metrics.iter().map(|m| m.avg_rating).collect::<Vec<_>>());
    let satisfaction = percentile_ranks(
        &metrics
            .iter()
            .map(|m| m.avg_satisfaction)
            .collect::<Vec<_>>(),
    );
    let reorder = percentile_ranks(&metrics.iter().map(|m| m.reorder_rate).collect::<Vec<_>>());

    let mut scores: Vec<DishScore> = metrics
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let demand = weighted_score(&[
                (volume[i], scoring.demand.order_volume),
                (coverage[i], scoring.demand.zone_coverage),
            ])
            .map(round2);
            let preference = weighted_score(&[
                (rating[i], scoring.preference.rating),
                (satisfaction[i], scoring.preference.satisfaction),
                (reorder[i], scoring.preference.reorder),
            ])
            .map(round2);
            let overall = weighted_score(&[
                (demand, scoring.overall.demand),
                (preference, scoring.overall.preference),
            ])
            .map(round2);

            // 以四捨五入後的分數分級，讓輸出檔可以重算驗證
            let tier = classify_dish(m.order_count, demand, preference, tiers);

            DishScore {
                dish_key: m.dish_key,
                dish: m.dish,
                order_count: m.order_count,
                zone_count: m.zone_count,
                partner_count: m.partner_count,
                avg_rating: m.avg_rating,
                survey_responses: m.survey_responses,
                avg_satisfaction: m.avg_satisfaction,
                reorder_rate: m.reorder_rate,
                demand_score: demand,
                preference_score: preference,
                overall_score: overall,
                tier,
            }
        })
        .collect();

    scores.sort_by(compare_dishes);
    scores
}

fn compare_dishes(a: &DishScore, b: &DishScore) -> Ordering {
    let by_score = match (a.overall_score, b.overall_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_score.then_with(|| a.dish_key.cmp(&b.dish_key))
}
