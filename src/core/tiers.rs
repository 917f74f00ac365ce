use crate::config::toml_config::TierConfig;
use crate::domain::model::DishTier;

fn passes(score: Option<f64>, cutoff: f64) -> bool {
    score.map_or(false, |s| s >= cutoff)
}

/// 依需求與偏好分數分級；訂單數不足時一律為 Insufficient Data
pub fn classify_dish(
    order_count: usize,
    demand: Option<f64>,
    preference: Option<f64>,
    tiers: &TierConfig,
) -> DishTier {
    if order_count < tiers.min_orders {
        return DishTier::InsufficientData;
    }

    let high_demand = passes(demand, tiers.driver_cutoff);
    let high_preference = passes(preference, tiers.driver_cutoff);

    match (high_demand, high_preference) {
        (true, true) => DishTier::CoreDriver,
        (false, true) => DishTier::PreferenceDriver,
        (true, false) => DishTier::DemandDriver,
        (false, false) => DishTier::Niche,
    }
}
