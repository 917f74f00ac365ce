use crate::app::pipelines::load_pipeline::{CLEAN_MENU, CLEAN_ORDERS, CLEAN_SURVEY};
use crate::config::toml_config::{
    MvpThresholds, ReportConfig, ScoringConfig, TierConfig, PHASE_ANALYZE,
};
use crate::core::rubric::analyze_zones;
use crate::core::scoring::{aggregate_dishes, score_dishes};
use crate::core::{Pipeline, Storage};
use crate::domain::model::{
    DishScore, MenuItem, OrderRow, PhaseOutput, SurveyResponse, ZoneAnalysis,
};
use crate::utils::error::Result;
use crate::utils::tables::{read_csv, write_csv, write_json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DISH_SCORES: &str = "dish_scores.csv";
pub const ZONE_ANALYSIS: &str = "zone_analysis.csv";
pub const ANALYSIS_META: &str = "analysis_meta.json";

pub struct CleanInputs {
    pub orders: Vec<OrderRow>,
    pub survey: Vec<SurveyResponse>,
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub dishes: Vec<DishScore>,
    pub zones: Vec<ZoneAnalysis>,
    pub order_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub pipeline: String,
    pub generated_at: String,
    pub dish_count: usize,
    pub zone_count: usize,
    pub order_count: usize,
    pub mvp: MvpThresholds,
    pub scoring: ScoringConfig,
    pub tiers: TierConfig,
}

/// 第二階段：菜色評分與區域 MVP 評估
pub struct AnalysisPipeline<S: Storage> {
    storage: S,
    config: Arc<ReportConfig>,
}

impl<S: Storage> AnalysisPipeline<S> {
    pub fn new(storage: S, config: Arc<ReportConfig>) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for AnalysisPipeline<S> {
    type Extracted = CleanInputs;
    type Transformed = AnalysisResult;

    fn name(&self) -> &str {
        PHASE_ANALYZE
    }

    async fn extract(&self) -> Result<CleanInputs> {
        let orders =
            read_csv::<_, OrderRow>(&self.storage, &self.config.clean_path(CLEAN_ORDERS)).await?;
        let survey =
            read_csv::<_, SurveyResponse>(&self.storage, &self.config.clean_path(CLEAN_SURVEY))
                .await?;
        let menu =
            read_csv::<_, MenuItem>(&self.storage, &self.config.clean_path(CLEAN_MENU)).await?;

        Ok(CleanInputs {
            orders: orders.rows,
            survey: survey.rows,
            menu: menu.rows,
        })
    }

    async fn transform(&self, data: CleanInputs) -> Result<AnalysisResult> {
        let metrics = aggregate_dishes(&data.orders, &data.survey, &data.menu);
        let dishes = score_dishes(metrics, &self.config.scoring, &self.config.tiers);
        let zones = analyze_zones(&data.orders, &data.menu, &dishes, &self.config.mvp);

        tracing::info!("🍽️ Scored {} dishes across {} zones", dishes.len(), zones.len());

        Ok(AnalysisResult {
            dishes,
            zones,
            order_count: data.orders.len(),
        })
    }

    async fn load(&self, result: AnalysisResult) -> Result<PhaseOutput> {
        let dishes_path = self.config.analysis_path(DISH_SCORES);
        let zones_path = self.config.analysis_path(ZONE_ANALYSIS);
        let meta_path = self.config.analysis_path(ANALYSIS_META);

        write_csv(&self.storage, &dishes_path, &result.dishes).await?;
        write_csv(&self.storage, &zones_path, &result.zones).await?;

        let meta = AnalysisMeta {
            pipeline: self.config.pipeline.name.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            dish_count: result.dishes.len(),
            zone_count: result.zones.len(),
            order_count: result.order_count,
            mvp: self.config.mvp.clone(),
            scoring: self.config.scoring.clone(),
            tiers: self.config.tiers.clone(),
        };
        write_json(&self.storage, &meta_path, &meta).await?;

        Ok(PhaseOutput {
            phase: PHASE_ANALYZE.to_string(),
            records: result.dishes.len() + result.zones.len(),
            artifacts: vec![dishes_path, zones_path, meta_path],
        })
    }
}
