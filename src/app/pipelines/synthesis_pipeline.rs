use crate::app::pipelines::analysis_pipeline::{DISH_SCORES, ZONE_ANALYSIS};
use crate::config::toml_config::{ReportConfig, PHASE_SYNTHESIZE};
use crate::core::synthesis::{build_summary, DashboardSummary};
use crate::core::{Pipeline, Storage};
use crate::domain::model::{DishScore, DishTier, PhaseOutput, ZoneAnalysis};
use crate::utils::error::Result;
use crate::utils::tables::{read_csv, to_csv};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const SUMMARY: &str = "summary.json";
pub const ZONE_RANKINGS: &str = "zone_rankings.csv";
pub const DISH_TIERS: &str = "dish_tiers.json";
pub const BUNDLE: &str = "dashboard_bundle.zip";

pub struct AnalysisInputs {
    pub dishes: Vec<DishScore>,
    pub zones: Vec<ZoneAnalysis>,
}

#[derive(Debug, Clone, Serialize)]
struct TierEntry<'a> {
    dish: &'a str,
    dish_key: &'a str,
    order_count: usize,
    demand_score: Option<f64>,
    preference_score: Option<f64>,
    overall_score: Option<f64>,
}

/// 產生 (檔名, 內容) 列表，之後寫檔或打包
pub struct DashboardArtifacts {
    pub summary: DashboardSummary,
    pub files: Vec<(String, Vec<u8>)>,
}

fn dish_tiers_json(dishes: &[DishScore]) -> Result<Vec<u8>> {
    let mut tiers: BTreeMap<&str, Vec<TierEntry<'_>>> = DishTier::ALL
        .iter()
        .map(|t| (t.label(), Vec::new()))
        .collect();
    for dish in dishes {
        tiers.entry(dish.tier.label()).or_default().push(TierEntry {
            dish: &dish.dish,
            dish_key: &dish.dish_key,
            order_count: dish.order_count,
            demand_score: dish.demand_score,
            preference_score: dish.preference_score,
            overall_score: dish.overall_score,
        });
    }
    Ok(serde_json::to_vec_pretty(&tiers)?)
}

fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// 第三階段：整合分析結果為儀表板資料
pub struct SynthesisPipeline<S: Storage> {
    storage: S,
    config: Arc<ReportConfig>,
}

impl<S: Storage> SynthesisPipeline<S> {
    pub fn new(storage: S, config: Arc<ReportConfig>) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for SynthesisPipeline<S> {
    type Extracted = AnalysisInputs;
    type Transformed = DashboardArtifacts;

    fn name(&self) -> &str {
        PHASE_SYNTHESIZE
    }

    async fn extract(&self) -> Result<AnalysisInputs> {
        let dishes =
            read_csv::<_, DishScore>(&self.storage, &self.config.analysis_path(DISH_SCORES))
                .await?;
        let zones =
            read_csv::<_, ZoneAnalysis>(&self.storage, &self.config.analysis_path(ZONE_ANALYSIS))
                .await?;
        Ok(AnalysisInputs {
            dishes: dishes.rows,
            zones: zones.rows,
        })
    }

    async fn transform(&self, data: AnalysisInputs) -> Result<DashboardArtifacts> {
        let summary = build_summary(
            &data.dishes,
            &data.zones,
            &self.config,
            chrono::Utc::now().to_rfc3339(),
        );

        // summary.json 一律輸出，其他檔案依 formats 決定
        let mut files = vec![(SUMMARY.to_string(), serde_json::to_vec_pretty(&summary)?)];
        if self.config.wants_format("json") {
            files.push((DISH_TIERS.to_string(), dish_tiers_json(&data.dishes)?));
        }
        if self.config.wants_format("csv") {
            files.push((ZONE_RANKINGS.to_string(), to_csv(&summary.zone_ranking)?));
        }

        tracing::info!(
            "📈 Dashboard: {} zones ranked, average readiness {:.2}",
            summary.totals.zones,
            summary.average_readiness
        );

        Ok(DashboardArtifacts { summary, files })
    }

    async fn load(&self, result: DashboardArtifacts) -> Result<PhaseOutput> {
        let mut artifacts = Vec::new();
        for (name, data) in &result.files {
            let path = self.config.dashboard_path(name);
            self.storage.write_file(&path, data).await?;
            artifacts.push(path);
        }

        if self.config.outputs.bundle {
            let zip_data = bundle_zip(&result.files)?;
            let path = self.config.dashboard_path(BUNDLE);
            tracing::debug!("Writing bundle ({} bytes) to {}", zip_data.len(), path);
            self.storage.write_file(&path, &zip_data).await?;
            artifacts.push(path);
        }

        Ok(PhaseOutput {
            phase: PHASE_SYNTHESIZE.to_string(),
            records: result.summary.zone_ranking.len(),
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_contains_every_file() {
        let files = vec![
            ("summary.json".to_string(), b"{}".to_vec()),
            ("zone_rankings.csv".to_string(), b"rank,zone\n".to_vec()),
        ];
        let data = bundle_zip(&files).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        let mut entry = archive.by_name("zone_rankings.csv").unwrap();
        std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
        assert_eq!(content, "rank,zone\n");
    }

    #[test]
    fn test_dish_tiers_json_lists_every_tier() {
        let json = dish_tiers_json(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        let tiers = value.as_object().unwrap();
        assert_eq!(tiers.len(), 5);
        assert!(tiers["Core Driver"].as_array().unwrap().is_empty());
    }
}
