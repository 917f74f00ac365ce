use crate::app::pipelines::analysis_pipeline::{DISH_SCORES, ZONE_ANALYSIS};
use crate::app::pipelines::load_pipeline::CLEAN_ORDERS;
use crate::app::pipelines::synthesis_pipeline::SUMMARY;
use crate::config::toml_config::{ReportConfig, PHASE_CONSISTENCY};
use crate::core::consistency::{check_consistency, ConsistencyInputs, ConsistencyReport};
use crate::core::synthesis::DashboardSummary;
use crate::core::{Pipeline, Storage};
use crate::domain::model::{DishScore, OrderRow, PhaseOutput, ZoneAnalysis};
use crate::utils::error::{EtlError, Result};
use crate::utils::tables::{read_csv, read_json, write_json, TableRead};
use std::sync::Arc;

pub const CONSISTENCY_REPORT: &str = "consistency_report.json";

fn present<T>(table: TableRead<T>) -> Option<Vec<T>> {
    (!table.missing).then_some(table.rows)
}

/// 第四階段：交叉比對各產出檔案
pub struct ConsistencyPipeline<S: Storage> {
    storage: S,
    config: Arc<ReportConfig>,
}

impl<S: Storage> ConsistencyPipeline<S> {
    pub fn new(storage: S, config: Arc<ReportConfig>) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ConsistencyPipeline<S> {
    type Extracted = ConsistencyInputs;
    type Transformed = ConsistencyReport;

    fn name(&self) -> &str {
        PHASE_CONSISTENCY
    }

    async fn extract(&self) -> Result<ConsistencyInputs> {
        let orders =
            read_csv::<_, OrderRow>(&self.storage, &self.config.clean_path(CLEAN_ORDERS)).await?;
        let dishes =
            read_csv::<_, DishScore>(&self.storage, &self.config.analysis_path(DISH_SCORES))
                .await?;
        let zones =
            read_csv::<_, ZoneAnalysis>(&self.storage, &self.config.analysis_path(ZONE_ANALYSIS))
                .await?;
        let summary =
            read_json::<_, DashboardSummary>(&self.storage, &self.config.dashboard_path(SUMMARY))
                .await?;

        Ok(ConsistencyInputs {
            clean_orders: present(orders).map(|rows| rows.len()),
            dishes: present(dishes),
            zones: present(zones),
            summary,
        })
    }

    async fn transform(&self, data: ConsistencyInputs) -> Result<ConsistencyReport> {
        Ok(check_consistency(&data, &self.config))
    }

    async fn load(&self, report: ConsistencyReport) -> Result<PhaseOutput> {
        let path = self.config.dashboard_path(CONSISTENCY_REPORT);
        write_json(&self.storage, &path, &report).await?;

        let total = report.checks.len();
        let failed = report.failed_count();
        if failed > 0 {
            return Err(EtlError::ConsistencyError { failed, total });
        }

        tracing::info!("🔎 All {} consistency checks passed", total);
        Ok(PhaseOutput {
            phase: PHASE_CONSISTENCY.to_string(),
            records: total,
            artifacts: vec![path],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_sequence;
    use crate::app::pipelines::test_support::MockStorage;
    use crate::core::etl::EtlEngine;

    #[tokio::test]
    async fn test_missing_artifacts_fail_every_check() {
        let storage = MockStorage::default();
        let config = Arc::new(ReportConfig::default());
        let engine = EtlEngine::new(ConsistencyPipeline::new(storage.clone(), config));

        let err = engine.run().await.unwrap_err();
        assert!(matches!(
            err,
            EtlError::ConsistencyError {
                failed: 8,
                total: 8
            }
        ));

        // 失敗時報告仍會寫出
        let bytes = storage.get("dashboard/consistency_report.json").await.unwrap();
        let report: ConsistencyReport = serde_json::from_slice(&bytes).unwrap();
        assert!(report.checks.iter().all(|c| c.detail.contains("missing")));
    }

    #[tokio::test]
    async fn test_fresh_run_passes_every_check() {
        let storage = MockStorage::default();
        storage
            .put(
                "raw/orders.csv",
                b"order_id,order_date,zone,partner,cuisine,dish,order_value,rating\n\
                  1,2024-03-01,North,Wok,Thai,Pad Thai,12.0,5\n\
                  2,2024-03-02,South,Wok,Thai,Green Curry,11.0,4\n",
            )
            .await;

        let config = Arc::new(ReportConfig::default());
        let report = build_sequence(storage.clone(), config, None, &Arc::default())
            .unwrap()
            .execute()
            .await;

        assert!(report.success(), "{:?}", report);
        let consistency = report.results.last().unwrap();
        assert_eq!(consistency.name, PHASE_CONSISTENCY);
        assert_eq!(consistency.records, 8);
    }
}
