use crate::domain::model::PhaseOutput;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use async_trait::async_trait;
use std::sync::Arc;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Arc<SystemMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, Arc::default())
    }

    /// 同一序列的引擎共用一個監控器，峰值才能跨階段比較
    pub fn new_with_monitoring(pipeline: P, monitor: Arc<SystemMonitor>) -> Self {
        Self { pipeline, monitor }
    }

    pub async fn run(&self) -> Result<PhaseOutput> {
        let name = self.pipeline.name();
        tracing::info!("▶️ Starting phase '{}'", name);

        let extracted = self.pipeline.extract().await?;
        self.monitor.log_stats(&format!("{} extract", name));

        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.log_stats(&format!("{} transform", name));

        let output = self.pipeline.load(transformed).await?;
        self.monitor.log_stats(&format!("{} load", name));

        tracing::info!(
            "✅ Phase '{}' wrote {} artifacts ({} records)",
            name,
            output.artifacts.len(),
            output.records
        );
        Ok(output)
    }
}

/// 可放入序列執行器的階段 (object safe)
#[async_trait]
pub trait Phase: Send + Sync {
    fn name(&self) -> &str;
    async fn run_phase(&self) -> Result<PhaseOutput>;
}

#[async_trait]
impl<P: Pipeline> Phase for EtlEngine<P> {
    fn name(&self) -> &str {
        self.pipeline.name()
    }

    async fn run_phase(&self) -> Result<PhaseOutput> {
        self.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    struct CountingPipeline {
        fail_on_transform: bool,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        type Extracted = Vec<u32>;
        type Transformed = u32;

        fn name(&self) -> &str {
            "counting"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<u32> {
            if self.fail_on_transform {
                return Err(EtlError::processing("boom"));
            }
            Ok(data.iter().sum())
        }

        async fn load(&self, total: u32) -> Result<PhaseOutput> {
            Ok(PhaseOutput {
                phase: "counting".to_string(),
                records: total as usize,
                artifacts: vec!["total.txt".to_string()],
            })
        }
    }

    #[test]
    fn test_engine_runs_all_steps() {
        let engine = EtlEngine::new(CountingPipeline {
            fail_on_transform: false,
        });
        let output = tokio_test::block_on(engine.run()).unwrap();
        assert_eq!(output.records, 6);
        assert_eq!(output.artifacts, vec!["total.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_engine_propagates_errors() {
        let engine = EtlEngine::new(CountingPipeline {
            fail_on_transform: true,
        });
        let phase: &dyn Phase = &engine;
        assert_eq!(phase.name(), "counting");
        assert!(phase.run_phase().await.is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_shared_monitor_records_every_step() {
        let monitor = Arc::new(SystemMonitor::new(true));
        let first = EtlEngine::new_with_monitoring(
            CountingPipeline {
                fail_on_transform: false,
            },
            Arc::clone(&monitor),
        );
        let second = EtlEngine::new_with_monitoring(
            CountingPipeline {
                fail_on_transform: true,
            },
            Arc::clone(&monitor),
        );
        tokio_test::block_on(first.run()).unwrap();
        assert!(tokio_test::block_on(second.run()).is_err());

        let steps: Vec<String> = monitor.samples().into_iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec!["counting extract", "counting transform", "counting load", "counting extract"]
        );
        let peak = monitor.peak().unwrap();
        assert!(peak.step.starts_with("counting "));
    }
}
