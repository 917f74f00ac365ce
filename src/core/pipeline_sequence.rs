use crate::core::etl::Phase;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// 單一階段的執行結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub name: String,
    pub success: bool,
    pub artifacts: Vec<String>,
    pub records: usize,
    pub error: Option<String>,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub results: Vec<PhaseResult>,
    pub skipped: Vec<String>,
}

impl SequenceReport {
    pub fn success(&self) -> bool {
        self.skipped.is_empty() && self.results.iter().all(|r| r.success)
    }

    pub fn failed_phases(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// 依序執行各階段；失敗時是否繼續由 continue_on_failure 決定
pub struct PipelineSequence {
    phases: Vec<Box<dyn Phase>>,
    continue_on_failure: bool,
}

impl PipelineSequence {
    pub fn new(continue_on_failure: bool) -> Self {
        Self {
            phases: Vec::new(),
            continue_on_failure,
        }
    }

    pub fn add_phase(&mut self, phase: Box<dyn Phase>) {
        self.phases.push(phase);
    }

    pub fn with_phase(mut self, phase: Box<dyn Phase>) -> Self {
        self.add_phase(phase);
        self
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub async fn execute(&self) -> SequenceReport {
        let mut report = SequenceReport::default();
        let total = self.phases.len();

        for (index, phase) in self.phases.iter().enumerate() {
            let name = phase.name().to_string();
            tracing::info!("🔄 [{}/{}] Running phase '{}'", index + 1, total, name);

            let start = Instant::now();
            let outcome = phase.run_phase().await;
            let duration_ms = start.elapsed().as_millis();

            let result = match outcome {
                Ok(output) => PhaseResult {
                    name: name.clone(),
                    success: true,
                    artifacts: output.artifacts,
                    records: output.records,
                    error: None,
                    duration_ms,
                },
                Err(e) => {
                    tracing::error!("❌ Phase '{}' failed: {}", name, e);
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                    PhaseResult {
                        name: name.clone(),
                        success: false,
                        artifacts: Vec::new(),
                        records: 0,
                        error: Some(e.to_string()),
                        duration_ms,
                    }
                }
            };

            let failed = !result.success;
            report.results.push(result);

            if failed && !self.continue_on_failure {
                report.skipped = self.phases[index + 1..]
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect();
                if !report.skipped.is_empty() {
                    tracing::warn!("⏭️ Skipping remaining phases: {}", report.skipped.join(", "));
                }
                break;
            }
        }

        if report.success() {
            tracing::info!("🎉 All {} phases completed", total);
        } else {
            tracing::warn!(
                "⚠️ Sequence finished with failures: {}",
                report.failed_phases().join(", ")
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PhaseOutput;
    use crate::utils::error::{EtlError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockPhase {
        name: String,
        fail: bool,
        runs: Arc<AtomicUsize>,
    }

    impl MockPhase {
        fn boxed(name: &str, fail: bool, runs: &Arc<AtomicUsize>) -> Box<dyn Phase> {
            Box::new(Self {
                name: name.to_string(),
                fail,
                runs: Arc::clone(runs),
            })
        }
    }

    #[async_trait]
    impl Phase for MockPhase {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run_phase(&self) -> Result<PhaseOutput> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EtlError::processing(format!("{} failed", self.name)));
            }
            Ok(PhaseOutput {
                phase: self.name.clone(),
                records: 1,
                artifacts: vec![format!("{}.csv", self.name)],
            })
        }
    }

    #[tokio::test]
    async fn test_all_phases_succeed() {
        let runs = Arc::new(AtomicUsize::new(0));
        let sequence = PipelineSequence::new(true)
            .with_phase(MockPhase::boxed("load", false, &runs))
            .with_phase(MockPhase::boxed("analyze", false, &runs));

        assert_eq!(sequence.phase_names(), vec!["load", "analyze"]);
        let report = sequence.execute().await;

        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.results[1].artifacts, vec!["analyze.csv".to_string()]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_continues_past_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let sequence = PipelineSequence::new(true)
            .with_phase(MockPhase::boxed("load", true, &runs))
            .with_phase(MockPhase::boxed("analyze", false, &runs));

        let report = sequence.execute().await;

        assert!(!report.success());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed_phases(), vec!["load"]);
        assert!(report.results[1].success);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_when_not_continuing() {
        let runs = Arc::new(AtomicUsize::new(0));
        let sequence = PipelineSequence::new(false)
            .with_phase(MockPhase::boxed("load", true, &runs))
            .with_phase(MockPhase::boxed("analyze", false, &runs))
            .with_phase(MockPhase::boxed("synthesize", false, &runs));

        let report = sequence.execute().await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.skipped, vec!["analyze", "synthesize"]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(report.results[0].error.as_deref().unwrap().contains("load failed"));
    }
}
