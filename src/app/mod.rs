pub mod pipelines;

use crate::config::toml_config::{
    ReportConfig, KNOWN_PHASES, PHASE_ANALYZE, PHASE_CONSISTENCY, PHASE_LOAD, PHASE_SYNTHESIZE,
};
use crate::core::etl::{EtlEngine, Phase};
use crate::core::pipeline_sequence::PipelineSequence;
use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use pipelines::{AnalysisPipeline, ConsistencyPipeline, LoadPipeline, SynthesisPipeline};
use std::sync::Arc;

/// 依名稱建立單一階段
pub fn build_phase<S>(
    name: &str,
    storage: S,
    config: Arc<ReportConfig>,
    monitor: &Arc<SystemMonitor>,
) -> Result<Box<dyn Phase>>
where
    S: Storage + 'static,
{
    let phase: Box<dyn Phase> = match name {
        PHASE_LOAD => Box::new(EtlEngine::new_with_monitoring(
            LoadPipeline::new(storage, config),
            Arc::clone(monitor),
        )),
        PHASE_ANALYZE => Box::new(EtlEngine::new_with_monitoring(
            AnalysisPipeline::new(storage, config),
            Arc::clone(monitor),
        )),
        PHASE_SYNTHESIZE => Box::new(EtlEngine::new_with_monitoring(
            SynthesisPipeline::new(storage, config),
            Arc::clone(monitor),
        )),
        PHASE_CONSISTENCY => Box::new(EtlEngine::new_with_monitoring(
            ConsistencyPipeline::new(storage, config),
            Arc::clone(monitor),
        )),
        other => {
            return Err(EtlError::InvalidConfigValueError {
                field: "phase".to_string(),
                value: other.to_string(),
                reason: format!("Unknown phase. Valid phases: {}", KNOWN_PHASES.join(", ")),
            })
        }
    };
    Ok(phase)
}

/// 依 execution_order 建立序列；`only` 指定時只執行該階段。
/// 所有階段共用 `monitor`，結束後由呼叫端回報峰值
pub fn build_sequence<S>(
    storage: S,
    config: Arc<ReportConfig>,
    only: Option<&str>,
    monitor: &Arc<SystemMonitor>,
) -> Result<PipelineSequence>
where
    S: Storage + Clone + 'static,
{
    let names: Vec<String> = match only {
        Some(phase) => vec![phase.to_string()],
        None => config.pipeline.execution_order.clone(),
    };

    let mut sequence = PipelineSequence::new(config.pipeline.continue_on_failure);
    for name in &names {
        sequence.add_phase(build_phase(name, storage.clone(), Arc::clone(&config), monitor)?);
    }
    Ok(sequence)
}
