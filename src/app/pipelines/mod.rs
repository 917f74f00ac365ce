pub mod analysis_pipeline;
pub mod consistency_pipeline;
pub mod load_pipeline;
pub mod synthesis_pipeline;

pub use analysis_pipeline::AnalysisPipeline;
pub use consistency_pipeline::ConsistencyPipeline;
pub use load_pipeline::LoadPipeline;
pub use synthesis_pipeline::SynthesisPipeline;
