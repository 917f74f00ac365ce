pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{build_phase, build_sequence};
pub use config::cli::LocalStorage;
pub use config::toml_config::ReportConfig;
pub use core::{
    etl::{EtlEngine, Phase},
    pipeline_sequence::{PipelineSequence, SequenceReport},
};
pub use utils::error::{EtlError, Result};
