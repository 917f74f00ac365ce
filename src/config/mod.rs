pub mod cli;
pub mod config_check;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "dinneroo-etl")]
#[command(about = "Dinneroo readiness pipeline: load, analyze, synthesize, check")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dinneroo.toml")]
    pub config: String,

    /// Directory that holds raw inputs and receives all outputs
    #[arg(long, default_value = ".")]
    pub data_dir: String,

    /// Run a single phase (load, analyze, synthesize, consistency)
    #[arg(long)]
    pub only: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system resource usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    /// Show what would run without executing
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn config_path(&self) -> &str {
        &self.config
    }

    fn only_phase(&self) -> Option<&str> {
        self.only.as_deref()
    }
}
