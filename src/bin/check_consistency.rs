use clap::Parser;
use dinneroo_etl::app::pipelines::analysis_pipeline::ZONE_ANALYSIS;
use dinneroo_etl::app::pipelines::synthesis_pipeline::SUMMARY;
use dinneroo_etl::config::toml_config::PHASE_CONSISTENCY;
use dinneroo_etl::core::Storage;
use dinneroo_etl::utils::logger;
use dinneroo_etl::utils::monitor::SystemMonitor;
use dinneroo_etl::{build_phase, EtlError, LocalStorage, Phase, ReportConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "check-consistency")]
#[command(about = "Cross-check clean, analysis and dashboard artifacts against the config")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dinneroo.toml")]
    config: String,

    /// Directory holding the pipeline outputs
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn fail(e: &EtlError) -> ! {
    tracing::error!("❌ {}", e);
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = ReportConfig::from_file(&args.config)?;
    let storage = LocalStorage::new(args.data_dir.clone());

    // 沒有任何分析或儀表板產出時，不做比對
    let zones_path = config.analysis_path(ZONE_ANALYSIS);
    let summary_path = config.dashboard_path(SUMMARY);
    if !storage.exists(&zones_path).await && !storage.exists(&summary_path).await {
        fail(&EtlError::MissingInputError { path: zones_path });
    }

    let monitor = Arc::new(SystemMonitor::new(false));
    let phase = build_phase(PHASE_CONSISTENCY, storage, Arc::new(config), &monitor)?;
    match phase.run_phase().await {
        Ok(output) => {
            println!("✅ All {} consistency checks passed", output.records);
            for artifact in &output.artifacts {
                println!("📁 Report saved to: {}", artifact);
            }
            Ok(())
        }
        Err(e) => fail(&e),
    }
}
