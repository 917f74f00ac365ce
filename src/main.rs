use clap::Parser;
use dinneroo_etl::core::ConfigProvider;
use dinneroo_etl::utils::logger;
use dinneroo_etl::utils::monitor::SystemMonitor;
use dinneroo_etl::{build_sequence, CliConfig, LocalStorage, ReportConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 載入 TOML 配置
    let config = match ReportConfig::from_file(args.config_path()) {
        Ok(config) => config,
        Err(e) => {
            logger::init_logger(args.verbose, args.log_json);
            tracing::error!("❌ Failed to load config '{}': {}", args.config, e);
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    };

    logger::init_logger(args.verbose, args.log_json || config.log_json());

    tracing::info!("🚀 Starting dinneroo-etl: {}", config.pipeline.name);
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let monitor_enabled = args.monitor || config.monitoring_enabled();
    let config = Arc::new(config);
    let storage = LocalStorage::new(args.data_dir().to_string());

    let monitor = Arc::new(SystemMonitor::new(monitor_enabled));
    let sequence = match build_sequence(
        storage,
        Arc::clone(&config),
        args.only_phase(),
        &monitor,
    ) {
        Ok(sequence) => sequence,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code());
        }
    };

    if args.dry_run {
        print_plan(&config, &args, &sequence.phase_names());
        return Ok(());
    }

    let report = sequence.execute().await;
    monitor.log_final_stats();

    println!("📋 Phase results:");
    for result in &report.results {
        let mark = if result.success { "✅" } else { "❌" };
        println!(
            "  {} {:<12} {:>6} ms  {}",
            mark,
            result.name,
            result.duration_ms,
            result
                .error
                .clone()
                .unwrap_or_else(|| result.artifacts.join(", "))
        );
    }
    for skipped in &report.skipped {
        println!("  ⏭️ {:<12} skipped", skipped);
    }

    if !report.success() {
        eprintln!(
            "❌ Pipeline finished with failures: {}",
            report.failed_phases().join(", ")
        );
    }
    std::process::exit(report.exit_code());
}

fn print_plan(config: &ReportConfig, args: &CliConfig, phases: &[&str]) {
    println!("🔍 Dry Run Plan:");
    println!("  Pipeline: {}", config.pipeline.name);
    println!("  Data dir: {}", args.data_dir);
    println!("  Phases: {}", phases.join(" → "));
    println!("  Continue on failure: {}", config.pipeline.continue_on_failure);
    println!(
        "  Inputs: {}, {}, {}",
        config.inputs.orders, config.inputs.survey, config.inputs.menu
    );
    println!(
        "  MVP thresholds: partners ≥ {}, cuisines ≥ {}, dishes ≥ {}, orders ≥ {}, core drivers ≥ {}",
        config.mvp.min_partners,
        config.mvp.min_cuisines,
        config.mvp.min_dishes,
        config.mvp.min_orders,
        config.mvp.min_core_drivers
    );
    println!(
        "  Tier cutoff: {} (min {} orders)",
        config.tiers.driver_cutoff, config.tiers.min_orders
    );
    println!("  Output formats: {}", config.outputs.formats.join(", "));
}
