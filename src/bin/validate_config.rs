use clap::Parser;
use dinneroo_etl::config::config_check::{validate_rubric, Severity};
use dinneroo_etl::utils::logger;
use dinneroo_etl::ReportConfig;

#[derive(Parser)]
#[command(name = "validate-config")]
#[command(about = "Check the readiness rubric configuration for errors and warnings")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dinneroo.toml")]
    config: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    tracing::info!("📁 Loading configuration from: {}", args.config);
    let config = match ReportConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let report = validate_rubric(&config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📋 Rubric check for '{}':", config.pipeline.name);
        if report.findings.is_empty() {
            println!("  ✅ No findings");
        }
        for finding in &report.findings {
            let mark = match finding.severity {
                Severity::Error => "❌",
                Severity::Warning => "⚠️",
            };
            println!(
                "  {} {} = {}: {}",
                mark, finding.field, finding.value, finding.message
            );
        }
    }

    let failed = !report.is_valid() || (args.strict && report.warnings().next().is_some());
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
