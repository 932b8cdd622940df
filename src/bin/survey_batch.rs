use clap::Parser;
use geovity::core::table_io::read_table;
use geovity::domain::model::columns;
use geovity::domain::ports::ConfigProvider;
use geovity::utils::{logger, validation::Validate};
use geovity::{
    AnomalyMapPipeline, CliShell, CorrectionPipeline, LocalStorage, RunOutcome, SurveyConfig,
    SurveyEngine,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "survey-batch")]
#[command(about = "Run correction and anomaly mapping for a survey described in a TOML file")]
struct Args {
    /// Path to the survey TOML file
    #[arg(short, long, default_value = "survey.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Stop after writing the corrected table
    #[arg(long)]
    skip_map: bool,

    /// Dry run - check inputs and show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match SurveyConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger_with_level(args.verbose, config.log_level());

    tracing::info!("🚀 Starting survey batch");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let settings = config.settings();

    let mut shell = CliShell::new(
        Some(PathBuf::from(&config.io.raw_input)),
        Some(PathBuf::from(&config.io.corrected_output)),
    );
    let correction = SurveyEngine::new_with_monitoring(
        CorrectionPipeline::new(LocalStorage::default(), settings.clone()),
        monitor_enabled,
    );
    if let RunOutcome::Failed(e) = correction.run(&mut shell).await {
        exit_with(&e);
    }

    if args.skip_map {
        tracing::info!("⏭️ Map stage skipped");
        return Ok(());
    }

    let mut shell = CliShell::new(
        Some(PathBuf::from(&config.io.corrected_output)),
        config.io.map_output.as_ref().map(PathBuf::from),
    );
    let map = SurveyEngine::new_with_monitoring(
        AnomalyMapPipeline::new(LocalStorage::default(), settings),
        monitor_enabled,
    );
    if let RunOutcome::Failed(e) = map.run(&mut shell).await {
        exit_with(&e);
    }

    tracing::info!("✅ Survey '{}' processed", config.survey.name);
    Ok(())
}

fn exit_with(e: &geovity::SurveyError) -> ! {
    tracing::error!(
        "❌ Survey batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code().max(1));
}

fn display_config_summary(config: &SurveyConfig, args: &Args) {
    let map = config.map_settings();
    let (width, height) = map.image_size();

    println!("📋 Configuration Summary:");
    println!("  Survey: {}", config.survey.name);
    if let Some(description) = &config.survey.description {
        println!("  Description: {}", description);
    }
    println!("  Raw stations: {}", config.io.raw_input);
    println!("  Corrected table: {}", config.io.corrected_output);
    println!(
        "  Map: {}",
        config.io.map_output.as_deref().unwrap_or("(not saved)")
    );
    println!("  Density: {} g/cm³", config.correction_settings().density);
    println!(
        "  Grid: {}x{}, {} contour levels, {}x{} px at {} dpi",
        map.grid_resolution, map.grid_resolution, map.contour_levels, width, height, map.dpi
    );

    if args.skip_map {
        println!("  ⏭️ MAP STAGE SKIPPED");
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &SurveyConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Station Table:");
    let data = std::fs::read(&config.io.raw_input)?;
    let table = read_table(&data)?;
    println!("  Stations: {}", table.len());
    println!("  Columns: {}", table.headers().join(", "));

    let mut ready = true;
    for column in columns::RAW_SCHEMA {
        if !table.has_column(column) {
            println!("  ⚠️ Missing column: {}", column);
            if column != columns::SITE {
                ready = false;
            }
        }
    }
    for column in columns::DERIVED {
        if table.has_column(column) {
            println!("  ℹ️ {} already present; it will be recomputed", column);
        }
    }

    println!();
    if ready {
        println!("✅ Dry run analysis complete. The table can be corrected.");
    } else {
        println!("❌ Dry run analysis complete. The correction stage would fail.");
    }

    Ok(())
}
