use clap::Parser;
use geovity::config::Command;
use geovity::domain::ports::Pipeline;
use geovity::utils::{logger, validation::Validate};
use geovity::{
    AnomalyMapPipeline, CliConfig, CliShell, CorrectionPipeline, LocalStorage, RunOutcome,
    SurveyEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting geovity");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.validate().and_then(|_| config.resolve()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let mut shell = CliShell::new(
        config.command.input().cloned(),
        config.command.output().cloned(),
    );
    let storage = LocalStorage::default();

    let exit_code = match &config.command {
        Command::Correct { .. } => {
            let pipeline = CorrectionPipeline::new(storage, settings);
            run(SurveyEngine::new_with_monitoring(pipeline, config.monitor), &mut shell).await
        }
        Command::Map { .. } => {
            let pipeline = AnomalyMapPipeline::new(storage, settings);
            run(SurveyEngine::new_with_monitoring(pipeline, config.monitor), &mut shell).await
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run<P: Pipeline>(engine: SurveyEngine<P>, shell: &mut CliShell) -> i32 {
    match engine.run(shell).await {
        RunOutcome::Cancelled => {
            println!("No input file given; nothing to do");
            0
        }
        RunOutcome::Completed { .. } => 0,
        RunOutcome::Failed(e) => {
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            e.severity().exit_code()
        }
    }
}
