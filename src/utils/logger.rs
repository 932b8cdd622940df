use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn init_cli_logger(verbose: bool) {
    init_logger_with_level(verbose, None);
}

/// `RUST_LOG` wins over `log_level`, which wins over the default `info`.
pub fn init_logger_with_level(verbose: bool, log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, log_level)));

    // try_init: tests and embedding shells may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

fn filter_directive(verbose: bool, log_level: Option<&str>) -> String {
    match (verbose, log_level) {
        (true, _) => "geovity=debug,info".to_string(),
        (false, Some(level)) => format!("geovity={}", level.trim().to_ascii_lowercase()),
        (false, None) => "geovity=info".to_string(),
    }
}
