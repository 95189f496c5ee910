mod cli;
mod setup;
mod sidebar;

use std::process::ExitCode;

use lantern_config::LanternConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config first: it decides the log level
    let loaded = match args.config {
        Some(ref path) => lantern_config::load_config_from(path),
        None => lantern_config::load_config(),
    };
    let directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.as_directive().to_string(),
        (None, Err(_)) => "info".to_string(),
    };
    init_logging(&directive);

    tracing::info!("Lantern v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            tracing::error!("Failed to load config override: {e}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            LanternConfig::default()
        }
    };
    args.apply_overrides(&mut config);
    if let Err(e) = lantern_config::validation::validate(&config) {
        tracing::error!("Invalid settings: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!(
        model = %config.ai.model_id,
        server = %config.engine.base_url,
        "Config loaded"
    );

    let session = setup::build_session(&config);
    match sidebar::run(session).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Sidebar error: {e}");
            ExitCode::FAILURE
        }
    }
}
