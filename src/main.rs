use std::io::stdout;

use clap::Parser;
use secrets_cache::{
    cli::{run, Cli},
    config::AppConfig,
    observability::{init_logging, init_metrics, log_config_info},
    secrets::AwsSecretsManagerClient,
    APP_NAME, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging);
    init_metrics(&config.metrics)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting secrets cache");
    log_config_info(&config);

    let store = AwsSecretsManagerClient::from_config(&config.store).await?;
    run(cli.command, &config, store, &mut stdout()).await?;

    Ok(())
}
