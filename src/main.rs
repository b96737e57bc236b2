//! Freight Manifest CLI application
//!
//! Command-line interface for extracting cargo records from partner
//! manifest spreadsheets.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use freight_manifest::cli::{
    handle_config, handle_inspect, handle_parse, Cli, Commands, ConfigAction,
};
use freight_manifest::config::{AppConfig, LoggingConfig};
use freight_manifest::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // `config init` must work even when the current file is broken
    let config = match &cli.command {
        Commands::Config(args) if matches!(args.action, ConfigAction::Init { .. }) => {
            AppConfig::default()
        }
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };

    init_logging(&cli, &config.logging);

    info!("Freight Manifest v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command {
        Commands::Parse(args) => {
            info!("Executing parse command");
            handle_parse(args, &config, quiet).await
        }
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            handle_inspect(args, &config).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config).await
        }
    }
}

/// Initialize logging from CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let log_level = cli
        .log_level()
        .or_else(|| logging.level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::WARN);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("freight_manifest={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(logging.colored_output)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
