//! Cpp2IL Import: converts an IL2CPP game build with Cpp2IL and imports
//! the resulting assemblies into a package tree.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use cpp2il_core::config::AppConfig;
use cpp2il_core::config::logging::LoggingConfig;
use cpp2il_core::AppResult;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (source, config) = match load_configuration(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(&source, &config).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration(path: &str) -> AppResult<(config::Config, AppConfig)> {
    let source = cpp2il_core::config::load_source(path)?;
    let config = AppConfig::from_source(&source)?;
    Ok((source, config))
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        "compact" => {
            fmt()
                .compact()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
