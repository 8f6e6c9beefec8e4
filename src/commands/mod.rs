//! CLI command definitions and dispatch.

pub mod check;
pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use cpp2il_core::config::AppConfig;
use cpp2il_core::AppResult;
use plugin_cpp2il_importer::{CONFIG_SECTION, ImporterConfig};

/// Cpp2IL Import: convert an IL2CPP game and import its assemblies
#[derive(Debug, Parser)]
#[command(name = "cpp2il-import", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert the game and import its assemblies
    Run(run::RunArgs),
    /// Inspect the game layout and converter availability
    Check,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, source: &::config::Config, app: &AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Run(args) => run::execute(args, source, app, self.format).await,
            Commands::Check => check::execute(source, app, self.format).await,
            Commands::Config(args) => config::execute(args, source, app, &self.config, self.format).await,
        }
    }
}

/// Helper: read the `[importer]` section
pub fn load_importer(source: &::config::Config) -> AppResult<ImporterConfig> {
    cpp2il_core::config::section(source, CONFIG_SECTION)
}
