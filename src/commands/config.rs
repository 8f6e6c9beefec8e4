//! Configuration management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{self, OutputFormat};
use cpp2il_core::config::AppConfig;
use cpp2il_core::AppResult;
use cpp2il_core::error::AppError;
use cpp2il_plugin::ProcessorRegistry;
use plugin_cpp2il_importer::ImporterConfig;
use plugin_cpp2il_importer::name_sets::provided_names_from_config;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Effective configuration, all sections
#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    #[serde(flatten)]
    app: &'a AppConfig,
    importer: &'a ImporterConfig,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    source: &::config::Config,
    app: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            let importer = super::load_importer(source)?;
            let effective = EffectiveConfig {
                app,
                importer: &importer,
            };
            match format {
                OutputFormat::Json => output::print_json(&effective),
                OutputFormat::Table => println!("{:#?}", effective),
            }
        }
        ConfigCommand::Validate => match validate(source) {
            Ok(importer) => {
                output::print_success(&format!("Configuration '{}' is valid", config_path));
                output::print_kv("Game", &app.game.path.display().to_string());
                output::print_kv("Executable", &app.game.executable);
                output::print_kv("Packages root", &app.packages.root.display().to_string());
                output::print_kv("Timeout", &format!("{} ms", importer.timeout_ms));
                output::print_kv(
                    "Processors",
                    &format!(
                        "{} blacklist, {} whitelist, {} path",
                        importer.processors.blacklist.len(),
                        importer.processors.whitelist.len(),
                        importer.processors.paths.len()
                    ),
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create dir: {}", e)))?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {}", e)))?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}

/// Parse and check the importer section, including its processor chains
fn validate(source: &::config::Config) -> AppResult<ImporterConfig> {
    let importer = super::load_importer(source)?;
    importer.validated()?;
    ProcessorRegistry::from_config(&importer.processors)?;
    provided_names_from_config(&importer.blacklist, &importer.artifact_extension)?;
    Ok(importer)
}
