//! The `run` command: one full import.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use crate::output::{self, OutputFormat};
use cpp2il_core::AppResult;
use cpp2il_core::config::AppConfig;
use cpp2il_core::error::AppError;
use plugin_cpp2il_importer::models::BatchReport;
use plugin_cpp2il_importer::{ImportPipeline, ImportReport, ImporterConfig, TimeoutPolicy};

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Game directory (overrides `game.path`)
    #[arg(long)]
    pub game_path: Option<PathBuf>,

    /// Game executable name (overrides `game.executable`)
    #[arg(long)]
    pub executable: Option<String>,

    /// Cpp2IL executable (overrides `importer.converter_path`)
    #[arg(long)]
    pub converter: Option<PathBuf>,

    /// Converter wait in milliseconds (overrides `importer.timeout_ms`)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Kill the converter and fail when the wait elapses
    #[arg(long)]
    pub terminate_on_timeout: bool,
}

/// One row of the per-file table
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    #[tabled(rename = "Batch")]
    batch: &'static str,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Execute the run command
pub async fn execute(
    args: &RunArgs,
    source: &::config::Config,
    app: &AppConfig,
    format: OutputFormat,
) -> AppResult<()> {
    let (app, importer) = apply_overrides(args, app, super::load_importer(source)?)?;
    let pipeline = ImportPipeline::new(&app, importer)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, cancelling import");
            on_ctrl_c.cancel();
        }
    });

    let report = pipeline.execute(cancel).await?;
    print_report(&report, format);
    Ok(())
}

/// Merge command-line flags over the loaded settings.
fn apply_overrides(
    args: &RunArgs,
    app: &AppConfig,
    mut importer: ImporterConfig,
) -> AppResult<(AppConfig, ImporterConfig)> {
    let mut app = app.clone();
    if let Some(path) = &args.game_path {
        app.game.path = path.clone();
    }
    if let Some(exe) = &args.executable {
        app.game.executable = exe.clone();
    }

    if let Some(converter) = &args.converter {
        importer.converter_path = converter.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        importer.timeout_ms = timeout_ms;
    }
    if args.terminate_on_timeout {
        importer.timeout_policy = TimeoutPolicy::Terminate;
    }

    if !app.game.is_configured() {
        return Err(AppError::validation(
            "game.path and game.executable must be set (config or --game-path/--executable)",
        ));
    }
    Ok((app, importer))
}

fn print_report(report: &ImportReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }

    output::print_success(&format!(
        "Imported {} file(s) into package '{}'",
        report.imported_count(),
        report.package_name
    ));
    output::print_kv("Run", &report.run_id.to_string());
    output::print_kv("Converted", &report.conversion.files.len().to_string());
    output::print_kv("Blacklist", &report.blacklist_size.to_string());
    output::print_kv("Whitelist", &report.whitelist_size.to_string());
    output::print_kv(
        "Duration",
        &format!(
            "{} ms",
            (report.finished_at - report.started_at).num_milliseconds()
        ),
    );

    let mut rows = batch_rows("assemblies", &report.primary);
    if let Some(plugins) = &report.plugins {
        rows.extend(batch_rows("plugins", plugins));
    }
    output::print_list(&rows, format);

    if report.failure_count() > 0 {
        output::print_warning(&format!(
            "{} file(s) could not be updated",
            report.failure_count()
        ));
    }
}

fn batch_rows(batch: &'static str, report: &BatchReport) -> Vec<FileRow> {
    let imported = report.imported.iter().map(|f| FileRow {
        batch,
        file: f.destination.display().to_string(),
        result: format!("imported ({} bytes)", f.size),
    });
    let skipped = report.skipped.iter().map(|name| FileRow {
        batch,
        file: name.clone(),
        result: "skipped (blacklisted)".to_string(),
    });
    let failed = report.failures.iter().map(|f| FileRow {
        batch,
        file: f.destination.display().to_string(),
        result: format!("failed: {}", f.error),
    });
    imported.chain(skipped).chain(failed).collect()
}
