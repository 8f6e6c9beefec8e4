//! The `check` command: read-only inspection of the game layout.

use std::path::PathBuf;

use serde::Serialize;

use crate::output::{self, OutputFormat};
use cpp2il_core::AppResult;
use cpp2il_core::config::AppConfig;
use plugin_cpp2il_importer::{ImporterConfig, PathPolicy};

/// What `check` found
#[derive(Debug, Serialize)]
struct CheckReport {
    game_path: PathBuf,
    executable: String,
    package_name: String,
    il2cpp_build: bool,
    primary_artifact: PathBuf,
    primary_artifact_present: bool,
    plugins_dir: PathBuf,
    plugins_dir_present: bool,
    converter: Option<PathBuf>,
    converter_summary: String,
    lock_file: PathBuf,
}

/// Execute the check command
pub async fn execute(
    source: &::config::Config,
    app: &AppConfig,
    format: OutputFormat,
) -> AppResult<()> {
    let mut importer = super::load_importer(source)?;
    let report = build_report(app, &mut importer);
    let game = &app.game;

    if format == OutputFormat::Json {
        output::print_json(&report);
        return Ok(());
    }

    if !game.is_configured() {
        output::print_warning("game.path and game.executable are not set");
    }
    output::print_kv("Game", &report.game_path.display().to_string());
    output::print_kv("Package", &report.package_name);
    output::print_kv("IL2CPP build", output::yes_no(report.il2cpp_build));
    output::print_kv(
        "GameAssembly.dll",
        output::yes_no(report.primary_artifact_present),
    );
    output::print_kv("Plugins directory", output::yes_no(report.plugins_dir_present));
    output::print_kv("Converter", &report.converter_summary);
    output::print_kv("Lock file", &report.lock_file.display().to_string());

    if report.il2cpp_build && report.primary_artifact_present && report.converter.is_some() {
        output::print_success("Ready to import");
    } else {
        output::print_warning("Import would fail; see the values above");
    }
    Ok(())
}

/// Inspect the layout without touching it. Resolving the converter caches
/// the discovered installation on `importer`.
fn build_report(app: &AppConfig, importer: &mut ImporterConfig) -> CheckReport {
    let converter = importer.resolve_converter_path(&app.packages.root);
    let package_name = app.package_name();
    let game = &app.game;
    CheckReport {
        game_path: game.path.clone(),
        executable: game.executable.clone(),
        il2cpp_build: game.is_configured() && game.il2cpp_data_path().is_dir(),
        primary_artifact: game.primary_artifact(),
        primary_artifact_present: game.is_configured() && game.primary_artifact().is_file(),
        plugins_dir: game.plugins_path(),
        plugins_dir_present: game.is_configured() && game.plugins_path().is_dir(),
        converter,
        converter_summary: importer.converter_summary(),
        lock_file: PathPolicy::new(&app.packages.root).lock_path(&package_name),
        package_name,
    }
}
