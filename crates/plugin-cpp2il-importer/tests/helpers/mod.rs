//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use cpp2il_core::config::AppConfig;
use cpp2il_core::config::game::GameConfig;
use cpp2il_core::config::packages::PackagesConfig;
use plugin_cpp2il_importer::models::WaitOutcome;
use plugin_cpp2il_importer::name_sets::{LoadedAssemblies, LoadedModule};
use plugin_cpp2il_importer::runner::scan_output;
use plugin_cpp2il_importer::{
    ConversionOutput, ConversionRequest, ConversionRunner, ImportError, ImportPipeline,
    ImporterConfig, NameCase,
};

/// Converter stand-in that writes fixed files and counts invocations.
#[derive(Debug, Default)]
pub struct FakeRunner {
    outputs: Vec<(String, Vec<u8>)>,
    invocations: AtomicUsize,
    last_request: Mutex<Option<ConversionRequest>>,
}

impl FakeRunner {
    /// Runner that produces `outputs` as `(file name, bytes)`.
    pub fn producing(outputs: &[(&str, &[u8])]) -> Arc<Self> {
        Arc::new(Self {
            outputs: outputs
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.to_vec()))
                .collect(),
            ..Default::default()
        })
    }

    /// Runner that produces nothing.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// How many times the converter was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<ConversionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl ConversionRunner for FakeRunner {
    async fn run_conversion(
        &self,
        request: &ConversionRequest,
        _cancel: CancellationToken,
    ) -> Result<ConversionOutput, ImportError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        tokio::fs::create_dir_all(&request.output_root).await?;
        for (name, bytes) in &self.outputs {
            tokio::fs::write(request.output_root.join(name), bytes).await?;
        }
        scan_output(
            &request.output_root,
            "dll",
            WaitOutcome::Exited { code: Some(0) },
            0,
        )
        .await
    }
}

/// A throwaway project with a fake IL2CPP game.
pub struct TestEnv {
    pub temp: TempDir,
    pub app: AppConfig,
    pub config: ImporterConfig,
}

impl TestEnv {
    /// Project rooted in a temp dir with `game/Game.exe` and `game/GameAssembly.dll`.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let game = temp.path().join("game");
        std::fs::create_dir_all(game.join("Game_Data/il2cpp_data")).expect("mkdir");
        std::fs::write(game.join("Game.exe"), b"exe").expect("write exe");
        std::fs::write(game.join("GameAssembly.dll"), b"native").expect("write primary");

        let app = AppConfig {
            game: GameConfig {
                path: game,
                executable: "Game.exe".to_string(),
            },
            packages: PackagesConfig {
                root: PathBuf::from("Packages"),
                installed_path: None,
            },
            ..Default::default()
        };
        let config = ImporterConfig {
            name_case: Some(NameCase::Sensitive),
            ..Default::default()
        };

        Self { temp, app, config }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn package_dir(&self) -> PathBuf {
        self.root().join("Packages/Game")
    }

    pub fn plugins_source(&self) -> PathBuf {
        self.app.game.path.join("Game_Data/Plugins")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root().join("Packages/Game.lock")
    }

    /// Pipeline using `runner` and a blacklist seeded with `provided` names.
    pub fn pipeline(&self, runner: Arc<FakeRunner>, provided: &[&str]) -> ImportPipeline {
        let modules = provided
            .iter()
            .map(|name| LoadedModule::from_path(format!("/editor/Managed/{name}")))
            .collect();

        ImportPipeline::with_working_dir(&self.app, self.config.clone(), self.root().to_path_buf())
            .expect("pipeline")
            .with_converter(Some(self.root().join("tools/Cpp2IL.exe")))
            .with_runner(runner)
            .with_provided_names(Arc::new(LoadedAssemblies::new(modules)))
    }
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
