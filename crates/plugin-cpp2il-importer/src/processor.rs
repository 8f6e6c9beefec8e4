//! Import pipeline: directory setup, conversion, name sets, filtered copy
//! of converted artifacts and native plugins, all under the batch lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use cpp2il_core::config::AppConfig;
use cpp2il_core::config::game::GameConfig;
use cpp2il_core::config::packages::PackagesConfig;
use cpp2il_plugin::ProcessorRegistry;

use crate::config::ImporterConfig;
use crate::copier::ArtifactCopier;
use crate::error::ImportError;
use crate::filesystem::FsUtils;
use crate::filter::ImportFilter;
use crate::lock::BatchEditLock;
use crate::metadata::{MetaFileWriter, MetadataWriter};
use crate::models::{BatchReport, ConversionRequest, CopyFailure, ImportReport, PipelineState};
use crate::name_sets::{NameSetBuilder, ProvidedNames, provided_names_from_config};
use crate::paths::PathPolicy;
use crate::runner::{ConversionRunner, Cpp2IlRunner};

/// Runs one import end to end.
///
/// Collaborators (runner, blacklist seed, metadata writer, processor
/// chains) default to the configured implementations and can be replaced
/// before [`execute`](Self::execute).
#[derive(Clone)]
pub struct ImportPipeline {
    config: ImporterConfig,
    game: GameConfig,
    packages: PackagesConfig,
    working_dir: PathBuf,
    converter: Option<PathBuf>,
    registry: Arc<ProcessorRegistry>,
    runner: Arc<dyn ConversionRunner>,
    provided: Arc<dyn ProvidedNames>,
    metadata: Arc<dyn MetadataWriter>,
}

impl std::fmt::Debug for ImportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportPipeline")
            .field("game", &self.game)
            .field("working_dir", &self.working_dir)
            .field("converter", &self.converter)
            .field("provided", &self.provided)
            .finish_non_exhaustive()
    }
}

impl ImportPipeline {
    /// Build a pipeline from settings, rooted at the current directory.
    ///
    /// Validates the importer section, builds the config-declared chains and
    /// resolves the converter. An unresolved converter is not an error here;
    /// the run fails with `converter missing` before invoking anything.
    pub fn new(app: &AppConfig, config: ImporterConfig) -> Result<Self, ImportError> {
        Self::with_working_dir(app, config, std::env::current_dir()?)
    }

    /// Like [`new`](Self::new) with an explicit working directory.
    pub fn with_working_dir(
        app: &AppConfig,
        mut config: ImporterConfig,
        working_dir: PathBuf,
    ) -> Result<Self, ImportError> {
        config.validated()?;

        let registry = ProcessorRegistry::from_config(&config.processors)?;
        let provided =
            provided_names_from_config(&config.blacklist, &config.artifact_extension)?;
        let converter = config.resolve_converter_path(&working_dir.join(&app.packages.root));

        Ok(Self {
            runner: Arc::new(Cpp2IlRunner::new(&config)),
            registry: Arc::new(registry),
            provided,
            metadata: Arc::new(MetaFileWriter),
            converter,
            game: app.game.clone(),
            packages: app.packages.clone(),
            working_dir,
            config,
        })
    }

    /// Replace the converter runner.
    pub fn with_runner(mut self, runner: Arc<dyn ConversionRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the blacklist seed supplier.
    pub fn with_provided_names(mut self, provided: Arc<dyn ProvidedNames>) -> Self {
        self.provided = provided;
        self
    }

    /// Replace the sidecar writer.
    pub fn with_metadata_writer(mut self, metadata: Arc<dyn MetadataWriter>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the resolved converter.
    pub fn with_converter(mut self, converter: Option<PathBuf>) -> Self {
        self.converter = converter;
        self
    }

    /// Mutable access to the processor chains, for registering extra steps.
    pub fn registry_mut(&mut self) -> &mut ProcessorRegistry {
        Arc::make_mut(&mut self.registry)
    }

    /// Resolved converter, if any.
    pub fn converter(&self) -> Option<&Path> {
        self.converter.as_deref()
    }

    /// Importer settings in effect.
    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Run the import with cancellation support.
    #[instrument(skip(self, cancel), fields(run_id, package))]
    pub async fn execute(&self, cancel: CancellationToken) -> Result<ImportReport, ImportError> {
        let run_id = Uuid::now_v7();
        let package_name = self.game.executable_stem();
        let span = tracing::Span::current();
        span.record("run_id", run_id.to_string());
        span.record("package", package_name.as_str());

        let mut state = PipelineState::Init;
        let result = self
            .run_pipeline(run_id, &package_name, &mut state, cancel)
            .await;

        if let Err(e) = &result {
            fail(&mut state, e);
        }
        result
    }

    /// Run the import without cancellation (convenience wrapper).
    pub async fn execute_simple(&self) -> Result<ImportReport, ImportError> {
        self.execute(CancellationToken::new()).await
    }

    /// Core pipeline.
    async fn run_pipeline(
        &self,
        run_id: Uuid,
        package_name: &str,
        state: &mut PipelineState,
        cancel: CancellationToken,
    ) -> Result<ImportReport, ImportError> {
        if package_name.is_empty() {
            return Err(ImportError::InvalidConfig(
                "game.executable is not set".to_string(),
            ));
        }

        let started_at = Utc::now();
        let policy = PathPolicy::new(self.working_dir.join(&self.packages.root));
        let _lock = BatchEditLock::try_acquire(policy.lock_path(package_name))?;

        // Phase 1: destinations
        let destinations = policy.assert_destinations(package_name).await?;
        advance(state, PipelineState::DirectoriesAsserted);

        // Phase 2: preconditions, then conversion
        let converter = self.converter.clone().ok_or(ImportError::ConverterMissing)?;

        let primary = self.game.primary_artifact();
        if !tokio::fs::try_exists(&primary).await.unwrap_or(false) {
            return Err(ImportError::PrimaryArtifactMissing { path: primary });
        }

        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let request = ConversionRequest::from_settings(
            &self.config,
            converter,
            &self.game,
            self.working_dir.clone(),
        );
        let conversion = self.runner.run_conversion(&request, cancel.clone()).await?;
        advance(state, PipelineState::Converted);

        // Phase 3: name sets and converted artifacts
        let names = NameSetBuilder::new(
            self.provided.clone(),
            self.registry.clone(),
            self.config.effective_name_case(),
        );
        let blacklist = names.build_blacklist().await?;
        let installed = self
            .working_dir
            .join(self.packages.installed_package_path(package_name));
        let whitelist = names.build_whitelist(&installed).await?;
        let (blacklist_size, whitelist_size) = (blacklist.len(), whitelist.len());

        let filter = ImportFilter::new(blacklist, whitelist, self.registry.clone());
        let copier = ArtifactCopier::new(self.config.copy_strategy, self.metadata.clone());

        let primary = copier
            .import_filtered(&filter, &conversion.files, &destinations.package_root)
            .await;
        advance(state, PipelineState::PrimaryImported);

        // Phase 4: native plugins
        let plugins_dir = self.game.plugins_path();
        let plugins = if tokio::fs::metadata(&plugins_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            Some(
                self.import_plugins(&copier, &filter, &plugins_dir, &destinations.plugins)
                    .await,
            )
        } else {
            debug!(dir = %plugins_dir.display(), "No plugins directory");
            None
        };
        advance(state, PipelineState::PluginsImported);

        advance(state, PipelineState::Done);
        let report = ImportReport {
            run_id,
            package_name: package_name.to_string(),
            started_at,
            finished_at: Utc::now(),
            conversion,
            blacklist_size,
            whitelist_size,
            primary,
            plugins,
            state: state.clone(),
        };

        info!(
            imported = report.imported_count(),
            failed = report.failure_count(),
            "Import completed"
        );
        Ok(report)
    }

    /// Copy the readable part of the plugins tree. Directories that cannot
    /// be listed are recorded as failures of the batch.
    async fn import_plugins(
        &self,
        copier: &ArtifactCopier,
        filter: &ImportFilter,
        plugins_dir: &Path,
        destination: &Path,
    ) -> BatchReport {
        let (candidates, unreadable) =
            FsUtils::list_files_tolerant(plugins_dir, true, None).await;
        let mut report = copier.import_filtered(filter, &candidates, destination).await;
        for (dir, e) in unreadable {
            warn!(dir = %dir.display(), error = %e, "Could not list plugins directory");
            report.failures.push(CopyFailure {
                destination: dir,
                error: e.to_string(),
            });
        }
        report
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!(from = %state, to = %next, "State transition");
    *state = next;
}

/// Terminal transition for a run that stopped on `err`.
fn fail(state: &mut PipelineState, err: &ImportError) {
    let last = std::mem::replace(state, PipelineState::Failed(err.reason().to_string()));
    error!(
        last_state = %last,
        state = %state,
        category = ?err.category(),
        error = %err,
        "Import failed"
    );
}
