//! Blacklist and whitelist construction.
//!
//! The blacklist starts from the names the host already provides and the
//! whitelist from the installed package contents. Each then runs through
//! its processor chain and the chain output is frozen into a [`NameSet`].

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use cpp2il_plugin::{NameList, ProcessorRegistry};

use crate::config::{BlacklistConfig, BlacklistSeed};
use crate::error::ImportError;
use crate::filesystem::FsUtils;
use crate::models::{NameCase, NameSet, NameSetKind};

/// Supplies the names the host environment already provides.
#[async_trait]
pub trait ProvidedNames: Send + Sync + Debug {
    /// Short label for logs.
    fn label(&self) -> &str;

    /// Bare file names of provided assemblies.
    async fn provided_names(&self) -> Result<NameList, ImportError>;
}

/// A module the host reports as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// File-backed location; `None` for dynamic or in-memory modules.
    pub location: Option<PathBuf>,
}

impl LoadedModule {
    /// Module loaded from `path`; an empty path means in-memory.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            location: (!path.as_os_str().is_empty()).then_some(path),
        }
    }

    /// In-memory module with no location.
    pub fn dynamic() -> Self {
        Self { location: None }
    }
}

/// Names of the modules loaded in the host process.
#[derive(Debug, Clone, Default)]
pub struct LoadedAssemblies {
    modules: Vec<LoadedModule>,
    listing: Option<PathBuf>,
}

impl LoadedAssemblies {
    /// Supplier over a fixed module list.
    pub fn new(modules: Vec<LoadedModule>) -> Self {
        Self {
            modules,
            listing: None,
        }
    }

    /// Also read module locations from a file, one per line.
    pub fn with_listing(mut self, listing: impl Into<PathBuf>) -> Self {
        self.listing = Some(listing.into());
        self
    }
}

#[async_trait]
impl ProvidedNames for LoadedAssemblies {
    fn label(&self) -> &str {
        "loaded_assemblies"
    }

    async fn provided_names(&self) -> Result<NameList, ImportError> {
        let mut modules = self.modules.clone();
        if let Some(listing) = &self.listing {
            let text = tokio::fs::read_to_string(listing).await?;
            modules.extend(text.lines().map(|l| LoadedModule::from_path(l.trim())));
        }

        let names: NameList = modules
            .iter()
            .filter_map(|m| m.location.as_deref())
            .map(FsUtils::extract_filename_str)
            .filter(|n| !n.is_empty())
            .collect();
        Ok(names)
    }
}

/// Assemblies shipped in `<editor>/Data/Managed`.
#[derive(Debug, Clone)]
pub struct EditorManagedScan {
    editor_path: PathBuf,
    extension: String,
}

impl EditorManagedScan {
    /// Scan the editor installed at `editor_path`.
    pub fn new(editor_path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            editor_path: editor_path.into(),
            extension: extension.into(),
        }
    }

    /// The scanned directory.
    pub fn managed_dir(&self) -> PathBuf {
        self.editor_path.join("Data").join("Managed")
    }
}

#[async_trait]
impl ProvidedNames for EditorManagedScan {
    fn label(&self) -> &str {
        "editor_managed"
    }

    async fn provided_names(&self) -> Result<NameList, ImportError> {
        let files = FsUtils::list_files(&self.managed_dir(), true, Some(&self.extension)).await?;
        Ok(files
            .iter()
            .map(|p| FsUtils::extract_filename_str(p))
            .collect())
    }
}

/// Build the configured blacklist seed supplier.
pub fn provided_names_from_config(
    config: &BlacklistConfig,
    extension: &str,
) -> Result<Arc<dyn ProvidedNames>, ImportError> {
    match config.seed {
        BlacklistSeed::LoadedAssemblies => {
            let modules = config
                .loaded_assemblies
                .iter()
                .cloned()
                .map(LoadedModule::from_path)
                .collect();
            let mut supplier = LoadedAssemblies::new(modules);
            if let Some(listing) = &config.loaded_assemblies_file {
                supplier = supplier.with_listing(listing);
            }
            Ok(Arc::new(supplier))
        }
        BlacklistSeed::EditorManaged => {
            let editor = config.editor_path.as_ref().ok_or_else(|| {
                ImportError::InvalidConfig(
                    "blacklist.editor_path is required for the editor_managed seed".to_string(),
                )
            })?;
            Ok(Arc::new(EditorManagedScan::new(editor, extension)))
        }
    }
}

/// Builds the two name sets for a run.
#[derive(Debug, Clone)]
pub struct NameSetBuilder {
    provided: Arc<dyn ProvidedNames>,
    registry: Arc<ProcessorRegistry>,
    case: NameCase,
}

impl NameSetBuilder {
    /// Create a builder.
    pub fn new(
        provided: Arc<dyn ProvidedNames>,
        registry: Arc<ProcessorRegistry>,
        case: NameCase,
    ) -> Self {
        Self {
            provided,
            registry,
            case,
        }
    }

    /// Provided names, refined by the blacklist chain.
    pub async fn build_blacklist(&self) -> Result<NameSet, ImportError> {
        let seed = self.provided.provided_names().await?;
        debug!(
            supplier = self.provided.label(),
            seed = seed.len(),
            "Blacklist seeded"
        );

        let names = self.registry.blacklist().apply(seed);
        info!(size = names.len(), "Blacklist built");
        Ok(NameSet::new(NameSetKind::Blacklist, names, self.case))
    }

    /// Installed package contents, refined by the whitelist chain.
    ///
    /// A missing package directory yields an empty seed.
    pub async fn build_whitelist(&self, installed_package_root: &Path) -> Result<NameSet, ImportError> {
        let files = FsUtils::list_files(installed_package_root, true, None).await?;
        let seed: NameList = files
            .iter()
            .map(|p| FsUtils::extract_filename_str(p))
            .collect();
        debug!(
            root = %installed_package_root.display(),
            seed = seed.len(),
            "Whitelist seeded"
        );

        let names = self.registry.whitelist().apply(seed);
        info!(size = names.len(), "Whitelist built");
        Ok(NameSet::new(NameSetKind::Whitelist, names, self.case))
    }
}
