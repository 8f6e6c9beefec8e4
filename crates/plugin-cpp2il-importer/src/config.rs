//! Configuration for the import pipeline.
//!
//! Lives under the `[importer]` section. If `converter_path` is empty the
//! converter is auto-discovered:
//! 1. The copy bundled with the importer package
//! 2. Anywhere under the packages root
//! 3. System PATH

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use cpp2il_plugin::ProcessorsConfig;

use crate::discovery::{ConverterInstallation, Cpp2IlDiscovery, DiscoveryMethod};
use crate::error::ImportError;
use crate::models::NameCase;

/// What to do when the converter is still running after the timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Leave the converter running and inspect whatever output exists.
    #[default]
    Continue,
    /// Kill the converter and fail the run.
    Terminate,
}

/// How an accepted file replaces its destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStrategy {
    /// Delete the destination, then copy.
    #[default]
    Replace,
    /// Copy to a temporary sibling, then rename over the destination.
    Atomic,
}

/// Where the blacklist seed comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistSeed {
    /// Modules the host reports as loaded.
    #[default]
    LoadedAssemblies,
    /// Managed assemblies shipped with the editor installation.
    EditorManaged,
}

/// Blacklist seeding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Seed source.
    pub seed: BlacklistSeed,
    /// Locations of the host's loaded modules. An empty entry is an
    /// in-memory module and contributes nothing.
    pub loaded_assemblies: Vec<PathBuf>,
    /// File listing one loaded module location per line.
    pub loaded_assemblies_file: Option<PathBuf>,
    /// Editor installation directory, for the `editor_managed` seed.
    pub editor_path: Option<PathBuf>,
}

/// Import pipeline configuration.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Path to the Cpp2IL executable. Empty means auto-discover.
    pub converter_path: PathBuf,

    /// Directory the converter writes into.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Pass `--skip-analysis`.
    #[serde(default = "default_true")]
    pub skip_analysis: bool,

    /// Pass `--experimental-enable-il-to-assembly-please`.
    pub attempt_il_to_dll: bool,

    /// Pass `--parallel`.
    pub parallel: bool,

    /// Pass `--throw-safety-out-the-window`.
    pub throw_safety_out_window: bool,

    /// Pass `--suppress-attributes`.
    #[serde(default = "default_true")]
    pub suppress_attributes: bool,

    /// How long to wait for the converter, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 100, max = 3_600_000))]
    pub timeout_ms: u64,

    /// Behaviour when the wait elapses.
    pub timeout_policy: TimeoutPolicy,

    /// Forward converter stdout/stderr to the debug log.
    #[serde(default = "default_true")]
    pub capture_output: bool,

    /// Remove stale artifacts from the output root before converting.
    pub clean_output_root: bool,

    /// Extension of converted artifacts, without the dot.
    #[serde(default = "default_artifact_extension")]
    #[validate(length(min = 1, max = 16))]
    pub artifact_extension: String,

    /// Destination replacement strategy.
    pub copy_strategy: CopyStrategy,

    /// Name comparison policy; the platform convention when unset.
    pub name_case: Option<NameCase>,

    /// Blacklist seeding.
    pub blacklist: BlacklistConfig,

    /// Config-declared processor chains.
    pub processors: ProcessorsConfig,

    /// Cached discovery result (not serialized, populated at runtime).
    #[serde(skip)]
    pub discovered_installation: Option<ConverterInstallation>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            converter_path: PathBuf::new(),
            output_root: default_output_root(),
            skip_analysis: true,
            attempt_il_to_dll: false,
            parallel: false,
            throw_safety_out_window: false,
            suppress_attributes: true,
            timeout_ms: default_timeout_ms(),
            timeout_policy: TimeoutPolicy::default(),
            capture_output: true,
            clean_output_root: false,
            artifact_extension: default_artifact_extension(),
            copy_strategy: CopyStrategy::default(),
            name_case: None,
            blacklist: BlacklistConfig::default(),
            processors: ProcessorsConfig::default(),
            discovered_installation: None,
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("Temp/ThunderKit/CPP2ILImport")
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_artifact_extension() -> String {
    "dll".to_string()
}

impl ImporterConfig {
    /// Run validator checks, mapping failures to [`ImportError::InvalidConfig`].
    pub fn validated(&self) -> Result<(), ImportError> {
        self.validate()
            .map_err(|e| ImportError::InvalidConfig(e.to_string()))?;
        if self.artifact_extension.starts_with('.') {
            return Err(ImportError::InvalidConfig(
                "artifact_extension must not start with '.'".to_string(),
            ));
        }
        Ok(())
    }

    /// The converter wait as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective name comparison policy.
    pub fn effective_name_case(&self) -> NameCase {
        self.name_case.unwrap_or_else(NameCase::platform)
    }

    /// Resolve the converter executable.
    ///
    /// An explicit `converter_path` is used when valid; otherwise the
    /// discovery chain runs against `packages_root`. The result is cached in
    /// `discovered_installation`.
    pub fn resolve_converter_path(&mut self, packages_root: &Path) -> Option<PathBuf> {
        if !self.converter_path.as_os_str().is_empty() {
            info!(
                path = %self.converter_path.display(),
                "Using explicitly configured converter path"
            );

            match Cpp2IlDiscovery::from_explicit_path(&self.converter_path) {
                Ok(installation) => {
                    let path = installation.executable.clone();
                    self.discovered_installation = Some(installation);
                    return Some(path);
                }
                Err(e) => {
                    warn!(
                        configured_path = %self.converter_path.display(),
                        error = %e,
                        "Configured converter path is invalid"
                    );
                    return None;
                }
            }
        }

        info!("Converter path not configured, attempting auto-discovery...");

        match Cpp2IlDiscovery::discover(packages_root) {
            Ok(installation) => {
                info!(
                    path = %installation.executable.display(),
                    method = ?installation.discovery_method,
                    "Auto-discovered Cpp2IL"
                );
                let path = installation.executable.clone();
                self.discovered_installation = Some(installation);
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Cpp2IL auto-discovery failed");
                None
            }
        }
    }

    /// Human-readable summary of the converter configuration.
    pub fn converter_summary(&self) -> String {
        match &self.discovered_installation {
            Some(inst) => {
                let method = match inst.discovery_method {
                    DiscoveryMethod::ExplicitConfig => "explicit config",
                    DiscoveryMethod::BundledPackage => "bundled package",
                    DiscoveryMethod::PackageSearch => "package search",
                    DiscoveryMethod::SystemPath => "system PATH",
                };
                format!("{} (found via {})", inst.executable.display(), method)
            }
            None if self.converter_path.as_os_str().is_empty() => {
                "Not configured, auto-discovery not yet attempted".to_string()
            }
            None => format!(
                "Configured: {} (not validated)",
                self.converter_path.display()
            ),
        }
    }
}
