//! Cpp2IL executable discovery.
//!
//! Locates the converter by checking, in order:
//! 1. The copy bundled with the importer package under the packages root
//! 2. Any matching executable anywhere under the packages root
//! 3. The system PATH

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use cpp2il_core::error::AppError;

/// Location of the bundled converter, relative to the packages root.
const BUNDLED_RELATIVE: &str = "com.kevinfromhp.thunderkit.cpp2ilimport/Editor/ThirdParty/Cpp2IL.exe";

/// File name suffixes that identify the converter.
#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["Cpp2IL.exe"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &["Cpp2IL.exe", "Cpp2IL"];

/// How deep the packages-root search descends.
const SEARCH_DEPTH: usize = 8;

/// Errors from converter discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No converter was found anywhere.
    #[error("Cpp2IL not found. Searched: bundled package, {packages_root}, and PATH")]
    NotFound {
        /// Packages root that was searched.
        packages_root: PathBuf,
    },

    /// An explicitly configured path does not exist.
    #[error("Configured converter path does not exist: {path}")]
    ExplicitMissing {
        /// The configured path.
        path: PathBuf,
    },

    /// A configured directory holds no converter.
    #[error("No Cpp2IL executable inside {dir}")]
    ExecutableMissing {
        /// The directory searched.
        dir: PathBuf,
    },
}

impl From<DiscoveryError> for AppError {
    fn from(err: DiscoveryError) -> Self {
        AppError::not_found(err.to_string())
    }
}

/// A located converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterInstallation {
    /// Full path to the executable.
    pub executable: PathBuf,
    /// Directory containing the executable.
    pub install_dir: PathBuf,
    /// How it was found.
    pub discovery_method: DiscoveryMethod,
}

impl ConverterInstallation {
    fn new(executable: PathBuf, discovery_method: DiscoveryMethod) -> Self {
        let install_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            executable,
            install_dir,
            discovery_method,
        }
    }
}

/// How the converter was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Explicitly configured by the user.
    ExplicitConfig,
    /// The copy shipped with the importer package.
    BundledPackage,
    /// Found by searching the packages root.
    PackageSearch,
    /// Found via the system PATH.
    SystemPath,
}

/// Converter discovery engine.
pub struct Cpp2IlDiscovery;

impl Cpp2IlDiscovery {
    /// Attempt to discover the converter relative to `packages_root`.
    pub fn discover(packages_root: &Path) -> Result<ConverterInstallation, DiscoveryError> {
        info!(packages_root = %packages_root.display(), "Searching for Cpp2IL...");

        let bundled = Self::bundled_path(packages_root);
        if bundled.is_file() {
            info!(path = %bundled.display(), "Found bundled Cpp2IL");
            return Ok(ConverterInstallation::new(
                bundled,
                DiscoveryMethod::BundledPackage,
            ));
        }
        debug!(path = %bundled.display(), "Bundled Cpp2IL not present");

        if let Some(found) = Self::find_executable(packages_root, SEARCH_DEPTH) {
            info!(path = %found.display(), "Found Cpp2IL under packages root");
            return Ok(ConverterInstallation::new(
                found,
                DiscoveryMethod::PackageSearch,
            ));
        }
        debug!("Packages root search failed, trying PATH");

        if let Some(found) = Self::find_in_path() {
            info!(path = %found.display(), "Found Cpp2IL in system PATH");
            return Ok(ConverterInstallation::new(found, DiscoveryMethod::SystemPath));
        }

        Err(DiscoveryError::NotFound {
            packages_root: packages_root.to_path_buf(),
        })
    }

    /// Where the importer package ships its converter.
    pub fn bundled_path(packages_root: &Path) -> PathBuf {
        packages_root.join(BUNDLED_RELATIVE)
    }

    /// Whether a file name identifies the converter.
    pub fn is_converter_name(file_name: &str) -> bool {
        EXECUTABLE_SUFFIXES
            .iter()
            .any(|suffix| file_name.ends_with(suffix))
    }

    /// Create an installation from an explicitly configured path.
    ///
    /// A directory is searched one level deep.
    pub fn from_explicit_path(path: &Path) -> Result<ConverterInstallation, DiscoveryError> {
        if path.is_file() {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !Self::is_converter_name(name) {
                warn!(
                    path = %path.display(),
                    "Configured converter does not look like Cpp2IL, using it anyway"
                );
            }
            return Ok(ConverterInstallation::new(
                path.to_path_buf(),
                DiscoveryMethod::ExplicitConfig,
            ));
        }

        if path.is_dir() {
            return Self::find_executable(path, 1)
                .map(|found| ConverterInstallation::new(found, DiscoveryMethod::ExplicitConfig))
                .ok_or_else(|| DiscoveryError::ExecutableMissing {
                    dir: path.to_path_buf(),
                });
        }

        Err(DiscoveryError::ExplicitMissing {
            path: path.to_path_buf(),
        })
    }

    /// Depth-limited search; entries are visited in sorted order so the
    /// first match is stable.
    fn find_executable(dir: &Path, max_depth: usize) -> Option<PathBuf> {
        Self::find_inner(dir, max_depth, 0)
    }

    fn find_inner(dir: &Path, max_depth: usize, depth: usize) -> Option<PathBuf> {
        if depth > max_depth {
            return None;
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .collect();
        entries.sort();

        let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
            entries.into_iter().partition(|p| p.is_dir());

        let hit = files.into_iter().find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(Self::is_converter_name)
        });
        if hit.is_some() {
            return hit;
        }

        dirs.iter()
            .find_map(|sub| Self::find_inner(sub, max_depth, depth + 1))
    }

    fn find_in_path() -> Option<PathBuf> {
        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var).find_map(|dir| {
            EXECUTABLE_SUFFIXES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }
}
