//! Destination layout for an imported package.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ImportError;

/// Name of the native plugins folder inside a package.
pub const PLUGINS_FOLDER: &str = "plugins";

/// The two folders a run copies into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDestinations {
    /// `<packages_root>/<package>`.
    pub package_root: PathBuf,
    /// `<packages_root>/<package>/plugins`.
    pub plugins: PathBuf,
}

/// Computes and creates package destinations.
#[derive(Debug, Clone)]
pub struct PathPolicy {
    packages_root: PathBuf,
}

impl PathPolicy {
    /// Policy rooted at `packages_root`.
    pub fn new(packages_root: impl Into<PathBuf>) -> Self {
        Self {
            packages_root: packages_root.into(),
        }
    }

    /// The packages root.
    pub fn packages_root(&self) -> &Path {
        &self.packages_root
    }

    /// Destinations for `package_name`. Pure; touches nothing.
    pub fn destinations(&self, package_name: &str) -> PackageDestinations {
        let package_root = self.packages_root.join(package_name);
        let plugins = package_root.join(PLUGINS_FOLDER);
        PackageDestinations {
            package_root,
            plugins,
        }
    }

    /// Lock file guarding `<packages_root>/<package>`, next to the package
    /// directory so it is not part of the imported tree.
    pub fn lock_path(&self, package_name: &str) -> PathBuf {
        self.packages_root.join(format!("{package_name}.lock"))
    }

    /// Ensure both destinations exist. Existing directories are fine.
    pub async fn assert_destinations(
        &self,
        package_name: &str,
    ) -> Result<PackageDestinations, ImportError> {
        let destinations = self.destinations(package_name);
        for dir in [&destinations.package_root, &destinations.plugins] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ImportError::DirectorySetup {
                    path: dir.clone(),
                    source,
                })?;
            debug!(dir = %dir.display(), "Destination ready");
        }
        Ok(destinations)
    }
}
