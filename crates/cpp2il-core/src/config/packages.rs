//! Destination package tree settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where imported packages live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Root of the package tree; each game gets `<root>/<package name>`.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Directory of the already-installed game package used to seed the
    /// whitelist. Defaults to `<root>/<package name>`.
    #[serde(default)]
    pub installed_path: Option<PathBuf>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            installed_path: None,
        }
    }
}

impl PackagesConfig {
    /// Installed package directory for `package_name`.
    pub fn installed_package_path(&self, package_name: &str) -> PathBuf {
        self.installed_path
            .clone()
            .unwrap_or_else(|| self.root.join(package_name))
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("Packages")
}
