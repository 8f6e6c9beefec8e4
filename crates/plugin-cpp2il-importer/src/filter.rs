//! Per-candidate import decision.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use cpp2il_plugin::ProcessorRegistry;

use crate::filesystem::FsUtils;
use crate::models::{CopyDecision, NameSet};

/// Applies the path chain and blacklist/whitelist precedence.
///
/// A candidate is imported unless its name is blacklisted and not
/// whitelisted. The whitelist always wins.
#[derive(Debug, Clone)]
pub struct ImportFilter {
    blacklist: NameSet,
    whitelist: NameSet,
    registry: Arc<ProcessorRegistry>,
}

impl ImportFilter {
    /// Create a filter over frozen name sets.
    pub fn new(blacklist: NameSet, whitelist: NameSet, registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            blacklist,
            whitelist,
            registry,
        }
    }

    /// Whether a bare file name should be imported.
    pub fn admits(&self, file_name: &str) -> bool {
        !self.blacklist.contains(file_name) || self.whitelist.contains(file_name)
    }

    /// Decide whether and where `candidate` is copied.
    pub fn decide(&self, candidate: &Path, destination_folder: &Path) -> CopyDecision {
        let normalized = FsUtils::normalize_separators(&candidate.to_string_lossy());
        let processed = self.registry.paths().apply(normalized);
        let file_name = FsUtils::file_name_of(&processed).to_string();

        if !self.admits(&file_name) {
            trace!(file = %file_name, "Blacklisted, skipping");
            return CopyDecision::Skip { file_name };
        }

        CopyDecision::Import {
            destination: destination_folder.join(&file_name),
            source: PathBuf::from(processed),
        }
    }
}
