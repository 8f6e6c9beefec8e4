//! Unified error type for the import pipeline.
//!
//! Fatal errors fall into three families that operators must be able to
//! tell apart: setup problems (nothing was run), conversion problems (the
//! converter ran but yielded nothing usable), and cancellation. Per-file
//! copy errors are recorded in the batch report and never abort a run.

use std::path::PathBuf;

use cpp2il_core::error::AppError;
use cpp2il_plugin::PluginError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad family an [`ImportError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A precondition failed before anything was copied.
    Setup,
    /// The converter ran but its output root holds no artifacts.
    ConversionEmpty,
    /// The converter did not finish in time.
    ConversionTimeout,
    /// The run was cancelled.
    Cancelled,
    /// A single candidate could not be imported.
    PerFile,
}

/// Unified error type for all import operations.
#[derive(Debug, Error)]
pub enum ImportError {
    // --- Setup errors ---
    /// A destination or working directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    DirectorySetup {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// No converter executable is configured or discoverable.
    #[error("Unable to find the Cpp2IL executable; check the importer configuration")]
    ConverterMissing,

    /// The converter executable could not be started.
    #[error("Failed to start converter {path}: {source}")]
    ConverterSpawn {
        /// Converter path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The game's native binary is not where the settings say it is.
    #[error("Primary artifact not found: {path}")]
    PrimaryArtifactMissing {
        /// Expected location.
        path: PathBuf,
    },

    /// Another run holds the batch edit lock.
    #[error("Another import is in progress (lock held: {path})")]
    LockBusy {
        /// Lock file path.
        path: PathBuf,
    },

    /// The batch edit lock could not be taken for a reason other than contention.
    #[error("Failed to acquire lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Importer configuration failed validation.
    #[error("Invalid importer configuration: {0}")]
    InvalidConfig(String),

    /// A processor chain could not be built.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    // --- Conversion errors ---
    /// The converter produced no artifact files.
    #[error("Converter produced no output in {output_root}")]
    ConversionEmpty {
        /// Directory that was scanned.
        output_root: PathBuf,
    },

    /// The converter did not exit within the configured wait.
    #[error("Converter timed out after {timeout_ms}ms")]
    ConversionTimedOut {
        /// The wait that was exceeded.
        timeout_ms: u64,
    },

    /// The run was cancelled via cancellation token.
    #[error("Import was cancelled")]
    Cancelled,

    // --- Per-file errors ---
    /// Deleting the stale file or copying the new one failed.
    #[error("Could not update {destination}: {source}")]
    Copy {
        /// Destination file.
        destination: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The sidecar metadata file could not be written.
    #[error("Could not write metadata for {destination}: {reason}")]
    Metadata {
        /// Destination file whose sidecar failed.
        destination: PathBuf,
        /// Failure description.
        reason: String,
    },

    // --- Generic errors ---
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Family of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConversionEmpty { .. } => ErrorCategory::ConversionEmpty,
            Self::ConversionTimedOut { .. } => ErrorCategory::ConversionTimeout,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Copy { .. } | Self::Metadata { .. } => ErrorCategory::PerFile,
            _ => ErrorCategory::Setup,
        }
    }

    /// Stable short reason, used as the `Failed` state label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DirectorySetup { .. } => "directory setup",
            Self::ConverterMissing => "converter missing",
            Self::ConverterSpawn { .. } => "converter failed to start",
            Self::PrimaryArtifactMissing { .. } => "primary artifact missing",
            Self::LockBusy { .. } | Self::Lock { .. } => "lock busy",
            Self::InvalidConfig(_) | Self::Plugin(_) => "invalid configuration",
            Self::ConversionEmpty { .. } => "no conversion output",
            Self::ConversionTimedOut { .. } => "conversion timed out",
            Self::Cancelled => "cancelled",
            Self::Copy { .. } => "copy failed",
            Self::Metadata { .. } => "metadata failed",
            Self::Io(_) => "io",
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match &err {
            ImportError::ConverterMissing | ImportError::PrimaryArtifactMissing { .. } => {
                AppError::not_found(err.to_string())
            }
            ImportError::LockBusy { .. } | ImportError::Cancelled => {
                AppError::conflict(err.to_string())
            }
            ImportError::InvalidConfig(_) => AppError::validation(err.to_string()),
            ImportError::Plugin(_) => AppError::plugin(err.to_string()),
            ImportError::ConverterSpawn { .. }
            | ImportError::ConversionEmpty { .. }
            | ImportError::ConversionTimedOut { .. } => {
                AppError::external_service(err.to_string())
            }
            _ => AppError::storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpp2il_core::error::ErrorKind;

    #[test]
    fn test_setup_and_empty_are_distinct() {
        let missing = ImportError::PrimaryArtifactMissing {
            path: PathBuf::from("/g/GameAssembly.dll"),
        };
        let empty = ImportError::ConversionEmpty {
            output_root: PathBuf::from("/tmp/out"),
        };
        assert_eq!(missing.category(), ErrorCategory::Setup);
        assert_eq!(empty.category(), ErrorCategory::ConversionEmpty);
        assert_eq!(missing.reason(), "primary artifact missing");
        assert_eq!(empty.reason(), "no conversion output");
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = ImportError::ConverterMissing.into();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err: AppError = ImportError::ConversionTimedOut { timeout_ms: 3000 }.into();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(err.message.contains("3000ms"));
    }

    #[test]
    fn test_per_file_errors_name_destination() {
        let err = ImportError::Copy {
            destination: PathBuf::from("Packages/Game/B.dll"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.category(), ErrorCategory::PerFile);
        assert!(err.to_string().contains("Packages/Game/B.dll"));
    }
}
