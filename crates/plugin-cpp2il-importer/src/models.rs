//! Domain models: conversion request/output, name sets, copy decisions,
//! and run reports.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cpp2il_core::config::game::GameConfig;
use cpp2il_plugin::NameList;

use crate::config::ImporterConfig;

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Everything needed to invoke the converter once. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Converter executable.
    pub converter: PathBuf,
    /// Working directory for the child process.
    pub working_dir: PathBuf,
    /// Directory the converter writes artifacts into.
    pub output_root: PathBuf,
    /// Game executable name without extension.
    pub exe_name: String,
    /// Game installation directory.
    pub game_path: PathBuf,
    /// Emit `--skip-analysis`.
    pub skip_analysis: bool,
    /// Emit `--experimental-enable-il-to-assembly-please`.
    pub attempt_il_to_dll: bool,
    /// Emit `--parallel`.
    pub parallel: bool,
    /// Emit `--throw-safety-out-the-window`.
    pub throw_safety_out_window: bool,
    /// Emit `--suppress-attributes`.
    pub suppress_attributes: bool,
}

/// Name of the converter log inside the output root.
pub const CONVERTER_LOG: &str = "cpp2il.log";

impl ConversionRequest {
    /// Build a request from the current settings.
    ///
    /// A relative output root is resolved against `working_dir`.
    pub fn from_settings(
        config: &ImporterConfig,
        converter: PathBuf,
        game: &GameConfig,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            converter,
            output_root: working_dir.join(&config.output_root),
            working_dir,
            exe_name: game.executable_stem(),
            game_path: game.path.clone(),
            skip_analysis: config.skip_analysis,
            attempt_il_to_dll: config.attempt_il_to_dll,
            parallel: config.parallel,
            throw_safety_out_window: config.throw_safety_out_window,
            suppress_attributes: config.suppress_attributes,
        }
    }

    /// File collecting converter output when it may outlive the run.
    pub fn log_path(&self) -> PathBuf {
        self.output_root.join(CONVERTER_LOG)
    }

    /// Flags in emission order; disabled optional flags are left out entirely.
    pub fn flags(&self) -> Vec<&'static str> {
        let optional = [
            (self.attempt_il_to_dll, "--experimental-enable-il-to-assembly-please"),
            (self.parallel, "--parallel"),
            (self.throw_safety_out_window, "--throw-safety-out-the-window"),
            (self.suppress_attributes, "--suppress-attributes"),
        ];

        let mut flags = Vec::with_capacity(8);
        if self.skip_analysis {
            flags.push("--skip-analysis");
        }
        flags.push("--analyze-all");
        flags.extend(optional.iter().filter(|(on, _)| *on).map(|(_, f)| *f));
        flags.push("--skip-method-dumps");
        flags.push("--skip-metadata-txts");
        flags
    }

    /// Value pairs that always follow the flags.
    pub fn value_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("--output-root", self.output_root.to_string_lossy().to_string()),
            ("--exe-name", self.exe_name.clone()),
            ("--game-path", self.game_path.to_string_lossy().to_string()),
        ]
    }

    /// Argument vector handed to the child process.
    ///
    /// Values are separate argv entries, so embedded spaces survive on every
    /// platform without extra quoting.
    pub fn arguments(&self) -> Vec<String> {
        let mut args: Vec<String> = self.flags().into_iter().map(String::from).collect();
        for (flag, value) in self.value_pairs() {
            args.push(flag.to_string());
            args.push(value);
        }
        args
    }

    /// Single-line rendering with every value quoted, for logs.
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self.flags().into_iter().map(String::from).collect();
        for (flag, value) in self.value_pairs() {
            parts.push(flag.to_string());
            parts.push(format!("\"{value}\""));
        }
        parts.join(" ")
    }
}

/// How the wait on the converter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The process exited within the timeout.
    Exited {
        /// Exit code, if the platform reported one.
        code: Option<i32>,
    },
    /// The timeout elapsed and the process was left running.
    StillRunning,
}

/// Artifacts found in the output root after the wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Directory that was scanned.
    pub output_root: PathBuf,
    /// Artifact files, de-duplicated and sorted.
    pub files: Vec<PathBuf>,
    /// How the wait ended.
    pub outcome: WaitOutcome,
    /// Wall time spent waiting, in milliseconds.
    pub duration_ms: u64,
}

impl ConversionOutput {
    /// Whether no artifacts were found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bare file names of the artifacts.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Name sets
// ---------------------------------------------------------------------------

/// How file names are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCase {
    /// Exact byte comparison.
    Sensitive,
    /// ASCII case folding, matching Windows filesystem semantics.
    Insensitive,
}

impl NameCase {
    /// The host filesystem's convention.
    pub fn platform() -> Self {
        if cfg!(windows) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    /// Normalize a name into its comparison key.
    pub fn fold(self, name: &str) -> String {
        match self {
            Self::Sensitive => name.to_string(),
            Self::Insensitive => name.to_ascii_lowercase(),
        }
    }
}

/// Which role a [`NameSet`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSetKind {
    /// Names the host already provides.
    Blacklist,
    /// Names that must always be imported.
    Whitelist,
}

impl fmt::Display for NameSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blacklist => write!(f, "blacklist"),
            Self::Whitelist => write!(f, "whitelist"),
        }
    }
}

/// A frozen set of bare file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSet {
    kind: NameSetKind,
    case: NameCase,
    /// Names as produced by the processor chain.
    names: NameList,
    /// Comparison keys.
    keys: BTreeSet<String>,
}

impl NameSet {
    /// Freeze a name list.
    pub fn new(kind: NameSetKind, names: NameList, case: NameCase) -> Self {
        let keys = names.iter().map(|n| case.fold(n)).collect();
        Self {
            kind,
            case,
            names,
            keys,
        }
    }

    /// An empty set.
    pub fn empty(kind: NameSetKind) -> Self {
        Self::new(kind, NameList::new(), NameCase::platform())
    }

    /// Membership test under this set's case policy.
    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&self.case.fold(name))
    }

    /// Role of this set.
    pub fn kind(&self) -> NameSetKind {
        self.kind
    }

    /// Names in sorted order.
    pub fn names(&self) -> &NameList {
        &self.names
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Filtering and copying
// ---------------------------------------------------------------------------

/// Outcome of filtering one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyDecision {
    /// Blacklisted and not whitelisted.
    Skip {
        /// Bare file name that matched the blacklist.
        file_name: String,
    },
    /// Copy `source` to `destination`.
    Import {
        /// Source after path processing.
        source: PathBuf,
        /// Target file.
        destination: PathBuf,
    },
}

/// A successfully imported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedFile {
    /// Source file.
    pub source: PathBuf,
    /// Destination file.
    pub destination: PathBuf,
    /// Bytes copied.
    pub size: u64,
}

/// A candidate that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    /// Destination that could not be updated, or a source directory that
    /// could not be listed.
    pub destination: PathBuf,
    /// Error description.
    pub error: String,
}

/// Result of one filter/copy pass over a candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Folder the batch copied into.
    pub destination_folder: PathBuf,
    /// Imported files, in candidate order.
    pub imported: Vec<ImportedFile>,
    /// Names skipped by the blacklist.
    pub skipped: Vec<String>,
    /// Per-file failures.
    pub failures: Vec<CopyFailure>,
}

impl BatchReport {
    /// An empty report for `destination_folder`.
    pub fn new(destination_folder: &Path) -> Self {
        Self {
            destination_folder: destination_folder.to_path_buf(),
            ..Default::default()
        }
    }

    /// Candidates considered.
    pub fn total(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.failures.len()
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum PipelineState {
    /// Nothing done yet.
    Init,
    /// Package directories exist.
    DirectoriesAsserted,
    /// The converter produced output.
    Converted,
    /// Converted artifacts were filtered and copied.
    PrimaryImported,
    /// Native plugins were filtered and copied (or there were none).
    PluginsImported,
    /// The run succeeded.
    Done,
    /// The run stopped; the label names the failed precondition.
    Failed(String),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::DirectoriesAsserted => write!(f, "directories_asserted"),
            Self::Converted => write!(f, "converted"),
            Self::PrimaryImported => write!(f, "primary_imported"),
            Self::PluginsImported => write!(f, "plugins_imported"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Package the run imported into.
    pub package_name: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Converter output.
    pub conversion: ConversionOutput,
    /// Blacklist size after processing.
    pub blacklist_size: usize,
    /// Whitelist size after processing.
    pub whitelist_size: usize,
    /// Converted-artifact batch.
    pub primary: BatchReport,
    /// Native-plugin batch; `None` when the game has no plugins directory.
    pub plugins: Option<BatchReport>,
    /// Final state.
    pub state: PipelineState,
}

impl ImportReport {
    /// Per-file failures across both batches.
    pub fn failure_count(&self) -> usize {
        self.primary.failures.len() + self.plugins.as_ref().map_or(0, |p| p.failures.len())
    }

    /// Imported files across both batches.
    pub fn imported_count(&self) -> usize {
        self.primary.imported.len() + self.plugins.as_ref().map_or(0, |p| p.imported.len())
    }
}
