//! # Plugin Cpp2IL Importer
//!
//! Imports the managed assemblies of an IL2CPP game build into a package
//! tree. Cpp2IL reconstructs the assemblies from `GameAssembly.dll`; the
//! importer then copies every produced artifact except those the host
//! already provides (the blacklist), unless the installed package demands
//! them (the whitelist). Native plugins bypass conversion but go through
//! the same filter.
//!
//! ## Cpp2IL Discovery
//!
//! When no converter path is configured, the copy bundled with the
//! importer package is used, then any `Cpp2IL.exe` under the packages
//! root, then the system PATH.

pub mod config;
pub mod copier;
pub mod discovery;
pub mod error;
pub mod filesystem;
pub mod filter;
pub mod lock;
pub mod metadata;
pub mod models;
pub mod name_sets;
pub mod paths;
pub mod processor;
pub mod runner;

pub use config::{BlacklistSeed, CopyStrategy, ImporterConfig, TimeoutPolicy};
pub use copier::ArtifactCopier;
pub use discovery::Cpp2IlDiscovery;
pub use error::{ErrorCategory, ImportError};
pub use filter::ImportFilter;
pub use metadata::{MetaFileWriter, MetadataWriter};
pub use models::{
    BatchReport, ConversionOutput, ConversionRequest, CopyDecision, ImportReport, NameCase,
    NameSet, NameSetKind, PipelineState,
};
pub use name_sets::{NameSetBuilder, ProvidedNames};
pub use paths::PathPolicy;
pub use processor::ImportPipeline;
pub use runner::{ConversionRunner, Cpp2IlRunner};

/// Configuration section read by this crate.
pub const CONFIG_SECTION: &str = "importer";
