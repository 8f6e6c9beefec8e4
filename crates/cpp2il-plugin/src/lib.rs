//! # cpp2il-plugin
//!
//! Extension points for the Cpp2IL importer. Provides:
//!
//! - The [`Processor`] trait: one single-input/single-output step
//! - [`ProcessorChain`]: an ordered list of steps applied left-to-right
//! - [`ProcessorRegistry`]: the three chains the importer consults
//!   (blacklist, whitelist, path)
//! - Built-in processors declared from configuration

pub mod builtin;
pub mod chain;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod traits;

pub use builtin::{ProcessorSpec, ProcessorsConfig};
pub use chain::ProcessorChain;
pub use error::PluginError;
pub use registry::{ChainKind, ProcessorRegistry};
pub use traits::{ClosureProcessor, NameList, Processor};
