//! Prelude for convenient imports.

pub use crate::chain::ProcessorChain;
pub use crate::registry::{ChainKind, ProcessorRegistry};
pub use crate::traits::{ClosureProcessor, NameList, Processor};
