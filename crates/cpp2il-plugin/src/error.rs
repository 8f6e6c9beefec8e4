//! Processor configuration errors.

use cpp2il_core::error::AppError;
use thiserror::Error;

use crate::registry::ChainKind;

/// Errors raised while building processor chains.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A processor was declared in a chain that cannot run it.
    #[error("Processor '{processor}' cannot be used in the {chain} chain")]
    WrongChain {
        /// Built-in processor kind.
        processor: &'static str,
        /// Chain the processor was declared in.
        chain: ChainKind,
    },

    /// A processor was declared with unusable parameters.
    #[error("Invalid '{processor}' processor: {reason}")]
    InvalidProcessor {
        /// Built-in processor kind.
        processor: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        AppError::plugin(err.to_string())
    }
}
