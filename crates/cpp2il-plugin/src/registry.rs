//! Processor registry: the three chains the importer consults.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::ProcessorChain;
use crate::traits::{NameList, Processor};

/// Identifies one of the registry's chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    /// Refines the set of names the host already provides.
    Blacklist,
    /// Refines the set of names that must always be imported.
    Whitelist,
    /// Rewrites each candidate path before the filter decision.
    Path,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blacklist => write!(f, "blacklist"),
            Self::Whitelist => write!(f, "whitelist"),
            Self::Path => write!(f, "path"),
        }
    }
}

/// Registry of processors organized by chain.
///
/// Built once before a run and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
    /// Blacklist set processors.
    blacklist: ProcessorChain<NameList>,
    /// Whitelist set processors.
    whitelist: ProcessorChain<NameList>,
    /// Candidate path processors.
    paths: ProcessorChain<String>,
}

impl ProcessorRegistry {
    /// Creates a registry with three empty chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a blacklist processor.
    pub fn register_blacklist(&mut self, processor: Arc<dyn Processor<NameList>>) {
        info!(
            chain = %ChainKind::Blacklist,
            processor = processor.name(),
            position = self.blacklist.len(),
            "Processor registered"
        );
        self.blacklist.push(processor);
    }

    /// Appends a whitelist processor.
    pub fn register_whitelist(&mut self, processor: Arc<dyn Processor<NameList>>) {
        info!(
            chain = %ChainKind::Whitelist,
            processor = processor.name(),
            position = self.whitelist.len(),
            "Processor registered"
        );
        self.whitelist.push(processor);
    }

    /// Appends a path processor.
    pub fn register_path(&mut self, processor: Arc<dyn Processor<String>>) {
        info!(
            chain = %ChainKind::Path,
            processor = processor.name(),
            position = self.paths.len(),
            "Processor registered"
        );
        self.paths.push(processor);
    }

    /// The blacklist chain.
    pub fn blacklist(&self) -> &ProcessorChain<NameList> {
        &self.blacklist
    }

    /// The whitelist chain.
    pub fn whitelist(&self) -> &ProcessorChain<NameList> {
        &self.whitelist
    }

    /// The path chain.
    pub fn paths(&self) -> &ProcessorChain<String> {
        &self.paths
    }

    /// Number of processors registered in a chain.
    pub fn count(&self, kind: ChainKind) -> usize {
        match kind {
            ChainKind::Blacklist => self.blacklist.len(),
            ChainKind::Whitelist => self.whitelist.len(),
            ChainKind::Path => self.paths.len(),
        }
    }
}
