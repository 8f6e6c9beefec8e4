//! Built-in processors declared from configuration.
//!
//! ```toml
//! [[importer.processors.blacklist]]
//! kind = "remove_names"
//! names = ["Newtonsoft.Json.dll"]
//!
//! [[importer.processors.paths]]
//! kind = "replace_in_path"
//! from = "/Managed/"
//! to = "/Patched/"
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::registry::{ChainKind, ProcessorRegistry};
use crate::traits::{NameList, Processor};

/// A built-in processor declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessorSpec {
    /// Adds names to a set.
    AddNames {
        /// Names to add.
        names: Vec<String>,
    },
    /// Removes names from a set.
    RemoveNames {
        /// Names to remove.
        names: Vec<String>,
    },
    /// Removes every name starting with a prefix.
    RemovePrefixed {
        /// Prefix to match.
        prefix: String,
    },
    /// Replaces every occurrence of `from` in a candidate path with `to`.
    ReplaceInPath {
        /// Substring to replace.
        from: String,
        /// Replacement.
        to: String,
    },
}

impl ProcessorSpec {
    /// Kind tag as written in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNames { .. } => "add_names",
            Self::RemoveNames { .. } => "remove_names",
            Self::RemovePrefixed { .. } => "remove_prefixed",
            Self::ReplaceInPath { .. } => "replace_in_path",
        }
    }

    /// Builds a set processor (blacklist or whitelist chain).
    pub fn into_set_processor(
        self,
        chain: ChainKind,
    ) -> Result<Arc<dyn Processor<NameList>>, PluginError> {
        let processor = self.kind();
        match self {
            Self::AddNames { names } => Ok(Arc::new(AddNames {
                names: names.into_iter().collect(),
            })),
            Self::RemoveNames { names } => Ok(Arc::new(RemoveNames {
                names: names.into_iter().collect(),
            })),
            Self::RemovePrefixed { prefix } => {
                if prefix.is_empty() {
                    return Err(PluginError::InvalidProcessor {
                        processor,
                        reason: "prefix must not be empty".to_string(),
                    });
                }
                Ok(Arc::new(RemovePrefixed { prefix }))
            }
            Self::ReplaceInPath { .. } => Err(PluginError::WrongChain { processor, chain }),
        }
    }

    /// Builds a path processor.
    pub fn into_path_processor(self) -> Result<Arc<dyn Processor<String>>, PluginError> {
        let processor = self.kind();
        match self {
            Self::ReplaceInPath { from, to } => {
                if from.is_empty() {
                    return Err(PluginError::InvalidProcessor {
                        processor,
                        reason: "'from' must not be empty".to_string(),
                    });
                }
                Ok(Arc::new(ReplaceInPath { from, to }))
            }
            _ => Err(PluginError::WrongChain {
                processor,
                chain: ChainKind::Path,
            }),
        }
    }
}

/// Processor declarations for each chain, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorsConfig {
    /// Blacklist chain.
    pub blacklist: Vec<ProcessorSpec>,
    /// Whitelist chain.
    pub whitelist: Vec<ProcessorSpec>,
    /// Path chain.
    pub paths: Vec<ProcessorSpec>,
}

impl ProcessorRegistry {
    /// Builds a registry from configuration declarations.
    pub fn from_config(config: &ProcessorsConfig) -> Result<Self, PluginError> {
        let mut registry = Self::new();
        for spec in &config.blacklist {
            registry.register_blacklist(spec.clone().into_set_processor(ChainKind::Blacklist)?);
        }
        for spec in &config.whitelist {
            registry.register_whitelist(spec.clone().into_set_processor(ChainKind::Whitelist)?);
        }
        for spec in &config.paths {
            registry.register_path(spec.clone().into_path_processor()?);
        }
        Ok(registry)
    }
}

/// Adds fixed names.
#[derive(Debug)]
struct AddNames {
    names: NameList,
}

impl Processor<NameList> for AddNames {
    fn name(&self) -> &str {
        "add_names"
    }

    fn process(&self, mut input: NameList) -> NameList {
        input.extend(self.names.iter().cloned());
        input
    }
}

/// Removes fixed names.
#[derive(Debug)]
struct RemoveNames {
    names: NameList,
}

impl Processor<NameList> for RemoveNames {
    fn name(&self) -> &str {
        "remove_names"
    }

    fn process(&self, mut input: NameList) -> NameList {
        input.retain(|n| !self.names.contains(n));
        input
    }
}

/// Removes names by prefix.
#[derive(Debug)]
struct RemovePrefixed {
    prefix: String,
}

impl Processor<NameList> for RemovePrefixed {
    fn name(&self) -> &str {
        "remove_prefixed"
    }

    fn process(&self, mut input: NameList) -> NameList {
        input.retain(|n| !n.starts_with(&self.prefix));
        input
    }
}

/// Substring replacement on candidate paths.
#[derive(Debug)]
struct ReplaceInPath {
    from: String,
    to: String,
}

impl Processor<String> for ReplaceInPath {
    fn name(&self) -> &str {
        "replace_in_path"
    }

    fn process(&self, input: String) -> String {
        input.replace(&self.from, &self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> NameList {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_processors_from_toml() {
        let config: ProcessorsConfig = toml::from_str(
            r#"
            [[blacklist]]
            kind = "add_names"
            names = ["Extra.dll"]

            [[blacklist]]
            kind = "remove_prefixed"
            prefix = "Unity."

            [[whitelist]]
            kind = "remove_names"
            names = ["B.dll"]
            "#,
        )
        .expect("parse toml");

        let registry = ProcessorRegistry::from_config(&config).expect("build");
        let blacklist = registry
            .blacklist()
            .apply(names(&["Unity.Core.dll", "mscorlib.dll"]));
        assert_eq!(blacklist, names(&["Extra.dll", "mscorlib.dll"]));

        let whitelist = registry.whitelist().apply(names(&["A.dll", "B.dll"]));
        assert_eq!(whitelist, names(&["A.dll"]));
    }

    #[test]
    fn test_path_processor() {
        let config = ProcessorsConfig {
            paths: vec![ProcessorSpec::ReplaceInPath {
                from: "/old/".to_string(),
                to: "/new/".to_string(),
            }],
            ..Default::default()
        };
        let registry = ProcessorRegistry::from_config(&config).expect("build");
        assert_eq!(
            registry.paths().apply("/root/old/A.dll".to_string()),
            "/root/new/A.dll"
        );
    }

    #[test]
    fn test_path_spec_in_set_chain_is_rejected() {
        let config = ProcessorsConfig {
            whitelist: vec![ProcessorSpec::ReplaceInPath {
                from: "a".to_string(),
                to: "b".to_string(),
            }],
            ..Default::default()
        };
        let err = ProcessorRegistry::from_config(&config).expect_err("wrong chain");
        assert!(matches!(
            err,
            PluginError::WrongChain {
                chain: ChainKind::Whitelist,
                ..
            }
        ));
    }

    #[test]
    fn test_set_spec_in_path_chain_is_rejected() {
        let config = ProcessorsConfig {
            paths: vec![ProcessorSpec::AddNames { names: vec![] }],
            ..Default::default()
        };
        assert!(ProcessorRegistry::from_config(&config).is_err());
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let spec = ProcessorSpec::RemovePrefixed {
            prefix: String::new(),
        };
        assert!(matches!(
            spec.into_set_processor(ChainKind::Blacklist),
            Err(PluginError::InvalidProcessor { .. })
        ));
    }
}
