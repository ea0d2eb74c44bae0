// src/config.rs

//! Depslist generation configuration
//!
//! Everything has a default, so an empty (or missing) configuration file
//! behaves like the historical gendepslist tool.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of unresolved requirements tolerated before giving up
pub const DEFAULT_MAX_UNRESOLVED: usize = 20;

/// How the install order is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePolicy {
    /// Seed the base system, then order each batch in input order
    #[default]
    BatchSequential,
    /// Ignore batches and always pick the globally cheapest package
    GlobalPriority,
}

impl SchedulePolicy {
    /// Remaining-count weight of an alternation none of whose members is placed
    pub fn default_alternation_penalty(&self) -> usize {
        match self {
            Self::BatchSequential => 1,
            Self::GlobalPriority => 1000,
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "batch" | "batch-sequential" | "sequential" => Some(Self::BatchSequential),
            "global" | "global-priority" | "priority" => Some(Self::GlobalPriority),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchSequential => write!(f, "batch-sequential"),
            Self::GlobalPriority => write!(f, "global-priority"),
        }
    }
}

/// Configuration for resolution and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepslistConfig {
    /// Abort once this many requirements are unresolved (0 disables the limit)
    pub max_unresolved: usize,

    /// Scheduling policy
    pub policy: SchedulePolicy,

    /// Short names of packages placed before anything else, in order
    pub put_first: Vec<String>,

    /// Package whose closure is seeded ahead of the first batch
    pub base_package: Option<String>,

    /// Override for the policy's alternation penalty
    pub alternation_penalty: Option<usize>,

    /// Requirements starting with one of these prefixes are ignored
    pub skip_requirement_prefixes: Vec<String>,
}

impl Default for DepslistConfig {
    fn default() -> Self {
        Self {
            max_unresolved: DEFAULT_MAX_UNRESOLVED,
            policy: SchedulePolicy::default(),
            put_first: vec!["setup".to_string(), "filesystem".to_string()],
            base_package: Some("basesystem".to_string()),
            alternation_penalty: None,
            skip_requirement_prefixes: vec!["rpmlib(".to_string()],
        }
    }
}

impl DepslistConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Alternation penalty in effect for the configured policy
    pub fn alternation_penalty(&self) -> usize {
        self.alternation_penalty
            .unwrap_or_else(|| self.policy.default_alternation_penalty())
    }

    /// Whether a requirement should be dropped before resolution
    pub fn skips_requirement(&self, name: &str) -> bool {
        self.skip_requirement_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DepslistConfig::default();
        assert_eq!(config.max_unresolved, 20);
        assert_eq!(config.policy, SchedulePolicy::BatchSequential);
        assert_eq!(config.put_first, vec!["setup", "filesystem"]);
        assert_eq!(config.alternation_penalty(), 1);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = DepslistConfig::parse(
            r#"
            policy = "global-priority"
            put_first = ["filesystem"]
            "#,
        )
        .unwrap();

        assert_eq!(config.policy, SchedulePolicy::GlobalPriority);
        assert_eq!(config.put_first, vec!["filesystem"]);
        assert_eq!(config.max_unresolved, DEFAULT_MAX_UNRESOLVED);
        assert_eq!(config.alternation_penalty(), 1000);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = DepslistConfig::parse("policy = \"random\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(SchedulePolicy::parse("global"), Some(SchedulePolicy::GlobalPriority));
        assert_eq!(SchedulePolicy::parse("Batch"), Some(SchedulePolicy::BatchSequential));
        assert_eq!(SchedulePolicy::parse("fastest"), None);
    }

    #[test]
    fn test_skips_rpmlib() {
        let config = DepslistConfig::default();
        assert!(config.skips_requirement("rpmlib(PayloadIsXz)"));
        assert!(!config.skips_requirement("glibc"));
    }
}
