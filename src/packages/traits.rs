// src/packages/traits.rs

//! Common traits for package record extractors

use std::fmt;

/// A capability named in a Provides or Requires list
///
/// Only the name takes part in matching. The version constraint is kept
/// verbatim so it can be shown in diagnostics, but it is never compared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capability {
    pub name: String,
    pub constraint: Option<String>,
}

impl Capability {
    /// Create an unversioned capability
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// Create a capability with a version constraint such as `>= 2.3`
    pub fn with_constraint(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        Self {
            name: name.into(),
            constraint: if constraint.trim().is_empty() {
                None
            } else {
                Some(constraint.trim().to_string())
            },
        }
    }

    /// Parse `name [op version]` as written in catalogs
    ///
    /// The operator may follow the name without a space (`glibc>=2.3`).
    /// A parenthesised rich dependency is kept whole as the name.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with('(') {
            return Self::new(s);
        }
        match s.find(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '=')) {
            Some(split) if split > 0 => Self::with_constraint(&s[..split], &s[split..]),
            _ => Self::new(s),
        }
    }

    /// File requirements are absolute paths
    pub fn is_file(&self) -> bool {
        self.name.starts_with('/')
    }

    /// Boolean rich dependency such as `(foo if bar)`
    pub fn is_rich(&self) -> bool {
        self.name.starts_with('(')
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{} {}", self.name, constraint),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Common interface for everything that yields package metadata records
/// (RPM files, TOML catalogs)
pub trait PackageRecord {
    /// Get the package name
    fn name(&self) -> &str;

    /// Get the package version
    fn version(&self) -> &str;

    /// Get the package release
    fn release(&self) -> &str;

    /// Get the installed size in bytes
    fn size(&self) -> u64;

    /// Get the explicit Provides entries
    fn provides(&self) -> &[Capability];

    /// Get the Requires entries, file requirements included
    fn requires(&self) -> &[Capability];

    /// Get the paths of the files owned by the package
    fn files(&self) -> &[String];

    /// `name-version-release`
    fn full_name(&self) -> String {
        format!("{}-{}-{}", self.name(), self.version(), self.release())
    }
}
