// src/packages/catalog.rs

//! TOML package catalogs
//!
//! A catalog describes a batch of packages without the package files
//! themselves:
//!
//! ```toml
//! [[package]]
//! name = "bash"
//! version = "5.2"
//! release = "1"
//! size = 1234
//! provides = ["/bin/sh"]
//! requires = ["glibc >= 2.3"]
//! files = ["/bin/bash"]
//! ```

use crate::error::{Error, Result};
use crate::packages::common::PackageMetadata;
use crate::packages::traits::Capability;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "package")]
    packages: Vec<CatalogEntry>,
}

/// One `[[package]]` table
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    version: String,
    release: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    provides: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
}

impl From<CatalogEntry> for PackageMetadata {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.name,
            version: entry.version,
            release: entry.release,
            size: entry.size,
            provides: entry.provides.iter().map(|s| Capability::parse(s)).collect(),
            requires: entry.requires.iter().map(|s| Capability::parse(s)).collect(),
            files: entry.files,
        }
    }
}

/// A parsed catalog file
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    packages: Vec<PackageMetadata>,
}

impl Catalog {
    /// Load a catalog from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse catalog text; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|source| Error::Catalog {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Parsed catalog {}: {} packages",
            path.display(),
            file.packages.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            packages: file.packages.into_iter().map(PackageMetadata::from).collect(),
        })
    }

    /// Path the catalog was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Packages in catalog order
    pub fn packages(&self) -> &[PackageMetadata] {
        &self.packages
    }

    pub fn into_packages(self) -> Vec<PackageMetadata> {
        self.packages
    }
}
