// src/packages/common.rs

//! Common structures shared across package record extractors
//!
//! `PackageMetadata` is the owned form of a package record. The RPM reader
//! and the catalog reader both produce it, so the resolver only ever sees
//! one concrete type.

use crate::packages::traits::{Capability, PackageRecord};

/// Metadata of one package as needed for dependency resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Package release
    pub release: String,
    /// Installed size in bytes
    pub size: u64,
    /// Explicit Provides entries
    pub provides: Vec<Capability>,
    /// Requires entries
    pub requires: Vec<Capability>,
    /// Owned file paths
    pub files: Vec<String>,
}

impl PackageMetadata {
    /// Create new metadata with required fields
    pub fn new(name: String, version: String, release: String) -> Self {
        Self {
            name,
            version,
            release,
            size: 0,
            provides: Vec::new(),
            requires: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl PackageRecord for PackageMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn release(&self) -> &str {
        &self.release
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn provides(&self) -> &[Capability] {
        &self.provides
    }

    fn requires(&self) -> &[Capability] {
        &self.requires
    }

    fn files(&self) -> &[String] {
        &self.files
    }
}

/// Builder for PackageMetadata to make construction cleaner
#[derive(Debug, Default)]
pub struct PackageMetadataBuilder {
    name: Option<String>,
    version: Option<String>,
    release: Option<String>,
    size: u64,
    provides: Vec<Capability>,
    requires: Vec<Capability>,
    files: Vec<String>,
}

impl PackageMetadataBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the package version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the package release
    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// Set the installed size
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Add a Provides entry (`name [op version]`)
    pub fn provides(mut self, capability: &str) -> Self {
        self.provides.push(Capability::parse(capability));
        self
    }

    /// Add a Requires entry (`name [op version]`)
    pub fn requires(mut self, capability: &str) -> Self {
        self.requires.push(Capability::parse(capability));
        self
    }

    /// Add an owned file
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Build the PackageMetadata
    ///
    /// # Panics
    /// Panics if name, version, or release are not set.
    pub fn build(self) -> PackageMetadata {
        self.try_build()
            .expect("name, version and release are required")
    }

    /// Try to build the PackageMetadata, returning None if required fields are missing
    pub fn try_build(self) -> Option<PackageMetadata> {
        Some(PackageMetadata {
            name: self.name?,
            version: self.version?,
            release: self.release?,
            size: self.size,
            provides: self.provides,
            requires: self.requires,
            files: self.files,
        })
    }
}
