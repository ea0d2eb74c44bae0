// src/resolver/mod.rs

//! Dependency resolution and install ordering
//!
//! The pipeline runs in stages over a `ResolutionContext`:
//!
//! 1. collect every required capability name (pass 0)
//! 2. build the `ProviderIndex` for those capabilities (pass 1)
//! 3. resolve each requirement to a `Dependency` (pass 2)
//! 4. close the direct dependency sets transitively
//! 5. schedule a total install order
//!
//! Each stage reads the previous stage's output and never mutates it.

pub mod graph;
pub mod index;
pub mod order;
pub mod requirement;

pub use graph::close;
pub use index::ProviderIndex;
pub use order::{schedule, InstallOrder, OrderException};
pub use requirement::RequirementResolver;

use crate::config::DepslistConfig;
use crate::error::Result;
use crate::packages::traits::{Capability, PackageRecord};
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Full package identifier, `name-version-release`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PackageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A package as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: PackageId,
    pub short_name: String,
    pub size: u64,
    /// Index of the input batch the package was read from
    pub batch: usize,
    /// Capability requirements, in declaration order
    pub requirements: Vec<Capability>,
    /// File requirements (absolute paths), in declaration order
    pub file_requirements: Vec<Capability>,
    /// Explicit Provides entries
    pub provides: Vec<String>,
    /// Owned file paths
    pub files: Vec<String>,
}

impl Package {
    /// Build a resolver package from an extracted record
    ///
    /// Rich (boolean) requirements are dropped; no package provides them
    /// by name.
    pub fn from_record<R: PackageRecord + ?Sized>(record: &R, batch: usize) -> Self {
        let id = PackageId::new(record.full_name());
        let (file_requirements, requirements) = record
            .requires()
            .iter()
            .filter(|cap| {
                if cap.is_rich() {
                    debug!("{} skips rich dependency {}", id, cap);
                }
                !cap.is_rich()
            })
            .cloned()
            .partition(Capability::is_file);

        Self {
            id,
            short_name: record.name().to_string(),
            size: record.size(),
            batch,
            requirements,
            file_requirements,
            provides: record.provides().iter().map(|p| p.name.clone()).collect(),
            files: record.files().to_vec(),
        }
    }

    /// All requirements, capabilities first then files
    pub fn all_requirements(&self) -> impl Iterator<Item = &Capability> {
        self.requirements.iter().chain(self.file_requirements.iter())
    }
}

/// Packages keyed by id
pub type PackageMap = BTreeMap<PackageId, Package>;

/// How one requirement of a package was resolved
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dependency {
    /// Exactly one package provides the capability
    Resolved(PackageId),
    /// Any one of these packages provides it, in discovery order
    Alternation(Vec<PackageId>),
    /// Nothing provides the capability
    Unresolved(String),
}

impl Dependency {
    /// The target of an unambiguous dependency
    pub fn resolved(&self) -> Option<&PackageId> {
        match self {
            Self::Resolved(id) => Some(id),
            _ => None,
        }
    }

    /// Every package that could satisfy this dependency
    pub fn members(&self) -> &[PackageId] {
        match self {
            Self::Resolved(id) => std::slice::from_ref(id),
            Self::Alternation(ids) => ids,
            Self::Unresolved(_) => &[],
        }
    }

    pub fn is_alternation(&self) -> bool {
        matches!(self, Self::Alternation(_))
    }
}

/// Per-package dependency descriptors
///
/// Holds direct dependencies when produced by the resolver and the
/// transitive closure when produced by [`close`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    deps: BTreeMap<PackageId, BTreeSet<Dependency>>,
}

/// Dependency set after transitive closure
pub type ClosedDependencySet = DependencySet;

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a package has an entry, even without dependencies
    pub fn add_package(&mut self, id: PackageId) {
        self.deps.entry(id).or_default();
    }

    /// Record a dependency; self references are dropped
    pub fn insert(&mut self, id: &PackageId, dep: Dependency) -> bool {
        if dep.resolved() == Some(id) {
            return false;
        }
        self.deps.entry(id.clone()).or_default().insert(dep)
    }

    /// Dependencies of a package (empty for unknown packages)
    pub fn get(&self, id: &str) -> Option<&BTreeSet<Dependency>> {
        self.deps.get(id)
    }

    pub fn contains_package(&self, id: &str) -> bool {
        self.deps.contains_key(id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PackageId, BTreeSet<Dependency>> {
        self.deps.iter()
    }

    pub fn package_ids(&self) -> impl Iterator<Item = &PackageId> {
        self.deps.keys()
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Total number of descriptors over all packages
    pub fn edge_count(&self) -> usize {
        self.deps.values().map(BTreeSet::len).sum()
    }

    /// Replace the dependencies of a package wholesale
    pub(crate) fn set_dependencies(&mut self, id: PackageId, deps: BTreeSet<Dependency>) {
        self.deps.insert(id, deps);
    }
}

/// Everything computed for one set of batches
#[derive(Debug, Clone)]
pub struct Resolution {
    pub direct: DependencySet,
    pub closed: ClosedDependencySet,
    pub order: InstallOrder,
}

/// Owner of the package set and configuration for one run
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    config: DepslistConfig,
    packages: PackageMap,
    /// Package ids in input order
    discovery: Vec<PackageId>,
    batch_count: usize,
}

impl ResolutionContext {
    pub fn new(config: DepslistConfig) -> Self {
        Self {
            config,
            packages: PackageMap::new(),
            discovery: Vec::new(),
            batch_count: 0,
        }
    }

    pub fn config(&self) -> &DepslistConfig {
        &self.config
    }

    /// Add the records of one input batch, returning the batch index
    ///
    /// A package id already seen in an earlier batch keeps its first
    /// occurrence.
    pub fn add_batch<R: PackageRecord>(&mut self, records: &[R]) -> usize {
        let batch = self.batch_count;
        self.batch_count += 1;

        for record in records {
            let package = Package::from_record(record, batch);
            if let Some(existing) = self.packages.get(&package.id) {
                warn!(
                    "Duplicate package {} in batch {} (first seen in batch {}), ignoring",
                    package.id, batch, existing.batch
                );
                continue;
            }
            self.discovery.push(package.id.clone());
            self.packages.insert(package.id.clone(), package);
        }

        batch
    }

    pub fn packages(&self) -> &PackageMap {
        &self.packages
    }

    pub fn package(&self, id: &str) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Packages in the order they were read
    pub fn discovery_order(&self) -> impl Iterator<Item = &Package> {
        self.discovery.iter().filter_map(|id| self.packages.get(id))
    }

    /// Pass 0: every capability some package requires
    pub fn required_capabilities(&self) -> HashSet<String> {
        self.packages
            .values()
            .flat_map(Package::all_requirements)
            .filter(|cap| !self.config.skips_requirement(&cap.name))
            .map(|cap| cap.name.clone())
            .collect()
    }

    /// Pass 1: index the providers of every required capability
    pub fn build_index(&self) -> ProviderIndex {
        let mut index = ProviderIndex::restricted_to(self.required_capabilities());
        for package in self.discovery_order() {
            index.register_package(package);
        }
        index
    }

    /// Pass 2: resolve every requirement into direct dependencies
    pub fn resolve(&self, index: &ProviderIndex) -> Result<DependencySet> {
        let mut resolver = RequirementResolver::new(index, &self.config);
        let mut direct = DependencySet::new();

        for package in self.packages.values() {
            direct.add_package(package.id.clone());
            for dep in resolver.resolve_package(package)? {
                direct.insert(&package.id, dep);
            }
        }

        if resolver.unresolved_count() > 0 {
            warn!(
                "{} requirements could not be resolved",
                resolver.unresolved_count()
            );
        }
        Ok(direct)
    }

    /// Run every stage and return direct, closed and ordered results
    pub fn run(&self) -> Result<Resolution> {
        let index = self.build_index();
        info!(
            "Indexed {} capabilities for {} packages",
            index.len(),
            self.packages.len()
        );

        let direct = self.resolve(&index)?;
        info!("Resolved {} direct dependencies", direct.edge_count());

        let closed = close(&direct);
        info!("Closure done ({} dependencies)", closed.edge_count());

        let order = schedule(&self.packages, &closed, &self.config);
        info!("Ordering done ({} packages)", order.len());

        Ok(Resolution {
            direct,
            closed,
            order,
        })
    }
}
