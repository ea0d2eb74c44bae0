// src/resolver/requirement.rs

//! Requirement → dependency resolution

use super::{Dependency, Package, PackageId, ProviderIndex};
use crate::config::DepslistConfig;
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Resolves requirements against a frozen provider index, counting the
/// ones nothing provides
pub struct RequirementResolver<'a> {
    index: &'a ProviderIndex,
    config: &'a DepslistConfig,
    unresolved: usize,
}

impl<'a> RequirementResolver<'a> {
    pub fn new(index: &'a ProviderIndex, config: &'a DepslistConfig) -> Self {
        Self {
            index,
            config,
            unresolved: 0,
        }
    }

    /// Resolve one capability required by `requirer`
    ///
    /// Returns `None` when the requirer provides the capability itself.
    pub fn resolve(&self, requirer: &PackageId, capability: &str) -> Option<Dependency> {
        let providers = self.index.lookup(capability);
        if providers.contains(requirer) {
            return None;
        }

        Some(match providers {
            [] => Dependency::Unresolved(capability.to_string()),
            [provider] => Dependency::Resolved(provider.clone()),
            _ => Dependency::Alternation(providers.to_vec()),
        })
    }

    /// Resolve every requirement of a package
    ///
    /// Unresolved requirements are logged and counted; reaching the
    /// configured limit aborts resolution.
    pub fn resolve_package(&mut self, package: &Package) -> Result<BTreeSet<Dependency>> {
        let mut deps = BTreeSet::new();
        let mut seen = HashSet::new();

        for capability in package.all_requirements() {
            let name = capability.name.as_str();
            if self.config.skips_requirement(name) || !seen.insert(name) {
                continue;
            }

            match self.resolve(&package.id, name) {
                None => debug!("{} provides {} itself", package.id, name),
                Some(dep @ Dependency::Unresolved(_)) => {
                    warn!(
                        "{} requires {} but no package provides it",
                        package.id, capability
                    );
                    self.record_unresolved()?;
                    deps.insert(dep);
                }
                Some(dep) => {
                    deps.insert(dep);
                }
            }
        }

        Ok(deps)
    }

    fn record_unresolved(&mut self) -> Result<()> {
        self.unresolved += 1;
        let limit = self.config.max_unresolved;
        if limit > 0 && self.unresolved >= limit {
            return Err(Error::TooManyUnresolved {
                count: self.unresolved,
                limit,
            });
        }
        Ok(())
    }

    /// Number of unresolved requirements seen so far
    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }
}
