// src/resolver/index.rs

//! Capability → provider index

use super::{Package, PackageId};
use std::collections::{HashMap, HashSet};

/// Maps capability names (package names, Provides entries, file paths) to
/// the packages supplying them, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ProviderIndex {
    providers: HashMap<String, Vec<PackageId>>,
    /// When set, only these capabilities are stored
    wanted: Option<HashSet<String>>,
}

impl ProviderIndex {
    /// Create an index that stores every capability
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that only stores capabilities someone requires
    pub fn restricted_to(wanted: HashSet<String>) -> Self {
        Self {
            providers: HashMap::new(),
            wanted: Some(wanted),
        }
    }

    /// Add `provider` to the providers of `capability`
    pub fn register(&mut self, capability: &str, provider: &PackageId) {
        if let Some(wanted) = &self.wanted
            && !wanted.contains(capability)
        {
            return;
        }

        let providers = self.providers.entry(capability.to_string()).or_default();
        if !providers.contains(provider) {
            providers.push(provider.clone());
        }
    }

    /// Register everything a package supplies: its own name, its Provides
    /// entries and its files
    pub fn register_package(&mut self, package: &Package) {
        self.register(&package.short_name, &package.id);
        for capability in &package.provides {
            self.register(capability, &package.id);
        }
        for file in &package.files {
            self.register(file, &package.id);
        }
    }

    /// Providers of a capability; empty when nothing provides it
    pub fn lookup(&self, capability: &str) -> &[PackageId] {
        self.providers
            .get(capability)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of capabilities with at least one provider
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::PackageMetadataBuilder;

    fn package(name: &str, provides: &[&str], files: &[&str]) -> Package {
        let mut builder = PackageMetadataBuilder::new()
            .name(name)
            .version("1")
            .release("1");
        for p in provides {
            builder = builder.provides(p);
        }
        for f in files {
            builder = builder.file(*f);
        }
        Package::from_record(&builder.build(), 0)
    }

    #[test]
    fn test_unknown_capability_is_empty() {
        let index = ProviderIndex::new();
        assert!(index.lookup("nothing").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_package_provides_own_name_and_files() {
        let mut index = ProviderIndex::new();
        let bash = package("bash", &["/bin/sh"], &["/bin/bash"]);
        index.register_package(&bash);

        assert_eq!(index.lookup("bash"), [bash.id.clone()]);
        assert_eq!(index.lookup("/bin/sh"), [bash.id.clone()]);
        assert_eq!(index.lookup("/bin/bash"), [bash.id.clone()]);
    }

    #[test]
    fn test_providers_keep_discovery_order_without_duplicates() {
        let mut index = ProviderIndex::new();
        let d = PackageId::from("d-1-1");
        let e = PackageId::from("e-1-1");
        index.register("y", &e);
        index.register("y", &d);
        index.register("y", &e);

        assert_eq!(index.lookup("y"), [e, d]);
    }

    #[test]
    fn test_restricted_index_skips_unwanted() {
        let wanted: HashSet<String> = ["/bin/sh".to_string()].into_iter().collect();
        let mut index = ProviderIndex::restricted_to(wanted);
        index.register_package(&package("bash", &[], &["/bin/sh", "/bin/bash"]));

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("/bin/sh").len(), 1);
        assert!(index.lookup("/bin/bash").is_empty());
    }
}
