// src/resolver/graph.rs

//! Transitive closure of the dependency relation
//!
//! The closed set of a package is the union of the direct sets of every
//! package reachable from it over `Resolved` edges. Alternations and
//! unresolved markers are carried along as plain items; their members are
//! not followed.

use super::{ClosedDependencySet, Dependency, DependencySet, PackageId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Map from package id to the packages that depend on it
#[derive(Debug, Default)]
struct ReverseEdges {
    dependents: HashMap<PackageId, BTreeSet<PackageId>>,
}

impl ReverseEdges {
    fn from_set(set: &DependencySet) -> Self {
        let mut edges = Self::default();
        for (package, deps) in set.iter() {
            for target in deps.iter().filter_map(Dependency::resolved) {
                edges.add(target, package);
            }
        }
        edges
    }

    fn add(&mut self, target: &PackageId, dependent: &PackageId) {
        self.dependents
            .entry(target.clone())
            .or_default()
            .insert(dependent.clone());
    }

    fn dependents_of(&self, target: &PackageId) -> impl Iterator<Item = &PackageId> {
        self.dependents.get(target).into_iter().flatten()
    }
}

/// Compute the transitive closure of a dependency set
///
/// One breadth-first walk per package over the direct `Resolved` edges,
/// O(N * (N + E)) overall. Cycles are fine; every package's own id is
/// removed from its result.
pub fn close(direct: &DependencySet) -> ClosedDependencySet {
    let mut closed = DependencySet::new();
    let mut visits = 0usize;

    for package in direct.package_ids() {
        let mut items: HashSet<&Dependency> = HashSet::new();
        let mut seen: HashSet<&PackageId> = HashSet::from([package]);
        let mut queue: VecDeque<&PackageId> = VecDeque::from([package]);

        while let Some(current) = queue.pop_front() {
            visits += 1;
            for dep in direct.get(current.as_str()).into_iter().flatten() {
                if let Some(target) = dep.resolved()
                    && seen.insert(target)
                {
                    queue.push_back(target);
                }
                items.insert(dep);
            }
        }

        let deps: BTreeSet<Dependency> = items
            .into_iter()
            .filter(|dep| dep.resolved() != Some(package))
            .cloned()
            .collect();
        closed.set_dependencies(package.clone(), deps);
    }

    debug!(
        "Closure visited {} nodes over {} packages",
        visits,
        closed.len()
    );
    closed
}

/// Packages nothing else depends on
pub fn leaves(set: &DependencySet) -> Vec<PackageId> {
    let reverse = ReverseEdges::from_set(set);
    set.package_ids()
        .filter(|id| reverse.dependents_of(id).next().is_none())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PackageId {
        PackageId::from(s)
    }

    fn set(edges: &[(&str, &[&str])]) -> DependencySet {
        let mut set = DependencySet::new();
        for (from, tos) in edges {
            set.add_package(id(from));
            for to in *tos {
                set.add_package(id(to));
                set.insert(&id(from), Dependency::Resolved(id(to)));
            }
        }
        set
    }

    fn resolved(set: &DependencySet, package: &str) -> Vec<String> {
        set.get(package)
            .unwrap()
            .iter()
            .filter_map(Dependency::resolved)
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_chain_closure() {
        let direct = set(&[("a", &["b"]), ("b", &["c"]), ("c", &["d"])]);
        let closed = close(&direct);

        assert_eq!(resolved(&closed, "a"), ["b", "c", "d"]);
        assert_eq!(resolved(&closed, "b"), ["c", "d"]);
        assert!(resolved(&closed, "d").is_empty());
    }

    #[test]
    fn test_closure_is_order_independent() {
        // Declared so that "z" is visited before what it reaches grows
        let direct = set(&[("z", &["m"]), ("m", &["a"]), ("a", &["b"]), ("b", &["c"])]);
        let closed = close(&direct);

        assert_eq!(resolved(&closed, "z"), ["a", "b", "c", "m"]);
    }

    #[test]
    fn test_cycle_terminates_without_self() {
        let direct = set(&[("g", &["h"]), ("h", &["g"])]);
        let closed = close(&direct);

        assert_eq!(resolved(&closed, "g"), ["h"]);
        assert_eq!(resolved(&closed, "h"), ["g"]);
    }

    #[test]
    fn test_closure_idempotent_and_monotone() {
        let direct = set(&[
            ("a", &["b", "c"]),
            ("b", &["d"]),
            ("c", &["d", "a"]),
            ("d", &["e"]),
            ("f", &[]),
        ]);
        let closed = close(&direct);

        assert_eq!(close(&closed), closed);
        for (package, deps) in direct.iter() {
            let closed_deps = closed.get(package.as_str()).unwrap();
            assert!(deps.is_subset(closed_deps));
            assert!(!closed_deps.contains(&Dependency::Resolved(package.clone())));
        }
    }

    #[test]
    fn test_alternations_and_unresolved_propagate_as_items() {
        let mut direct = set(&[("f", &["lib"]), ("lib", &[])]);
        direct.insert(
            &id("lib"),
            Dependency::Alternation(vec![id("d"), id("e")]),
        );
        direct.insert(&id("lib"), Dependency::Unresolved("x".to_string()));
        direct.add_package(id("d"));
        direct.add_package(id("e"));

        let closed = close(&direct);
        let f = closed.get("f").unwrap();

        assert!(f.contains(&Dependency::Alternation(vec![id("d"), id("e")])));
        assert!(f.contains(&Dependency::Unresolved("x".to_string())));
        // Alternation members are not expanded
        assert!(!f.contains(&Dependency::Resolved(id("d"))));
    }

    #[test]
    fn test_long_chain_with_shortcuts() {
        // p_i requires p_{i-1} and one earlier package
        let n = 400;
        let names: Vec<String> = (0..n).map(|i| format!("p{:04}", i)).collect();
        let mut direct = DependencySet::new();
        let mut seed = 12345u64;
        for i in 0..n {
            direct.add_package(id(&names[i]));
            if i > 0 {
                direct.insert(&id(&names[i]), Dependency::Resolved(id(&names[i - 1])));
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (seed >> 33) as usize % i;
                direct.insert(&id(&names[i]), Dependency::Resolved(id(&names[j])));
            }
        }

        let closed = close(&direct);
        for i in [0, 1, n / 2, n - 1] {
            assert_eq!(closed.get(&names[i]).unwrap().len(), i);
        }
    }

    #[test]
    fn test_leaves() {
        let direct = set(&[("a", &["b"]), ("c", &["b"]), ("b", &[])]);
        assert_eq!(leaves(&direct), [id("a"), id("c")]);
    }
}
