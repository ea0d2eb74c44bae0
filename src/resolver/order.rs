// src/resolver/order.rs

//! Install order scheduling
//!
//! Packages are placed greedily: the next package is always the candidate
//! with the fewest dependencies not yet placed. Candidates live in a
//! `BTreeSet<(remaining, id)>`, so the pick is O(log N) and ties fall to the
//! lexicographically smallest id. When only packages with unplaced
//! dependencies remain (cycles), the smallest count still wins and the
//! broken edges are recorded as exceptions.

use super::{ClosedDependencySet, Dependency, PackageId, PackageMap};
use crate::config::{DepslistConfig, SchedulePolicy};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// A place where the computed order does not follow the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderException {
    /// `package` was placed while `dependency` was still unplaced, to break
    /// a cycle or because the dependency lives in a later batch
    Unsatisfied {
        package: PackageId,
        dependency: PackageId,
    },
    /// `package` depends on `dependency`, which comes from a later batch
    LaterBatch {
        package: PackageId,
        dependency: PackageId,
    },
}

/// A total order over all packages
#[derive(Debug, Clone, Default)]
pub struct InstallOrder {
    order: Vec<PackageId>,
    positions: HashMap<PackageId, usize>,
    batches: HashMap<PackageId, usize>,
    exceptions: Vec<OrderException>,
}

impl InstallOrder {
    /// Packages in install order
    pub fn packages(&self) -> &[PackageId] {
        &self.order
    }

    /// Zero-based position of a package
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Input batch a package came from
    pub fn batch_of(&self, id: &str) -> Option<usize> {
        self.batches.get(id).copied()
    }

    pub fn exceptions(&self) -> &[OrderException] {
        &self.exceptions
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compute the install order of every package
pub fn schedule(
    packages: &PackageMap,
    closed: &ClosedDependencySet,
    config: &DepslistConfig,
) -> InstallOrder {
    let mut scheduler = Scheduler::new(packages, closed, config.alternation_penalty());

    for name in &config.put_first {
        for id in scheduler.ids_named(name) {
            debug!("Placing {} first", id);
            scheduler.place(&id);
        }
    }

    match config.policy {
        SchedulePolicy::BatchSequential => {
            if let Some(base) = &config.base_package {
                let seeds = scheduler.seed_set(base);
                debug!("Seeding {} packages from {}", seeds.len(), base);
                scheduler.drain(seeds);
            }

            let batch_count = packages.values().map(|p| p.batch + 1).max().unwrap_or(0);
            for batch in 0..batch_count {
                let members = packages
                    .values()
                    .filter(|p| p.batch == batch)
                    .map(|p| p.id.clone());
                scheduler.drain(members);
            }
        }
        SchedulePolicy::GlobalPriority => {
            scheduler.drain(packages.keys().cloned());
        }
    }

    scheduler.finish()
}

/// Mutable bookkeeping for one scheduling run
struct Scheduler<'a> {
    packages: &'a PackageMap,
    closed: &'a ClosedDependencySet,
    penalty: usize,
    /// Current remaining count of every unplaced package
    remaining: HashMap<PackageId, usize>,
    /// Packages with `target` among their closed resolved dependencies
    dependents: HashMap<PackageId, Vec<PackageId>>,
    /// (package, alternation number) for every alternation `member` appears in
    alternation_dependents: HashMap<PackageId, Vec<(PackageId, usize)>>,
    satisfied: HashSet<(PackageId, usize)>,
    candidates: BTreeSet<(usize, PackageId)>,
    in_candidates: HashSet<PackageId>,
    placed: HashSet<PackageId>,
    order: InstallOrder,
}

impl<'a> Scheduler<'a> {
    fn new(packages: &'a PackageMap, closed: &'a ClosedDependencySet, penalty: usize) -> Self {
        let mut remaining = HashMap::new();
        let mut dependents: HashMap<PackageId, Vec<PackageId>> = HashMap::new();
        let mut alternation_dependents: HashMap<PackageId, Vec<(PackageId, usize)>> =
            HashMap::new();

        for id in packages.keys() {
            let mut count = 0;
            let deps = closed.get(id.as_str()).into_iter().flatten();
            let mut alternations = 0;

            for dep in deps {
                match dep {
                    Dependency::Resolved(target) => {
                        if packages.contains_key(target) {
                            count += 1;
                            dependents.entry(target.clone()).or_default().push(id.clone());
                        }
                    }
                    // Satisfied by the package itself
                    Dependency::Alternation(members) if members.contains(id) => {}
                    Dependency::Alternation(members) => {
                        count += penalty;
                        for member in members.iter().collect::<BTreeSet<_>>() {
                            alternation_dependents
                                .entry(member.clone())
                                .or_default()
                                .push((id.clone(), alternations));
                        }
                        alternations += 1;
                    }
                    Dependency::Unresolved(_) => {}
                }
            }

            remaining.insert(id.clone(), count);
        }

        Self {
            packages,
            closed,
            penalty,
            remaining,
            dependents,
            alternation_dependents,
            satisfied: HashSet::new(),
            candidates: BTreeSet::new(),
            in_candidates: HashSet::new(),
            placed: HashSet::new(),
            order: InstallOrder::default(),
        }
    }

    /// Packages with a given short name, by id
    fn ids_named(&self, name: &str) -> Vec<PackageId> {
        self.packages
            .values()
            .filter(|p| p.short_name == name)
            .map(|p| p.id.clone())
            .collect()
    }

    /// The base package plus its closure, alternation members expanded
    /// together with their own closures
    fn seed_set(&self, base: &str) -> BTreeSet<PackageId> {
        let mut seeds = BTreeSet::new();
        for id in self.ids_named(base) {
            seeds.insert(id.clone());
            for dep in self.closed.get(id.as_str()).into_iter().flatten() {
                for member in dep.members() {
                    seeds.insert(member.clone());
                    if dep.is_alternation() {
                        seeds.extend(
                            self.closed
                                .get(member.as_str())
                                .into_iter()
                                .flatten()
                                .filter_map(Dependency::resolved)
                                .cloned(),
                        );
                    }
                }
            }
        }
        seeds.retain(|id| self.packages.contains_key(id));
        seeds
    }

    /// Greedily place every not yet placed package of `scope`
    fn drain(&mut self, scope: impl IntoIterator<Item = PackageId>) {
        for id in scope {
            if self.placed.contains(&id) || self.in_candidates.contains(&id) {
                continue;
            }
            let count = self.remaining.get(&id).copied().unwrap_or(0);
            self.candidates.insert((count, id.clone()));
            self.in_candidates.insert(id);
        }

        while let Some((count, id)) = self.candidates.pop_first() {
            self.in_candidates.remove(&id);
            if count > 0 {
                debug!("Placing {} with {} unsatisfied dependencies", id, count);
            }
            self.place(&id);
        }
    }

    /// Append a package to the order and update everyone waiting on it
    fn place(&mut self, id: &PackageId) {
        if !self.placed.insert(id.clone()) {
            return;
        }
        if self.in_candidates.remove(id) {
            let count = self.remaining.get(id).copied().unwrap_or(0);
            self.candidates.remove(&(count, id.clone()));
        }

        let batch = self.packages.get(id).map(|p| p.batch).unwrap_or(0);
        self.check_dependencies(id, batch);

        self.order.positions.insert(id.clone(), self.order.order.len());
        self.order.batches.insert(id.clone(), batch);
        self.order.order.push(id.clone());
        self.remaining.remove(id);

        // Each package is placed once, so its waiting lists can be taken
        let waiting = self.dependents.remove(id).unwrap_or_default();
        for dependent in waiting {
            self.decrease(&dependent, 1);
        }

        let alternations = self.alternation_dependents.remove(id).unwrap_or_default();
        for key in alternations {
            if self.satisfied.insert(key.clone()) {
                self.decrease(&key.0, self.penalty);
            }
        }
    }

    /// Record dependencies that are not placed yet or live in a later batch
    fn check_dependencies(&mut self, id: &PackageId, batch: usize) {
        let closed = self.closed;
        let targets = closed
            .get(id.as_str())
            .into_iter()
            .flatten()
            .filter_map(Dependency::resolved);

        for target in targets {
            if !self.placed.contains(target) && self.packages.contains_key(target) {
                warn!("{} placed before its dependency {}", id, target);
                self.order.exceptions.push(OrderException::Unsatisfied {
                    package: id.clone(),
                    dependency: target.clone(),
                });
            }

            let target_batch = self.packages.get(target).map(|p| p.batch).unwrap_or(0);
            if target_batch > batch {
                warn!(
                    "{} (batch {}) requires {} which is in later batch {}",
                    id, batch, target, target_batch
                );
                self.order.exceptions.push(OrderException::LaterBatch {
                    package: id.clone(),
                    dependency: target.clone(),
                });
            }
        }
    }

    /// Lower a package's remaining count, re-keying it among the candidates
    fn decrease(&mut self, id: &PackageId, by: usize) {
        let Some(count) = self.remaining.get_mut(id) else {
            return;
        };
        let old = *count;
        *count = old.saturating_sub(by);
        let new = *count;

        if self.in_candidates.contains(id) {
            self.candidates.remove(&(old, id.clone()));
            self.candidates.insert((new, id.clone()));
        }
    }

    fn finish(mut self) -> InstallOrder {
        // Anything outside every scope still gets a position
        let leftovers: Vec<PackageId> = self
            .packages
            .keys()
            .filter(|id| !self.placed.contains(*id))
            .cloned()
            .collect();
        if !leftovers.is_empty() {
            self.drain(leftovers);
        }
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::PackageMetadataBuilder;
    use crate::resolver::{close, DependencySet, Package};

    fn add(packages: &mut PackageMap, name: &str, batch: usize) -> PackageId {
        let meta = PackageMetadataBuilder::new()
            .name(name)
            .version("1")
            .release("1")
            .build();
        let package = Package::from_record(&meta, batch);
        let id = package.id.clone();
        packages.insert(id.clone(), package);
        id
    }

    fn direct(packages: &PackageMap, edges: &[(&PackageId, Dependency)]) -> DependencySet {
        let mut set = DependencySet::new();
        for id in packages.keys() {
            set.add_package(id.clone());
        }
        for (from, dep) in edges {
            set.insert(from, dep.clone());
        }
        set
    }

    fn bare_config(policy: SchedulePolicy) -> DepslistConfig {
        DepslistConfig {
            policy,
            put_first: Vec::new(),
            base_package: None,
            ..DepslistConfig::default()
        }
    }

    fn pos(order: &InstallOrder, id: &PackageId) -> usize {
        order.position(id.as_str()).unwrap()
    }

    #[test]
    fn test_dependency_before_dependent() {
        let mut packages = PackageMap::new();
        let b = add(&mut packages, "b", 0);
        let a = add(&mut packages, "a", 0);
        let closed = close(&direct(&packages, &[(&a, Dependency::Resolved(b.clone()))]));

        for policy in [SchedulePolicy::BatchSequential, SchedulePolicy::GlobalPriority] {
            let order = schedule(&packages, &closed, &bare_config(policy));
            assert_eq!(order.len(), 2);
            assert!(pos(&order, &b) < pos(&order, &a));
            assert!(order.exceptions().is_empty());
        }
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut packages = PackageMap::new();
        let z = add(&mut packages, "z", 0);
        let m = add(&mut packages, "m", 0);
        let a = add(&mut packages, "a", 0);
        let closed = close(&direct(&packages, &[]));

        let order = schedule(&packages, &closed, &bare_config(SchedulePolicy::GlobalPriority));
        assert_eq!(order.packages(), [a, m, z]);
    }

    #[test]
    fn test_cycle_is_broken_and_recorded() {
        let mut packages = PackageMap::new();
        let g = add(&mut packages, "g", 0);
        let h = add(&mut packages, "h", 0);
        let closed = close(&direct(
            &packages,
            &[
                (&g, Dependency::Resolved(h.clone())),
                (&h, Dependency::Resolved(g.clone())),
            ],
        ));

        let order = schedule(&packages, &closed, &bare_config(SchedulePolicy::BatchSequential));
        assert_eq!(order.packages(), [g.clone(), h.clone()]);
        assert_eq!(
            order.exceptions(),
            [OrderException::Unsatisfied {
                package: g,
                dependency: h,
            }]
        );
    }

    #[test]
    fn test_batches_are_processed_in_order() {
        let mut packages = PackageMap::new();
        let late = add(&mut packages, "a-late", 1);
        let early = add(&mut packages, "z-early", 0);
        let closed = close(&direct(&packages, &[]));

        let sequential =
            schedule(&packages, &closed, &bare_config(SchedulePolicy::BatchSequential));
        assert_eq!(sequential.packages(), [early.clone(), late.clone()]);
        assert_eq!(sequential.batch_of(late.as_str()), Some(1));

        let global = schedule(&packages, &closed, &bare_config(SchedulePolicy::GlobalPriority));
        assert_eq!(global.packages(), [late, early]);
    }

    #[test]
    fn test_later_batch_dependency_is_recorded() {
        let mut packages = PackageMap::new();
        let lib = add(&mut packages, "lib", 1);
        let app = add(&mut packages, "app", 0);
        let closed = close(&direct(&packages, &[(&app, Dependency::Resolved(lib.clone()))]));

        let order = schedule(&packages, &closed, &bare_config(SchedulePolicy::BatchSequential));
        assert_eq!(order.len(), 2);
        assert!(order.exceptions().contains(&OrderException::LaterBatch {
            package: app,
            dependency: lib,
        }));
    }

    #[test]
    fn test_put_first_and_base_seed() {
        let mut packages = PackageMap::new();
        let filesystem = add(&mut packages, "filesystem", 0);
        let setup = add(&mut packages, "setup", 0);
        let aaa = add(&mut packages, "aaa", 0);
        let basesystem = add(&mut packages, "basesystem", 0);
        let bash = add(&mut packages, "bash", 0);
        let closed = close(&direct(
            &packages,
            &[(&basesystem, Dependency::Resolved(bash.clone()))],
        ));

        let order = schedule(&packages, &closed, &DepslistConfig::default());
        assert_eq!(order.packages(), [setup, filesystem, bash, basesystem, aaa]);
    }

    #[test]
    fn test_alternation_penalty_delays_ambiguous_packages() {
        let mut packages = PackageMap::new();
        let d = add(&mut packages, "d", 0);
        let e = add(&mut packages, "e", 0);
        let f = add(&mut packages, "a-f", 0);
        let closed = close(&direct(
            &packages,
            &[(&f, Dependency::Alternation(vec![d.clone(), e.clone()]))],
        ));

        let order = schedule(&packages, &closed, &bare_config(SchedulePolicy::GlobalPriority));
        // "a-f" sorts first but waits for one of its providers
        assert_eq!(order.packages()[0], d);
        assert!(pos(&order, &d) < pos(&order, &f));
    }

    #[test]
    fn test_unresolved_never_blocks() {
        let mut packages = PackageMap::new();
        let c = add(&mut packages, "c", 0);
        let closed = close(&direct(&packages, &[(&c, Dependency::Unresolved("x".into()))]));

        let order = schedule(&packages, &closed, &bare_config(SchedulePolicy::BatchSequential));
        assert_eq!(order.packages(), [c]);
        assert!(order.exceptions().is_empty());
    }
}
