//! Dependency graph between assets
//!
//! Two adjacency maps are kept in step: `dependents[h]` holds the assets
//! that depend on `h`, `dependencies[d]` holds the assets `d` depends on.
//! An entry in `dependencies` (even an empty one) means the dependent's
//! dependencies have been registered at least once.
//!
//! The graph stores handles only, never asset objects.

use crate::handle::AssetHandle;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    dependents: HashMap<AssetHandle, HashSet<AssetHandle>>,
    dependencies: HashMap<AssetHandle, HashSet<AssetHandle>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` depends on `dependency`. A null dependency
    /// only marks `dependent` as registered.
    pub fn register(&mut self, dependency: AssetHandle, dependent: AssetHandle) {
        let outgoing = self.dependencies.entry(dependent).or_default();
        if dependency.is_null() {
            return;
        }
        outgoing.insert(dependency);
        self.dependents.entry(dependency).or_default().insert(dependent);
    }

    /// Remove a single edge
    pub fn deregister(&mut self, dependency: AssetHandle, dependent: AssetHandle) {
        if dependency.is_null() {
            return;
        }
        if let Some(outgoing) = self.dependencies.get_mut(&dependent) {
            outgoing.remove(&dependency);
        }
        self.remove_dependent_edge(dependency, dependent);
    }

    /// Remove every outgoing edge of `dependent` and the matching reverse
    /// edges. The dependent no longer counts as registered afterwards.
    pub fn deregister_all(&mut self, dependent: AssetHandle) {
        let Some(outgoing) = self.dependencies.remove(&dependent) else {
            return;
        };
        for dependency in outgoing {
            self.remove_dependent_edge(dependency, dependent);
        }
    }

    /// Swap `dependent`'s dependency set for `dependencies` in one step
    pub fn replace(&mut self, dependent: AssetHandle, dependencies: impl IntoIterator<Item = AssetHandle>) {
        self.deregister_all(dependent);
        self.dependencies.entry(dependent).or_default();
        for dependency in dependencies {
            self.register(dependency, dependent);
        }
    }

    /// Make sure `dependent` has an entry, without touching existing edges
    pub fn ensure_registered(&mut self, dependent: AssetHandle) {
        self.dependencies.entry(dependent).or_default();
    }

    /// True once `dependent`'s dependencies have been recorded
    pub fn is_registered(&self, dependent: AssetHandle) -> bool {
        self.dependencies.contains_key(&dependent)
    }

    /// Dependencies of `dependent`, `None` if never registered
    pub fn dependencies_of(&self, dependent: AssetHandle) -> Option<HashSet<AssetHandle>> {
        self.dependencies.get(&dependent).cloned()
    }

    /// Assets that depend on `dependency`
    pub fn dependents_of(&self, dependency: AssetHandle) -> HashSet<AssetHandle> {
        self.dependents.get(&dependency).cloned().unwrap_or_default()
    }

    /// Drop every edge touching `handle` in either direction
    pub fn remove_asset(&mut self, handle: AssetHandle) {
        self.deregister_all(handle);
        if let Some(dependents) = self.dependents.remove(&handle) {
            for dependent in dependents {
                if let Some(outgoing) = self.dependencies.get_mut(&dependent) {
                    outgoing.remove(&handle);
                }
            }
        }
    }

    /// Check that both maps describe the same edges
    pub fn is_consistent(&self) -> bool {
        let forward = self.dependencies.iter().all(|(dependent, outgoing)| {
            outgoing.iter().all(|dependency| {
                self.dependents
                    .get(dependency)
                    .map_or(false, |incoming| incoming.contains(dependent))
            })
        });
        let backward = self.dependents.iter().all(|(dependency, incoming)| {
            incoming.iter().all(|dependent| {
                self.dependencies
                    .get(dependent)
                    .map_or(false, |outgoing| outgoing.contains(dependency))
            })
        });
        forward && backward
    }

    fn remove_dependent_edge(&mut self, dependency: AssetHandle, dependent: AssetHandle) {
        if let Some(incoming) = self.dependents.get_mut(&dependency) {
            incoming.remove(&dependent);
            if incoming.is_empty() {
                self.dependents.remove(&dependency);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(value: u64) -> AssetHandle {
        AssetHandle::from_u64(value)
    }

    #[test]
    fn test_register_is_symmetric() {
        let mut graph = DependencyGraph::new();
        graph.register(h(1), h(10));
        graph.register(h(2), h(10));
        graph.register(h(1), h(11));

        assert_eq!(graph.dependencies_of(h(10)).unwrap(), HashSet::from([h(1), h(2)]));
        assert_eq!(graph.dependents_of(h(1)), HashSet::from([h(10), h(11)]));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_null_dependency_marks_registered() {
        let mut graph = DependencyGraph::new();
        assert!(!graph.is_registered(h(5)));
        assert_eq!(graph.dependencies_of(h(5)), None);

        graph.register(AssetHandle::NULL, h(5));
        assert!(graph.is_registered(h(5)));
        assert_eq!(graph.dependencies_of(h(5)), Some(HashSet::new()));
        assert!(graph.dependents_of(AssetHandle::NULL).is_empty());
    }

    #[test]
    fn test_deregister_keeps_symmetry() {
        let mut graph = DependencyGraph::new();
        graph.register(h(1), h(10));
        graph.register(h(2), h(10));
        graph.register(h(3), h(11));

        graph.deregister(h(1), h(10));
        assert!(graph.is_consistent());
        assert!(graph.dependents_of(h(1)).is_empty());
        assert_eq!(graph.dependencies_of(h(10)).unwrap(), HashSet::from([h(2)]));

        graph.deregister_all(h(10));
        assert!(graph.is_consistent());
        assert_eq!(graph.dependencies_of(h(10)), None);
        assert!(!graph.is_registered(h(10)));
        assert!(graph.dependents_of(h(2)).is_empty());
        assert_eq!(graph.dependents_of(h(3)), HashSet::from([h(11)]));
    }

    #[test]
    fn test_replace() {
        let mut graph = DependencyGraph::new();
        graph.register(h(1), h(10));
        graph.replace(h(10), [h(2), AssetHandle::NULL, h(3)]);

        assert_eq!(graph.dependencies_of(h(10)).unwrap(), HashSet::from([h(2), h(3)]));
        assert!(graph.dependents_of(h(1)).is_empty());
        assert!(graph.is_consistent());

        graph.replace(h(12), []);
        assert!(graph.is_registered(h(12)));
    }

    #[test]
    fn test_remove_asset() {
        let mut graph = DependencyGraph::new();
        graph.register(h(1), h(10));
        graph.register(h(10), h(20));

        graph.remove_asset(h(10));
        assert!(!graph.is_registered(h(10)));
        assert!(graph.dependents_of(h(1)).is_empty());
        assert_eq!(graph.dependencies_of(h(20)), Some(HashSet::new()));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_random_sequence_stays_consistent() {
        let mut graph = DependencyGraph::new();
        let mut seed = 0x2545_f491_u64;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let a = h(seed % 8);
            let b = h((seed >> 8) % 8 + 1);
            match (seed >> 16) % 4 {
                0 | 1 => graph.register(a, b),
                2 => graph.deregister(a, b),
                _ => graph.deregister_all(b),
            }
            assert!(graph.is_consistent());
        }
    }
}
