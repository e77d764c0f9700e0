use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use beanscope_core::{ConfigurationUnit, ImportRef, ImportResolver, SearchScope};

use crate::LocalModel;

/// Import graph over a working set, built fresh per query.
///
/// Nodes are the units reachable from the seeds. Units inside the search
/// scope are expanded (their local model is built and their imports
/// followed); units outside it are kept as external leaves.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    models: BTreeMap<ConfigurationUnit, Arc<LocalModel>>,
    external: BTreeSet<ConfigurationUnit>,
    edges: BTreeMap<ConfigurationUnit, BTreeSet<ConfigurationUnit>>,
    dangling: BTreeSet<ImportRef>,
}

impl ModelGraph {
    /// Breadth-first expansion from `seeds`. `load` supplies (cached) local
    /// models for in-scope units.
    pub fn build<I>(
        seeds: I,
        scope: &SearchScope,
        resolver: &dyn ImportResolver,
        mut load: impl FnMut(&ConfigurationUnit) -> Arc<LocalModel>,
    ) -> Self
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        let mut graph = ModelGraph::default();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();

        for seed in seeds {
            if seen.insert(seed.clone()) {
                queue.push_back(seed);
            }
        }

        while let Some(unit) = queue.pop_front() {
            if !scope.contains(&unit) {
                graph.external.insert(unit);
                continue;
            }

            let model = load(&unit);
            let mut targets = BTreeSet::new();
            for import in model.imports() {
                let resolved = resolver.resolve(import, scope);
                if resolved.is_empty() {
                    graph.dangling.insert(import.clone());
                    continue;
                }
                for target in resolved {
                    if seen.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                    targets.insert(target);
                }
            }

            graph.edges.insert(unit.clone(), targets);
            graph.models.insert(unit, model);
        }

        tracing::debug!(
            target: "beanscope.model",
            scope = scope.name(),
            expanded = graph.models.len(),
            external = graph.external.len(),
            edges = graph.edge_count(),
            dangling = graph.dangling.len(),
            "built model graph"
        );
        graph
    }

    /// Every node: expanded units and external leaves, in natural order.
    pub fn units(&self) -> impl Iterator<Item = &ConfigurationUnit> {
        let mut all: Vec<_> = self.models.keys().chain(self.external.iter()).collect();
        all.sort();
        all.into_iter()
    }

    /// In-scope units whose local models were built.
    pub fn expanded(&self) -> impl Iterator<Item = &ConfigurationUnit> {
        self.models.keys()
    }

    pub fn external_leaves(&self) -> impl Iterator<Item = &ConfigurationUnit> {
        self.external.iter()
    }

    pub fn is_external(&self, unit: &ConfigurationUnit) -> bool {
        self.external.contains(unit)
    }

    pub fn contains(&self, unit: &ConfigurationUnit) -> bool {
        self.models.contains_key(unit) || self.external.contains(unit)
    }

    pub fn model(&self, unit: &ConfigurationUnit) -> Option<&Arc<LocalModel>> {
        self.models.get(unit)
    }

    pub fn successors(&self, unit: &ConfigurationUnit) -> impl Iterator<Item = &ConfigurationUnit> {
        self.edges.get(unit).into_iter().flatten()
    }

    /// All edges, sorted by source then target.
    pub fn edges(&self) -> impl Iterator<Item = (&ConfigurationUnit, &ConfigurationUnit)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Imports the resolver could not resolve.
    pub fn dangling(&self) -> impl Iterator<Item = &ImportRef> {
        self.dangling.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Units reachable from `start`, including `start` itself.
    pub fn reachable_from(&self, start: &ConfigurationUnit) -> BTreeSet<ConfigurationUnit> {
        let mut seen = BTreeSet::new();
        if !self.contains(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start.clone());
        while let Some(unit) = queue.pop_front() {
            for next in self.successors(unit) {
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}
