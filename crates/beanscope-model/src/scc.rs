//! Strongly connected components of a [`ModelGraph`] and canonical selection.

use std::collections::{BTreeSet, HashMap};

use beanscope_core::ConfigurationUnit;

use crate::ModelGraph;

/// The condensed DAG of a [`ModelGraph`].
#[derive(Debug, Clone)]
pub struct Condensation {
    /// Members of each component, sorted.
    components: Vec<Vec<ConfigurationUnit>>,
    component_of: HashMap<ConfigurationUnit, usize>,
    successors: Vec<BTreeSet<usize>>,
    in_degree: Vec<usize>,
    external: Vec<bool>,
}

impl Condensation {
    pub fn of(graph: &ModelGraph) -> Self {
        let mut components = strongly_connected_components(graph);
        for members in &mut components {
            members.sort();
        }
        // Present components in the order of their lowest member.
        components.sort();

        let component_of: HashMap<ConfigurationUnit, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(idx, members)| members.iter().map(move |unit| (unit.clone(), idx)))
            .collect();

        let mut successors = vec![BTreeSet::new(); components.len()];
        for (from, to) in graph.edges() {
            let (Some(&a), Some(&b)) = (component_of.get(from), component_of.get(to)) else {
                continue;
            };
            if a != b {
                successors[a].insert(b);
            }
        }

        let mut in_degree = vec![0; components.len()];
        for targets in &successors {
            for &target in targets {
                in_degree[target] += 1;
            }
        }

        let external = components
            .iter()
            .map(|members| members.iter().all(|unit| graph.is_external(unit)))
            .collect();

        Self {
            components,
            component_of,
            successors,
            in_degree,
            external,
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, idx: usize) -> &[ConfigurationUnit] {
        &self.components[idx]
    }

    pub fn components(&self) -> impl Iterator<Item = &[ConfigurationUnit]> {
        self.components.iter().map(Vec::as_slice)
    }

    pub fn component_of(&self, unit: &ConfigurationUnit) -> Option<usize> {
        self.component_of.get(unit).copied()
    }

    pub fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors[idx].iter().copied()
    }

    pub fn is_root(&self, idx: usize) -> bool {
        self.in_degree[idx] == 0
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.components.len()).filter(|&idx| self.is_root(idx))
    }

    /// The lowest member of every root component that is not made of
    /// external leaves, in natural order.
    pub fn canonical_units(&self) -> Vec<ConfigurationUnit> {
        self.roots()
            .filter(|&idx| !self.external[idx])
            .filter_map(|idx| self.components[idx].first().cloned())
            .collect()
    }
}

/// Tarjan's algorithm over the graph's nodes, iterating nodes and successors
/// in natural order. Components come out in reverse topological order.
pub fn strongly_connected_components(graph: &ModelGraph) -> Vec<Vec<ConfigurationUnit>> {
    let nodes: Vec<&ConfigurationUnit> = graph.units().collect();
    let index_of: HashMap<&ConfigurationUnit, usize> =
        nodes.iter().enumerate().map(|(idx, unit)| (*unit, idx)).collect();
    let adjacency: Vec<Vec<usize>> = nodes
        .iter()
        .map(|unit| {
            graph
                .successors(unit)
                .filter_map(|next| index_of.get(next).copied())
                .collect()
        })
        .collect();

    let mut tarjan = Tarjan::new(nodes.len());
    for start in 0..nodes.len() {
        if tarjan.index[start].is_none() {
            tarjan.visit(start, &adjacency);
        }
    }

    tarjan
        .components
        .into_iter()
        .map(|members| members.into_iter().map(|idx| nodes[idx].clone()).collect())
        .collect()
}

struct Tarjan {
    next_index: usize,
    index: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl Tarjan {
    fn new(len: usize) -> Self {
        Self {
            next_index: 0,
            index: vec![None; len],
            low_link: vec![0; len],
            on_stack: vec![false; len],
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn discover(&mut self, node: usize) {
        self.index[node] = Some(self.next_index);
        self.low_link[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    /// Iterative DFS; each frame is a node and the position of the next
    /// successor to look at.
    fn visit(&mut self, start: usize, adjacency: &[Vec<usize>]) {
        self.discover(start);
        let mut frames = vec![(start, 0usize)];

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            if let Some(&succ) = adjacency[node].get(frame.1) {
                frame.1 += 1;
                match self.index[succ] {
                    None => {
                        self.discover(succ);
                        frames.push((succ, 0));
                    }
                    Some(succ_index) if self.on_stack[succ] => {
                        self.low_link[node] = self.low_link[node].min(succ_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                self.low_link[parent] = self.low_link[parent].min(self.low_link[node]);
            }

            if Some(self.low_link[node]) == self.index[node] {
                let mut members = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    members.push(member);
                    if member == node {
                        break;
                    }
                }
                self.components.push(members);
            }
        }
    }
}
