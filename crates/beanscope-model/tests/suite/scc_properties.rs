use std::collections::BTreeSet;

use beanscope_core::{ConfigurationUnit, SearchScope};
use beanscope_model::{strongly_connected_components, Condensation, ModelGraph};
use proptest::prelude::*;

use super::support::{class, engine, importing, workspace};

const MAX_UNITS: usize = 8;

fn unit_name(idx: usize) -> String {
    format!("com.example.U{idx}")
}

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=MAX_UNITS).prop_flat_map(|len| {
        (
            Just(len),
            prop::collection::vec((0..len, 0..len), 0..len * 3),
        )
    })
}

fn build(len: usize, edges: &[(usize, usize)], reversed_seeds: bool) -> ModelGraph {
    let ws = workspace();
    for from in 0..len {
        let targets: Vec<String> = edges
            .iter()
            .filter(|(source, _)| *source == from)
            .map(|(_, target)| unit_name(*target))
            .collect();
        let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        ws.set_unit(class(&unit_name(from)), importing(&targets));
    }

    let mut seeds: Vec<ConfigurationUnit> = (0..len).map(|idx| class(&unit_name(idx))).collect();
    if reversed_seeds {
        seeds.reverse();
    }
    engine(&ws).model_graph(seeds, &SearchScope::everything("module"))
}

proptest! {
    #[test]
    fn canonical_units_are_one_lowest_member_per_root((len, edges) in arb_graph()) {
        let graph = build(len, &edges, false);
        let condensation = Condensation::of(&graph);
        let canonical = condensation.canonical_units();

        let all: BTreeSet<_> = graph.units().cloned().collect();
        prop_assert_eq!(all.len(), len);
        prop_assert!(canonical.iter().all(|unit| all.contains(unit)));

        let roots: Vec<usize> = condensation.roots().collect();
        prop_assert_eq!(canonical.len(), roots.len());
        for root in roots {
            let lowest = condensation.component(root).iter().min().cloned();
            prop_assert!(lowest.is_some_and(|unit| canonical.contains(&unit)));
        }
    }

    #[test]
    fn every_unit_is_reachable_from_a_canonical_unit((len, edges) in arb_graph()) {
        let graph = build(len, &edges, false);
        let canonical = Condensation::of(&graph).canonical_units();

        let mut covered = BTreeSet::new();
        for unit in &canonical {
            covered.extend(graph.reachable_from(unit));
        }
        prop_assert_eq!(covered.len(), len);

        for (idx, a) in canonical.iter().enumerate() {
            for b in &canonical[idx + 1..] {
                prop_assert!(!graph.reachable_from(a).contains(b));
                prop_assert!(!graph.reachable_from(b).contains(a));
            }
        }
    }

    #[test]
    fn components_partition_the_graph_into_a_dag((len, edges) in arb_graph()) {
        let graph = build(len, &edges, false);
        let components = strongly_connected_components(&graph);

        let members: usize = components.iter().map(Vec::len).sum();
        prop_assert_eq!(members, len);

        let condensation = Condensation::of(&graph);
        for idx in 0..condensation.len() {
            for succ in condensation.successors(idx) {
                prop_assert_ne!(idx, succ);
                let back = condensation.component(succ)[0].clone();
                let front = &condensation.component(idx)[0];
                prop_assert!(!graph.reachable_from(&back).contains(front));
            }
        }
    }

    #[test]
    fn canonical_selection_is_deterministic((len, edges) in arb_graph()) {
        let forward = Condensation::of(&build(len, &edges, false)).canonical_units();
        let backward = Condensation::of(&build(len, &edges, true)).canonical_units();
        prop_assert_eq!(forward, backward);
    }
}
