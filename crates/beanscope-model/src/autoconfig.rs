//! Ordering of auto-configuration units.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use beanscope_core::{ConfigurationUnit, ImportResolver, SearchScope};

use crate::LocalModel;

/// Sorts auto-configuration units into application order.
///
/// Units whose class-presence conditions fail are dropped. The rest are
/// sorted by name, then (stably) by order value, and finally rearranged so
/// that every unit comes after the units it must follow: those it names in
/// its "after" list and those naming it in their "before" list. Cyclic
/// constraints are broken at the first unit visited.
pub struct AutoConfigSorter<'a> {
    resolver: &'a dyn ImportResolver,
    scope: &'a SearchScope,
    default_order: i32,
}

impl<'a> AutoConfigSorter<'a> {
    pub fn new(resolver: &'a dyn ImportResolver, scope: &'a SearchScope, default_order: i32) -> Self {
        Self {
            resolver,
            scope,
            default_order,
        }
    }

    fn passes_class_conditions(&self, model: &LocalModel) -> bool {
        model
            .auto_configure()
            .on_class
            .iter()
            .all(|class| self.resolver.has_class(class, self.scope))
    }

    pub fn sort(&self, models: &[Arc<LocalModel>]) -> Vec<ConfigurationUnit> {
        let mut configs: Vec<&LocalModel> = models
            .iter()
            .map(Arc::as_ref)
            .filter(|model| {
                let passes = self.passes_class_conditions(model);
                if !passes {
                    tracing::debug!(
                        target: "beanscope.model",
                        unit = %model.unit(),
                        "class condition not met; skipping auto-configuration"
                    );
                }
                passes
            })
            .collect();
        // Unit order is handle first, so equal units end up adjacent.
        configs.sort_by(|a, b| a.unit().cmp(b.unit()));
        configs.dedup_by(|a, b| a.unit() == b.unit());
        configs.sort_by_key(|model| model.auto_configure().order.unwrap_or(self.default_order));

        // Several units can share a handle (a class and an XML document).
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, model) in configs.iter().enumerate() {
            by_name.entry(model.unit().handle()).or_default().push(idx);
        }
        let lookup = |names: &[beanscope_core::SmolStr]| -> Vec<usize> {
            let mut out = Vec::new();
            for name in names {
                for &idx in by_name.get(name.as_str()).into_iter().flatten() {
                    if !out.contains(&idx) {
                        out.push(idx);
                    }
                }
            }
            out
        };

        // requested_after[i]: units that must be placed before unit i.
        let mut requested_after: Vec<Vec<usize>> = configs
            .iter()
            .map(|model| lookup(&model.auto_configure().after))
            .collect();
        for (idx, model) in configs.iter().enumerate() {
            for target in lookup(&model.auto_configure().before) {
                if !requested_after[target].contains(&idx) {
                    requested_after[target].push(idx);
                }
            }
        }

        let mut remaining: BTreeSet<usize> = (0..configs.len()).collect();
        let mut sorted = Vec::with_capacity(configs.len());
        while let Some(next) = remaining.first().copied() {
            place_after_requirements(next, &requested_after, &mut remaining, &mut sorted);
        }

        sorted
            .into_iter()
            .map(|idx| configs[idx].unit().clone())
            .collect()
    }
}

/// Depth-first placement: everything `current` must follow is placed first.
fn place_after_requirements(
    current: usize,
    requested_after: &[Vec<usize>],
    remaining: &mut BTreeSet<usize>,
    sorted: &mut Vec<usize>,
) {
    remaining.remove(&current);
    for &before in &requested_after[current] {
        if remaining.contains(&before) {
            place_after_requirements(before, requested_after, remaining, sorted);
        }
    }
    sorted.push(current);
}
