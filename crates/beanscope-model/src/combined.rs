//! A merged, queryable view over several local models.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use beanscope_core::{ActiveProfileSet, ComponentDefinition, ConfigurationUnit, Layer, SmolStr};
use indexmap::IndexMap;

use crate::LocalModel;

/// Result of looking a name up in a [`CombinedModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup<'a> {
    Missing,
    Unique(&'a ComponentDefinition),
    /// Several definitions of equal precedence share the name. Candidates
    /// are in model order; [`CombinedModel::find_by_name`] returns the first.
    Ambiguous(&'a [ComponentDefinition]),
}

impl<'a> NameLookup<'a> {
    pub fn first(&self) -> Option<&'a ComponentDefinition> {
        match *self {
            NameLookup::Missing => None,
            NameLookup::Unique(def) => Some(def),
            NameLookup::Ambiguous(defs) => defs.first(),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, NameLookup::Ambiguous(_))
    }
}

/// Precedence of a definition when names collide: the child layer wins over
/// the parent layer; within a layer, a profile-gated definition whose gate
/// is satisfied wins over an unconditional one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    layer: Layer,
    profile_specific: bool,
}

#[derive(Debug, Default)]
struct ClassHierarchy {
    supertypes: HashMap<SmolStr, Vec<SmolStr>>,
}

impl ClassHierarchy {
    fn insert(&mut self, class: &str, supertypes: &[SmolStr]) {
        let entry = self.supertypes.entry(SmolStr::new(class)).or_default();
        for supertype in supertypes {
            if !entry.contains(supertype) {
                entry.push(supertype.clone());
            }
        }
    }

    fn is_assignable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut queue = VecDeque::<&str>::new();
        queue.push_back(from);

        let mut visited = HashSet::<&str>::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(supertypes) = self.supertypes.get(current) else {
                continue;
            };
            for supertype in supertypes {
                if supertype == to {
                    return true;
                }
                queue.push_back(supertype);
            }
        }

        false
    }
}

/// Merged view over a set of [`LocalModel`]s and an [`ActiveProfileSet`].
///
/// All lookups are resolved at construction; the model is immutable
/// afterwards and can be shared freely.
#[derive(Debug)]
pub struct CombinedModel {
    models: Vec<Arc<LocalModel>>,
    profiles: ActiveProfileSet,
    /// Winning candidates per name, in first-seen order.
    by_name: IndexMap<SmolStr, Vec<ComponentDefinition>>,
    /// alias -> target name, first declaration wins.
    aliases: IndexMap<SmolStr, SmolStr>,
    hierarchy: ClassHierarchy,
}

impl CombinedModel {
    /// Models are ordered by unit; duplicates are ignored.
    pub fn new(models: impl IntoIterator<Item = Arc<LocalModel>>, profiles: ActiveProfileSet) -> Self {
        let mut models: Vec<Arc<LocalModel>> = models.into_iter().collect();
        models.sort_by(|a, b| a.unit().cmp(b.unit()));
        models.dedup_by(|a, b| a.unit() == b.unit());

        let mut hierarchy = ClassHierarchy::default();
        let mut ranked: IndexMap<SmolStr, (Rank, Vec<ComponentDefinition>)> = IndexMap::new();
        let mut aliases: IndexMap<SmolStr, SmolStr> = IndexMap::new();

        for model in &models {
            for def in model.definitions() {
                if let Some(ty) = def.ty.name() {
                    hierarchy.insert(ty, &def.supertypes);
                }
            }

            if !model.profiles().matches(&profiles) {
                continue;
            }
            let layer = model.markers().layer;

            for alias in model.aliases() {
                aliases
                    .entry(alias.alias.clone())
                    .or_insert_with(|| alias.name.clone());
            }

            for def in model.definitions() {
                if !def.profiles.matches(&profiles) {
                    continue;
                }
                let rank = Rank {
                    layer,
                    profile_specific: !model.profiles().is_unconditional()
                        || !def.profiles.is_unconditional(),
                };
                match ranked.get_mut(&def.name) {
                    Some((best, candidates)) if *best == rank => candidates.push(def.clone()),
                    Some((best, candidates)) if *best < rank => {
                        *best = rank;
                        *candidates = vec![def.clone()];
                    }
                    Some(_) => {}
                    None => {
                        ranked.insert(def.name.clone(), (rank, vec![def.clone()]));
                    }
                }
                for alias in &def.aliases {
                    aliases
                        .entry(alias.clone())
                        .or_insert_with(|| def.name.clone());
                }
            }
        }

        let by_name: IndexMap<_, _> = ranked
            .into_iter()
            .map(|(name, (_, candidates))| (name, candidates))
            .collect();

        tracing::trace!(
            target: "beanscope.model",
            models = models.len(),
            names = by_name.len(),
            profiles = %profiles,
            "built combined model"
        );

        Self {
            models,
            profiles,
            by_name,
            aliases,
            hierarchy,
        }
    }

    pub fn models(&self) -> &[Arc<LocalModel>] {
        &self.models
    }

    pub fn units(&self) -> impl Iterator<Item = &ConfigurationUnit> {
        self.models.iter().map(|model| model.unit())
    }

    pub fn profiles(&self) -> &ActiveProfileSet {
        &self.profiles
    }

    /// Follows alias declarations from `name` to a defined name. Cycles and
    /// dangling aliases resolve to `None`.
    fn resolve_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let mut current = name;
        let mut seen = HashSet::new();
        loop {
            if self.by_name.contains_key(current) {
                return Some(current);
            }
            if !seen.insert(current) {
                return None;
            }
            current = self.aliases.get(current)?.as_str();
        }
    }

    pub fn lookup_name(&self, name: &str) -> NameLookup<'_> {
        let Some(candidates) = self
            .resolve_name(name)
            .and_then(|resolved| self.by_name.get(resolved))
        else {
            return NameLookup::Missing;
        };
        match candidates.as_slice() {
            [] => NameLookup::Missing,
            [only] => NameLookup::Unique(only),
            many => NameLookup::Ambiguous(many),
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ComponentDefinition> {
        self.lookup_name(name).first()
    }

    /// One definition per name, profile-filtered and shadowed, in model order.
    pub fn all_visible(&self) -> Vec<&ComponentDefinition> {
        self.by_name
            .values()
            .filter_map(|candidates| candidates.first())
            .collect()
    }

    /// Non-degraded visible definitions whose type is assignable to `ty`.
    pub fn find_by_type(&self, ty: &str) -> Vec<&ComponentDefinition> {
        self.all_visible()
            .into_iter()
            .filter(|def| !def.is_degraded())
            .filter(|def| {
                def.ty
                    .name()
                    .is_some_and(|name| self.hierarchy.is_assignable(name, ty))
            })
            .collect()
    }

    /// The single autowiring candidate for `ty`: the only `primary`
    /// definition, or the only definition at all.
    pub fn find_primary(&self, ty: &str) -> Option<&ComponentDefinition> {
        let candidates = self.find_by_type(ty);
        let mut primaries = candidates.iter().filter(|def| def.primary);
        match (primaries.next(), primaries.next()) {
            (Some(primary), None) => Some(*primary),
            (None, _) if candidates.len() == 1 => candidates.first().copied(),
            _ => None,
        }
    }

    /// The definition's name followed by every alias that resolves to it.
    pub fn all_names(&self, def: &ComponentDefinition) -> Vec<SmolStr> {
        let mut names = vec![def.name.clone()];
        for alias in self.aliases.keys() {
            if self.by_name.contains_key(alias) {
                continue;
            }
            if self.resolve_name(alias) == Some(def.name.as_str()) {
                names.push(alias.clone());
            }
        }
        names
    }

    /// Names that resolve to more than one equally ranked definition.
    pub fn ambiguities(&self) -> Vec<&str> {
        self.by_name
            .iter()
            .filter(|(_, candidates)| candidates.len() > 1)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        self.hierarchy.is_assignable(from, to)
    }
}
