use std::collections::{BTreeMap, BTreeSet, HashMap};

use beanscope_core::{
    ActiveProfileSet, ConfigurationUnit, DeclarationReader, ImportRef, ImportResolver,
    ImportTarget, ProfileProvider, ReadError, SearchScope, SmolStr, UnitDeclarations,
};
use parking_lot::{Mutex, RwLock};

/// In-memory implementation of every collaborator trait, for tests and
/// embedding.
///
/// Type imports resolve to the annotated unit with the same handle; resource
/// imports resolve to the XML unit whose handle equals the location with any
/// `classpath:` / `classpath*:` prefix and leading `/` removed.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    state: RwLock<WorkspaceState>,
    reads: Mutex<HashMap<ConfigurationUnit, usize>>,
}

#[derive(Debug, Default)]
struct WorkspaceState {
    units: BTreeMap<ConfigurationUnit, UnitDeclarations>,
    unreadable: BTreeMap<ConfigurationUnit, String>,
    classes: BTreeSet<SmolStr>,
    profiles: ActiveProfileSet,
}

impl WorkspaceState {
    fn exists(&self, unit: &ConfigurationUnit) -> bool {
        self.units.contains_key(unit) || self.unreadable.contains_key(unit)
    }
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a unit.
    pub fn set_unit(&self, unit: ConfigurationUnit, declarations: UnitDeclarations) {
        let mut state = self.state.write();
        state.unreadable.remove(&unit);
        state.units.insert(unit, declarations);
    }

    pub fn remove_unit(&self, unit: &ConfigurationUnit) {
        let mut state = self.state.write();
        state.units.remove(unit);
        state.unreadable.remove(unit);
    }

    /// Keeps the unit visible to resolution but makes reads fail.
    pub fn set_unreadable(&self, unit: ConfigurationUnit, message: impl Into<String>) {
        let mut state = self.state.write();
        state.units.remove(&unit);
        state.unreadable.insert(unit, message.into());
    }

    /// Registers a library class for class-presence checks.
    pub fn add_class(&self, binary_name: impl Into<SmolStr>) {
        self.state.write().classes.insert(binary_name.into());
    }

    pub fn set_active_profiles<I, S>(&self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.state.write().profiles = profiles.into_iter().collect();
    }

    /// How many times `unit` was read.
    pub fn reads(&self, unit: &ConfigurationUnit) -> usize {
        self.reads.lock().get(unit).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().values().sum()
    }
}

fn resource_handle(location: &str) -> &str {
    let location = location
        .strip_prefix("classpath*:")
        .or_else(|| location.strip_prefix("classpath:"))
        .unwrap_or(location);
    location.trim_start_matches('/')
}

impl DeclarationReader for MemoryWorkspace {
    fn read_unit(&self, unit: &ConfigurationUnit) -> Result<UnitDeclarations, ReadError> {
        *self.reads.lock().entry(unit.clone()).or_insert(0) += 1;

        let state = self.state.read();
        if let Some(message) = state.unreadable.get(unit) {
            return Err(ReadError::Unreadable {
                unit: unit.clone(),
                message: message.clone(),
            });
        }
        state
            .units
            .get(unit)
            .cloned()
            .ok_or_else(|| ReadError::Missing(unit.clone()))
    }
}

impl ImportResolver for MemoryWorkspace {
    fn resolve(&self, import: &ImportRef, _scope: &SearchScope) -> Vec<ConfigurationUnit> {
        let candidate = match &import.target {
            ImportTarget::Type(name) => ConfigurationUnit::annotated(name.clone()),
            ImportTarget::Resource(location) => ConfigurationUnit::xml(resource_handle(location)),
        };
        if self.state.read().exists(&candidate) {
            vec![candidate]
        } else {
            Vec::new()
        }
    }

    fn candidates(&self, scope: &SearchScope) -> Vec<ConfigurationUnit> {
        let state = self.state.read();
        let mut units: Vec<_> = state
            .units
            .keys()
            .chain(state.unreadable.keys())
            .filter(|unit| scope.contains(unit))
            .cloned()
            .collect();
        units.sort();
        units
    }

    fn has_class(&self, binary_name: &str, _scope: &SearchScope) -> bool {
        let state = self.state.read();
        state.classes.contains(binary_name)
            || state
                .units
                .contains_key(&ConfigurationUnit::annotated(binary_name))
    }
}

impl ProfileProvider for MemoryWorkspace {
    fn active_profiles(&self, _scope: &SearchScope) -> ActiveProfileSet {
        self.state.read().profiles.clone()
    }
}
