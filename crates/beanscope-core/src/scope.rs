use std::collections::BTreeSet;

use smol_str::SmolStr;

use crate::ConfigurationUnit;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeMembers {
    Everything,
    Only(BTreeSet<ConfigurationUnit>),
}

/// Bound on graph expansion, typically a module plus its dependency closure.
///
/// The scope is passed through to the import resolver untouched; the engine
/// only asks it whether a unit may be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchScope {
    name: SmolStr,
    members: ScopeMembers,
}

impl SearchScope {
    pub fn everything(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            members: ScopeMembers::Everything,
        }
    }

    pub fn of_units<I>(name: impl Into<SmolStr>, units: I) -> Self
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        Self {
            name: name.into(),
            members: ScopeMembers::Only(units.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &ScopeMembers {
        &self.members
    }

    pub fn contains(&self, unit: &ConfigurationUnit) -> bool {
        match &self.members {
            ScopeMembers::Everything => true,
            ScopeMembers::Only(units) => units.contains(unit),
        }
    }
}
