//! Collaborator interfaces supplied by the host environment.

use crate::{ActiveProfileSet, ConfigurationUnit, ImportRef, SearchScope, UnitDeclarations};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("configuration unit {0} no longer exists")]
    Missing(ConfigurationUnit),

    #[error("failed to read {unit}: {message}")]
    Unreadable {
        unit: ConfigurationUnit,
        message: String,
    },
}

/// Turns a unit into its raw declarations. Must be a pure function of the
/// unit's current source.
pub trait DeclarationReader: Send + Sync {
    fn read_unit(&self, unit: &ConfigurationUnit) -> Result<UnitDeclarations, ReadError>;
}

/// Resolves import references and enumerates candidate units.
pub trait ImportResolver: Send + Sync {
    /// Units an import points at. An empty result marks the import as dangling.
    fn resolve(&self, import: &ImportRef, scope: &SearchScope) -> Vec<ConfigurationUnit>;

    /// Configuration units visible in `scope` that are candidates for
    /// auto-discovery.
    fn candidates(&self, scope: &SearchScope) -> Vec<ConfigurationUnit>;

    /// Whether a class is resolvable in `scope`. Used by class-presence
    /// conditions.
    fn has_class(&self, _binary_name: &str, _scope: &SearchScope) -> bool {
        true
    }
}

/// Supplies the active profiles for a scope.
pub trait ProfileProvider: Send + Sync {
    fn active_profiles(&self, scope: &SearchScope) -> ActiveProfileSet;
}
