//! Core shared types for beanscope.
//!
//! This crate is intentionally small: it defines configuration unit identity,
//! component definitions, profile conditions, raw declarations, and the
//! collaborator traits the engine consumes. It performs no caching and no
//! cross-unit resolution.

mod declaration;
mod definition;
mod profile;
mod scope;
mod source;
mod unit;

pub use declaration::{
    AliasDeclaration, AutoConfigureMetadata, Condition, DeclaredComponent, DeclaredType, ImportRef,
    ImportTarget, Layer, UnitDeclarations, UnitMarkers,
};
pub use definition::{
    decapitalize, BeanScope, BeanType, ComponentDefinition, DefinitionOrigin,
};
pub use profile::{ActiveProfileSet, ProfileCondition, ProfileExpr, ProfileExpressionError};
pub use scope::{ScopeMembers, SearchScope};
pub use source::{DeclarationReader, ImportResolver, ProfileProvider, ReadError};
pub use unit::{ConfigurationUnit, UnitKind};

pub use smol_str::SmolStr;

/// Profile name that is implicitly active when no profile is active.
pub const DEFAULT_PROFILE: &str = "default";
