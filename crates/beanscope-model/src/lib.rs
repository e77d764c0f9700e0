//! Bean model resolution for beanscope.
//!
//! The pipeline runs from one configuration unit to a queryable model:
//!
//! 1. [`LocalModel`]: what a single unit declares, imports unresolved.
//! 2. [`ModelGraph`]: the import closure of a set of seed units.
//! 3. [`Condensation`]: its strongly connected components and the canonical
//!    unit of every root component.
//! 4. [`CombinedModel`]: a merged view with profile filtering, shadowing and
//!    alias resolution.
//!
//! [`ModelEngine`] caches every stage against a
//! [`beanscope_cache::ModificationTracker`] and is the entry point for hosts.

mod autoconfig;
mod combined;
mod engine;
mod graph;
mod local;
mod memory;
mod scc;

pub use autoconfig::AutoConfigSorter;
pub use combined::{CombinedModel, NameLookup};
pub use engine::{EngineStats, ModelEngine};
pub use graph::ModelGraph;
pub use local::{LocalModel, ModelProblem};
pub use memory::MemoryWorkspace;
pub use scc::{strongly_connected_components, Condensation};
