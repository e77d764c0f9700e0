//! Modification tracking and versioned caching for beanscope models.
//!
//! Every cached value is stored together with a [`Stamp`]: the token values of
//! the [`InvalidationDomain`]s it depends on at the time computation started.
//! An entry is served only while all of those tokens are unchanged. Edits are
//! turned into token bumps by an [`EditClassifier`].

mod cache;
mod classify;
mod token;

pub use cache::{CacheStats, EntryState, VersionedCache};
pub use classify::{
    DefaultEditClassifier, EditClassifier, EditEvent, ElementKind, FileKind, FileSystemChange,
    FileSystemEvent, ModifierOwner, Relevance, TreeEdit, Verdict,
};
pub use token::{InvalidationDomain, ModificationTracker, Stamp};
