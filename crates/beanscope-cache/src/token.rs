use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use beanscope_core::ConfigurationUnit;
use parking_lot::RwLock;

use crate::{Relevance, Verdict};

/// A family of edits that invalidates the values depending on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvalidationDomain {
    /// Structural declarations in class sources (annotations, imports,
    /// class/method shape).
    Structural,
    /// Declarative configuration files (properties, YAML, XML, strategy
    /// registrations).
    ConfigurationFiles,
    /// The active profile selection.
    Profiles,
    /// Explicitly configured file sets (multiple application contexts).
    MultipleContexts,
    /// Registrations of custom XML namespace handlers.
    CustomBeanParsers,
    /// Bumped when a structural edit can't be attributed to particular units.
    AllUnits,
    Unit(ConfigurationUnit),
}

impl fmt::Display for InvalidationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationDomain::Structural => f.write_str("structural"),
            InvalidationDomain::ConfigurationFiles => f.write_str("configuration-files"),
            InvalidationDomain::Profiles => f.write_str("profiles"),
            InvalidationDomain::MultipleContexts => f.write_str("multiple-contexts"),
            InvalidationDomain::CustomBeanParsers => f.write_str("custom-bean-parsers"),
            InvalidationDomain::AllUnits => f.write_str("all-units"),
            InvalidationDomain::Unit(unit) => write!(f, "unit({unit})"),
        }
    }
}

/// Token values observed for a set of domains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stamp {
    entries: Vec<(InvalidationDomain, u64)>,
}

impl Stamp {
    pub fn domains(&self) -> impl Iterator<Item = &InvalidationDomain> {
        self.entries.iter().map(|(domain, _)| domain)
    }

    /// Token value recorded for `domain`, if the stamp covers it.
    pub fn token(&self, domain: &InvalidationDomain) -> Option<u64> {
        self.entries
            .iter()
            .find(|(d, _)| d == domain)
            .map(|(_, value)| *value)
    }

    /// `true` if no covered domain has been bumped since the stamp was taken.
    pub fn is_current(&self, tracker: &ModificationTracker) -> bool {
        self.entries
            .iter()
            .all(|(domain, value)| tracker.current(domain) == *value)
    }
}

/// Monotonic modification counters, one per [`InvalidationDomain`].
///
/// Counters only ever increase. Reading a counter never blocks a writer for
/// long: fixed domains are atomics, per-unit counters live behind a
/// read-mostly lock.
#[derive(Debug, Default)]
pub struct ModificationTracker {
    structural: AtomicU64,
    configuration_files: AtomicU64,
    profiles: AtomicU64,
    multiple_contexts: AtomicU64,
    custom_bean_parsers: AtomicU64,
    all_units: AtomicU64,
    units: RwLock<HashMap<ConfigurationUnit, u64>>,
}

impl ModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, domain: &InvalidationDomain) -> Option<&AtomicU64> {
        match domain {
            InvalidationDomain::Structural => Some(&self.structural),
            InvalidationDomain::ConfigurationFiles => Some(&self.configuration_files),
            InvalidationDomain::Profiles => Some(&self.profiles),
            InvalidationDomain::MultipleContexts => Some(&self.multiple_contexts),
            InvalidationDomain::CustomBeanParsers => Some(&self.custom_bean_parsers),
            InvalidationDomain::AllUnits => Some(&self.all_units),
            InvalidationDomain::Unit(_) => None,
        }
    }

    pub fn current(&self, domain: &InvalidationDomain) -> u64 {
        match (self.counter(domain), domain) {
            (Some(counter), _) => counter.load(Ordering::Acquire),
            (None, InvalidationDomain::Unit(unit)) => {
                self.units.read().get(unit).copied().unwrap_or(0)
            }
            (None, _) => 0,
        }
    }

    /// Increments the token for `domain` and returns the new value.
    pub fn bump(&self, domain: &InvalidationDomain) -> u64 {
        let value = match (self.counter(domain), domain) {
            (Some(counter), _) => counter.fetch_add(1, Ordering::AcqRel) + 1,
            (None, InvalidationDomain::Unit(unit)) => {
                let mut units = self.units.write();
                let entry = units.entry(unit.clone()).or_insert(0);
                *entry += 1;
                *entry
            }
            (None, _) => 0,
        };
        tracing::trace!(target: "beanscope.cache", domain = %domain, value, "token bumped");
        value
    }

    pub fn stamp(&self, domains: &[InvalidationDomain]) -> Stamp {
        let mut entries: Vec<_> = domains
            .iter()
            .map(|domain| (domain.clone(), self.current(domain)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        Stamp { entries }
    }

    pub fn fire_active_profiles_changed(&self) {
        self.bump(&InvalidationDomain::Profiles);
    }

    pub fn fire_multiple_contexts_changed(&self) {
        self.bump(&InvalidationDomain::MultipleContexts);
    }

    pub fn fire_custom_bean_parser_changed(&self) {
        self.bump(&InvalidationDomain::CustomBeanParsers);
    }

    /// Applies a classification verdict and returns the domains bumped.
    pub fn apply(&self, verdict: &Verdict) -> Vec<InvalidationDomain> {
        let mut bumped = match verdict.relevance {
            Relevance::Irrelevant => return Vec::new(),
            Relevance::Structural => vec![InvalidationDomain::Structural],
            Relevance::ConfigurationFile => vec![InvalidationDomain::ConfigurationFiles],
        };

        if verdict.units.is_empty() {
            if verdict.relevance == Relevance::Structural {
                bumped.push(InvalidationDomain::AllUnits);
            }
        } else {
            bumped.extend(verdict.units.iter().cloned().map(InvalidationDomain::Unit));
        }

        for domain in &bumped {
            self.bump(domain);
        }
        bumped
    }
}
