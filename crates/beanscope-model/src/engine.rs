use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use beanscope_cache::{
    CacheStats, DefaultEditClassifier, EditClassifier, EditEvent, InvalidationDomain,
    ModificationTracker, VersionedCache, Verdict,
};
use beanscope_config::ModelConfig;
use beanscope_core::{
    ActiveProfileSet, ConfigurationUnit, DeclarationReader, ImportResolver, ProfileProvider,
    SearchScope, UnitKind,
};

use crate::{AutoConfigSorter, CombinedModel, Condensation, LocalModel, ModelGraph};

/// Domains every cross-unit result depends on.
const CROSS_UNIT_DEPS: &[InvalidationDomain] = &[
    InvalidationDomain::Structural,
    InvalidationDomain::ConfigurationFiles,
    InvalidationDomain::Profiles,
    InvalidationDomain::MultipleContexts,
    InvalidationDomain::CustomBeanParsers,
    InvalidationDomain::AllUnits,
];

type CombinedKey = (BTreeSet<ConfigurationUnit>, ActiveProfileSet);
type DiscoveryKey = (BTreeSet<ConfigurationUnit>, SearchScope);

/// Hit and computation counters of every cache the engine owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub local_models: CacheStats,
    pub combined_models: CacheStats,
    pub discoveries: CacheStats,
    pub auto_configured: CacheStats,
}

/// Entry point for building and querying bean models.
///
/// The engine owns the collaborators, a [`ModificationTracker`], and one
/// [`VersionedCache`] per stage. All methods take `&self` and are safe to
/// call from several threads at once.
pub struct ModelEngine {
    reader: Arc<dyn DeclarationReader>,
    resolver: Arc<dyn ImportResolver>,
    profiles: Arc<dyn ProfileProvider>,
    classifier: Box<dyn EditClassifier>,
    config: ModelConfig,
    tracker: ModificationTracker,
    local_models: VersionedCache<ConfigurationUnit, LocalModel>,
    combined_models: VersionedCache<CombinedKey, CombinedModel>,
    discoveries: VersionedCache<DiscoveryKey, Vec<ConfigurationUnit>>,
    auto_configured: VersionedCache<SearchScope, Vec<Arc<CombinedModel>>>,
}

impl fmt::Debug for ModelEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEngine")
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ModelEngine {
    pub fn new(
        reader: Arc<dyn DeclarationReader>,
        resolver: Arc<dyn ImportResolver>,
        profiles: Arc<dyn ProfileProvider>,
    ) -> Self {
        Self {
            reader,
            resolver,
            profiles,
            classifier: Box::new(DefaultEditClassifier),
            config: ModelConfig::default(),
            tracker: ModificationTracker::new(),
            local_models: VersionedCache::new("local-models"),
            combined_models: VersionedCache::new("combined-models"),
            discoveries: VersionedCache::new("canonical-discovery"),
            auto_configured: VersionedCache::new("auto-configured-models"),
        }
    }

    /// Uses one object for every collaborator role.
    pub fn for_workspace<W>(workspace: Arc<W>) -> Self
    where
        W: DeclarationReader + ImportResolver + ProfileProvider + 'static,
    {
        Self::new(workspace.clone(), workspace.clone(), workspace)
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_classifier(mut self, classifier: impl EditClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ModificationTracker {
        &self.tracker
    }

    pub fn active_profiles(&self, scope: &SearchScope) -> ActiveProfileSet {
        self.profiles.active_profiles(scope)
    }

    /// Returns the cached local model for `unit`, reading it on a miss.
    ///
    /// A unit the reader cannot read yields an empty model flagged as
    /// unreadable; it is cached like any other result.
    pub fn build_local_model(&self, unit: &ConfigurationUnit) -> Arc<LocalModel> {
        let deps = local_model_deps(unit);
        self.local_models
            .get_or_compute(unit, &self.tracker, &deps, || {
                tracing::trace!(target: "beanscope.model", %unit, "building local model");
                match self.reader.read_unit(unit) {
                    Ok(declarations) => LocalModel::build(unit.clone(), declarations),
                    Err(err) => {
                        tracing::warn!(
                            target: "beanscope.model",
                            %unit,
                            error = %err,
                            "configuration unit is unreadable; using an empty model"
                        );
                        LocalModel::unreadable(unit.clone(), err)
                    }
                }
            })
    }

    /// Merges the local models of `units` under `profiles`.
    ///
    /// The result only depends on the set of units, not on their order or
    /// multiplicity.
    pub fn build_combined_model<I>(&self, units: I, profiles: &ActiveProfileSet) -> Arc<CombinedModel>
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        let key: CombinedKey = (units.into_iter().collect(), profiles.clone());
        self.combined_models
            .get_or_compute(&key, &self.tracker, CROSS_UNIT_DEPS, || {
                let models: Vec<_> = key.0.iter().map(|unit| self.build_local_model(unit)).collect();
                tracing::debug!(
                    target: "beanscope.model",
                    units = models.len(),
                    profiles = %key.1,
                    "building combined model"
                );
                CombinedModel::new(models, key.1.clone())
            })
    }

    /// Import graph from `seeds`, expanded inside `scope`. Not cached; its
    /// local models are.
    pub fn model_graph<I>(&self, seeds: I, scope: &SearchScope) -> ModelGraph
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        ModelGraph::build(seeds, scope, self.resolver.as_ref(), |unit| {
            self.build_local_model(unit)
        })
    }

    /// The lowest unit of every root cycle reachable from `seeds`.
    pub fn discover_canonical_auto_configuration<I>(
        &self,
        seeds: I,
        scope: &SearchScope,
    ) -> Vec<ConfigurationUnit>
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        let key: DiscoveryKey = (seeds.into_iter().collect(), scope.clone());
        let canonical = self
            .discoveries
            .get_or_compute(&key, &self.tracker, CROSS_UNIT_DEPS, || {
                let graph = self.model_graph(key.0.iter().cloned(), scope);
                let canonical = Condensation::of(&graph).canonical_units();
                tracing::debug!(
                    target: "beanscope.model",
                    scope = scope.name(),
                    seeds = key.0.len(),
                    canonical = canonical.len(),
                    "selected canonical configuration units"
                );
                canonical
            });
        canonical.as_ref().clone()
    }

    /// Combined models assembled automatically for `scope`.
    ///
    /// Each application entry point gets a model over its import closure.
    /// Without entry points, the canonical units of all candidates form a
    /// single model over their closure. Empty when auto-configuration is
    /// disabled.
    pub fn auto_configured_models(&self, scope: &SearchScope) -> Vec<Arc<CombinedModel>> {
        if !self.config.allow_auto_configuration {
            tracing::debug!(
                target: "beanscope.model",
                scope = scope.name(),
                "auto-configuration disabled"
            );
            return Vec::new();
        }

        let models = self
            .auto_configured
            .get_or_compute(scope, &self.tracker, CROSS_UNIT_DEPS, || {
                self.assemble_auto_configured(scope)
            });
        models.as_ref().clone()
    }

    fn assemble_auto_configured(&self, scope: &SearchScope) -> Vec<Arc<CombinedModel>> {
        let mut candidates: Vec<_> = self
            .resolver
            .candidates(scope)
            .into_iter()
            .filter(|unit| scope.contains(unit))
            .collect();
        candidates.sort();
        candidates.dedup();

        let candidates: Vec<Arc<LocalModel>> = candidates
            .iter()
            .map(|unit| self.build_local_model(unit))
            .filter(|model| !(self.config.exclude_test_sources && model.markers().test_source))
            .collect();
        let profiles = self.profiles.active_profiles(scope);

        let applications: Vec<_> = candidates
            .iter()
            .filter(|model| model.markers().application)
            .collect();
        if !applications.is_empty() {
            tracing::debug!(
                target: "beanscope.model",
                scope = scope.name(),
                applications = applications.len(),
                "assembling application models"
            );
            return applications
                .into_iter()
                .map(|model| {
                    let graph = self.model_graph([model.unit().clone()], scope);
                    self.build_combined_model(graph.expanded().cloned(), &profiles)
                })
                .collect();
        }

        let canonical = self.discover_canonical_auto_configuration(
            candidates.iter().map(|model| model.unit().clone()),
            scope,
        );
        if canonical.is_empty() {
            return Vec::new();
        }
        let graph = self.model_graph(canonical, scope);
        vec![self.build_combined_model(graph.expanded().cloned(), &profiles)]
    }

    /// Application order of the auto-configuration units among `units`.
    pub fn sorted_auto_configuration<I>(&self, units: I, scope: &SearchScope) -> Vec<ConfigurationUnit>
    where
        I: IntoIterator<Item = ConfigurationUnit>,
    {
        let models: Vec<_> = units
            .into_iter()
            .map(|unit| self.build_local_model(&unit))
            .collect();
        AutoConfigSorter::new(
            self.resolver.as_ref(),
            scope,
            self.config.auto_configure_order_default,
        )
        .sort(&models)
    }

    /// Classifies `event` and bumps the tokens it invalidates.
    pub fn apply_edit(&self, event: &EditEvent) -> Verdict {
        let verdict = self.classifier.classify(event);
        let bumped = self.tracker.apply(&verdict);
        tracing::debug!(
            target: "beanscope.model",
            relevance = ?verdict.relevance,
            bumped = bumped.len(),
            "applied edit"
        );
        verdict
    }

    /// Drops entries whose dependencies changed. Returns how many were removed.
    pub fn evict_stale(&self) -> usize {
        self.local_models.evict_stale(&self.tracker)
            + self.combined_models.evict_stale(&self.tracker)
            + self.discoveries.evict_stale(&self.tracker)
            + self.auto_configured.evict_stale(&self.tracker)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            local_models: self.local_models.stats(),
            combined_models: self.combined_models.stats(),
            discoveries: self.discoveries.stats(),
            auto_configured: self.auto_configured.stats(),
        }
    }
}

fn local_model_deps(unit: &ConfigurationUnit) -> Vec<InvalidationDomain> {
    let mut deps = vec![
        InvalidationDomain::Unit(unit.clone()),
        InvalidationDomain::AllUnits,
    ];
    if unit.kind() == UnitKind::XmlDocument {
        // Configuration-file edits are not always attributed to a unit.
        deps.push(InvalidationDomain::ConfigurationFiles);
        deps.push(InvalidationDomain::CustomBeanParsers);
    }
    deps
}
