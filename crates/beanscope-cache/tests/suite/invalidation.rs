use beanscope_cache::{
    DefaultEditClassifier, EditClassifier, EditEvent, ElementKind, EntryState, FileKind,
    FileSystemChange, FileSystemEvent, InvalidationDomain, ModificationTracker, TreeEdit,
    VersionedCache,
};
use beanscope_core::ConfigurationUnit;
use pretty_assertions::assert_eq;

fn local_deps(unit: &ConfigurationUnit) -> Vec<InvalidationDomain> {
    vec![
        InvalidationDomain::Unit(unit.clone()),
        InvalidationDomain::AllUnits,
    ]
}

fn apply(tracker: &ModificationTracker, event: impl Into<EditEvent>) {
    let verdict = DefaultEditClassifier.classify(&event.into());
    tracker.apply(&verdict);
}

#[test]
fn method_body_edit_keeps_entries_fresh() {
    let tracker = ModificationTracker::new();
    let cache: VersionedCache<ConfigurationUnit, u32> = VersionedCache::new("local");
    let unit = ConfigurationUnit::annotated("com.example.AppConfig");
    cache.get_or_compute(&unit, &tracker, &local_deps(&unit), || 1);

    let before = tracker.stamp(&[InvalidationDomain::Structural]);
    apply(
        &tracker,
        TreeEdit::in_file(FileKind::ClassSource)
            .units([unit.clone()])
            .parent(ElementKind::CodeBlock)
            .child(ElementKind::Statement)
            .ancestors([ElementKind::Method, ElementKind::Class]),
    );

    assert!(before.is_current(&tracker));
    assert_eq!(cache.entry_state(&unit, &tracker), EntryState::Fresh);
}

#[test]
fn structural_edit_invalidates_only_the_owning_unit() {
    let tracker = ModificationTracker::new();
    let cache: VersionedCache<ConfigurationUnit, u32> = VersionedCache::new("local");
    let edited = ConfigurationUnit::annotated("com.example.A");
    let other = ConfigurationUnit::annotated("com.example.B");
    cache.get_or_compute(&edited, &tracker, &local_deps(&edited), || 1);
    cache.get_or_compute(&other, &tracker, &local_deps(&other), || 2);

    apply(
        &tracker,
        TreeEdit::in_file(FileKind::ClassSource)
            .units([edited.clone()])
            .parent(ElementKind::Class)
            .child(ElementKind::Method),
    );

    assert_eq!(tracker.current(&InvalidationDomain::Structural), 1);
    assert_eq!(cache.entry_state(&edited, &tracker), EntryState::Stale);
    assert_eq!(cache.entry_state(&other, &tracker), EntryState::Fresh);

    let value = cache.get_or_compute(&edited, &tracker, &local_deps(&edited), || 10);
    assert_eq!(*value, 10);
}

#[test]
fn unattributed_structural_edit_invalidates_every_unit() {
    let tracker = ModificationTracker::new();
    let cache: VersionedCache<ConfigurationUnit, u32> = VersionedCache::new("local");
    let a = ConfigurationUnit::annotated("a.A");
    let b = ConfigurationUnit::xml("b.xml");
    cache.get_or_compute(&a, &tracker, &local_deps(&a), || 1);
    cache.get_or_compute(&b, &tracker, &local_deps(&b), || 2);

    apply(&tracker, FileSystemEvent::directory(FileSystemChange::Deleted));

    assert_eq!(cache.entry_state(&a, &tracker), EntryState::Stale);
    assert_eq!(cache.entry_state(&b, &tracker), EntryState::Stale);
    assert_eq!(cache.evict_stale(&tracker), 2);
    assert!(cache.is_empty());
}

#[test]
fn configuration_file_edit_bumps_configuration_token_strictly() {
    let tracker = ModificationTracker::new();
    let xml = ConfigurationUnit::xml("META-INF/beans.xml");
    let combined_deps = [
        InvalidationDomain::Structural,
        InvalidationDomain::ConfigurationFiles,
    ];
    let stamp = tracker.stamp(&combined_deps);

    apply(
        &tracker,
        TreeEdit::in_file(FileKind::Xml)
            .units([xml.clone()])
            .parent(ElementKind::Other),
    );

    assert!(!stamp.is_current(&tracker));
    assert_eq!(tracker.current(&InvalidationDomain::ConfigurationFiles), 1);
    assert_eq!(tracker.current(&InvalidationDomain::Unit(xml)), 1);
    assert_eq!(tracker.current(&InvalidationDomain::Structural), 0);
}
