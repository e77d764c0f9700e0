use std::sync::Arc;

use beanscope_core::{
    ActiveProfileSet, AliasDeclaration, Condition, ConfigurationUnit, DeclaredComponent,
    ImportTarget, SearchScope, UnitDeclarations,
};
use beanscope_model::NameLookup;
use pretty_assertions::assert_eq;

use super::support::{class, engine, handles, importing, workspace};

fn profiles(names: &[&str]) -> ActiveProfileSet {
    names.iter().copied().collect()
}

fn type_of<'a>(def: Option<&'a beanscope_core::ComponentDefinition>) -> Option<&'a str> {
    def.and_then(|def| def.ty.name())
}

#[test]
fn cycle_plus_isolated_unit_yields_lowest_member_and_isolated_unit() {
    let ws = workspace();
    ws.set_unit(class("com.example.B"), importing(&["com.example.A"]));
    ws.set_unit(class("com.example.A"), importing(&["com.example.B"]));
    ws.set_unit(class("com.example.C"), UnitDeclarations::default());
    let engine = engine(&ws);

    let canonical = engine.discover_canonical_auto_configuration(
        [class("com.example.B"), class("com.example.C"), class("com.example.A")],
        &SearchScope::everything("module"),
    );

    assert_eq!(handles(&canonical), vec!["com.example.A", "com.example.C"]);
}

#[test]
fn profile_specific_definition_overrides_unconditional_one() {
    let ws = workspace();
    let x = class("com.example.X");
    let y = class("com.example.Y");
    ws.set_unit(
        x.clone(),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::factory_method("svc", Some("com.example.Foo"))],
            ..Default::default()
        },
    );
    ws.set_unit(
        y.clone(),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::factory_method(
                "svc",
                Some("com.example.FooTestStub"),
            )],
            conditions: vec![Condition::Profile(vec!["test".to_string()])],
            ..Default::default()
        },
    );
    let engine = engine(&ws);

    let plain = engine.build_combined_model([x.clone(), y.clone()], &profiles(&[]));
    assert_eq!(type_of(plain.find_by_name("svc")), Some("com.example.Foo"));
    assert!(!plain.lookup_name("svc").is_ambiguous());

    let test = engine.build_combined_model([x, y], &profiles(&["test"]));
    assert_eq!(type_of(test.find_by_name("svc")), Some("com.example.FooTestStub"));
}

#[test]
fn definitions_are_filtered_by_active_profiles() {
    let ws = workspace();
    let unit = class("com.example.DevConfig");
    ws.set_unit(
        unit.clone(),
        UnitDeclarations {
            definitions: vec![
                DeclaredComponent::factory_method("devOnly", Some("com.example.DevTool"))
                    .with_profiles(["dev"]),
                DeclaredComponent::factory_method("notProd", Some("com.example.Local"))
                    .with_profiles(["!prod"]),
            ],
            ..Default::default()
        },
    );
    let engine = engine(&ws);

    let prod = engine.build_combined_model([unit.clone()], &profiles(&["prod"]));
    assert!(prod.find_by_name("devOnly").is_none());
    assert!(prod.find_by_name("notProd").is_none());

    let dev = engine.build_combined_model([unit], &profiles(&["dev"]));
    assert!(dev.find_by_name("devOnly").is_some());
    assert!(dev.find_by_name("notProd").is_some());
}

#[test]
fn malformed_and_default_profile_conditions() {
    let ws = workspace();
    let broken = class("com.example.BrokenConfig");
    let fallback = class("com.example.FallbackConfig");
    ws.set_unit(
        broken.clone(),
        UnitDeclarations {
            definitions: vec![
                DeclaredComponent::factory_method("broken", Some("com.example.Broken"))
                    .with_profiles(["dev & | prod"]),
            ],
            conditions: vec![Condition::Profile(vec!["(".into()])],
            ..Default::default()
        },
    );
    ws.set_unit(
        fallback.clone(),
        UnitDeclarations {
            definitions: vec![
                DeclaredComponent::factory_method("fallback", Some("com.example.Fallback"))
                    .with_profiles(["dev & | prod"]),
                DeclaredComponent::factory_method("always", Some("com.example.Always")),
            ],
            conditions: vec![Condition::Profile(vec!["default".into()])],
            ..Default::default()
        },
    );
    let engine = engine(&ws);

    for active in [profiles(&[]), profiles(&["prod"]), profiles(&["dev", "prod"])] {
        let model = engine.build_combined_model([broken.clone(), fallback.clone()], &active);
        assert!(model.find_by_name("broken").is_none());
        assert!(model.find_by_name("fallback").is_none());
        assert!(model.find_by_name("always").is_some());
    }
}

#[test]
fn same_rank_collisions_are_reported_as_ambiguous() {
    let ws = workspace();
    for name in ["com.example.First", "com.example.Second"] {
        ws.set_unit(
            class(name),
            UnitDeclarations {
                definitions: vec![DeclaredComponent::factory_method(
                    "dataSource",
                    Some("javax.sql.DataSource"),
                )],
                ..Default::default()
            },
        );
    }
    let engine = engine(&ws);

    let model = engine.build_combined_model(
        [class("com.example.Second"), class("com.example.First")],
        &ActiveProfileSet::new(),
    );

    let NameLookup::Ambiguous(candidates) = model.lookup_name("dataSource") else {
        panic!("expected an ambiguous lookup");
    };
    assert_eq!(
        handles(candidates.iter().map(|def| &def.owner)),
        vec!["com.example.First", "com.example.Second"]
    );
    assert_eq!(model.ambiguities(), vec!["dataSource"]);
    assert_eq!(
        model.find_by_name("dataSource").map(|def| def.owner.handle()),
        Some("com.example.First")
    );
}

#[test]
fn type_lookup_follows_reported_supertypes_and_alias_chains() {
    let ws = workspace();
    let unit = class("com.example.AppConfig");
    ws.set_unit(
        unit.clone(),
        UnitDeclarations {
            definitions: vec![
                DeclaredComponent::class("com.example.JdbcRepository")
                    .with_supertypes(["com.example.Repository"])
                    .primary(),
                DeclaredComponent::class("com.example.MemoryRepository")
                    .with_supertypes(["com.example.Repository"]),
                DeclaredComponent::factory_method("broken", None),
            ],
            aliases: vec![
                AliasDeclaration::new("jdbcRepository", "repo"),
                AliasDeclaration::new("repo", "store"),
            ],
            ..Default::default()
        },
    );
    ws.set_unit(
        class("com.example.Repository"),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::class("com.example.Repository")
                .with_supertypes(["com.example.Store"])],
            ..Default::default()
        },
    );
    let engine = engine(&ws);
    let model = engine.build_combined_model(
        [unit, class("com.example.Repository")],
        &ActiveProfileSet::new(),
    );

    let repositories: Vec<_> = model
        .find_by_type("com.example.Repository")
        .into_iter()
        .map(|def| def.name.as_str())
        .collect();
    assert_eq!(
        repositories,
        vec!["jdbcRepository", "memoryRepository", "repository"]
    );
    assert_eq!(model.find_by_type("com.example.Store").len(), 3);
    assert_eq!(
        model.find_primary("com.example.Repository").map(|def| def.name.as_str()),
        Some("jdbcRepository")
    );

    let via_alias = model.find_by_name("store");
    assert_eq!(type_of(via_alias), Some("com.example.JdbcRepository"));
    let names = via_alias.map(|def| model.all_names(def)).unwrap_or_default();
    assert_eq!(names, vec!["jdbcRepository", "repo", "store"]);

    assert!(model.find_by_type("java.lang.Object").is_empty());
    assert!(model.find_by_name("broken").is_some_and(|def| def.is_degraded()));
}

#[test]
fn combined_model_depends_only_on_the_unit_set() {
    let ws = workspace();
    let a = class("com.example.A");
    let b = class("com.example.B");
    ws.set_unit(
        a.clone(),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::class("com.example.Alpha")],
            ..Default::default()
        },
    );
    ws.set_unit(
        b.clone(),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::class("com.example.Beta")],
            ..Default::default()
        },
    );

    let first = engine(&ws);
    let forward = first.build_combined_model([a.clone(), b.clone()], &ActiveProfileSet::new());
    let backward =
        first.build_combined_model([b.clone(), a.clone(), b.clone()], &ActiveProfileSet::new());
    assert!(Arc::ptr_eq(&forward, &backward));

    let second = engine(&ws);
    let rebuilt = second.build_combined_model([b, a], &ActiveProfileSet::new());
    let names = |model: &beanscope_model::CombinedModel| -> Vec<String> {
        model
            .all_visible()
            .into_iter()
            .map(|def| def.name.to_string())
            .collect()
    };
    assert_eq!(names(&forward), names(&rebuilt));
    assert_eq!(names(&forward), vec!["alpha", "beta"]);
}

#[test]
fn xml_includes_resolve_to_xml_units() {
    let ws = workspace();
    let config = class("com.example.AppConfig");
    let xml = ConfigurationUnit::xml("META-INF/beans.xml");
    ws.set_unit(
        config.clone(),
        UnitDeclarations {
            imports: vec![ImportTarget::Resource("classpath:/META-INF/beans.xml".into())],
            ..Default::default()
        },
    );
    ws.set_unit(
        xml.clone(),
        UnitDeclarations {
            definitions: vec![
                DeclaredComponent::xml_bean("com.example.Cache"),
                DeclaredComponent::xml_bean("com.example.Cache"),
            ],
            ..Default::default()
        },
    );
    let engine = engine(&ws);
    let scope = SearchScope::everything("module");

    let graph = engine.model_graph([config.clone()], &scope);
    assert_eq!(graph.successors(&config).collect::<Vec<_>>(), vec![&xml]);
    assert_eq!(
        engine.discover_canonical_auto_configuration([config.clone(), xml.clone()], &scope),
        vec![config.clone()]
    );

    let model = engine.build_combined_model(graph.expanded().cloned(), &ActiveProfileSet::new());
    assert!(model.find_by_name("com.example.Cache#0").is_some());
    assert!(model.find_by_name("com.example.Cache#1").is_some());
}

#[test]
fn unreadable_units_contribute_nothing() {
    let ws = workspace();
    let good = class("com.example.Good");
    let gone = class("com.example.Gone");
    ws.set_unit(
        good.clone(),
        UnitDeclarations {
            definitions: vec![DeclaredComponent::class("com.example.Good")],
            imports: vec![ImportTarget::Type("com.example.Gone".into())],
            ..Default::default()
        },
    );
    ws.set_unreadable(gone.clone(), "source vanished");
    let engine = engine(&ws);

    let local = engine.build_local_model(&gone);
    assert!(local.is_unreadable());
    assert!(local.definitions().is_empty());

    let graph = engine.model_graph([good.clone()], &SearchScope::everything("module"));
    assert!(graph.contains(&gone));

    let model = engine.build_combined_model(graph.expanded().cloned(), &ActiveProfileSet::new());
    assert_eq!(
        handles(model.units()),
        vec!["com.example.Gone", "com.example.Good"]
    );
    assert!(model.find_by_name("good").is_some());
}
