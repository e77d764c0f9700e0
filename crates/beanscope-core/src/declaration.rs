use smol_str::SmolStr;

use crate::ConfigurationUnit;

/// What an import/include points at, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportTarget {
    /// A class reference (`@Import(Foo.class)`).
    Type(SmolStr),
    /// A resource location (`<import resource="..."/>`, `@ImportResource`).
    Resource(SmolStr),
}

impl ImportTarget {
    pub fn text(&self) -> &str {
        match self {
            ImportTarget::Type(name) | ImportTarget::Resource(name) => name,
        }
    }
}

/// An unresolved import edge: the tag plus the unit that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportRef {
    pub target: ImportTarget,
    pub declared_in: ConfigurationUnit,
}

/// Declared type information as reported by the declaration reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// A concrete class: stereotype-annotated classes and XML `<bean class=...>`.
    Class(SmolStr),
    /// A factory method; `return_type` is `None` when the reader could not
    /// structurally match the method.
    FactoryMethod {
        method: SmolStr,
        return_type: Option<SmolStr>,
    },
    /// The reader saw a declaration but could not make sense of it.
    Unresolved { reason: SmolStr },
}

/// A component exactly as the declaration reader reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredComponent {
    pub name: Option<SmolStr>,
    pub aliases: Vec<SmolStr>,
    pub ty: DeclaredType,
    /// Direct supertypes (superclass and interfaces) of the component type.
    pub supertypes: Vec<SmolStr>,
    pub scope: Option<SmolStr>,
    pub qualifiers: Vec<SmolStr>,
    pub primary: bool,
    /// Raw `@Profile`-style expressions on the definition itself.
    pub profiles: Vec<String>,
    /// `true` for XML `<bean>` elements.
    pub xml: bool,
}

impl DeclaredComponent {
    pub fn new(ty: DeclaredType) -> Self {
        Self {
            name: None,
            aliases: Vec::new(),
            ty,
            supertypes: Vec::new(),
            scope: None,
            qualifiers: Vec::new(),
            primary: false,
            profiles: Vec::new(),
            xml: false,
        }
    }

    pub fn class(ty: impl Into<SmolStr>) -> Self {
        Self::new(DeclaredType::Class(ty.into()))
    }

    pub fn xml_bean(ty: impl Into<SmolStr>) -> Self {
        Self {
            xml: true,
            ..Self::class(ty)
        }
    }

    pub fn factory_method(method: impl Into<SmolStr>, return_type: Option<&str>) -> Self {
        Self::new(DeclaredType::FactoryMethod {
            method: method.into(),
            return_type: return_type.map(SmolStr::new),
        })
    }

    pub fn named(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.supertypes.extend(supertypes.into_iter().map(Into::into));
        self
    }

    pub fn with_qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.qualifiers.extend(qualifiers.into_iter().map(Into::into));
        self
    }

    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles.extend(profiles.into_iter().map(Into::into));
        self
    }

    pub fn with_scope(mut self, scope: impl Into<SmolStr>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// XML `<alias name="..." alias="..."/>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasDeclaration {
    pub name: SmolStr,
    pub alias: SmolStr,
}

impl AliasDeclaration {
    pub fn new(name: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// Unit-level conditions reported by the declaration reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `@Profile` / `<beans profile=...>` expressions.
    Profile(Vec<String>),
    /// Classes that must be present on the classpath.
    OnClass(Vec<SmolStr>),
    AutoConfigureOrder(i32),
    AutoConfigureAfter(Vec<SmolStr>),
    AutoConfigureBefore(Vec<SmolStr>),
}

/// Override layer of a unit. A child-layer definition shadows a parent-layer
/// definition with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Parent,
    #[default]
    Child,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UnitMarkers {
    /// The unit is an application entry point (`@SpringBootApplication`-like).
    pub application: bool,
    /// The unit lives in test sources.
    pub test_source: bool,
    pub layer: Layer,
}

/// Everything the declaration reader reports for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitDeclarations {
    pub definitions: Vec<DeclaredComponent>,
    pub imports: Vec<ImportTarget>,
    pub aliases: Vec<AliasDeclaration>,
    pub conditions: Vec<Condition>,
    pub markers: UnitMarkers,
}

/// Ordering metadata collected from a unit's conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoConfigureMetadata {
    pub order: Option<i32>,
    pub after: Vec<SmolStr>,
    pub before: Vec<SmolStr>,
    pub on_class: Vec<SmolStr>,
}

impl AutoConfigureMetadata {
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        let mut out = Self::default();
        for condition in conditions {
            match condition {
                Condition::AutoConfigureOrder(order) => out.order = Some(*order),
                Condition::AutoConfigureAfter(names) => extend_unique(&mut out.after, names),
                Condition::AutoConfigureBefore(names) => extend_unique(&mut out.before, names),
                Condition::OnClass(names) => extend_unique(&mut out.on_class, names),
                Condition::Profile(_) => {}
            }
        }
        out
    }
}

fn extend_unique(out: &mut Vec<SmolStr>, names: &[SmolStr]) {
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
}
