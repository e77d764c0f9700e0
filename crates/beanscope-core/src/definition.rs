use std::fmt;

use smol_str::SmolStr;

use crate::{ConfigurationUnit, ProfileCondition};

/// Resolved type of a component definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BeanType {
    Known(SmolStr),
    /// The declaration was degraded; the type could not be determined.
    Unknown,
}

impl BeanType {
    pub fn name(&self) -> Option<&str> {
        match self {
            BeanType::Known(name) => Some(name),
            BeanType::Unknown => None,
        }
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanType::Known(name) => f.write_str(name),
            BeanType::Unknown => f.write_str("<unknown>"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum BeanScope {
    #[default]
    Singleton,
    Prototype,
    Custom(SmolStr),
}

impl BeanScope {
    pub fn parse(scope: Option<&str>) -> Self {
        match scope.map(str::trim) {
            None | Some("") | Some("singleton") => BeanScope::Singleton,
            Some("prototype") => BeanScope::Prototype,
            Some(other) => BeanScope::Custom(SmolStr::new(other)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BeanScope::Singleton => "singleton",
            BeanScope::Prototype => "prototype",
            BeanScope::Custom(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefinitionOrigin {
    /// A stereotype-annotated class (`@Component`, `@Configuration`, ...).
    Stereotype,
    /// A factory method (`@Bean`).
    FactoryMethod { method: SmolStr },
    /// An XML `<bean>` element.
    XmlBean,
}

/// A component ("bean") definition contributed by exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    /// Effective name: the declared name, or the implicit one.
    pub name: SmolStr,
    /// `false` when `name` was generated by the implicit naming policy.
    pub explicit_name: bool,
    pub aliases: Vec<SmolStr>,
    pub ty: BeanType,
    pub supertypes: Vec<SmolStr>,
    pub scope: BeanScope,
    pub qualifiers: Vec<SmolStr>,
    pub primary: bool,
    pub owner: ConfigurationUnit,
    /// The definition's own profile gate (the unit's gate is applied separately).
    pub profiles: ProfileCondition,
    pub origin: DefinitionOrigin,
    /// Why the definition is degraded, if it is.
    pub degraded: Option<SmolStr>,
}

impl ComponentDefinition {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Name plus aliases declared on the definition itself.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(SmolStr::as_str))
    }

    pub fn has_qualifier(&self, qualifier: &str) -> bool {
        self.name == qualifier || self.qualifiers.iter().any(|q| q == qualifier)
    }
}

/// `java.beans.Introspector#decapitalize`: lower-case the first character,
/// unless the first two characters are both upper-case (`URLService` stays).
pub fn decapitalize(name: &str) -> SmolStr {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return SmolStr::default();
    };
    if let Some(second) = chars.next() {
        if first.is_uppercase() && second.is_uppercase() {
            return SmolStr::new(name);
        }
    }
    let mut out = String::with_capacity(name.len());
    out.extend(first.to_lowercase());
    out.push_str(&name[first.len_utf8()..]);
    SmolStr::new(out)
}
