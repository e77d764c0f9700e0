//! Local models: the self-contained contribution of one configuration unit.

use std::collections::HashMap;

use beanscope_core::{
    decapitalize, AliasDeclaration, AutoConfigureMetadata, BeanScope, BeanType,
    ComponentDefinition, Condition, ConfigurationUnit, DeclaredComponent, DeclaredType,
    DefinitionOrigin, ImportRef, ProfileCondition, ProfileExpressionError, ReadError,
    SmolStr, UnitDeclarations, UnitMarkers,
};

/// A non-fatal issue found while building a [`LocalModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelProblem {
    /// A profile expression could not be parsed and was ignored. A condition
    /// left without any valid expression never matches.
    MalformedProfile {
        expression: String,
        error: ProfileExpressionError,
    },
    /// A definition was kept in degraded form.
    DegradedDefinition { name: SmolStr, reason: SmolStr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModel {
    unit: ConfigurationUnit,
    definitions: Vec<ComponentDefinition>,
    imports: Vec<ImportRef>,
    aliases: Vec<AliasDeclaration>,
    profiles: ProfileCondition,
    auto_configure: AutoConfigureMetadata,
    markers: UnitMarkers,
    problems: Vec<ModelProblem>,
    unreadable: Option<ReadError>,
}

impl LocalModel {
    /// Builds the model for `unit` from what the declaration reader reported.
    ///
    /// Imports stay unresolved; nothing outside `declarations` is consulted.
    pub fn build(unit: ConfigurationUnit, declarations: UnitDeclarations) -> Self {
        let UnitDeclarations {
            definitions: declared,
            imports,
            aliases,
            conditions,
            markers,
        } = declarations;

        let mut problems = Vec::new();
        let profiles = parse_profiles(
            conditions
                .iter()
                .filter_map(|condition| match condition {
                    Condition::Profile(expressions) => Some(expressions),
                    _ => None,
                })
                .flatten(),
            &mut problems,
        );
        let auto_configure = AutoConfigureMetadata::from_conditions(&conditions);

        let mut namer = ImplicitNamer::default();
        let definitions = declared
            .into_iter()
            .enumerate()
            .map(|(index, component)| {
                lower_definition(&unit, index, component, &mut namer, &mut problems)
            })
            .collect();

        let imports = imports
            .into_iter()
            .map(|target| ImportRef {
                target,
                declared_in: unit.clone(),
            })
            .collect();

        Self {
            unit,
            definitions,
            imports,
            aliases,
            profiles,
            auto_configure,
            markers,
            problems,
            unreadable: None,
        }
    }

    /// An empty model standing in for a unit the reader could not read.
    pub fn unreadable(unit: ConfigurationUnit, error: ReadError) -> Self {
        Self {
            unreadable: Some(error),
            ..Self::build(unit, UnitDeclarations::default())
        }
    }

    pub fn unit(&self) -> &ConfigurationUnit {
        &self.unit
    }

    pub fn definitions(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    pub fn imports(&self) -> &[ImportRef] {
        &self.imports
    }

    pub fn aliases(&self) -> &[AliasDeclaration] {
        &self.aliases
    }

    /// The unit-level profile gate.
    pub fn profiles(&self) -> &ProfileCondition {
        &self.profiles
    }

    pub fn auto_configure(&self) -> &AutoConfigureMetadata {
        &self.auto_configure
    }

    pub fn markers(&self) -> &UnitMarkers {
        &self.markers
    }

    pub fn problems(&self) -> &[ModelProblem] {
        &self.problems
    }

    pub fn is_unreadable(&self) -> bool {
        self.unreadable.is_some()
    }

    pub fn read_error(&self) -> Option<&ReadError> {
        self.unreadable.as_ref()
    }

    pub fn find_definition(&self, name: &str) -> Option<&ComponentDefinition> {
        self.definitions
            .iter()
            .find(|def| def.names().any(|n| n == name))
    }
}

fn parse_profiles<'a>(
    expressions: impl IntoIterator<Item = &'a String>,
    problems: &mut Vec<ModelProblem>,
) -> ProfileCondition {
    let (condition, errors) = ProfileCondition::parse(expressions);
    problems.extend(
        errors
            .into_iter()
            .map(|(expression, error)| ModelProblem::MalformedProfile { expression, error }),
    );
    condition
}

/// Generates names for definitions that don't declare one.
#[derive(Default)]
struct ImplicitNamer {
    xml_counters: HashMap<SmolStr, usize>,
}

impl ImplicitNamer {
    fn xml_bean(&mut self, class: &str) -> SmolStr {
        let counter = self.xml_counters.entry(SmolStr::new(class)).or_insert(0);
        let name = SmolStr::new(format!("{class}#{counter}"));
        *counter += 1;
        name
    }
}

/// Short class name as used for implicit stereotype names: the package is
/// dropped and nested classes keep their outer name (`a.Outer$Inner` ->
/// `Outer.Inner`).
fn short_class_name(fqn: &str) -> String {
    let simple = fqn.rsplit('.').next().unwrap_or(fqn);
    simple.replace('$', ".")
}

fn lower_definition(
    unit: &ConfigurationUnit,
    index: usize,
    component: DeclaredComponent,
    namer: &mut ImplicitNamer,
    problems: &mut Vec<ModelProblem>,
) -> ComponentDefinition {
    let DeclaredComponent {
        name,
        aliases,
        ty,
        supertypes,
        scope,
        qualifiers,
        primary,
        profiles,
        xml,
    } = component;

    let anonymous = || SmolStr::new(format!("{}#{index}", unit.handle()));
    let origin_for_class = if xml {
        DefinitionOrigin::XmlBean
    } else {
        DefinitionOrigin::Stereotype
    };

    let (implicit_name, bean_type, origin, degraded) = match ty {
        DeclaredType::Class(class) if !class.trim().is_empty() => {
            let implicit = if xml {
                namer.xml_bean(&class)
            } else {
                decapitalize(&short_class_name(&class))
            };
            (implicit, BeanType::Known(class), origin_for_class, None)
        }
        DeclaredType::Class(_) => (
            anonymous(),
            BeanType::Unknown,
            origin_for_class,
            Some(SmolStr::new("missing class")),
        ),
        DeclaredType::FactoryMethod {
            method,
            return_type: Some(return_type),
        } => (
            method.clone(),
            BeanType::Known(return_type),
            DefinitionOrigin::FactoryMethod { method },
            None,
        ),
        DeclaredType::FactoryMethod {
            method,
            return_type: None,
        } => (
            method.clone(),
            BeanType::Unknown,
            DefinitionOrigin::FactoryMethod { method },
            Some(SmolStr::new("factory method return type could not be resolved")),
        ),
        DeclaredType::Unresolved { reason } => {
            (anonymous(), BeanType::Unknown, origin_for_class, Some(reason))
        }
    };

    let explicit_name = name.as_ref().is_some_and(|n| !n.trim().is_empty());
    let name = match name {
        Some(name) if explicit_name => name,
        _ => implicit_name,
    };

    if let Some(reason) = &degraded {
        tracing::debug!(
            target: "beanscope.model",
            unit = %unit,
            name = %name,
            reason = %reason,
            "degraded definition"
        );
        problems.push(ModelProblem::DegradedDefinition {
            name: name.clone(),
            reason: reason.clone(),
        });
    }

    ComponentDefinition {
        profiles: parse_profiles(&profiles, problems),
        name,
        explicit_name,
        aliases,
        ty: bean_type,
        supertypes,
        scope: BeanScope::parse(scope.as_deref()),
        qualifiers,
        primary,
        owner: unit.clone(),
        origin,
        degraded,
    }
}
