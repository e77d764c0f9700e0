//! Edit classification.
//!
//! Hosts describe source edits as [`EditEvent`]s; a classifier answers whether
//! the edit can change what the declaration reader reports. Most keystrokes
//! land inside method bodies and must not invalidate anything.

use beanscope_core::ConfigurationUnit;

/// Kind of file an edit happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A source file that declares classes.
    ClassSource,
    Xml,
    Properties,
    Yaml,
    /// Strategy registration files (`META-INF/spring.factories`-like).
    StrategyRegistration,
    Html,
    JavaScript,
    Jsp,
    PlainText,
    Other,
}

impl FileKind {
    pub fn is_configuration(self) -> bool {
        matches!(
            self,
            FileKind::Xml | FileKind::Properties | FileKind::Yaml | FileKind::StrategyRegistration
        )
    }

    /// File types whose disk events never affect models.
    fn is_ignored_on_disk(self) -> bool {
        matches!(self, FileKind::Html | FileKind::JavaScript | FileKind::Jsp)
    }
}

/// Owner of a modifier list (and so of the annotations inside it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierOwner {
    Class,
    Method,
    Field,
    Parameter,
    LocalVariable,
    Unknown,
}

impl ModifierOwner {
    fn is_declaration_relevant(self) -> bool {
        matches!(
            self,
            ModifierOwner::Class | ModifierOwner::Method | ModifierOwner::Unknown
        )
    }
}

/// Shape of a syntax element touched by a tree edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    File,
    ImportList,
    ImportStatement,
    Class,
    ModifierList(ModifierOwner),
    Annotation,
    Method,
    Field,
    Parameter,
    LocalVariable,
    CodeBlock,
    Statement,
    Expression,
    Comment,
    Other,
}

impl ElementKind {
    fn is_import(self) -> bool {
        matches!(self, ElementKind::ImportList | ElementKind::ImportStatement)
    }

    fn as_owner(self) -> Option<ModifierOwner> {
        match self {
            ElementKind::ModifierList(owner) => Some(owner),
            ElementKind::Class => Some(ModifierOwner::Class),
            ElementKind::Method => Some(ModifierOwner::Method),
            ElementKind::Field => Some(ModifierOwner::Field),
            ElementKind::Parameter => Some(ModifierOwner::Parameter),
            ElementKind::LocalVariable => Some(ModifierOwner::LocalVariable),
            _ => None,
        }
    }
}

/// A change inside a parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEdit {
    pub file: FileKind,
    /// Units declared by the edited file, when the host knows them.
    pub units: Vec<ConfigurationUnit>,
    /// `None` when the host cannot tell where the change happened.
    pub parent: Option<ElementKind>,
    pub child: Option<ElementKind>,
    pub old_child: Option<ElementKind>,
    pub new_child: Option<ElementKind>,
    /// Elements enclosing `parent`, innermost first.
    pub ancestors: Vec<ElementKind>,
    /// Bulk notification that carries no structure.
    pub generic: bool,
}

impl TreeEdit {
    pub fn in_file(file: FileKind) -> Self {
        Self {
            file,
            units: Vec::new(),
            parent: None,
            child: None,
            old_child: None,
            new_child: None,
            ancestors: Vec::new(),
            generic: false,
        }
    }

    pub fn parent(mut self, parent: ElementKind) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn child(mut self, child: ElementKind) -> Self {
        self.child = Some(child);
        self
    }

    /// A replacement of `old` by `new`.
    pub fn replaced(mut self, old: ElementKind, new: ElementKind) -> Self {
        self.child = Some(old);
        self.old_child = Some(old);
        self.new_child = Some(new);
        self
    }

    pub fn ancestors(mut self, ancestors: impl IntoIterator<Item = ElementKind>) -> Self {
        self.ancestors.extend(ancestors);
        self
    }

    pub fn units(mut self, units: impl IntoIterator<Item = ConfigurationUnit>) -> Self {
        self.units.extend(units);
        self
    }

    pub fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    fn touches(&self, pred: impl Fn(ElementKind) -> bool) -> bool {
        [self.child, self.old_child, self.new_child]
            .into_iter()
            .flatten()
            .any(pred)
    }

    /// Owner of the nearest annotation enclosing the change, if any.
    fn enclosing_annotation_owner(&self) -> Option<ModifierOwner> {
        let mut chain = self.parent.into_iter().chain(self.ancestors.iter().copied());
        chain.by_ref().find(|kind| *kind == ElementKind::Annotation)?;
        let owner = chain
            .find(|kind| *kind != ElementKind::Annotation && kind.as_owner().is_some())
            .and_then(ElementKind::as_owner);
        Some(owner.unwrap_or(ModifierOwner::Unknown))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileSystemChange {
    Created,
    Deleted,
    Moved,
    Renamed,
    /// Content changed on disk without a parsed tree event.
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEvent {
    pub change: FileSystemChange,
    pub file: FileKind,
    pub is_directory: bool,
    /// Whether the file is inside a project content root.
    pub in_content: bool,
    pub units: Vec<ConfigurationUnit>,
}

impl FileSystemEvent {
    pub fn new(change: FileSystemChange, file: FileKind) -> Self {
        Self {
            change,
            file,
            is_directory: false,
            in_content: true,
            units: Vec::new(),
        }
    }

    pub fn directory(change: FileSystemChange) -> Self {
        Self {
            is_directory: true,
            ..Self::new(change, FileKind::Other)
        }
    }

    pub fn outside_content(mut self) -> Self {
        self.in_content = false;
        self
    }

    pub fn units(mut self, units: impl IntoIterator<Item = ConfigurationUnit>) -> Self {
        self.units.extend(units);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Tree(TreeEdit),
    FileSystem(FileSystemEvent),
}

impl From<TreeEdit> for EditEvent {
    fn from(edit: TreeEdit) -> Self {
        EditEvent::Tree(edit)
    }
}

impl From<FileSystemEvent> for EditEvent {
    fn from(event: FileSystemEvent) -> Self {
        EditEvent::FileSystem(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relevance {
    Structural,
    ConfigurationFile,
    Irrelevant,
}

/// Outcome of classifying one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub relevance: Relevance,
    /// Units whose local models are affected. Empty for a structural verdict
    /// means "could be any unit".
    pub units: Vec<ConfigurationUnit>,
}

impl Verdict {
    pub fn structural(units: Vec<ConfigurationUnit>) -> Self {
        Self {
            relevance: Relevance::Structural,
            units,
        }
    }

    pub fn configuration_file(units: Vec<ConfigurationUnit>) -> Self {
        Self {
            relevance: Relevance::ConfigurationFile,
            units,
        }
    }

    pub fn irrelevant() -> Self {
        Self {
            relevance: Relevance::Irrelevant,
            units: Vec::new(),
        }
    }

    pub fn is_irrelevant(&self) -> bool {
        self.relevance == Relevance::Irrelevant
    }
}

pub trait EditClassifier: Send + Sync {
    fn classify(&self, event: &EditEvent) -> Verdict;
}

/// The built-in classification rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEditClassifier;

impl EditClassifier for DefaultEditClassifier {
    fn classify(&self, event: &EditEvent) -> Verdict {
        match event {
            EditEvent::Tree(edit) => classify_tree_edit(edit),
            EditEvent::FileSystem(event) => classify_file_system_event(event),
        }
    }
}

fn classify_tree_edit(edit: &TreeEdit) -> Verdict {
    if edit.file.is_configuration() {
        return Verdict::configuration_file(edit.units.clone());
    }
    if edit.file != FileKind::ClassSource || edit.generic {
        return Verdict::irrelevant();
    }

    let Some(parent) = edit.parent else {
        return Verdict::structural(edit.units.clone());
    };

    if is_structural_change(edit, parent) {
        Verdict::structural(edit.units.clone())
    } else {
        Verdict::irrelevant()
    }
}

fn is_structural_change(edit: &TreeEdit, parent: ElementKind) -> bool {
    if let ElementKind::ModifierList(owner) = parent {
        if edit.touches(|kind| kind == ElementKind::Annotation) {
            return owner.is_declaration_relevant();
        }
        if owner == ModifierOwner::Class {
            return true;
        }
    }

    if parent == ElementKind::Class
        && edit.touches(|kind| matches!(kind, ElementKind::Class | ElementKind::Method))
    {
        return true;
    }

    if parent.is_import()
        || edit.touches(ElementKind::is_import)
        || edit.ancestors.iter().any(|kind| kind.is_import())
    {
        return true;
    }

    edit.enclosing_annotation_owner()
        .is_some_and(ModifierOwner::is_declaration_relevant)
}

fn classify_file_system_event(event: &FileSystemEvent) -> Verdict {
    if !event.in_content {
        return Verdict::irrelevant();
    }

    if event.change == FileSystemChange::Modified {
        if event.is_directory {
            return Verdict::irrelevant();
        }
        let ambiguous = TreeEdit::in_file(event.file).units(event.units.iter().cloned());
        return classify_tree_edit(&ambiguous);
    }

    if event.is_directory {
        return Verdict::structural(Vec::new());
    }
    if event.file.is_ignored_on_disk() {
        return Verdict::irrelevant();
    }
    if event.file.is_configuration() {
        Verdict::configuration_file(event.units.clone())
    } else {
        Verdict::structural(event.units.clone())
    }
}
