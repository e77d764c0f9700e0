use std::fmt;

use smol_str::SmolStr;

/// What kind of source artifact a [`ConfigurationUnit`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// A class carrying configuration annotations.
    AnnotatedType,
    /// An XML bean-definition document.
    XmlDocument,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::AnnotatedType => "class",
            UnitKind::XmlDocument => "xml",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a single configuration source.
///
/// The identity never changes when the underlying source is edited; only data
/// derived from it is invalidated. Ordering is the string ordering of the
/// handle, then the kind, which is the tie-break used wherever a stable order
/// is required (canonical selection, diagnostics, test output).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigurationUnit {
    handle: SmolStr,
    kind: UnitKind,
}

impl ConfigurationUnit {
    pub fn new(kind: UnitKind, handle: impl Into<SmolStr>) -> Self {
        Self {
            handle: handle.into(),
            kind,
        }
    }

    /// An annotated class, identified by its fully qualified name.
    pub fn annotated(fqn: impl Into<SmolStr>) -> Self {
        Self::new(UnitKind::AnnotatedType, fqn)
    }

    /// An XML document, identified by its project-relative path.
    pub fn xml(path: impl Into<SmolStr>) -> Self {
        Self::new(UnitKind::XmlDocument, path)
    }

    #[inline]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    #[inline]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Last segment of the handle (`com.example.AppConfig` -> `AppConfig`,
    /// `config/beans.xml` -> `beans.xml`).
    pub fn simple_name(&self) -> &str {
        let handle = self.handle.as_str();
        let sep = match self.kind {
            UnitKind::AnnotatedType => '.',
            UnitKind::XmlDocument => '/',
        };
        handle.rsplit(sep).next().unwrap_or(handle)
    }
}

impl fmt::Display for ConfigurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.handle)
    }
}
