//! Packages and annotations

use mof_types::{ClassifierId, PackageId};

/// Namespace holding classifiers and nested packages
#[derive(Debug, Clone)]
pub struct Package {
    pub(crate) id: PackageId,
    pub(crate) name: String,
    pub(crate) ns_uri: String,
    pub(crate) ns_prefix: String,
    pub(crate) classifiers: Vec<ClassifierId>,
    pub(crate) subpackages: Vec<PackageId>,
    pub(crate) super_package: Option<PackageId>,
    pub(crate) annotations: Vec<Annotation>,
}

impl Package {
    /// Package handle
    pub fn id(&self) -> PackageId {
        self.id
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI
    pub fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    /// Namespace prefix
    pub fn ns_prefix(&self) -> &str {
        &self.ns_prefix
    }

    /// Registered classifiers, in registration order
    pub fn classifiers(&self) -> &[ClassifierId] {
        &self.classifiers
    }

    /// Nested packages
    pub fn subpackages(&self) -> &[PackageId] {
        &self.subpackages
    }

    /// Enclosing package
    pub fn super_package(&self) -> Option<PackageId> {
        self.super_package
    }

    /// Attached annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Free-form metadata attached to a schema element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    source: String,
    details: Vec<(String, String)>,
}

impl Annotation {
    /// Create an annotation with no details
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            details: Vec::new(),
        }
    }

    /// Add or replace a detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_detail(key, value);
        self
    }

    /// Add or replace a detail entry in place
    pub fn set_detail(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.details.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.details.push((key, value)),
        }
    }

    /// Annotation source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Look up a detail
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All details, in insertion order
    pub fn details(&self) -> &[(String, String)] {
        &self.details
    }
}

/// First annotation with the given source
pub(crate) fn find_annotation<'a>(annotations: &'a [Annotation], source: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.source == source)
}
