//! Schema registry
//!
//! Classifiers, features, operations and packages live in arenas addressed by
//! the handles of `mof_types::id`. Handles stay valid for the lifetime of the
//! kernel: removing a feature from its class detaches it (its owner becomes
//! `None`) but keeps the record so notifications and stored values that
//! mention it remain meaningful.
//!
//! ## Query order
//!
//! | Query                       | Order                                        |
//! |-----------------------------|----------------------------------------------|
//! | `all_super_types`           | direct supertypes, then each one's ancestors |
//! | `all_structural_features`   | supertypes first, own features last          |
//! | `all_operations`            | supertypes first, own operations last        |
//! | `find_feature`              | own first, then supertypes depth-first       |
//! | `find_operation`            | own first, then supertypes depth-first       |

pub mod bootstrap;
pub mod builder;
pub mod classifier;
pub mod feature;
pub mod operation;
pub mod package;

pub use bootstrap::Builtins;
pub use builder::{ClassBuilder, FeatureBuilder, OperationBuilder};
pub use classifier::{Class, Classifier, ClassifierKind, DataType, EnumLiteral, Enumeration};
pub use feature::{Derivation, Feature, FeatureKind, UNBOUNDED};
pub use operation::{Operation, Parameter};
pub use package::{Annotation, Package};

use crate::error::{KernelError, KernelResult};
use crate::notification::SchemaElement;
use mof_types::{ClassifierId, FeatureId, OperationId, PackageId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Registry of every schema element known to a kernel
#[derive(Debug, Default)]
pub struct Schema {
    classifiers: Vec<Classifier>,
    features: Vec<Feature>,
    operations: Vec<Operation>,
    packages: Vec<Package>,
    packages_by_uri: FxHashMap<String, PackageId>,
}

impl Schema {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc_classifier(&mut self, name: String, kind: ClassifierKind) -> ClassifierId {
        let id = ClassifierId::new(self.classifiers.len() as u32);
        self.classifiers.push(Classifier {
            id,
            name,
            package: None,
            annotations: Vec::new(),
            kind,
        });
        id
    }

    pub(crate) fn alloc_feature(&mut self, builder: FeatureBuilder, owner: ClassifierId) -> FeatureId {
        let id = FeatureId::new(self.features.len() as u32);
        self.features.push(builder.build(id, owner));
        id
    }

    pub(crate) fn alloc_operation(
        &mut self,
        builder: OperationBuilder,
        owner: ClassifierId,
    ) -> OperationId {
        let id = OperationId::new(self.operations.len() as u32);
        self.operations.push(builder.build(id, owner));
        id
    }

    pub(crate) fn alloc_package(&mut self, name: String, ns_uri: String, ns_prefix: String) -> PackageId {
        let id = PackageId::new(self.packages.len() as u32);
        if !ns_uri.is_empty() {
            self.packages_by_uri.insert(ns_uri.clone(), id);
        }
        self.packages.push(Package {
            id,
            name,
            ns_uri,
            ns_prefix,
            classifiers: Vec::new(),
            subpackages: Vec::new(),
            super_package: None,
            annotations: Vec::new(),
        });
        id
    }

    /// Get a classifier
    pub fn classifier(&self, id: ClassifierId) -> KernelResult<&Classifier> {
        self.classifiers
            .get(id.index())
            .ok_or_else(|| KernelError::UnknownClassifier {
                name: id.to_string(),
            })
    }

    pub(crate) fn classifier_mut(&mut self, id: ClassifierId) -> KernelResult<&mut Classifier> {
        self.classifiers
            .get_mut(id.index())
            .ok_or_else(|| KernelError::UnknownClassifier {
                name: id.to_string(),
            })
    }

    /// Get the class data of a classifier
    pub fn class(&self, id: ClassifierId) -> KernelResult<&Class> {
        let classifier = self.classifier(id)?;
        classifier
            .as_class()
            .ok_or_else(|| KernelError::WrongClassifierKind {
                name: classifier.name.clone(),
                expected: "class",
            })
    }

    pub(crate) fn class_mut(&mut self, id: ClassifierId) -> KernelResult<&mut Class> {
        let classifier = self.classifier_mut(id)?;
        let name = classifier.name.clone();
        classifier
            .as_class_mut()
            .ok_or(KernelError::WrongClassifierKind {
                name,
                expected: "class",
            })
    }

    /// Get the enumeration data of a classifier
    pub fn enumeration(&self, id: ClassifierId) -> KernelResult<&Enumeration> {
        let classifier = self.classifier(id)?;
        classifier
            .as_enum()
            .ok_or_else(|| KernelError::WrongClassifierKind {
                name: classifier.name.clone(),
                expected: "enumeration",
            })
    }

    pub(crate) fn enumeration_mut(&mut self, id: ClassifierId) -> KernelResult<&mut Enumeration> {
        let classifier = self.classifier_mut(id)?;
        let name = classifier.name.clone();
        classifier
            .as_enum_mut()
            .ok_or(KernelError::WrongClassifierKind {
                name,
                expected: "enumeration",
            })
    }

    /// Get a feature
    pub fn feature(&self, id: FeatureId) -> KernelResult<&Feature> {
        self.features
            .get(id.index())
            .ok_or_else(|| KernelError::UnknownFeature {
                name: id.to_string(),
            })
    }

    pub(crate) fn feature_mut(&mut self, id: FeatureId) -> KernelResult<&mut Feature> {
        self.features
            .get_mut(id.index())
            .ok_or_else(|| KernelError::UnknownFeature {
                name: id.to_string(),
            })
    }

    /// Get an operation
    pub fn operation(&self, id: OperationId) -> KernelResult<&Operation> {
        self.operations
            .get(id.index())
            .ok_or_else(|| KernelError::UnknownOperation {
                name: id.to_string(),
            })
    }

    pub(crate) fn operation_mut(&mut self, id: OperationId) -> KernelResult<&mut Operation> {
        self.operations
            .get_mut(id.index())
            .ok_or_else(|| KernelError::UnknownOperation {
                name: id.to_string(),
            })
    }

    /// Get a package
    pub fn package(&self, id: PackageId) -> KernelResult<&Package> {
        self.packages
            .get(id.index())
            .ok_or_else(|| KernelError::UnknownPackage {
                name: id.to_string(),
            })
    }

    pub(crate) fn package_mut(&mut self, id: PackageId) -> KernelResult<&mut Package> {
        self.packages
            .get_mut(id.index())
            .ok_or_else(|| KernelError::UnknownPackage {
                name: id.to_string(),
            })
    }

    /// Move a classifier into a package, leaving its previous package
    pub(crate) fn link_classifier(&mut self, package: PackageId, classifier: ClassifierId) {
        let previous = match self.classifiers.get_mut(classifier.index()) {
            Some(c) => c.package.replace(package),
            None => return,
        };
        if let Some(old) = previous.and_then(|p| self.packages.get_mut(p.index())) {
            old.classifiers.retain(|c| *c != classifier);
        }
        if let Some(p) = self.packages.get_mut(package.index()) {
            p.classifiers.push(classifier);
        }
    }

    /// Find a package by namespace URI
    pub fn package_by_uri(&self, ns_uri: &str) -> Option<PackageId> {
        self.packages_by_uri.get(ns_uri).copied()
    }

    /// Find a classifier registered in a package
    pub fn classifier_in(&self, package: PackageId, name: &str) -> Option<ClassifierId> {
        let package = self.packages.get(package.index())?;
        package
            .classifiers
            .iter()
            .copied()
            .find(|c| self.classifiers[c.index()].name == name)
    }

    /// Find the first classifier with a name, registered or not
    pub fn find_classifier(&self, name: &str) -> Option<ClassifierId> {
        self.classifiers.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Number of classifiers
    pub fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    /// Name of a classifier, or its handle when unknown
    pub(crate) fn classifier_name(&self, id: ClassifierId) -> String {
        self.classifiers
            .get(id.index())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Name of a feature, or its handle when unknown
    pub(crate) fn feature_name(&self, id: FeatureId) -> String {
        self.features
            .get(id.index())
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Direct supertypes of a class
    pub fn super_types(&self, class: ClassifierId) -> KernelResult<&[ClassifierId]> {
        Ok(&self.class(class)?.super_types)
    }

    /// All ancestors of a class, deduplicated
    pub fn all_super_types(&self, class: ClassifierId) -> KernelResult<Vec<ClassifierId>> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(class);
        self.collect_super_types(class, &mut seen, &mut out)?;
        Ok(out)
    }

    fn collect_super_types(
        &self,
        class: ClassifierId,
        seen: &mut FxHashSet<ClassifierId>,
        out: &mut Vec<ClassifierId>,
    ) -> KernelResult<()> {
        let supers = self.super_types(class)?;
        let fresh: Vec<ClassifierId> = supers.iter().copied().filter(|s| seen.insert(*s)).collect();
        out.extend_from_slice(&fresh);
        for s in fresh {
            self.collect_super_types(s, seen, out)?;
        }
        Ok(())
    }

    /// Whether `ancestor` is `class` or one of its ancestors
    pub fn conforms_to(&self, class: ClassifierId, ancestor: ClassifierId) -> bool {
        class == ancestor
            || self
                .all_super_types(class)
                .map(|all| all.contains(&ancestor))
                .unwrap_or(false)
    }

    /// Owned structural features of a class
    pub fn structural_features(&self, class: ClassifierId) -> KernelResult<&[FeatureId]> {
        Ok(&self.class(class)?.features)
    }

    /// Owned attributes of a class
    pub fn attributes(&self, class: ClassifierId) -> KernelResult<Vec<FeatureId>> {
        Ok(self.filter_features(self.structural_features(class)?, Feature::is_attribute))
    }

    /// Owned references of a class
    pub fn references(&self, class: ClassifierId) -> KernelResult<Vec<FeatureId>> {
        Ok(self.filter_features(self.structural_features(class)?, Feature::is_reference))
    }

    /// Effective structural features, supertypes first
    pub fn all_structural_features(&self, class: ClassifierId) -> KernelResult<Vec<FeatureId>> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_inherited(class, &mut seen, &mut out, |c| &c.features)?;
        Ok(out)
    }

    /// Effective attributes, supertypes first
    pub fn all_attributes(&self, class: ClassifierId) -> KernelResult<Vec<FeatureId>> {
        Ok(self.filter_features(&self.all_structural_features(class)?, Feature::is_attribute))
    }

    /// Effective references, supertypes first
    pub fn all_references(&self, class: ClassifierId) -> KernelResult<Vec<FeatureId>> {
        Ok(self.filter_features(&self.all_structural_features(class)?, Feature::is_reference))
    }

    /// Owned operations of a class
    pub fn operations(&self, class: ClassifierId) -> KernelResult<&[OperationId]> {
        Ok(&self.class(class)?.operations)
    }

    /// Effective operations, supertypes first
    pub fn all_operations(&self, class: ClassifierId) -> KernelResult<Vec<OperationId>> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_inherited(class, &mut seen, &mut out, |c| &c.operations)?;
        Ok(out)
    }

    fn collect_inherited<T: Copy + PartialEq>(
        &self,
        class: ClassifierId,
        seen: &mut FxHashSet<ClassifierId>,
        out: &mut Vec<T>,
        own: fn(&Class) -> &Vec<T>,
    ) -> KernelResult<()> {
        if !seen.insert(class) {
            return Ok(());
        }
        let data = self.class(class)?;
        for s in &data.super_types {
            self.collect_inherited(*s, seen, out, own)?;
        }
        for item in own(data) {
            if !out.contains(item) {
                out.push(*item);
            }
        }
        Ok(())
    }

    fn filter_features(&self, ids: &[FeatureId], keep: fn(&Feature) -> bool) -> Vec<FeatureId> {
        ids.iter()
            .copied()
            .filter(|id| self.features.get(id.index()).map(keep).unwrap_or(false))
            .collect()
    }

    /// Find a feature by name; subtypes shadow their ancestors
    pub fn find_feature(&self, class: ClassifierId, name: &str) -> Option<FeatureId> {
        let mut seen = FxHashSet::default();
        self.find_inherited(class, &mut seen, &|c| {
            c.features
                .iter()
                .copied()
                .find(|f| self.features[f.index()].name == name)
        })
    }

    /// Find an operation by name; subtypes shadow their ancestors
    pub fn find_operation(&self, class: ClassifierId, name: &str) -> Option<OperationId> {
        let mut seen = FxHashSet::default();
        self.find_inherited(class, &mut seen, &|c| {
            c.operations
                .iter()
                .copied()
                .find(|o| self.operations[o.index()].name == name)
        })
    }

    fn find_inherited<T>(
        &self,
        class: ClassifierId,
        seen: &mut FxHashSet<ClassifierId>,
        own: &dyn Fn(&Class) -> Option<T>,
    ) -> Option<T> {
        if !seen.insert(class) {
            return None;
        }
        let data = self.class(class).ok()?;
        if let Some(found) = own(data) {
            return Some(found);
        }
        data.super_types
            .iter()
            .find_map(|s| self.find_inherited(*s, seen, own))
    }

    /// Annotations of a schema element
    pub fn annotations(&self, element: SchemaElement) -> KernelResult<&[Annotation]> {
        let list = match element {
            SchemaElement::Classifier(id) => &self.classifier(id)?.annotations,
            SchemaElement::Feature(id) => &self.feature(id)?.annotations,
            SchemaElement::Operation(id) => &self.operation(id)?.annotations,
            SchemaElement::Package(id) => &self.package(id)?.annotations,
        };
        Ok(list.as_slice())
    }

    pub(crate) fn annotations_mut(&mut self, element: SchemaElement) -> KernelResult<&mut Vec<Annotation>> {
        Ok(match element {
            SchemaElement::Classifier(id) => &mut self.classifier_mut(id)?.annotations,
            SchemaElement::Feature(id) => &mut self.feature_mut(id)?.annotations,
            SchemaElement::Operation(id) => &mut self.operation_mut(id)?.annotations,
            SchemaElement::Package(id) => &mut self.package_mut(id)?.annotations,
        })
    }

    /// First annotation of an element with the given source
    pub fn annotation(&self, element: SchemaElement, source: &str) -> Option<&Annotation> {
        let annotations = self.annotations(element).ok()?;
        package::find_annotation(annotations, source)
    }
}
