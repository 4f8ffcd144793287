//! Schema editing
//!
//! Schema elements are edited through the kernel so every edit notifies the
//! edited element. Each class listens to itself with a `ClassUpdater` and
//! each feature with a `FeatureUpdater`, which is how instance types (and so
//! existing objects) follow the schema.

use crate::error::{KernelError, KernelResult};
use crate::instance_type::{ClassUpdater, FeatureUpdater};
use crate::kernel::Kernel;
use crate::notification::{MetaFeature, NotificationKind, SchemaElement};
use crate::schema::builder::TypeRef;
use crate::schema::{
    Annotation, Class, ClassBuilder, ClassifierKind, DataType, Enumeration, Feature, FeatureBuilder, FeatureKind,
    OperationBuilder,
};
use mof_types::{ClassifierId, FeatureId, OperationId, PackageId, Value};
use std::rc::Rc;
use tracing::debug;

impl Kernel {
    // ===== Packages =====

    /// Create a package
    pub fn create_package(
        &mut self,
        name: impl Into<String>,
        ns_uri: impl Into<String>,
        ns_prefix: impl Into<String>,
    ) -> PackageId {
        let name = name.into();
        let ns_uri = ns_uri.into();
        debug!(package = %name, %ns_uri, "package created");
        self.schema.alloc_package(name, ns_uri, ns_prefix.into())
    }

    /// Nest a package, moving it out of its previous parent
    pub fn add_subpackage(&mut self, parent: PackageId, child: PackageId) -> KernelResult<()> {
        self.schema.package(parent)?;
        self.schema.package(child)?;
        let mut ancestor = Some(parent);
        while let Some(package) = ancestor {
            if package == child {
                return Err(KernelError::PackageCycle {
                    package: self.schema.package(child)?.name().to_string(),
                });
            }
            ancestor = self.schema.package(package)?.super_package();
        }

        let mark = self.begin();
        let previous = self.schema.package_mut(child)?.super_package.replace(parent);
        if let Some(previous) = previous {
            self.schema.package_mut(previous)?.subpackages.retain(|p| *p != child);
        }
        self.schema.package_mut(parent)?.subpackages.push(child);
        self.emit_meta(
            parent,
            MetaFeature::Subpackages,
            NotificationKind::Add,
            Value::Null,
            Value::Package(child),
        );
        self.finish(mark)
    }

    /// Register a classifier in a package, moving it out of its previous one
    pub fn register_classifier(&mut self, package: PackageId, classifier: ClassifierId) -> KernelResult<()> {
        self.schema.package(package)?;
        self.schema.classifier(classifier)?;
        let mark = self.begin();
        self.schema.link_classifier(package, classifier);
        self.emit_meta(
            package,
            MetaFeature::Classifiers,
            NotificationKind::Add,
            Value::Null,
            Value::Classifier(classifier),
        );
        self.finish(mark)
    }

    // ===== Classifiers =====

    /// Create an empty concrete class
    pub fn create_class(&mut self, name: impl Into<String>) -> ClassifierId {
        let name = name.into();
        let id = self
            .schema
            .alloc_classifier(name.clone(), ClassifierKind::Class(Class::default()));
        debug!(class = %name, %id, "class created");
        self.types.insert(id, name);
        self.add_eternal_listener(id, Rc::new(ClassUpdater { class: id }));
        id
    }

    /// Create a data type
    pub fn create_data_type(&mut self, name: impl Into<String>, data_type: DataType) -> ClassifierId {
        self.schema
            .alloc_classifier(name.into(), ClassifierKind::DataType(data_type))
    }

    /// Create an enumeration; literal values follow declaration order
    pub fn create_enum<I, S>(&mut self, name: impl Into<String>, literals: I) -> ClassifierId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut enumeration = Enumeration::default();
        for literal in literals {
            enumeration.push(literal.as_ref(), None);
        }
        self.schema
            .alloc_classifier(name.into(), ClassifierKind::Enum(enumeration))
    }

    /// Append a literal; `value` defaults to one past the largest value
    pub fn add_literal(&mut self, enumeration: ClassifierId, name: &str, value: Option<i32>) -> KernelResult<Value> {
        let value = self.schema.enumeration_mut(enumeration)?.push(name, value).value();
        let literal = Value::Literal { enumeration, value };
        let mark = self.begin();
        self.emit_meta(
            enumeration,
            MetaFeature::Literals,
            NotificationKind::Add,
            Value::Null,
            literal.clone(),
        );
        self.finish(mark)?;
        Ok(literal)
    }

    /// Make a literal the enumeration's default
    pub fn set_default_literal(&mut self, enumeration: ClassifierId, name: &str) -> KernelResult<()> {
        if self.schema.enumeration_mut(enumeration)?.set_default(name) {
            Ok(())
        } else {
            Err(self.unknown_literal(enumeration, name))
        }
    }

    /// Literal value by name
    pub fn enum_value(&self, enumeration: ClassifierId, name: &str) -> KernelResult<Value> {
        self.schema
            .enumeration(enumeration)?
            .literal(name)
            .map(|literal| Value::Literal {
                enumeration,
                value: literal.value(),
            })
            .ok_or_else(|| self.unknown_literal(enumeration, name))
    }

    fn unknown_literal(&self, enumeration: ClassifierId, literal: &str) -> KernelError {
        KernelError::UnknownLiteral {
            enumeration: self.schema.classifier_name(enumeration),
            literal: literal.to_string(),
        }
    }

    /// Parse literal text with a data type or enumeration
    pub fn value_from_string(&self, classifier: ClassifierId, text: &str) -> KernelResult<Value> {
        let data = self.schema.classifier(classifier)?;
        match data.kind() {
            ClassifierKind::DataType(data_type) => Ok(data_type.from_string(text)?),
            ClassifierKind::Enum(_) => self.enum_value(classifier, text),
            ClassifierKind::Class(_) => Err(KernelError::WrongClassifierKind {
                name: data.name().to_string(),
                expected: "data type",
            }),
        }
    }

    /// Render a value with a data type or enumeration
    pub fn value_to_string(&self, classifier: ClassifierId, value: &Value) -> KernelResult<String> {
        let data = self.schema.classifier(classifier)?;
        match data.kind() {
            ClassifierKind::DataType(data_type) => Ok(data_type.to_string(value)),
            ClassifierKind::Enum(enumeration) => match value {
                Value::Literal {
                    enumeration: owner,
                    value,
                } if *owner == classifier => enumeration
                    .literal_for(*value)
                    .map(|literal| literal.name().to_string())
                    .ok_or_else(|| self.unknown_literal(classifier, &value.to_string())),
                other => Err(self.unknown_literal(classifier, &self.describe(other))),
            },
            ClassifierKind::Class(_) => Err(KernelError::WrongClassifierKind {
                name: data.name().to_string(),
                expected: "data type",
            }),
        }
    }

    /// Rename a classifier; a class's instance type follows
    pub fn rename_classifier(&mut self, classifier: ClassifierId, name: impl Into<String>) -> KernelResult<()> {
        let name = name.into();
        let old = std::mem::replace(&mut self.schema.classifier_mut(classifier)?.name, name.clone());
        let mark = self.begin();
        self.emit_meta(
            classifier,
            MetaFeature::Name,
            NotificationKind::Set,
            Value::Str(old),
            Value::Str(name),
        );
        self.finish(mark)
    }

    /// Attach an annotation to a schema element
    pub fn annotate(&mut self, element: SchemaElement, annotation: Annotation) -> KernelResult<()> {
        self.schema.annotations_mut(element)?.push(annotation);
        Ok(())
    }

    // ===== Class structure =====

    fn validate_feature(&self, builder: &FeatureBuilder) -> KernelResult<()> {
        if let Some(TypeRef::Classifier(e_type)) = builder.e_type {
            let classifier = self.schema.classifier(e_type)?;
            if builder.reference && !classifier.is_class() {
                return Err(KernelError::WrongClassifierKind {
                    name: classifier.name().to_string(),
                    expected: "class",
                });
            }
        }
        if let Some(opposite) = builder.opposite {
            if !builder.reference {
                return Err(KernelError::NotAReference {
                    feature: builder.name.clone(),
                });
            }
            let opposite = self.schema.feature(opposite)?;
            if !opposite.is_reference() {
                return Err(KernelError::NotAReference {
                    feature: opposite.name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn attach_feature(&mut self, class: ClassifierId, builder: FeatureBuilder) -> FeatureId {
        let opposite = builder.opposite;
        let id = self.schema.alloc_feature(builder, class);
        if let Ok(data) = self.schema.class_mut(class) {
            data.features.push(id);
        }
        self.add_eternal_listener(id, Rc::new(FeatureUpdater { feature: id }));
        if let Some(opposite) = opposite {
            self.pair_opposites(id, opposite);
        }
        id
    }

    fn write_opposite(&mut self, feature: FeatureId, value: Option<FeatureId>) {
        if let Ok(data) = self.schema.feature_mut(feature) {
            if let FeatureKind::Reference { opposite, .. } = &mut data.kind {
                *opposite = value;
            }
        }
    }

    /// Point two references at each other, releasing their old partners
    fn pair_opposites(&mut self, a: FeatureId, b: FeatureId) {
        for (one, other) in [(a, b), (b, a)] {
            let previous = self.schema.feature(one).ok().and_then(Feature::opposite);
            if let Some(previous) = previous {
                let partner = self.schema.feature(previous).ok().and_then(Feature::opposite);
                if previous != other && partner == Some(one) {
                    self.write_opposite(previous, None);
                }
            }
            self.write_opposite(one, Some(other));
        }
    }

    /// Add a structural feature to a class
    ///
    /// Existing instances see the feature immediately and read its default
    /// until it is first set.
    pub fn add_feature(&mut self, class: ClassifierId, builder: FeatureBuilder) -> KernelResult<FeatureId> {
        self.schema.class(class)?;
        self.validate_feature(&builder)?;
        let mark = self.begin();
        let id = self.attach_feature(class, builder);
        self.emit_meta(
            class,
            MetaFeature::StructuralFeatures,
            NotificationKind::Add,
            Value::Null,
            Value::Feature(id),
        );
        self.finish(mark)?;
        Ok(id)
    }

    /// Add several features with a single `AddMany` notification
    pub fn add_features(&mut self, class: ClassifierId, builders: Vec<FeatureBuilder>) -> KernelResult<Vec<FeatureId>> {
        self.schema.class(class)?;
        for builder in &builders {
            self.validate_feature(builder)?;
        }
        let mark = self.begin();
        let ids = self.attach_features(class, builders);
        self.finish(mark)?;
        Ok(ids)
    }

    fn attach_features(&mut self, class: ClassifierId, builders: Vec<FeatureBuilder>) -> Vec<FeatureId> {
        let ids: Vec<FeatureId> = builders
            .into_iter()
            .map(|builder| self.attach_feature(class, builder))
            .collect();
        match ids.as_slice() {
            [] => {}
            [single] => self.emit_meta(
                class,
                MetaFeature::StructuralFeatures,
                NotificationKind::Add,
                Value::Null,
                Value::Feature(*single),
            ),
            many => {
                let list = many.iter().copied().map(Value::Feature).collect();
                self.emit_meta(
                    class,
                    MetaFeature::StructuralFeatures,
                    NotificationKind::AddMany,
                    Value::Null,
                    Value::List(list),
                );
            }
        }
        ids
    }

    /// Detach a feature from its class
    ///
    /// The feature record stays valid but no instance exposes it anymore.
    pub fn remove_feature(&mut self, class: ClassifierId, feature: FeatureId) -> KernelResult<()> {
        let Some(position) = self.schema.class(class)?.features.iter().position(|f| *f == feature) else {
            return Err(KernelError::UnknownFeature {
                name: self.schema.feature_name(feature),
            });
        };
        let mark = self.begin();
        self.schema.class_mut(class)?.features.remove(position);
        self.schema.feature_mut(feature)?.owner = None;
        self.emit_meta(
            class,
            MetaFeature::StructuralFeatures,
            NotificationKind::Remove,
            Value::Feature(feature),
            Value::Null,
        );
        self.finish(mark)
    }

    /// Rename a feature; accessor slots follow unless the class is static
    pub fn rename_feature(&mut self, feature: FeatureId, name: impl Into<String>) -> KernelResult<()> {
        let name = name.into();
        let old = std::mem::replace(&mut self.schema.feature_mut(feature)?.name, name.clone());
        let mark = self.begin();
        self.emit_meta(
            feature,
            MetaFeature::Name,
            NotificationKind::Set,
            Value::Str(old),
            Value::Str(name),
        );
        self.finish(mark)
    }

    /// Declare two references as each other's opposite
    ///
    /// Previous partners are released. Links already stored in objects are
    /// not rewritten.
    pub fn set_opposite(&mut self, a: FeatureId, b: FeatureId) -> KernelResult<()> {
        for feature in [a, b] {
            let data = self.schema.feature(feature)?;
            if !data.is_reference() {
                return Err(KernelError::NotAReference {
                    feature: data.name().to_string(),
                });
            }
        }
        let old_a = self.schema.feature(a)?.opposite();
        let old_b = self.schema.feature(b)?.opposite();
        let mark = self.begin();
        self.pair_opposites(a, b);
        for (feature, old, new) in [(a, old_a, b), (b, old_b, a)] {
            self.emit_meta(
                feature,
                MetaFeature::Opposite,
                NotificationKind::Set,
                old.map(Value::Feature).unwrap_or(Value::Null),
                Value::Feature(new),
            );
        }
        self.finish(mark)
    }

    fn validate_operation(&self, builder: &OperationBuilder) -> KernelResult<()> {
        for parameter in &builder.parameters {
            if let Some(e_type) = parameter.e_type() {
                self.schema.classifier(e_type)?;
            }
        }
        Ok(())
    }

    fn attach_operation(&mut self, class: ClassifierId, builder: OperationBuilder) -> OperationId {
        let id = self.schema.alloc_operation(builder, class);
        if let Ok(data) = self.schema.class_mut(class) {
            data.operations.push(id);
        }
        self.emit_meta(
            class,
            MetaFeature::Operations,
            NotificationKind::Add,
            Value::Null,
            Value::Operation(id),
        );
        id
    }

    /// Add an operation; instances get a stub that fails until implemented
    pub fn add_operation(&mut self, class: ClassifierId, builder: OperationBuilder) -> KernelResult<OperationId> {
        self.schema.class(class)?;
        self.validate_operation(&builder)?;
        let mark = self.begin();
        let id = self.attach_operation(class, builder);
        self.finish(mark)?;
        Ok(id)
    }

    /// Detach an operation from its class
    pub fn remove_operation(&mut self, class: ClassifierId, operation: OperationId) -> KernelResult<()> {
        let Some(position) = self
            .schema
            .class(class)?
            .operations
            .iter()
            .position(|o| *o == operation)
        else {
            return Err(KernelError::UnknownOperation {
                name: operation.to_string(),
            });
        };
        let mark = self.begin();
        self.schema.class_mut(class)?.operations.remove(position);
        self.schema.operation_mut(operation)?.owner = None;
        self.emit_meta(
            class,
            MetaFeature::Operations,
            NotificationKind::Remove,
            Value::Operation(operation),
            Value::Null,
        );
        self.finish(mark)
    }

    // ===== Inheritance =====

    /// Append a supertype
    ///
    /// Existing instances see the inherited features and operations at
    /// once. Adding a supertype already present is a no-op.
    pub fn add_super_type(&mut self, class: ClassifierId, super_type: ClassifierId) -> KernelResult<()> {
        self.schema.class(super_type)?;
        if self.schema.super_types(class)?.contains(&super_type) {
            return Ok(());
        }
        if super_type == class || self.schema.conforms_to(super_type, class) {
            return Err(KernelError::CyclicInheritance {
                class: self.schema.classifier_name(class),
                super_type: self.schema.classifier_name(super_type),
            });
        }
        let mark = self.begin();
        self.push_super_type(class, super_type);
        self.finish(mark)
    }

    fn push_super_type(&mut self, class: ClassifierId, super_type: ClassifierId) {
        if let Ok(data) = self.schema.class_mut(class) {
            data.super_types.push(super_type);
        }
        self.emit_meta(
            class,
            MetaFeature::SuperTypes,
            NotificationKind::Add,
            Value::Null,
            Value::Classifier(super_type),
        );
    }

    /// Remove a direct supertype
    pub fn remove_super_type(&mut self, class: ClassifierId, super_type: ClassifierId) -> KernelResult<()> {
        let Some(position) = self
            .schema
            .super_types(class)?
            .iter()
            .position(|s| *s == super_type)
        else {
            return Err(KernelError::ValueNotFound {
                feature: format!("{}.super_types", self.schema.classifier_name(class)),
                value: self.schema.classifier_name(super_type),
            });
        };
        let mark = self.begin();
        self.schema.class_mut(class)?.super_types.remove(position);
        self.emit_meta(
            class,
            MetaFeature::SuperTypes,
            NotificationKind::Remove,
            Value::Classifier(super_type),
            Value::Null,
        );
        self.finish(mark)
    }

    /// Mark a class abstract or concrete
    pub fn set_abstract(&mut self, class: ClassifierId, is_abstract: bool) -> KernelResult<()> {
        let old = std::mem::replace(&mut self.schema.class_mut(class)?.is_abstract, is_abstract);
        let mark = self.begin();
        self.emit_meta(
            class,
            MetaFeature::Abstract,
            NotificationKind::Set,
            Value::Bool(old),
            Value::Bool(is_abstract),
        );
        self.finish(mark)
    }

    /// Build a class with its supertypes, features and operations
    ///
    /// Everything is validated before the class is created. A class built
    /// with `static_type()` keeps the instance type it has at the end of
    /// this call: later schema edits no longer reach its instances.
    pub fn define_class(&mut self, builder: ClassBuilder) -> KernelResult<ClassifierId> {
        for super_type in &builder.super_types {
            self.schema.class(*super_type)?;
        }
        if let Some(package) = builder.package {
            self.schema.package(package)?;
        }
        for feature in &builder.features {
            self.validate_feature(feature)?;
        }
        for operation in &builder.operations {
            self.validate_operation(operation)?;
        }

        let ClassBuilder {
            name,
            super_types,
            is_abstract,
            interface,
            features,
            operations,
            static_type,
            package,
            annotations,
        } = builder;

        let mark = self.begin();
        let class = self.create_class(name);
        if let Ok(data) = self.schema.classifier_mut(class) {
            data.annotations = annotations;
        }
        if let Ok(data) = self.schema.class_mut(class) {
            data.is_abstract = is_abstract;
            data.interface = interface;
        }
        for super_type in super_types {
            if !self.schema.super_types(class)?.contains(&super_type) {
                self.push_super_type(class, super_type);
            }
        }
        self.attach_features(class, features);
        for operation in operations {
            self.attach_operation(class, operation);
        }
        if let Some(package) = package {
            self.schema.link_classifier(package, class);
            self.emit_meta(
                package,
                MetaFeature::Classifiers,
                NotificationKind::Add,
                Value::Null,
                Value::Classifier(class),
            );
        }
        if static_type {
            if let Ok(data) = self.schema.class_mut(class) {
                data.static_type = true;
            }
            self.types.freeze(class);
        }
        self.finish(mark)?;
        Ok(class)
    }
}
