//! Declarative definitions for features, operations and classes
//!
//! Builders collect a definition with chained calls and are consumed by
//! `Kernel::add_feature`, `Kernel::add_operation` and `Kernel::define_class`:
//!
//! ```ignore
//! let node = kernel.define_class(
//!     ClassBuilder::new("Node")
//!         .feature(FeatureBuilder::attribute("name", builtins.e_string))
//!         .feature(FeatureBuilder::reference_to_owner("children").many().containment()),
//! )?;
//! ```

use crate::kernel::Kernel;
use crate::schema::feature::{Derivation, Feature, FeatureKind, UNBOUNDED};
use crate::schema::operation::{Operation, Parameter};
use crate::schema::Annotation;
use mof_types::{ClassifierId, FeatureId, ObjectId, OperationId, PackageId, Value};

/// Declared type of a feature under construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeRef {
    Classifier(ClassifierId),
    /// The class that receives the feature
    Owner,
}

/// Definition of a structural feature
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    pub(crate) name: String,
    pub(crate) e_type: Option<TypeRef>,
    pub(crate) reference: bool,
    lower: i32,
    upper: i32,
    ordered: bool,
    unique: bool,
    changeable: bool,
    volatile: bool,
    transient: bool,
    unsettable: bool,
    derived: bool,
    default_value: Option<Value>,
    derivation: Option<Derivation>,
    id: bool,
    containment: bool,
    resolve_proxies: bool,
    pub(crate) opposite: Option<FeatureId>,
    annotations: Vec<Annotation>,
}

impl FeatureBuilder {
    fn base(name: String, e_type: Option<TypeRef>, reference: bool) -> Self {
        Self {
            name,
            e_type,
            reference,
            lower: 0,
            upper: 1,
            ordered: true,
            unique: true,
            changeable: true,
            volatile: false,
            transient: false,
            unsettable: false,
            derived: false,
            default_value: None,
            derivation: None,
            id: false,
            containment: false,
            resolve_proxies: true,
            opposite: None,
            annotations: Vec::new(),
        }
    }

    /// Attribute of the given data type
    pub fn attribute(name: impl Into<String>, e_type: ClassifierId) -> Self {
        Self::base(name.into(), Some(TypeRef::Classifier(e_type)), false)
    }

    /// Attribute accepting any value
    pub fn untyped_attribute(name: impl Into<String>) -> Self {
        Self::base(name.into(), None, false)
    }

    /// Reference to instances of the given class
    pub fn reference(name: impl Into<String>, e_type: ClassifierId) -> Self {
        Self::base(name.into(), Some(TypeRef::Classifier(e_type)), true)
    }

    /// Reference to instances of the class that receives the feature
    pub fn reference_to_owner(name: impl Into<String>) -> Self {
        Self::base(name.into(), Some(TypeRef::Owner), true)
    }

    /// Unbounded upper bound
    pub fn many(mut self) -> Self {
        self.upper = UNBOUNDED;
        self
    }

    /// Explicit bounds
    pub fn bounds(mut self, lower: i32, upper: i32) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Lower bound of one
    pub fn required(mut self) -> Self {
        self.lower = self.lower.max(1);
        self
    }

    /// Drop insertion order (set or bag semantics)
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    /// Allow duplicates (list or bag semantics)
    pub fn non_unique(mut self) -> Self {
        self.unique = false;
        self
    }

    /// Owner owns the referenced objects
    pub fn containment(mut self) -> Self {
        self.containment = true;
        self
    }

    /// Computed, read-only feature with no computation (empty or null)
    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Computed, read-only feature
    pub fn derived_with(
        mut self,
        compute: impl Fn(&Kernel, ObjectId) -> Vec<Value> + 'static,
    ) -> Self {
        self.derived = true;
        self.derivation = Some(Derivation::new(compute));
        self
    }

    /// Mark volatile
    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    /// Mark transient
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Mark unsettable
    pub fn unsettable(mut self) -> Self {
        self.unsettable = true;
        self
    }

    /// Mark not changeable
    pub fn read_only(mut self) -> Self {
        self.changeable = false;
        self
    }

    /// Explicit default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Mark the attribute as identifier
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Keep stored proxies unresolved on access
    pub fn no_proxy_resolution(mut self) -> Self {
        self.resolve_proxies = false;
        self
    }

    /// Pair with an existing reference
    pub fn opposite(mut self, opposite: FeatureId) -> Self {
        self.opposite = Some(opposite);
        self
    }

    /// Attach an annotation
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub(crate) fn build(self, id: FeatureId, owner: ClassifierId) -> Feature {
        let e_type = self.e_type.map(|t| match t {
            TypeRef::Classifier(c) => c,
            TypeRef::Owner => owner,
        });
        let kind = if self.reference {
            FeatureKind::Reference {
                containment: self.containment,
                opposite: None,
                resolve_proxies: self.resolve_proxies,
            }
        } else {
            FeatureKind::Attribute { id: self.id }
        };
        Feature {
            id,
            name: self.name,
            owner: Some(owner),
            e_type,
            lower: self.lower,
            upper: self.upper,
            ordered: self.ordered,
            unique: self.unique,
            changeable: self.changeable,
            volatile: self.volatile,
            transient: self.transient,
            unsettable: self.unsettable,
            derived: self.derived,
            default_value: self.default_value,
            derivation: self.derivation,
            annotations: self.annotations,
            kind,
        }
    }
}

/// Definition of an operation
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    name: String,
    e_type: Option<ClassifierId>,
    pub(crate) parameters: Vec<Parameter>,
    exceptions: Vec<ClassifierId>,
    annotations: Vec<Annotation>,
}

impl OperationBuilder {
    /// Operation with no parameters and no return type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            e_type: None,
            parameters: Vec::new(),
            exceptions: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Set the return type
    pub fn returns(mut self, e_type: ClassifierId) -> Self {
        self.e_type = Some(e_type);
        self
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>, e_type: ClassifierId) -> Self {
        self.parameters.push(Parameter::new(name, Some(e_type)));
        self
    }

    /// Add an optional parameter
    pub fn optional_param(mut self, name: impl Into<String>, e_type: ClassifierId) -> Self {
        self.parameters.push(Parameter::new(name, Some(e_type)).optional());
        self
    }

    /// Add a required parameter accepting any value
    pub fn untyped_param(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(name, None));
        self
    }

    /// Declare an exception type
    pub fn raises(mut self, e_type: ClassifierId) -> Self {
        self.exceptions.push(e_type);
        self
    }

    /// Attach an annotation
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub(crate) fn build(self, id: OperationId, owner: ClassifierId) -> Operation {
        Operation {
            id,
            name: self.name,
            owner: Some(owner),
            e_type: self.e_type,
            parameters: self.parameters,
            exceptions: self.exceptions,
            annotations: self.annotations,
        }
    }
}

/// Definition of a whole class
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) super_types: Vec<ClassifierId>,
    pub(crate) is_abstract: bool,
    pub(crate) interface: bool,
    pub(crate) features: Vec<FeatureBuilder>,
    pub(crate) operations: Vec<OperationBuilder>,
    pub(crate) static_type: bool,
    pub(crate) package: Option<PackageId>,
    pub(crate) annotations: Vec<Annotation>,
}

impl ClassBuilder {
    /// Empty concrete class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_types: Vec::new(),
            is_abstract: false,
            interface: false,
            features: Vec::new(),
            operations: Vec::new(),
            static_type: false,
            package: None,
            annotations: Vec::new(),
        }
    }

    /// Add a supertype
    pub fn extends(mut self, super_type: ClassifierId) -> Self {
        self.super_types.push(super_type);
        self
    }

    /// Mark abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark as interface (implies abstract)
    pub fn interface(mut self) -> Self {
        self.interface = true;
        self.is_abstract = true;
        self
    }

    /// Add a structural feature
    pub fn feature(mut self, feature: FeatureBuilder) -> Self {
        self.features.push(feature);
        self
    }

    /// Add an operation
    pub fn operation(mut self, operation: OperationBuilder) -> Self {
        self.operations.push(operation);
        self
    }

    /// Freeze the instance type once defined
    pub fn static_type(mut self) -> Self {
        self.static_type = true;
        self
    }

    /// Register in a package
    pub fn in_package(mut self, package: PackageId) -> Self {
        self.package = Some(package);
        self
    }

    /// Attach an annotation
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}
