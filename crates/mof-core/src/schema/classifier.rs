//! Classifiers: classes, data types and enumerations

use crate::schema::Annotation;
use mof_types::{
    lookup_type_name, ClassifierId, FeatureId, OperationId, PackageId, Value, ValueError,
    ValueKind,
};

/// Named type descriptor
#[derive(Debug, Clone)]
pub struct Classifier {
    pub(crate) id: ClassifierId,
    pub(crate) name: String,
    pub(crate) package: Option<PackageId>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) kind: ClassifierKind,
}

/// Specialization of a classifier
#[derive(Debug, Clone)]
pub enum ClassifierKind {
    /// Aggregate with features and operations
    Class(Class),
    /// Primitive or opaque value type
    DataType(DataType),
    /// Data type with named literals
    Enum(Enumeration),
}

impl Classifier {
    /// Classifier handle
    pub fn id(&self) -> ClassifierId {
        self.id
    }

    /// Classifier name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package the classifier is registered in
    pub fn package(&self) -> Option<PackageId> {
        self.package
    }

    /// Attached annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Specialization
    pub fn kind(&self) -> &ClassifierKind {
        &self.kind
    }

    /// Class data, if this is a class
    pub fn as_class(&self) -> Option<&Class> {
        match &self.kind {
            ClassifierKind::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Data type data, if this is a plain data type
    pub fn as_data_type(&self) -> Option<&DataType> {
        match &self.kind {
            ClassifierKind::DataType(data_type) => Some(data_type),
            _ => None,
        }
    }

    /// Enumeration data, if this is an enumeration
    pub fn as_enum(&self) -> Option<&Enumeration> {
        match &self.kind {
            ClassifierKind::Enum(enumeration) => Some(enumeration),
            _ => None,
        }
    }

    pub(crate) fn as_class_mut(&mut self) -> Option<&mut Class> {
        match &mut self.kind {
            ClassifierKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub(crate) fn as_enum_mut(&mut self) -> Option<&mut Enumeration> {
        match &mut self.kind {
            ClassifierKind::Enum(enumeration) => Some(enumeration),
            _ => None,
        }
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        matches!(self.kind, ClassifierKind::Class(_))
    }

    /// Default value of a data type or enumeration; null for classes
    pub fn default_value(&self) -> Value {
        match &self.kind {
            ClassifierKind::Class(_) => Value::Null,
            ClassifierKind::DataType(data_type) => data_type.default_value(),
            ClassifierKind::Enum(enumeration) => enumeration.default_value(self.id),
        }
    }
}

/// Class data
#[derive(Debug, Clone, Default)]
pub struct Class {
    pub(crate) is_abstract: bool,
    pub(crate) interface: bool,
    pub(crate) super_types: Vec<ClassifierId>,
    pub(crate) features: Vec<FeatureId>,
    pub(crate) operations: Vec<OperationId>,
    pub(crate) static_type: bool,
}

impl Class {
    /// Whether the class cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether the class is an interface
    pub fn is_interface(&self) -> bool {
        self.interface
    }

    /// Direct supertypes, in declaration order
    pub fn super_types(&self) -> &[ClassifierId] {
        &self.super_types
    }

    /// Owned structural features, in declaration order
    pub fn structural_features(&self) -> &[FeatureId] {
        &self.features
    }

    /// Owned operations, in declaration order
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    /// Whether the instance type was frozen at definition
    pub fn is_static(&self) -> bool {
        self.static_type
    }
}

/// Data type data
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    pub(crate) kind: ValueKind,
    pub(crate) default: Value,
    pub(crate) factory: bool,
    pub(crate) instance_type_name: Option<String>,
    pub(crate) serializable: bool,
}

impl DataType {
    /// Data type of the given kind with an explicit default
    pub fn new(kind: ValueKind, default: Value) -> Self {
        Self {
            kind,
            default,
            factory: false,
            instance_type_name: None,
            serializable: true,
        }
    }

    /// Data type whose default is built by construction
    pub fn factory(kind: ValueKind) -> Self {
        Self {
            factory: true,
            ..Self::new(kind, Value::Null)
        }
    }

    /// Data type bound to an external type name
    ///
    /// Unknown names fall back to an opaque kind with no default.
    pub fn from_type_name(name: &str) -> Self {
        let binding = lookup_type_name(name);
        Self {
            kind: binding.kind,
            default: binding.default,
            factory: binding.factory,
            instance_type_name: Some(name.to_string()),
            serializable: true,
        }
    }

    /// Implementation kind
    pub fn value_kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether defaults are built by construction
    pub fn is_factory(&self) -> bool {
        self.factory
    }

    /// External type name, if bound
    pub fn instance_type_name(&self) -> Option<&str> {
        self.instance_type_name.as_deref()
    }

    /// Whether values of this type are serializable
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Rebind to an external type name
    pub fn set_instance_type_name(&mut self, name: &str) {
        *self = Self {
            serializable: self.serializable,
            ..Self::from_type_name(name)
        };
    }

    /// Default value; a fresh value for factory types
    pub fn default_value(&self) -> Value {
        if self.factory {
            self.kind.construct()
        } else {
            self.default.clone()
        }
    }

    /// Whether a value belongs to this type
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_null() || self.kind.accepts(value)
    }

    /// Parse literal text
    pub fn from_string(&self, text: &str) -> Result<Value, ValueError> {
        self.kind.parse(text)
    }

    /// Render a value as literal text
    pub fn to_string(&self, value: &Value) -> String {
        self.kind.format(value)
    }
}

/// Named enumeration literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLiteral {
    pub(crate) name: String,
    pub(crate) value: i32,
    pub(crate) literal: String,
}

impl EnumLiteral {
    /// Literal name (digit-leading names carry a `_` prefix)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integer value; the literal's identity
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Literal text as originally given
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

/// Enumeration data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub(crate) literals: Vec<EnumLiteral>,
}

impl Enumeration {
    /// Literals in order; the first one is the default
    pub fn literals(&self) -> &[EnumLiteral] {
        &self.literals
    }

    /// Find a literal by name or literal text
    pub fn literal(&self, name: &str) -> Option<&EnumLiteral> {
        self.literals
            .iter()
            .find(|l| l.name == name)
            .or_else(|| self.literals.iter().find(|l| l.literal == name))
    }

    /// Find a literal by value
    pub fn literal_for(&self, value: i32) -> Option<&EnumLiteral> {
        self.literals.iter().find(|l| l.value == value)
    }

    /// Default literal
    pub fn default_literal(&self) -> Option<&EnumLiteral> {
        self.literals.first()
    }

    /// Default value as a literal of `enumeration`
    pub(crate) fn default_value(&self, enumeration: ClassifierId) -> Value {
        self.default_literal()
            .map(|l| Value::Literal {
                enumeration,
                value: l.value,
            })
            .unwrap_or(Value::Null)
    }

    /// Whether a value is one of this enumeration's literals
    pub(crate) fn contains(&self, enumeration: ClassifierId, value: &Value) -> bool {
        match value {
            Value::Literal {
                enumeration: owner,
                value,
            } => *owner == enumeration && self.literal_for(*value).is_some(),
            _ => false,
        }
    }

    /// Append a literal; `value` defaults to the next free position
    pub(crate) fn push(&mut self, name: &str, value: Option<i32>) -> &EnumLiteral {
        let value = value.unwrap_or_else(|| {
            self.literals
                .iter()
                .map(|l| l.value + 1)
                .max()
                .unwrap_or(0)
        });
        let normalized = if name.starts_with(|c: char| c.is_ascii_digit()) {
            format!("_{}", name)
        } else {
            name.to_string()
        };
        let index = self.literals.len();
        self.literals.push(EnumLiteral {
            name: normalized,
            value,
            literal: name.to_string(),
        });
        &self.literals[index]
    }

    /// Make the named literal the default by moving it to the front
    pub(crate) fn set_default(&mut self, name: &str) -> bool {
        let Some(position) = self.literals.iter().position(|l| l.name == name) else {
            return false;
        };
        let literal = self.literals.remove(position);
        self.literals.insert(0, literal);
        true
    }
}
