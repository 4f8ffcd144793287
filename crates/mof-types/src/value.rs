//! Dynamic value representation
//!
//! A `Value` is what a feature slot stores and what a notification carries.
//! Object-valued features store handles, never owned objects: ownership of
//! instances lives in the kernel arena, and the containment relation is a
//! single back-pointer kept there.
//!
//! Floats compare and hash by bit pattern so values can be members of the
//! unique collections (sets and ordered sets).

use crate::id::{ClassifierId, FeatureId, ObjectId, OperationId, PackageId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Dynamically typed value
#[derive(Clone)]
pub enum Value {
    /// Absence of a value (an unset single-valued slot)
    Null,
    /// Boolean
    Bool(bool),
    /// Integer (all integral primitive kinds)
    Int(i64),
    /// Floating point (all floating primitive kinds)
    Float(f64),
    /// String
    Str(String),
    /// Single character
    Char(char),
    /// Byte sequence
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch
    Date(i64),
    /// Ordered sequence of values
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
    /// Enumeration literal, identified by its integer value
    Literal {
        /// Enumeration the literal belongs to
        enumeration: ClassifierId,
        /// Integer value of the literal
        value: i32,
    },
    /// Object instance (or proxy) handle
    Object(ObjectId),
    /// Classifier handle (type-valued data)
    Classifier(ClassifierId),
    /// Structural feature handle (schema notifications)
    Feature(FeatureId),
    /// Operation handle (schema notifications)
    Operation(OperationId),
    /// Package handle (schema notifications)
    Package(PackageId),
}

impl Value {
    /// Check if this value is null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Extract a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract an object handle
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract a classifier handle
    pub fn as_classifier(&self) -> Option<ClassifierId> {
        match self {
            Value::Classifier(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract a feature handle
    pub fn as_feature(&self) -> Option<FeatureId> {
        match self {
            Value::Feature(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract an operation handle
    pub fn as_operation(&self) -> Option<OperationId> {
        match self {
            Value::Operation(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract a package handle
    pub fn as_package(&self) -> Option<PackageId> {
        match self {
            Value::Package(id) => Some(*id),
            _ => None,
        }
    }

    /// Borrow the elements of a list value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Elements of a list value, or the value itself as a one-element list
    ///
    /// Null yields an empty list.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    /// Name of the value's runtime kind, used in error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Char(_) => "char",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Literal { .. } => "literal",
            Value::Object(_) => "object",
            Value::Classifier(_) => "classifier",
            Value::Feature(_) => "feature",
            Value::Operation(_) => "operation",
            Value::Package(_) => "package",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Literal { enumeration: e1, value: v1 },
                Value::Literal { enumeration: e2, value: v2 },
            ) => e1 == e2 && v1 == v2,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Classifier(a), Value::Classifier(b)) => a == b,
            (Value::Feature(a), Value::Feature(b)) => a == b,
            (Value::Operation(a), Value::Operation(b)) => a == b,
            (Value::Package(a), Value::Package(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::List(items) => items.hash(state),
            Value::Map(map) => {
                map.len().hash(state);
                for (k, v) in map {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Literal { enumeration, value } => {
                enumeration.hash(state);
                value.hash(state);
            }
            Value::Object(id) => id.hash(state),
            Value::Classifier(id) => id.hash(state),
            Value::Feature(id) => id.hash(state),
            Value::Operation(id) => id.hash(state),
            Value::Package(id) => id.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::Int(i) => write!(f, "int({})", i),
            Value::Float(x) => write!(f, "float({})", x),
            Value::Str(s) => write!(f, "str({:?})", s),
            Value::Char(c) => write!(f, "char({:?})", c),
            Value::Bytes(b) => write!(f, "bytes({:?})", b),
            Value::Date(d) => write!(f, "date({})", d),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Literal { enumeration, value } => {
                write!(f, "literal({}={})", enumeration, value)
            }
            Value::Object(id) => write!(f, "{}", id),
            Value::Classifier(id) => write!(f, "{}", id),
            Value::Feature(id) => write!(f, "{}", id),
            Value::Operation(id) => write!(f, "{}", id),
            Value::Package(id) => write!(f, "{}", id),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Date(d) => write!(f, "{}", d),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl From<ClassifierId> for Value {
    fn from(id: ClassifierId) -> Self {
        Value::Classifier(id)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn test_values_are_hashable() {
        let mut set = FxHashSet::default();
        set.insert(Value::Int(1));
        set.insert(Value::from("a"));
        set.insert(Value::Object(ObjectId::new(3)));
        assert!(set.contains(&Value::Int(1)));
        assert!(!set.insert(Value::from("a")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_different_kinds_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::Null, Value::List(vec![]));
    }

    #[test]
    fn test_into_list() {
        assert_eq!(Value::Null.into_list(), Vec::<Value>::new());
        assert_eq!(Value::Int(2).into_list(), vec![Value::Int(2)]);
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).into_list().len(),
            2
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(3).type_name(), "int");
        assert_eq!(Value::Object(ObjectId::new(0)).type_name(), "object");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
