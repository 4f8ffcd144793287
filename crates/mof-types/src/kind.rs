//! Primitive value kinds
//!
//! A data type is bound to one `ValueKind`. The kind decides which runtime
//! values the data type accepts, how it builds a value by construction,
//! and how literal text converts to and from values.

use crate::error::ValueError;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Implementation kind of a data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Opaque: accepts any value
    Any,
    /// Booleans
    Bool,
    /// Integers
    Int,
    /// Floating point numbers
    Float,
    /// Strings
    Str,
    /// Single characters
    Char,
    /// Byte sequences
    Bytes,
    /// Timestamps
    Date,
    /// Lists
    List,
    /// Sets (represented as lists of distinct values)
    Set,
    /// String-keyed maps
    Map,
    /// Classifier handles
    Type,
}

impl ValueKind {
    /// Check whether a non-null value belongs to this kind
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Any, _) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Int, Value::Int(_)) => true,
            (ValueKind::Float, Value::Float(_)) => true,
            (ValueKind::Str, Value::Str(_)) => true,
            (ValueKind::Char, Value::Char(_)) => true,
            (ValueKind::Bytes, Value::Bytes(_)) => true,
            (ValueKind::Date, Value::Date(_)) => true,
            (ValueKind::List, Value::List(_)) => true,
            (ValueKind::Set, Value::List(_)) => true,
            (ValueKind::Map, Value::Map(_)) => true,
            (ValueKind::Type, Value::Classifier(_)) => true,
            _ => false,
        }
    }

    /// Build a fresh value of this kind (default-by-construction)
    ///
    /// Only container-like kinds can be constructed; scalar kinds yield null.
    pub fn construct(self) -> Value {
        match self {
            ValueKind::List | ValueKind::Set => Value::List(Vec::new()),
            ValueKind::Map => Value::Map(BTreeMap::new()),
            ValueKind::Bytes => Value::Bytes(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Parse literal text into a value of this kind
    pub fn parse(self, input: &str) -> Result<Value, ValueError> {
        let fail = || ValueError::Parse {
            kind: self.to_string(),
            input: input.to_string(),
        };
        match self {
            ValueKind::Any | ValueKind::Str => Ok(Value::Str(input.to_string())),
            ValueKind::Bool => Ok(Value::Bool(matches!(input, "true" | "True"))),
            ValueKind::Int => input.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
            ValueKind::Float => input
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail()),
            ValueKind::Date => input.trim().parse::<i64>().map(Value::Date).map_err(|_| fail()),
            ValueKind::Char => {
                let mut chars = input.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(fail()),
                }
            }
            ValueKind::Bytes => Ok(Value::Bytes(input.as_bytes().to_vec())),
            ValueKind::List | ValueKind::Set | ValueKind::Map | ValueKind::Type => {
                Err(ValueError::NoLiteralForm {
                    kind: self.to_string(),
                })
            }
        }
    }

    /// Render a value of this kind as literal text
    pub fn format(self, value: &Value) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => other.to_string(),
        }
    }

    /// Name of the kind
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Char => "char",
            ValueKind::Bytes => "bytes",
            ValueKind::Date => "date",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Type => "type",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
