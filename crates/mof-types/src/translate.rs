//! External type-name translation
//!
//! Data types can be bound to a type name coming from an external schema
//! language. The table maps those names to an implementation kind, a flag
//! telling whether values are built by construction, and a default value.
//! Unknown names fall back to an opaque kind with no default.

use crate::kind::ValueKind;
use crate::value::Value;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Result of translating an external type name
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBinding {
    /// Implementation kind of the data type
    pub kind: ValueKind,
    /// Whether the default value is built by construction
    pub factory: bool,
    /// Default value (null when the type has none)
    pub default: Value,
}

impl TypeBinding {
    fn new(kind: ValueKind, factory: bool, default: Value) -> Self {
        Self {
            kind,
            factory,
            default,
        }
    }

    /// Binding used for names missing from the table
    pub fn fallback() -> Self {
        Self::new(ValueKind::Any, false, Value::Null)
    }
}

static TRANSLATIONS: Lazy<FxHashMap<&'static str, TypeBinding>> = Lazy::new(|| {
    use ValueKind::*;

    let entries: [(&'static str, TypeBinding); 28] = [
        ("int", TypeBinding::new(Int, false, Value::Int(0))),
        ("boolean", TypeBinding::new(Bool, false, Value::Bool(false))),
        ("byte", TypeBinding::new(Int, false, Value::Int(0))),
        ("short", TypeBinding::new(Int, false, Value::Int(0))),
        ("long", TypeBinding::new(Int, false, Value::Int(0))),
        ("float", TypeBinding::new(Float, false, Value::Float(0.0))),
        ("char", TypeBinding::new(Str, false, Value::Str(String::new()))),
        ("double", TypeBinding::new(Float, false, Value::Float(0.0))),
        ("byte[]", TypeBinding::new(Bytes, true, Value::Null)),
        ("java.lang.Integer", TypeBinding::new(Int, false, Value::Null)),
        ("java.lang.String", TypeBinding::new(Str, false, Value::Null)),
        ("java.lang.Character", TypeBinding::new(Str, false, Value::Null)),
        ("java.lang.Boolean", TypeBinding::new(Bool, false, Value::Bool(false))),
        ("java.lang.Short", TypeBinding::new(Int, false, Value::Null)),
        ("java.lang.Long", TypeBinding::new(Int, false, Value::Null)),
        ("java.lang.Float", TypeBinding::new(Float, false, Value::Null)),
        ("java.lang.Double", TypeBinding::new(Float, false, Value::Null)),
        ("java.lang.Class", TypeBinding::new(Type, false, Value::Null)),
        ("java.lang.Byte", TypeBinding::new(Int, false, Value::Null)),
        ("java.lang.Object", TypeBinding::new(Any, false, Value::Null)),
        ("java.util.List", TypeBinding::new(List, true, Value::Null)),
        ("java.util.Set", TypeBinding::new(Set, true, Value::Null)),
        ("java.util.Map", TypeBinding::new(Map, true, Value::Null)),
        ("java.util.Map$Entry", TypeBinding::new(Map, true, Value::Null)),
        ("java.util.Date", TypeBinding::new(Date, false, Value::Null)),
        ("org.eclipse.emf.common.util.EList", TypeBinding::new(List, true, Value::Null)),
        ("org.eclipse.emf.ecore.util.FeatureMap", TypeBinding::new(Map, true, Value::Null)),
        (
            "org.eclipse.emf.ecore.util.FeatureMap$Entry",
            TypeBinding::new(Map, true, Value::Null),
        ),
    ];

    entries.into_iter().collect()
});

/// Translate an external type name
///
/// Never fails: unknown names produce [`TypeBinding::fallback`].
pub fn lookup_type_name(name: &str) -> TypeBinding {
    TRANSLATIONS
        .get(name)
        .cloned()
        .unwrap_or_else(TypeBinding::fallback)
}

/// Check whether a name has an explicit translation
pub fn is_known_type_name(name: &str) -> bool {
    TRANSLATIONS.contains_key(name)
}
