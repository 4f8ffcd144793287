//! Built-in package
//!
//! A kernel created with `bootstrap_builtins` registers the `ecore` package:
//! the primitive data types every schema builds on, and the root class
//! `EObject` that every class implicitly extends.

use crate::kernel::Kernel;
use crate::schema::DataType;
use mof_types::{ClassifierId, PackageId, Value, ValueKind};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Namespace URI of the built-in package
pub const ECORE_NS_URI: &str = "http://www.eclipse.org/emf/2002/Ecore";

/// Name of the root class
pub const ROOT_CLASS_NAME: &str = "EObject";

struct BuiltinType {
    name: &'static str,
    kind: ValueKind,
    default: Value,
    factory: bool,
    instance_type_name: Option<&'static str>,
}

impl BuiltinType {
    fn data_type(&self) -> DataType {
        let mut data_type = if self.factory {
            DataType::factory(self.kind)
        } else {
            DataType::new(self.kind, self.default.clone())
        };
        data_type.instance_type_name = self.instance_type_name.map(str::to_string);
        data_type
    }
}

static BUILTIN_TYPES: Lazy<Vec<BuiltinType>> = Lazy::new(|| {
    use ValueKind::*;

    let plain = |name, kind, default, instance_type_name| BuiltinType {
        name,
        kind,
        default,
        factory: false,
        instance_type_name: Some(instance_type_name),
    };
    let factory = |name, kind, instance_type_name| BuiltinType {
        name,
        kind,
        default: Value::Null,
        factory: true,
        instance_type_name: Some(instance_type_name),
    };

    vec![
        plain("EString", Str, Value::Null, "java.lang.String"),
        plain("EBoolean", Bool, Value::Bool(false), "boolean"),
        plain("EBooleanObject", Bool, Value::Null, "java.lang.Boolean"),
        plain("EInt", Int, Value::Int(0), "int"),
        plain("EInteger", Int, Value::Int(0), "java.lang.Integer"),
        plain("EIntegerObject", Int, Value::Null, "java.lang.Integer"),
        plain("ELong", Int, Value::Int(0), "long"),
        plain("ELongObject", Int, Value::Null, "java.lang.Long"),
        plain("EBigInteger", Int, Value::Null, "java.math.BigInteger"),
        plain("EShort", Int, Value::Null, "short"),
        plain("EByte", Bytes, Value::Null, "byte"),
        plain("EByteObject", Bytes, Value::Null, "java.lang.Byte"),
        plain("EByteArray", Bytes, Value::Null, "byte[]"),
        plain("EChar", Char, Value::Null, "char"),
        plain("ECharacterObject", Char, Value::Null, "java.lang.Character"),
        plain("EFloat", Float, Value::Float(0.0), "float"),
        plain("EFloatObject", Float, Value::Null, "java.lang.Float"),
        plain("EDouble", Float, Value::Float(0.0), "double"),
        plain("EDoubleObject", Float, Value::Null, "java.lang.Double"),
        plain("EBigDecimal", Float, Value::Null, "java.math.BigDecimal"),
        plain("EDate", Date, Value::Null, "java.util.Date"),
        plain("EJavaObject", Any, Value::Null, "java.lang.Object"),
        BuiltinType {
            name: "ENativeType",
            kind: Any,
            default: Value::Null,
            factory: false,
            instance_type_name: None,
        },
        plain("EJavaClass", Type, Value::Null, "java.lang.Class"),
        factory("EStringToStringMapEntry", Map, "java.util.Map$Entry"),
        factory(
            "EFeatureMapEntry",
            Map,
            "org.eclipse.emf.ecore.util.FeatureMap$Entry",
        ),
        plain(
            "EDiagnosticChain",
            Str,
            Value::Null,
            "org.eclipse.emf.common.util.DiagnosticChain",
        ),
    ]
});

/// Handles of the built-in package contents
#[derive(Debug, Clone)]
pub struct Builtins {
    /// The `ecore` package
    pub package: PackageId,
    /// Root class
    pub e_object: ClassifierId,
    /// Strings
    pub e_string: ClassifierId,
    /// Booleans (default false)
    pub e_boolean: ClassifierId,
    /// Integers (default 0)
    pub e_int: ClassifierId,
    /// Long integers (default 0)
    pub e_long: ClassifierId,
    /// Floats (default 0.0)
    pub e_float: ClassifierId,
    /// Doubles (default 0.0)
    pub e_double: ClassifierId,
    /// Characters
    pub e_char: ClassifierId,
    /// Dates
    pub e_date: ClassifierId,
    /// Byte arrays
    pub e_byte_array: ClassifierId,
    /// Opaque values
    pub e_java_object: ClassifierId,
    by_name: FxHashMap<&'static str, ClassifierId>,
}

impl Builtins {
    /// Look up any built-in classifier by name
    pub fn get(&self, name: &str) -> Option<ClassifierId> {
        self.by_name.get(name).copied()
    }

    /// Number of built-in classifiers (data types and root class)
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Always false: the built-in package is never empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Register the built-in package in a fresh kernel
pub(crate) fn install(kernel: &mut Kernel) -> Builtins {
    let package = kernel.create_package("ecore", ECORE_NS_URI, "ecore");

    let mut by_name = FxHashMap::default();
    for builtin in BUILTIN_TYPES.iter() {
        let id = kernel.create_data_type(builtin.name, builtin.data_type());
        kernel.schema.link_classifier(package, id);
        by_name.insert(builtin.name, id);
    }

    let e_object = kernel.create_class(ROOT_CLASS_NAME);
    kernel.schema.link_classifier(package, e_object);
    by_name.insert(ROOT_CLASS_NAME, e_object);

    debug!(count = by_name.len(), "built-in package installed");

    let id = |name: &str| by_name.get(name).copied().unwrap_or(e_object);
    Builtins {
        package,
        e_object,
        e_string: id("EString"),
        e_boolean: id("EBoolean"),
        e_int: id("EInt"),
        e_long: id("ELong"),
        e_float: id("EFloat"),
        e_double: id("EDouble"),
        e_char: id("EChar"),
        e_date: id("EDate"),
        e_byte_array: id("EByteArray"),
        e_java_object: id("EJavaObject"),
        by_name,
    }
}
