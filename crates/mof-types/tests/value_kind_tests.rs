//! Integration tests for value kinds and the type-name translation table

use mof_types::translate::is_known_type_name;
use mof_types::{lookup_type_name, ObjectId, TypeBinding, Value, ValueError, ValueKind};

#[test]
fn test_every_translated_kind_accepts_its_constructed_value() {
    for name in [
        "java.util.List",
        "java.util.Set",
        "java.util.Map",
        "byte[]",
        "org.eclipse.emf.common.util.EList",
    ] {
        let binding = lookup_type_name(name);
        assert!(binding.factory, "{} should be built by construction", name);
        let built = binding.kind.construct();
        assert!(
            binding.kind.accepts(&built),
            "{} does not accept its own constructed value",
            name
        );
    }
}

#[test]
fn test_primitive_defaults_are_accepted_by_their_kind() {
    for name in ["int", "boolean", "long", "float", "double", "char"] {
        let binding = lookup_type_name(name);
        assert!(!binding.factory);
        assert!(binding.kind.accepts(&binding.default), "{}", name);
    }
}

#[test]
fn test_fallback_is_opaque_without_default() {
    let binding = lookup_type_name("org.example.Unknown");
    assert_eq!(binding, TypeBinding::fallback());
    assert_eq!(binding.kind, ValueKind::Any);
    assert!(!binding.factory);
    assert!(binding.default.is_null());
    assert!(!is_known_type_name("org.example.Unknown"));
}

#[test]
fn test_parse_format_roundtrip_for_scalars() {
    let cases = [
        (ValueKind::Int, "-17"),
        (ValueKind::Float, "2.5"),
        (ValueKind::Bool, "true"),
        (ValueKind::Str, "hello"),
        (ValueKind::Char, "x"),
    ];
    for (kind, text) in cases {
        let value = kind.parse(text).unwrap();
        assert!(kind.accepts(&value));
        assert_eq!(kind.format(&value), text);
    }
}

#[test]
fn test_parse_error_reports_kind_and_input() {
    let err = ValueKind::Int.parse("twelve").unwrap_err();
    assert_eq!(
        err,
        ValueError::Parse {
            kind: "int".to_string(),
            input: "twelve".to_string(),
        }
    );
    assert_eq!(err.to_string(), "Cannot parse \"twelve\" as int");
}

#[test]
fn test_object_values_are_not_data() {
    let object = Value::Object(ObjectId::new(4));
    assert!(!ValueKind::Str.accepts(&object));
    assert!(ValueKind::Any.accepts(&object));
}
