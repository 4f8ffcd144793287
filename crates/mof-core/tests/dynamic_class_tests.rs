//! Integration tests for schema edits reaching live instances
//!
//! Covers feature and supertype edits on classes that already have
//! instances, static classes, operations and their invocation, packages and
//! annotations.

use mof_core::{
    Annotation, ClassBuilder, FeatureBuilder, Kernel, KernelError, OperationBuilder, SchemaElement, Value,
};

fn kernel() -> Kernel {
    Kernel::new()
}

// ============================================================================
// Features and inheritance
// ============================================================================

#[test]
fn test_feature_added_after_instances_exist() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;
    let class = k.create_class("Counter");
    let c = k.create_object(class).unwrap();

    let value = k
        .add_feature(class, FeatureBuilder::attribute("value", e_int).default_value(10))
        .unwrap();

    assert_eq!(k.get(c, value).unwrap(), Value::Int(10));
    k.set(c, value, Value::Int(11)).unwrap();
    assert_eq!(k.get_by_name(c, "value").unwrap(), Value::Int(11));
}

#[test]
fn test_removed_feature_is_no_longer_available() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let class = k.create_class("Note");
    let text = k
        .add_feature(class, FeatureBuilder::attribute("text", e_string))
        .unwrap();
    let n = k.create_object(class).unwrap();
    k.set(n, text, Value::from("hello")).unwrap();

    k.remove_feature(class, text).unwrap();

    assert!(matches!(k.get(n, text), Err(KernelError::FeatureNotAvailable { .. })));
    assert_eq!(k.schema().feature(text).unwrap().owner(), None);
    assert!(k.schema().structural_features(class).unwrap().is_empty());
    assert!(matches!(
        k.remove_feature(class, text),
        Err(KernelError::UnknownFeature { .. })
    ));
}

#[test]
fn test_supertype_edits_reach_existing_objects() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let named = k.create_class("Named");
    let name = k
        .add_feature(named, FeatureBuilder::attribute("name", e_string))
        .unwrap();
    let city = k.create_class("City");
    let c = k.create_object(city).unwrap();
    assert!(!k.is_instance(c, named).unwrap());

    k.add_super_type(city, named).unwrap();

    assert!(k.is_instance(c, named).unwrap());
    k.set(c, name, Value::from("Lyon")).unwrap();
    assert_eq!(k.get_by_name(c, "name").unwrap(), Value::from("Lyon"));

    k.remove_super_type(city, named).unwrap();

    assert!(!k.is_instance(c, named).unwrap());
    assert!(matches!(k.get(c, name), Err(KernelError::FeatureNotAvailable { .. })));
    assert!(matches!(
        k.remove_super_type(city, named),
        Err(KernelError::ValueNotFound { .. })
    ));
}

#[test]
fn test_every_object_is_an_instance_of_the_root_class() {
    let mut k = kernel();
    let root = k.builtins().unwrap().e_object;
    let class = k.create_class("Thing");
    let t = k.create_object(class).unwrap();

    assert!(k.is_instance(t, root).unwrap());
    assert_eq!(k.instance_type(class).unwrap().closure().last(), Some(&root));
}

#[test]
fn test_inheritance_cycles_are_rejected() {
    let mut k = kernel();
    let a = k.create_class("A");
    let b = k.define_class(ClassBuilder::new("B").extends(a)).unwrap();
    let c = k.define_class(ClassBuilder::new("C").extends(b)).unwrap();

    assert!(matches!(k.add_super_type(a, c), Err(KernelError::CyclicInheritance { .. })));
    assert!(matches!(k.add_super_type(a, a), Err(KernelError::CyclicInheritance { .. })));
    assert!(k.schema().super_types(a).unwrap().is_empty());

    k.add_super_type(c, b).unwrap();
    assert_eq!(k.schema().super_types(c).unwrap(), &[b]);
}

#[test]
fn test_abstract_and_interface_classes_cannot_be_instantiated() {
    let mut k = kernel();
    let shape = k.define_class(ClassBuilder::new("Shape").abstract_class()).unwrap();
    let drawable = k.define_class(ClassBuilder::new("Drawable").interface()).unwrap();
    let before = k.object_count();

    assert_eq!(
        k.create_object(shape),
        Err(KernelError::AbstractInstantiation {
            class: "Shape".to_string()
        })
    );
    assert!(matches!(k.create_object(drawable), Err(KernelError::AbstractInstantiation { .. })));
    assert_eq!(k.object_count(), before);

    k.set_abstract(shape, false).unwrap();
    assert!(k.create_object(shape).is_ok());
}

#[test]
fn test_data_types_cannot_be_instantiated() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;

    assert!(matches!(
        k.create_object(e_int),
        Err(KernelError::WrongClassifierKind { expected: "class", .. })
    ));
}

#[test]
fn test_renames_follow_into_instances() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let class = k.create_class("Person");
    let first = k
        .add_feature(class, FeatureBuilder::attribute("first", e_string))
        .unwrap();
    let p = k.create_object(class).unwrap();

    k.rename_feature(first, "given_name").unwrap();
    k.rename_classifier(class, "Human").unwrap();

    k.set_by_name(p, "given_name", Value::from("Ada")).unwrap();
    assert_eq!(k.get(p, first).unwrap(), Value::from("Ada"));
    assert!(matches!(
        k.get_by_name(p, "first"),
        Err(KernelError::FeatureNotAvailable { ref class, .. }) if class == "Human"
    ));
    assert_eq!(k.instance_type(class).unwrap().name(), "Human");
}

#[test]
fn test_static_class_ignores_later_edits() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;
    let point = k
        .define_class(
            ClassBuilder::new("Point")
                .feature(FeatureBuilder::attribute("x", e_int))
                .static_type(),
        )
        .unwrap();
    let p = k.create_object(point).unwrap();

    let y = k.add_feature(point, FeatureBuilder::attribute("y", e_int)).unwrap();

    assert!(k.instance_type(point).unwrap().is_frozen());
    assert!(k.schema().class(point).unwrap().is_static());
    assert!(matches!(k.get(p, y), Err(KernelError::FeatureNotAvailable { .. })));
    assert_eq!(k.get_by_name(p, "x").unwrap(), Value::Int(0));
}

#[test]
fn test_find_feature_prefers_the_nearest_declaration() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let e_int = k.builtins().unwrap().e_int;
    let base = k.create_class("Base");
    let base_label = k
        .add_feature(base, FeatureBuilder::attribute("label", e_string))
        .unwrap();
    let size = k.add_feature(base, FeatureBuilder::attribute("size", e_int)).unwrap();
    let derived = k.define_class(ClassBuilder::new("Derived").extends(base)).unwrap();
    let derived_label = k
        .add_feature(derived, FeatureBuilder::attribute("label", e_int))
        .unwrap();
    let d = k.create_object(derived).unwrap();

    assert_eq!(k.schema().find_feature(derived, "label"), Some(derived_label));
    assert_eq!(k.schema().find_feature(base, "label"), Some(base_label));
    assert_eq!(
        k.schema().all_structural_features(derived).unwrap(),
        vec![base_label, size, derived_label]
    );
    assert_eq!(k.feature_by_name(d, "label").unwrap(), derived_label);
    k.set_by_name(d, "label", Value::Int(4)).unwrap();
    assert_eq!(k.get(d, derived_label).unwrap(), Value::Int(4));
}

#[test]
fn test_class_builder_is_validated_before_anything_is_created() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;
    let count = k.schema().classifier_count();

    let result = k.define_class(
        ClassBuilder::new("Broken").feature(FeatureBuilder::reference("bad", e_int)),
    );

    assert!(matches!(result, Err(KernelError::WrongClassifierKind { expected: "class", .. })));
    assert_eq!(k.schema().classifier_count(), count);
}

// ============================================================================
// Operations
// ============================================================================

#[test]
fn test_operation_stub_until_implemented() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let e_int = k.builtins().unwrap().e_int;
    let class = k
        .define_class(
            ClassBuilder::new("Greeter").operation(
                OperationBuilder::new("greet")
                    .param("who", e_string)
                    .optional_param("times", e_int)
                    .returns(e_string),
            ),
        )
        .unwrap();
    let g = k.create_object(class).unwrap();

    assert_eq!(
        k.invoke(g, "greet", &[Value::from("Bob")]),
        Err(KernelError::NotImplemented {
            operation: "greet".to_string()
        })
    );

    k.implement_operation(class, "greet", |_, _, args| {
        let who = args[0].as_str().unwrap_or_default().to_string();
        let times = args[1].as_int().unwrap_or(0).max(1) as usize;
        Ok(Value::from(format!("hi {who}").repeat(times)))
    })
    .unwrap();

    assert_eq!(k.invoke(g, "greet", &[Value::from("Bob")]).unwrap(), Value::from("hi Bob"));
    assert_eq!(
        k.invoke(g, "greet", &[Value::from("Bob"), Value::Int(2)]).unwrap(),
        Value::from("hi Bobhi Bob")
    );
}

#[test]
fn test_invocation_checks_arguments() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;
    let class = k
        .define_class(ClassBuilder::new("Calc").operation(OperationBuilder::new("double").param("n", e_int)))
        .unwrap();
    k.implement_operation(class, "double", |_, _, args| {
        Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
    })
    .unwrap();
    let c = k.create_object(class).unwrap();

    assert_eq!(k.invoke(c, "double", &[Value::Int(21)]).unwrap(), Value::Int(42));
    assert_eq!(
        k.invoke(c, "double", &[]),
        Err(KernelError::MissingArgument {
            operation: "double".to_string(),
            parameter: "n".to_string(),
        })
    );
    assert_eq!(
        k.invoke(c, "double", &[Value::Int(1), Value::Int(2)]),
        Err(KernelError::TooManyArguments {
            operation: "double".to_string(),
            expected: 1,
            actual: 2,
        })
    );
    assert!(matches!(
        k.invoke(c, "double", &[Value::from("x")]),
        Err(KernelError::BadValue { .. })
    ));
    assert!(matches!(k.invoke(c, "triple", &[]), Err(KernelError::UnknownOperation { .. })));
}

#[test]
fn test_subclass_overrides_an_inherited_body() {
    let mut k = kernel();
    let animal = k
        .define_class(ClassBuilder::new("Animal").operation(OperationBuilder::new("speak")))
        .unwrap();
    let dog = k.define_class(ClassBuilder::new("Dog").extends(animal)).unwrap();
    k.implement_operation(animal, "speak", |_, _, _| Ok(Value::from("...")))
        .unwrap();
    let generic = k.create_object(animal).unwrap();
    let rex = k.create_object(dog).unwrap();

    assert_eq!(k.invoke(rex, "speak", &[]).unwrap(), Value::from("..."));

    k.implement_operation(dog, "speak", |_, _, _| Ok(Value::from("woof")))
        .unwrap();

    assert_eq!(k.invoke(rex, "speak", &[]).unwrap(), Value::from("woof"));
    assert_eq!(k.invoke(generic, "speak", &[]).unwrap(), Value::from("..."));
    assert!(matches!(
        k.implement_operation(dog, "fetch", |_, _, _| Ok(Value::Null)),
        Err(KernelError::UnknownOperation { .. })
    ));
}

#[test]
fn test_operation_body_can_mutate_its_object() {
    let mut k = kernel();
    let e_int = k.builtins().unwrap().e_int;
    let class = k
        .define_class(
            ClassBuilder::new("Tally")
                .feature(FeatureBuilder::attribute("count", e_int))
                .operation(OperationBuilder::new("bump")),
        )
        .unwrap();
    k.implement_operation(class, "bump", |k, this, _| {
        let next = k.get_by_name(this, "count")?.as_int().unwrap_or(0) + 1;
        k.set_by_name(this, "count", Value::Int(next))?;
        Ok(Value::Int(next))
    })
    .unwrap();
    let t = k.create_object(class).unwrap();

    k.invoke(t, "bump", &[]).unwrap();
    assert_eq!(k.invoke(t, "bump", &[]).unwrap(), Value::Int(2));
}

#[test]
fn test_removed_operation_is_no_longer_callable() {
    let mut k = kernel();
    let class = k.create_class("Job");
    let run = k.add_operation(class, OperationBuilder::new("run")).unwrap();
    let j = k.create_object(class).unwrap();
    assert!(matches!(k.invoke(j, "run", &[]), Err(KernelError::NotImplemented { .. })));

    k.remove_operation(class, run).unwrap();

    assert!(matches!(k.invoke(j, "run", &[]), Err(KernelError::UnknownOperation { .. })));
    assert_eq!(k.schema().operation(run).unwrap().owner(), None);
}

// ============================================================================
// Packages and annotations
// ============================================================================

#[test]
fn test_classes_registered_in_packages() {
    let mut k = kernel();
    let library = k.create_package("library", "http://example.org/library", "lib");
    let book = k
        .define_class(ClassBuilder::new("Book").in_package(library))
        .unwrap();
    let shelf = k.create_class("Shelf");
    k.register_classifier(library, shelf).unwrap();

    assert_eq!(k.schema().package_by_uri("http://example.org/library"), Some(library));
    assert_eq!(k.schema().classifier_in(library, "Book"), Some(book));
    assert_eq!(k.schema().classifier_in(library, "Shelf"), Some(shelf));
    assert_eq!(k.schema().classifier(book).unwrap().package(), Some(library));
    assert_eq!(k.schema().package(library).unwrap().classifiers(), &[book, shelf]);
}

#[test]
fn test_subpackages_move_and_refuse_cycles() {
    let mut k = kernel();
    let root = k.create_package("root", "urn:root", "r");
    let other = k.create_package("other", "urn:other", "o");
    let leaf = k.create_package("leaf", "urn:leaf", "l");

    k.add_subpackage(root, leaf).unwrap();
    k.add_subpackage(other, leaf).unwrap();

    assert!(k.schema().package(root).unwrap().subpackages().is_empty());
    assert_eq!(k.schema().package(leaf).unwrap().super_package(), Some(other));
    assert_eq!(
        k.add_subpackage(leaf, other),
        Err(KernelError::PackageCycle {
            package: "other".to_string()
        })
    );
    assert!(matches!(k.add_subpackage(root, root), Err(KernelError::PackageCycle { .. })));
}

#[test]
fn test_annotations_on_schema_elements() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let class = k
        .define_class(
            ClassBuilder::new("Doc")
                .annotate(Annotation::new("http://example.org/doc").with_detail("summary", "A document"))
                .feature(
                    FeatureBuilder::attribute("title", e_string)
                        .annotate(Annotation::new("ui").with_detail("label", "Title")),
                ),
        )
        .unwrap();
    let title = k.schema().find_feature(class, "title").unwrap();

    k.annotate(
        SchemaElement::Classifier(class),
        Annotation::new("ui").with_detail("icon", "page"),
    )
    .unwrap();

    let schema = k.schema();
    let doc = schema
        .annotation(SchemaElement::Classifier(class), "http://example.org/doc")
        .unwrap();
    assert_eq!(doc.detail("summary"), Some("A document"));
    assert_eq!(
        schema
            .annotation(SchemaElement::Classifier(class), "ui")
            .and_then(|a| a.detail("icon")),
        Some("page")
    );
    assert_eq!(
        schema
            .annotation(SchemaElement::Feature(title), "ui")
            .and_then(|a| a.detail("label")),
        Some("Title")
    );
    assert!(schema.annotation(SchemaElement::Feature(title), "missing").is_none());
}

#[test]
fn test_feature_metadata_is_reflected() {
    let mut k = kernel();
    let e_string = k.builtins().unwrap().e_string;
    let doc = k.create_class("Doc");
    let id = k
        .add_feature(doc, FeatureBuilder::attribute("id", e_string).id().required())
        .unwrap();
    let cache = k
        .add_feature(
            doc,
            FeatureBuilder::attribute("cache", e_string)
                .bounds(0, 3)
                .transient()
                .volatile()
                .unsettable(),
        )
        .unwrap();
    let link = k
        .add_feature(doc, FeatureBuilder::reference("link", doc).no_proxy_resolution())
        .unwrap();

    let schema = k.schema();
    assert_eq!(schema.find_classifier("Doc"), Some(doc));
    assert_eq!(schema.all_attributes(doc).unwrap(), vec![id, cache]);

    let id = schema.feature(id).unwrap();
    assert!(id.is_id() && id.is_required() && !id.is_many());
    assert_eq!((id.lower_bound(), id.upper_bound()), (1, 1));

    let cache = schema.feature(cache).unwrap();
    assert!(cache.is_many() && cache.is_transient() && cache.is_volatile() && cache.is_unsettable());
    assert_eq!(cache.upper_bound(), 3);
    assert!(!cache.is_derived());

    assert!(!schema.feature(link).unwrap().resolves_proxies());
}
