use std::sync::Arc;

use attrcast::compiler::{BulkAccessor, Compiler, CompilerOptions, Declaration};
use attrcast::datatype::Value;
use attrcast::defaults::DefaultStore;
use attrcast::model::{attributes, Model};
use attrcast::registry::TypeRegistry;
use attrcast::typekey::TypeRef;
use attrcast::{compile_attributes, CastError};

fn setup() -> Compiler {
    Compiler::new(Arc::new(TypeRegistry::with_builtins()), Arc::new(DefaultStore::new()))
}

fn book(compiler: &Compiler, options: CompilerOptions) -> Arc<Model> {
    Arc::new(
        compiler
            .compile_attributes(
                "Book",
                vec![
                    Declaration::new(["title", "name"], TypeRef::named("String")),
                    Declaration::new(["pages"], TypeRef::named("Integer")),
                    Declaration::new(["rate"], TypeRef::named("Float")),
                ],
                options,
            )
            .expect("book compiles"),
    )
}

#[test]
fn pages_and_rate_from_text() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default().with_constructor());
    let instance = model
        .construct(attributes([("pages", "250"), ("rate", "4.1")]))
        .expect("constructs");
    assert_eq!(instance.get("pages").expect("known attribute"), Value::Integer(250));
    assert_eq!(instance.get("rate").expect("known attribute"), Value::Float(4.1));
    assert_eq!(instance.get("title").expect("known attribute"), Value::Nil);
}

#[test]
fn invalid_pages_name_the_attribute_and_type() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default().with_constructor());
    let err = model.construct(attributes([("pages", "abc")])).unwrap_err();
    match &err {
        CastError::InvalidValue { attribute, type_name, value } => {
            assert_eq!(attribute, "pages");
            assert_eq!(type_name, "Integer");
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "Invalid value \"abc\" for attribute \"pages\" of type \"Integer\"");
}

#[test]
fn unsupported_types_fail_compilation() {
    let compiler = setup();
    let err = compiler
        .compile_attributes(
            "Shelf",
            vec![Declaration::new(["shape"], TypeRef::named("Shape"))],
            CompilerOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported attribute type \"Shape\"");

    let err = compiler
        .compile_attributes(
            "Shelf",
            vec![Declaration::new(["shapes"], TypeRef::array_of(TypeRef::named("Shape")))],
            CompilerOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CastError::UnsupportedType { type_name } if type_name == "Shape"));
}

#[test]
fn declarations_need_names() {
    let compiler = setup();
    let err = compiler
        .compile_attributes(
            "Nameless",
            vec![Declaration::new(Vec::<String>::new(), TypeRef::named("String"))],
            CompilerOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CastError::InvalidDeclaration { .. }));
    let err = compiler
        .compile_attributes(
            "Nameless",
            vec![Declaration::new([""], TypeRef::named("String"))],
            CompilerOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CastError::InvalidDeclaration { .. }));
}

#[test]
fn attributes_keep_declaration_order() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default());
    assert_eq!(model.attribute_set().names(), vec!["title", "name", "pages", "rate"]);
    assert_eq!(model.to_string(), "Book(title, name, pages, rate)");

    let redeclared = compiler
        .compile_attributes(
            "Redeclared",
            vec![
                Declaration::new(["a", "b"], TypeRef::named("String")),
                Declaration::new(["a"], TypeRef::named("Integer")),
            ],
            CompilerOptions::default(),
        )
        .expect("compiles");
    assert_eq!(redeclared.attribute_set().names(), vec!["a", "b"]);
    let a = redeclared.attribute_set().get("a").expect("declared");
    assert_eq!(a.type_ref(), &TypeRef::named("Integer"));
}

#[test]
fn setters_coerce_and_getters_return_stored_values() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default());
    let mut instance = model.new_instance();
    instance.set("pages", "12").expect("coerces");
    instance.set("name", 7).expect("coerces");
    assert_eq!(instance.get("pages").expect("known attribute"), Value::Integer(12));
    assert_eq!(instance.raw("name").expect("known attribute"), &Value::from("7"));
    assert!(instance.set("pages", "twelve").is_err());
    assert_eq!(instance.get("pages").expect("known attribute"), Value::Integer(12));
    let err = instance.set("isbn", "123").unwrap_err();
    assert!(matches!(err, CastError::UnknownAttribute { attribute, .. } if attribute == "isbn"));
    assert!(instance.get("isbn").is_err());
}

#[test]
fn constructor_only_when_asked_for() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default());
    let err = model.construct(attributes([("pages", 1)])).unwrap_err();
    assert!(matches!(err, CastError::NotSynthesized { member: "constructor", .. }));
}

#[test]
fn unrecognized_keys() {
    let compiler = setup();
    let strict = book(&compiler, CompilerOptions::default().with_constructor());
    let err = strict
        .construct(attributes([("pages", Value::from(1)), ("isbn", Value::from("123"))]))
        .unwrap_err();
    assert!(matches!(err, CastError::UnknownAttribute { attribute, .. } if attribute == "isbn"));

    let lenient = Arc::new(
        compiler
            .compile_attributes(
                "LenientBook",
                vec![Declaration::new(["pages"], TypeRef::named("Integer"))],
                CompilerOptions::default().with_constructor().ignoring_unrecognized_keys(),
            )
            .expect("compiles"),
    );
    let instance = lenient
        .construct(attributes([("pages", Value::from("1")), ("isbn", Value::from("123"))]))
        .expect("unknown key dropped");
    assert_eq!(instance.get("pages").expect("known attribute"), Value::Integer(1));
}

#[test]
fn bulk_accessor_modes() {
    let compiler = setup();
    let off = book(&compiler, CompilerOptions::default().with_constructor());
    let instance = off.construct(attributes([("pages", 3)])).expect("constructs");
    assert!(matches!(instance.attributes(), Err(CastError::NotSynthesized { .. })));

    for mode in [BulkAccessor::Storage, BulkAccessor::Getters] {
        let model = book(&compiler, CompilerOptions::default().with_constructor().with_bulk_accessor(mode));
        let instance = model
            .construct(attributes([("title", Value::from("Dune")), ("pages", Value::from("412"))]))
            .expect("constructs");
        let pairs = instance.attributes().expect("bulk accessor");
        assert_eq!(
            pairs,
            vec![
                ("title".to_string(), Value::from("Dune")),
                ("name".to_string(), Value::Nil),
                ("pages".to_string(), Value::Integer(412)),
                ("rate".to_string(), Value::Nil),
            ]
        );
    }
}

#[test]
fn instances_compare_by_values() {
    let compiler = setup();
    let model = book(&compiler, CompilerOptions::default().with_constructor());
    let a = model.construct(attributes([("pages", "10")])).expect("constructs");
    let b = model.construct(attributes([("pages", 10)])).expect("constructs");
    let c = model.construct(attributes([("pages", 11)])).expect("constructs");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(Value::Object(a).to_json(), serde_json::json!({"title": null, "name": null, "pages": 10, "rate": null}));
}

#[test]
fn process_wide_compilation() {
    let model = compile_attributes(
        "GlobalPoint",
        vec![Declaration::new(["x", "y"], TypeRef::named("Integer"))],
        CompilerOptions::default().with_constructor(),
    )
    .expect("compiles");
    let model = Arc::new(model);
    let point = model.construct(attributes([("x", "1"), ("y", "2")])).expect("constructs");
    assert_eq!(point.get("y").expect("known attribute"), Value::Integer(2));
}
