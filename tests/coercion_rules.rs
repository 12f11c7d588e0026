use attrcast::datatype::Value;
use attrcast::registry::TypeRegistry;
use attrcast::rule::CoercionRule;
use attrcast::template::{Guard, Pattern, Template};
use attrcast::typekey::TypeRef;
use attrcast::CastError;

fn setup() -> TypeRegistry {
    TypeRegistry::with_builtins()
}

fn apply(registry: &TypeRegistry, rule: CoercionRule, attribute: &str, value: Value) -> Result<Value, CastError> {
    rule.compile(attribute, &TypeRef::tag("test")).apply(value, registry)
}

#[test]
fn input_placeholder_and_escapes() {
    let registry = setup();
    let rule = CoercionRule::new(Template::text("%s %%s %%%s %%%%s"));
    let value = apply(&registry, rule, "title", Value::from(3)).expect("rendered");
    assert_eq!(value.as_text(), Some("3 %s %3 %%s"));
}

#[test]
fn attribute_placeholder_and_escapes() {
    let registry = setup();
    let rule = CoercionRule::new(Template::text("%a%%a%%%a"));
    let value = apply(&registry, rule, "title", Value::Nil).expect("rendered");
    assert_eq!(value.as_text(), Some("title%a%title"));
}

#[test]
fn other_percent_signs_are_literal() {
    let pattern = Pattern::parse("100%d of %");
    assert_eq!(pattern.render("rate", &Value::Nil), "100%d of %");
    assert!(!pattern.references_input());
    assert!(Pattern::parse("<%s>").references_input());
}

#[test]
fn input_is_rendered_at_every_reference() {
    let registry = setup();
    let rule = CoercionRule::new(Template::text("%s-%s-%s"));
    let value = apply(&registry, rule, "code", Value::from("ab")).expect("rendered");
    assert_eq!(value.as_text(), Some("ab-ab-ab"));
}

#[test]
fn lenient_rule_from_text() {
    let registry = setup();
    let rule = CoercionRule::parse(&[("\"yes\"", "true"), ("\"no\"", "false")], "nil").expect("rule parses");
    registry.register(&TypeRef::tag("lenient"), rule);
    let coercion = registry.coercion("accepted", &TypeRef::tag("lenient")).expect("registered");
    assert_eq!(coercion.apply("yes".into(), &registry).expect("coerced"), Value::Bool(true));
    assert_eq!(coercion.apply("no".into(), &registry).expect("coerced"), Value::Bool(false));
    assert_eq!(coercion.apply("maybe".into(), &registry).expect("coerced"), Value::Nil);
    assert_eq!(coercion.apply(Value::Nil, &registry).expect("coerced"), Value::Nil);
}

#[test]
fn first_matching_guard_wins() {
    let registry = setup();
    let rule = CoercionRule::new(Template::Reject)
        .when(Guard::literal(1), Template::constant("one"))
        .when(Guard::kind("Integer"), Template::constant("int"))
        .when(Guard::literal(2), Template::constant("two"));
    let coercion = rule.compile("count", &TypeRef::tag("count"));
    assert_eq!(coercion.apply(1.into(), &registry).expect("matched"), Value::from("one"));
    assert_eq!(coercion.apply(2.into(), &registry).expect("matched"), Value::from("int"));
    let err = coercion.apply("x".into(), &registry).unwrap_err();
    match err {
        CastError::InvalidValue { attribute, type_name, value } => {
            assert_eq!(attribute, "count");
            assert_eq!(type_name, ":count");
            assert_eq!(value, "x");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn guards_parse_from_text() {
    assert_eq!(Guard::parse("nil").expect("guard"), Guard::Absent);
    assert_eq!(Guard::parse("Integer").expect("guard"), Guard::kind("Integer"));
    assert_eq!(Guard::parse("42").expect("guard"), Guard::literal(42));
    assert_eq!(Guard::parse("-4.5").expect("guard"), Guard::literal(-4.5));
    assert_eq!(Guard::parse("true").expect("guard"), Guard::literal(true));
    assert_eq!(Guard::parse("\"on\"").expect("guard"), Guard::literal("on"));
    assert_eq!(Guard::parse(":on").expect("guard"), Guard::Literal(Value::symbol("on")));
    assert!(matches!(Guard::parse("x > 1"), Err(CastError::Template { .. })));
}

#[test]
fn templates_parse_from_text() {
    assert!(matches!(Template::parse("nil"), Ok(Template::Absent)));
    assert!(matches!(Template::parse("%s"), Ok(Template::Input)));
    assert!(matches!(Template::parse("reject"), Ok(Template::Reject)));
    assert!(matches!(Template::parse("integer(%s)"), Ok(Template::Convert(_))));
    assert!(matches!(Template::parse("\"<%s>\""), Ok(Template::Text(_))));
    assert!(matches!(Template::parse("12"), Ok(Template::Constant(Value::Integer(12)))));
    assert!(matches!(Template::parse("shout(%s)"), Err(CastError::Template { .. })));
    assert!(matches!(Template::parse("what"), Err(CastError::Template { .. })));
}

#[test]
fn parsed_conversion_call_coerces() {
    let registry = setup();
    let rule = CoercionRule::parse(&[("\"none\"", "nil")], "integer(%s)").expect("rule parses");
    let coercion = rule.compile("pages", &TypeRef::named("Integer"));
    assert_eq!(coercion.apply("none".into(), &registry).expect("coerced"), Value::Nil);
    assert_eq!(coercion.apply("12".into(), &registry).expect("coerced"), Value::Integer(12));
    assert!(matches!(coercion.apply("x".into(), &registry), Err(CastError::InvalidValue { .. })));
}

#[test]
fn failed_conversions_become_invalid_values() {
    let registry = setup();
    let rule = CoercionRule::new(Template::convert(|value, _| {
        Err(CastError::Unconvertible(format!("no thanks: {}", value)))
    }));
    let err = rule.compile("color", &TypeRef::named("Color")).apply("mauve".into(), &registry).unwrap_err();
    assert_eq!(err.to_string(), "Invalid value \"mauve\" for attribute \"color\" of type \"Color\"");
}

#[test]
fn conversions_see_the_attribute() {
    let registry = setup();
    let rule = CoercionRule::new(Template::convert(|value, context| {
        Ok(Value::from(format!("{}={}", context.attribute, value)))
    }));
    let value = rule.compile("size", &TypeRef::named("Label")).apply(3.into(), &registry).expect("converted");
    assert_eq!(value.as_text(), Some("size=3"));
}
