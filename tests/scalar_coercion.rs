use chrono::{FixedOffset, Local, NaiveDate, TimeZone};

use attrcast::datatype::{Decimal, Value};
use attrcast::registry::{TypeRegistry, FALSE_VALUES, TRUE_VALUES};
use attrcast::typekey::TypeRef;
use attrcast::{CastError, Result};

fn setup() -> TypeRegistry {
    TypeRegistry::with_builtins()
}

fn coerce(registry: &TypeRegistry, type_ref: TypeRef, value: impl Into<Value>) -> Result<Value> {
    registry.coercion("attr", &type_ref)?.apply(value.into(), registry)
}

fn integer() -> TypeRef {
    TypeRef::named("Integer")
}

#[test]
fn absence_stays_absent() {
    let registry = setup();
    for name in ["String", "Integer", "Float", "Array", "Date", "Time", "DateTime", "Decimal"] {
        let value = coerce(&registry, TypeRef::named(name), Value::Nil).expect("nil coerces");
        assert_eq!(value, Value::Nil, "{name} should keep nil");
    }
    assert_eq!(coerce(&registry, TypeRef::tag("boolean"), Value::Nil).expect("nil coerces"), Value::Nil);
}

#[test]
fn typed_values_pass_through_untouched() {
    let registry = setup();
    let items = vec![Value::from(1), Value::from("two")];
    let buffer = items.as_ptr();
    let value = coerce(&registry, TypeRef::named("Array"), Value::List(items)).expect("list passes");
    assert_eq!(value.as_list().expect("still a list").as_ptr(), buffer);

    let text = String::from("kept");
    let buffer = text.as_ptr();
    let value = coerce(&registry, TypeRef::named("String"), text).expect("text passes");
    assert_eq!(value.as_text().expect("still text").as_ptr(), buffer);
}

#[test]
fn integers() {
    let registry = setup();
    let cases: [(Value, i64); 9] = [
        ("250".into(), 250),
        (" 42 ".into(), 42),
        ("-1_000".into(), -1000),
        ("0x1A".into(), 26),
        ("0b101".into(), 5),
        ("0o17".into(), 15),
        ("017".into(), 17),
        (4.9.into(), 4),
        (Decimal::parse("12.0").expect("decimal").into(), 12),
    ];
    for (input, expected) in cases {
        let value = coerce(&registry, integer(), input.clone()).expect("integer coerces");
        assert_eq!(value, Value::Integer(expected), "coercing {input:?}");
    }
    for input in [Value::from("abc"), Value::from("4.5"), Value::from(true), Value::from(f64::NAN)] {
        let err = coerce(&registry, integer(), input).unwrap_err();
        assert!(matches!(err, CastError::InvalidValue { .. }));
    }
}

#[test]
fn floats() {
    let registry = setup();
    let float = || TypeRef::named("Float");
    assert_eq!(coerce(&registry, float(), "4.1").expect("float"), Value::Float(4.1));
    assert_eq!(coerce(&registry, float(), 3).expect("float"), Value::Float(3.0));
    assert_eq!(coerce(&registry, float(), "1e3").expect("float"), Value::Float(1000.0));
    assert_eq!(coerce(&registry, float(), "-2").expect("float"), Value::Float(-2.0));
    assert!(coerce(&registry, float(), "four").is_err());
    assert!(coerce(&registry, float(), "inf").is_err());
}

#[test]
fn text() {
    let registry = setup();
    let string = || TypeRef::named("String");
    assert_eq!(coerce(&registry, string(), 42).expect("text"), Value::from("42"));
    assert_eq!(coerce(&registry, string(), 4.0).expect("text"), Value::from("4.0"));
    assert_eq!(coerce(&registry, string(), true).expect("text"), Value::from("true"));
    assert_eq!(coerce(&registry, string(), Value::symbol("draft")).expect("text"), Value::from("draft"));
    let err = coerce(&registry, string(), vec![Value::from(1)]).unwrap_err();
    assert!(matches!(err, CastError::InvalidValue { .. }));
}

#[test]
fn decimals_keep_their_digits() {
    let registry = setup();
    let decimal = || TypeRef::named("Decimal");
    let value = coerce(&registry, decimal(), "12345678901234567890.123456789").expect("decimal");
    assert_eq!(value.to_string(), "12345678901234567890.123456789");
    assert_eq!(coerce(&registry, decimal(), 7).expect("decimal"), Value::Decimal(Decimal::from(7)));
    assert!(coerce(&registry, decimal(), "1.2.3").is_err());
}

#[test]
fn dates() {
    let registry = setup();
    let date = || TypeRef::named("Date");
    let expected = Value::Date(NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"));
    for input in ["2024-03-05", "2024/03/05", "05.03.2024", "2024-03-05T10:00:00+02:00", "2024-03-05 23:59:59"] {
        assert_eq!(coerce(&registry, date(), input).expect("date"), expected, "coercing {input}");
    }
    assert!(coerce(&registry, date(), "2024-02-30").is_err());
    assert!(coerce(&registry, date(), 20240305).is_err());
}

#[test]
fn date_times_default_to_utc() {
    let registry = setup();
    let date_time = || TypeRef::named("DateTime");
    let utc = FixedOffset::east_opt(0).expect("valid offset");
    let expected = utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).single().expect("valid time");
    assert_eq!(coerce(&registry, date_time(), "2024-03-05 10:30:00").expect("date-time"), Value::DateTime(expected));

    let plus_two = FixedOffset::east_opt(2 * 3600).expect("valid offset");
    let expected = plus_two.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).single().expect("valid time");
    let value = coerce(&registry, date_time(), "2024-03-05T10:30:00+02:00").expect("date-time");
    assert_eq!(value, Value::DateTime(expected));
    assert_eq!(value.to_string(), "2024-03-05T10:30:00+02:00");
}

#[test]
fn times_are_local() {
    let registry = setup();
    let expected = Local.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).earliest().expect("valid time");
    let value = coerce(&registry, TypeRef::named("Time"), "2024-03-05 10:30:00").expect("time");
    assert_eq!(value, Value::Time(expected));
}

#[test]
fn scalars_wrap_into_arrays() {
    let registry = setup();
    let value = coerce(&registry, TypeRef::named("Array"), "x").expect("array");
    assert_eq!(value, Value::List(vec![Value::from("x")]));
}

#[test]
fn coercion_is_idempotent() {
    let registry = setup();
    let cases: [(&str, Value); 6] = [
        ("Integer", "0x10".into()),
        ("Float", "2.5".into()),
        ("String", 12.into()),
        ("Date", "2024-01-31".into()),
        ("DateTime", "2024-01-31 08:00:00".into()),
        ("Decimal", "0.10".into()),
    ];
    for (name, input) in cases {
        let once = coerce(&registry, TypeRef::named(name), input).expect("coerces once");
        let twice = coerce(&registry, TypeRef::named(name), once.clone()).expect("coerces twice");
        assert_eq!(once, twice, "{name} should be idempotent");
    }
}

#[test]
fn booleans_from_literal_sets() {
    let registry = setup();
    let boolean = || TypeRef::tag("boolean");
    for text in TRUE_VALUES {
        assert_eq!(coerce(&registry, boolean(), text).expect("boolean"), Value::Bool(true), "{text}");
    }
    for text in FALSE_VALUES {
        assert_eq!(coerce(&registry, boolean(), text).expect("boolean"), Value::Bool(false), "{text}");
    }
    assert_eq!(coerce(&registry, boolean(), true).expect("boolean"), Value::Bool(true));
    assert_eq!(coerce(&registry, boolean(), 1).expect("boolean"), Value::Bool(true));
    assert_eq!(coerce(&registry, boolean(), false).expect("boolean"), Value::Bool(false));
    assert_eq!(coerce(&registry, boolean(), 0).expect("boolean"), Value::Bool(false));
    assert_eq!(coerce(&registry, boolean(), 1.0).expect("boolean"), Value::Bool(true));
    assert_eq!(coerce(&registry, boolean(), 0.0).expect("boolean"), Value::Bool(false));
    assert_eq!(coerce(&registry, boolean(), -0.0).expect("boolean"), Value::Bool(false));
    for rejected in [Value::from("yes"), Value::from(2), Value::from(0.5), Value::from("True")] {
        let err = coerce(&registry, boolean(), rejected).unwrap_err();
        assert!(matches!(err, CastError::InvalidValue { .. }));
    }
}
