use clumper::types::{Clumper, Record, Value};
use clumper::ClumpError;
use serde_json::json;

#[test]
fn pipeline_over_parsed_json() {
    let input = r#"[
        {"id": 1, "user": {"name": "Ada"}, "score": 98.5, "tags": ["x"]},
        {"id": 2, "user": {"name": "Grace"}, "score": 87.25, "tags": []},
        {"id": 3, "user": {"name": "Alan"}, "score": 91, "tags": ["y", "z"]}
    ]"#;
    let c: Clumper = serde_json::from_str(input).unwrap();

    let out = c
        .mutate_field("name", |r| {
            let user = r.field("user")?.as_record().ok_or(ClumpError::TypeMismatch {
                field: "user".to_string(),
                expected: "record",
                found: r.field("user")?.type_name(),
            })?;
            Ok(Value::from(user.text("name")?))
        })
        .unwrap()
        .keep(|r| Ok(r.field("tags")?.as_list().is_some_and(|t| !t.is_empty())))
        .unwrap()
        .sort_by_field("score", false)
        .unwrap()
        .select(["id", "name"])
        .unwrap();

    assert_eq!(
        serde_json::to_value(&out).unwrap(),
        json!([{"id": 3, "name": "Alan"}, {"id": 1, "name": "Ada"}])
    );
}

#[test]
fn single_object_is_wrapped_into_a_collection() {
    let c = Clumper::try_from(json!({"a": 1})).unwrap();
    assert!(c.equals(&[Record::from_iter([("a", 1)])]));
}

#[test]
fn scalar_json_is_rejected() {
    let err = Clumper::try_from(json!(42)).unwrap_err();
    assert_eq!(err, ClumpError::NotARecord { found: "number" });

    let parsed: Result<Clumper, _> = serde_json::from_str("[1, 2]");
    assert!(parsed.is_err());
}

#[test]
fn record_roundtrips_through_json_value() {
    let r = Record::from_iter([("b", Value::from(1)), ("a", Value::from("x"))]);
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v, json!({"a": "x", "b": 1}));
    let back: Record = serde_json::from_value(v).unwrap();
    assert_eq!(back, r);
}
