use avro_fast::value::Value;
use avro_fast::{Options, Schema};
use pretty_assertions::assert_eq;

const SCHEMA_JSON: &str = r#"{
    "type": "record",
    "name": "Person",
    "fields": [
        {"name": "name", "type": "string", "default": "JDoe"},
        {"name": "age", "type": "int", "default": 25}
    ]
}"#;

/// Scenario C (spec §8): encoding an empty map with
/// `record_encode_use_defaults=true` fills in the field defaults.
#[test]
fn encode_uses_field_defaults() {
    let schema = Schema::compile(
        SCHEMA_JSON,
        Options::builder().record_encode_use_defaults(true).build(),
    )
    .unwrap();

    let bytes = schema.binary_encode(&Value::Map(hashbrown::HashMap::new())).unwrap();
    assert_eq!(bytes, vec![0x08, b'J', b'D', b'o', b'e', 0x32]);
}

/// Same encode with defaults disabled must fail with `MissingField`.
#[test]
fn encode_without_defaults_errors() {
    let schema = Schema::compile(
        SCHEMA_JSON,
        Options::builder().record_encode_use_defaults(false).build(),
    )
    .unwrap();

    let err = schema
        .binary_encode(&Value::Map(hashbrown::HashMap::new()))
        .unwrap_err();
    assert!(matches!(err, avro_fast::SerError::MissingField { .. }));
}

/// Testable property 7 (spec §8): mutating one decoded record's default
/// field must not affect another decoded record that used the same
/// default.
#[test]
fn default_isolation_across_decodes() {
    let schema = Schema::compile(
        SCHEMA_JSON,
        Options::builder().record_encode_use_defaults(true).build(),
    )
    .unwrap();

    let bytes = schema.binary_encode(&Value::Map(hashbrown::HashMap::new())).unwrap();
    let mut first = schema.binary_decode(&bytes).unwrap();
    let second = schema.binary_decode(&bytes).unwrap();

    if let Value::Record(record) = &mut first {
        for (name, value) in record.fields.iter_mut() {
            if name == "age" {
                *value = Value::Int(99);
            }
        }
    }

    match second {
        Value::Record(record) => assert_eq!(record.field("age"), Some(&Value::Int(25))),
        other => panic!("expected a record, got {other:?}"),
    }
}
