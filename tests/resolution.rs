use avro_fast::value::Value;
use avro_fast::{Options, Schema};
use pretty_assertions::assert_eq;

fn schema(json: &str) -> Schema {
    Schema::compile(json, Options::default()).expect("failed to compile schema")
}

/// Testable property 6 (spec §8): resolving against an identical reader
/// schema must equal a direct decode.
#[test]
fn resolution_monotonicity() {
    let s = schema(
        r#"{"type": "record", "name": "Example", "fields": [
            {"name": "name", "type": "string"},
            {"name": "age", "type": "int"}
        ]}"#,
    );
    let value = Value::Record(avro_fast::value::RecordValue {
        schema_id: avro_fast::value::SchemaId {
            fingerprint: s.fingerprint(),
            node: s.root(),
        },
        name: "Example".to_owned(),
        fields: vec![
            ("name".to_owned(), Value::String("John".to_owned())),
            ("age".to_owned(), Value::Int(42)),
        ],
    });
    let bytes = s.binary_encode(&value).unwrap();

    let direct = s.binary_decode(&bytes).unwrap();
    let resolved = s.binary_decode_resolving(&s, &bytes).unwrap();
    assert_eq!(direct, resolved);
}

/// Writer `int` promotes to reader `long`/`float`/`double` (§4.G).
#[test]
fn int_promotes_to_long() {
    let writer = schema(r#""int""#);
    let reader = schema(r#""long""#);

    let bytes = writer.binary_encode(&Value::Int(42)).unwrap();
    let resolved = reader.binary_decode_resolving(&writer, &bytes).unwrap();
    assert_eq!(resolved, Value::Long(42));
}

/// A reader field absent from the writer falls back to its declared
/// default rather than failing resolution.
#[test]
fn missing_writer_field_uses_reader_default() {
    let writer = schema(r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#);
    let reader = schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string", "default": "fallback"}
        ]}"#,
    );

    let value = Value::Record(avro_fast::value::RecordValue {
        schema_id: avro_fast::value::SchemaId {
            fingerprint: writer.fingerprint(),
            node: writer.root(),
        },
        name: "R".to_owned(),
        fields: vec![("a".to_owned(), Value::Int(7))],
    });
    let bytes = writer.binary_encode(&value).unwrap();

    let resolved = reader.binary_decode_resolving(&writer, &bytes).unwrap();
    match resolved {
        Value::Record(r) => {
            assert_eq!(r.field("a"), Some(&Value::Int(7)));
            assert_eq!(r.field("b"), Some(&Value::String("fallback".to_owned())));
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

/// A reader field with no writer counterpart and no default is an error.
#[test]
fn missing_reader_field_without_default_errors() {
    let writer = schema(r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#);
    let reader = schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"}
        ]}"#,
    );

    let bytes = writer.binary_encode(&Value::Record(avro_fast::value::RecordValue {
        schema_id: avro_fast::value::SchemaId {
            fingerprint: writer.fingerprint(),
            node: writer.root(),
        },
        name: "R".to_owned(),
        fields: vec![("a".to_owned(), Value::Int(7))],
    })).unwrap();

    let err = reader.binary_decode_resolving(&writer, &bytes).unwrap_err();
    assert!(matches!(
        err,
        avro_fast::DeError::Resolution(avro_fast::de::ResolutionError::MissingReaderField { .. })
    ));
}
