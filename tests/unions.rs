use avro_fast::value::Value;
use avro_fast::{Options, Schema};
use pretty_assertions::assert_eq;

fn schema(json: &str) -> Schema {
    Schema::compile(json, Options::default()).expect("failed to compile schema")
}

/// Scenario B (spec §8): `["null","string"]`.
#[test]
fn null_or_string() {
    let s = schema(r#"["null", "string"]"#);

    let encoded_null = s.binary_encode(&Value::Null).unwrap();
    assert_eq!(encoded_null, vec![0x00]);
    assert_eq!(s.binary_decode(&encoded_null).unwrap(), Value::Null);

    let encoded_str = s.binary_encode(&Value::String("hi".to_owned())).unwrap();
    assert_eq!(encoded_str, vec![0x02, 0x04, b'h', b'i']);
    match s.binary_decode(&encoded_str).unwrap() {
        Value::Union(1, inner) => assert_eq!(*inner, Value::String("hi".to_owned())),
        other => panic!("expected union branch 1, got {other:?}"),
    }
}

/// Scenario D (spec §8): `record_values_type_hint` dispatches a bare map
/// with a `-type` key to the matching named branch.
#[test]
fn record_values_type_hint() {
    let s = Schema::compile(
        r#"[
            {"type": "record", "name": "A", "fields": [{"name": "value", "type": "int"}]},
            {"type": "record", "name": "B", "fields": [{"name": "value", "type": "long"}]}
        ]"#,
        Options::builder().record_values_type_hint(true).build(),
    )
    .unwrap();

    let mut map = hashbrown::HashMap::new();
    map.insert("-type".to_owned(), Value::String("B".to_owned()));
    map.insert("value".to_owned(), Value::Long(42));

    let bytes = s.binary_encode(&Value::Map(map)).unwrap();
    assert_eq!(bytes, vec![0x02, 0x54]);

    match s.binary_decode(&bytes).unwrap() {
        Value::Union(1, inner) => match *inner {
            Value::Record(record) => {
                assert_eq!(record.name, "B");
                assert_eq!(record.field("value"), Some(&Value::Long(42)));
            }
            other => panic!("expected record B, got {other:?}"),
        },
        other => panic!("expected union branch 1, got {other:?}"),
    }
}

/// An ambiguous dispatch (two branches sharing a category with no
/// disambiguating hint available) must surface as an error, not a silent
/// pick of the first match.
#[test]
fn ambiguous_dispatch_is_an_error() {
    let s = schema(
        r#"[
            {"type": "record", "name": "A", "fields": [{"name": "value", "type": "int"}]},
            {"type": "record", "name": "B", "fields": [{"name": "value", "type": "int"}]}
        ]"#,
    );

    let mut map = hashbrown::HashMap::new();
    map.insert("value".to_owned(), Value::Int(1));

    let err = s.binary_encode(&Value::Map(map)).unwrap_err();
    assert!(matches!(err, avro_fast::SerError::DispatchAmbiguous(_)));
}
