use avro_fast::value::{EnumValue, FixedValue, RecordValue, SchemaId, Value};
use avro_fast::{Options, Schema};
use hashbrown::HashMap;
use pretty_assertions::assert_eq;

fn schema(json: &str) -> Schema {
    Schema::compile(json, Options::default()).expect("failed to compile schema")
}

fn root_schema_id(s: &Schema) -> SchemaId {
    SchemaId {
        fingerprint: s.fingerprint(),
        node: s.root(),
    }
}

fn round_trip(schema: &Schema, value: Value) {
    let bytes = schema.binary_encode(&value).expect("encode failed");
    let decoded = schema.binary_decode(&bytes).expect("decode failed");
    assert_eq!(decoded, value);
}

#[test]
fn primitives() {
    round_trip(&schema(r#""null""#), Value::Null);
    round_trip(&schema(r#""boolean""#), Value::Boolean(true));
    round_trip(&schema(r#""int""#), Value::Int(1234));
    round_trip(&schema(r#""long""#), Value::Long(1234));
    round_trip(&schema(r#""float""#), Value::Float(1234.5));
    round_trip(&schema(r#""double""#), Value::Double(1234.5));
    round_trip(
        &schema(r#""string""#),
        Value::String("adsfasdf09809dsf-=adsf".to_owned()),
    );
    round_trip(
        &schema(r#""bytes""#),
        Value::Bytes(b"12345abcd".to_vec()),
    );
}

#[test]
fn fixed_and_enum() {
    let fixed_schema = schema(r#"{"type": "fixed", "name": "Test", "size": 1}"#);
    round_trip(
        &fixed_schema,
        Value::Fixed(FixedValue {
            schema_id: root_schema_id(&fixed_schema),
            name: "Test".to_owned(),
            bytes: vec![b'B'],
        }),
    );

    let enum_schema = schema(r#"{"type": "enum", "name": "Test", "symbols": ["A", "B"]}"#);
    round_trip(
        &enum_schema,
        Value::Enum(EnumValue {
            schema_id: root_schema_id(&enum_schema),
            name: "Test".to_owned(),
            index: 1,
            symbol: "B".to_owned(),
        }),
    );
}

#[test]
fn array_and_map() {
    round_trip(
        &schema(r#"{"type": "array", "items": "long"}"#),
        Value::Array(vec![Value::Long(1), Value::Long(3), Value::Long(2)]),
    );

    let mut map = HashMap::new();
    map.insert("a".to_owned(), Value::Long(1));
    map.insert("b".to_owned(), Value::Long(3));
    round_trip(&schema(r#"{"type": "map", "values": "long"}"#), Value::Map(map));
}

#[test]
fn record() {
    let s = schema(
        r#"{"type": "record", "name": "Example", "fields": [
            {"name": "name", "type": "string"},
            {"name": "age", "type": "int"}
        ]}"#,
    );
    let value = Value::Record(RecordValue {
        schema_id: root_schema_id(&s),
        name: "Example".to_owned(),
        fields: vec![
            ("name".to_owned(), Value::String("John".to_owned())),
            ("age".to_owned(), Value::Int(42)),
        ],
    });

    // Scenario A (spec §8): encoded bytes are exactly the length-prefixed
    // name followed by the zigzag-encoded age.
    let bytes = s.binary_encode(&value).unwrap();
    assert_eq!(bytes, vec![0x08, b'J', b'o', b'h', b'n', 0x54]);

    let decoded = s.binary_decode(&bytes).unwrap();
    match decoded {
        Value::Record(r) => {
            assert_eq!(r.field("name"), Some(&Value::String("John".to_owned())));
            assert_eq!(r.field("age"), Some(&Value::Int(42)));
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn zigzag_scenario_f() {
    let s = schema(r#""long""#);
    assert_eq!(s.binary_encode(&Value::Long(0)).unwrap(), vec![0x00]);
    assert_eq!(s.binary_encode(&Value::Long(-1)).unwrap(), vec![0x01]);
    assert_eq!(s.binary_encode(&Value::Long(1)).unwrap(), vec![0x02]);
    assert_eq!(s.binary_encode(&Value::Long(63)).unwrap(), vec![0x7E]);
    assert_eq!(s.binary_encode(&Value::Long(64)).unwrap(), vec![0x80, 0x01]);
    assert_eq!(s.binary_encode(&Value::Long(-64)).unwrap(), vec![0x7F]);

    let eleven_bytes = [0xffu8, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
    let err = s.binary_decode(&eleven_bytes).unwrap_err();
    assert!(matches!(err, avro_fast::DeError::IntegerOverflow));
}
