use avro_fast::object_container_file_encoding::{Reader, WriterBuilder};
use avro_fast::value::{RecordValue, SchemaId, Value};
use avro_fast::{Options, Schema};
use pretty_assertions::assert_eq;

const SCHEMA_JSON: &str = r#"{
    "type": "record",
    "name": "Example",
    "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int"}
    ]
}"#;

fn example(schema: &Schema, name: &str, age: i32) -> Value {
    Value::Record(RecordValue {
        schema_id: SchemaId {
            fingerprint: schema.fingerprint(),
            node: schema.root(),
        },
        name: "Example".to_owned(),
        fields: vec![
            ("name".to_owned(), Value::String(name.to_owned())),
            ("age".to_owned(), Value::Int(age)),
        ],
    })
}

/// Scenario E (spec §8): two values written into one block, read back in
/// order; truncating the trailing sync marker surfaces `TruncatedBlock`
/// at (not before) the last object of that block.
#[test]
fn two_values_one_block_round_trip() {
    let schema = Schema::compile(SCHEMA_JSON, Options::default()).unwrap();
    let v1 = example(&schema, "John", 42);
    let v2 = example(&schema, "Jane", 30);

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().build(&schema, &mut buf).unwrap();
        writer.append(&v1).unwrap();
        writer.append(&v2).unwrap();
        writer.finish().unwrap();
    }

    let reader = Reader::new(buf.as_slice(), Options::default()).unwrap();
    let values: Vec<Value> = reader.collect::<Result<Vec<Value>, _>>().unwrap();
    assert_eq!(values, vec![v1, v2]);
}

#[test]
fn truncated_sync_marker_errors_on_last_object_of_the_block() {
    let schema = Schema::compile(SCHEMA_JSON, Options::default()).unwrap();
    let v1 = example(&schema, "John", 42);
    let v2 = example(&schema, "Jane", 30);

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().build(&schema, &mut buf).unwrap();
        writer.append(&v1).unwrap();
        writer.append(&v2).unwrap();
        writer.finish().unwrap();
    }
    buf.truncate(buf.len() - 1);

    let reader = Reader::new(buf.as_slice(), Options::default()).unwrap();
    let results: Vec<_> = reader.collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &v1);
    assert!(matches!(
        results[1],
        Err(avro_fast::object_container_file_encoding::ContainerError::TruncatedBlock)
    ));
}

#[test]
fn round_trip_through_deflate() {
    use avro_fast::object_container_file_encoding::{Compression, CompressionLevel};

    let schema = Schema::compile(SCHEMA_JSON, Options::default()).unwrap();
    let v1 = example(&schema, "John", 42);

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .compression(Compression::Deflate(CompressionLevel::default()))
            .build(&schema, &mut buf)
            .unwrap();
        writer.append(&v1).unwrap();
        writer.finish().unwrap();
    }

    let reader = Reader::new(buf.as_slice(), Options::default()).unwrap();
    let values: Vec<Value> = reader.collect::<Result<Vec<Value>, _>>().unwrap();
    assert_eq!(values, vec![v1]);
}
