//! # Getting started
//!
//! ```
//! let schema = avro_fast::Schema::compile(
//! 	r#"
//! 	{
//! 		"type": "record",
//! 		"name": "Test",
//! 		"fields": [
//! 			{ "name": "field", "type": "string" }
//! 		]
//! 	}
//! 	"#,
//! 	avro_fast::Options::default(),
//! )
//! .expect("failed to compile schema");
//!
//! let avro_datum = &[6, 102, 111, 111];
//! let value = schema.binary_decode(avro_datum).expect("failed to decode");
//! let record = match &value {
//! 	avro_fast::Value::Record(record) => record,
//! 	_ => panic!("expected a record"),
//! };
//! assert_eq!(
//! 	record.field("field"),
//! 	Some(&avro_fast::Value::String("foo".to_owned()))
//! );
//! ```
//!
//! # An arena-based Avro schema compiler and dynamic (de)serializer
//!
//! Schemas compile once into a flat node arena (no boxed/recursive
//! self-referential graph), after which encoding and decoding operate on a
//! dynamic [`Value`] rather than requiring a generated Rust type per
//! schema — useful for tooling that only learns its schemas at runtime
//! (gateways, CLI inspectors, schema registries).
//!
//! Binary (datum), JSON, and object-container-file encodings are all
//! supported, along with writer/reader schema resolution and the
//! standard logical types (decimals, dates, timestamps, durations, uuid).

mod codec;
mod dispatch;

pub mod de;
pub mod object_container_file_encoding;
pub mod options;
pub mod schema;
pub mod ser;
pub mod value;

pub use de::DeError;
pub use options::Options;
pub use schema::{Schema, SchemaError};
pub use ser::SerError;
pub use value::Value;
