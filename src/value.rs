//! The dynamic host value type that `Schema::binary_encode`/`binary_decode`
//! operate over.
//!
//! Shaped after the dynamic `Value` enum used throughout the Avro Rust
//! ecosystem (mirrored here rather than invented, since typed host bindings
//! are out of scope and a dynamic value is the natural substitute).

use hashbrown::HashMap;
use rust_decimal::Decimal;

use crate::schema::SchemaKey;

/// Identity of the schema a `Record`/`Enum`/`Fixed` value was produced
/// against, used to short-circuit record adaptation (§4.E) without walking
/// back to the originating `Schema`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SchemaId {
    pub fingerprint: [u8; 8],
    pub node: SchemaKey,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordValue {
    pub schema_id: SchemaId,
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl RecordValue {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumValue {
    pub schema_id: SchemaId,
    pub name: String,
    pub index: usize,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FixedValue {
    pub schema_id: SchemaId,
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DurationValue {
    pub months: u32,
    pub days: u32,
    pub millis: u32,
}

/// A dynamic Avro value.
///
/// `date`/`time-millis`/`time-micros`/`timestamp-millis`/`timestamp-micros`/
/// `uuid` logical types reuse their physical representation (`Int`, `Long`,
/// `String`) since their host-level "transform" is a pure reinterpretation
/// with no additional shape (§4.F); `Decimal` and `Duration` get dedicated
/// variants because they carry real validation/transform logic.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Fixed(FixedValue),
    Enum(EnumValue),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Branch index, then the payload.
    Union(usize, Box<Value>),
    Record(RecordValue),
    Decimal(Decimal),
    Duration(DurationValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The coarse category tag used for union dispatch (§4.D), ignoring any
    /// `int`/`long` or `float`/`double` promotion.
    pub fn category(&self) -> Category {
        match self {
            Value::Null => Category::Null,
            Value::Boolean(_) => Category::Boolean,
            Value::Int(_) => Category::Int,
            Value::Long(_) => Category::Long,
            Value::Float(_) => Category::Float,
            Value::Double(_) => Category::Double,
            Value::Bytes(_) => Category::Bytes,
            Value::String(_) => Category::String,
            Value::Array(_) => Category::Array,
            Value::Map(_) => Category::Map,
            Value::Fixed(f) => Category::Fixed(f.name.clone()),
            Value::Enum(e) => Category::Enum(e.name.clone()),
            Value::Record(r) => Category::Record(r.name.clone()),
            Value::Union(_, inner) => inner.category(),
            Value::Decimal(_) => Category::Bytes,
            Value::Duration(_) => Category::Fixed(String::new()),
        }
    }
}

/// Coarse dispatch tag, see §4.D.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array,
    Map,
    Fixed(String),
    Enum(String),
    Record(String),
}
