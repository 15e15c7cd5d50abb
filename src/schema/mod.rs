//! The schema model: a typed representation of every Avro type, the
//! named-type registry, canonical form and fingerprinting (§3, §4.C).
//!
//! Grounded on `serde_avro_fast`'s safe arena representation
//! (`schema/safe/mod.rs`: `SchemaMut` + `SchemaKey`), promoted here to be
//! the crate's *only* runtime schema representation — no unsafe
//! self-referential pointer graph on top, per `spec.md` §9's own
//! endorsement of arena+index for recursive schemas (see `DESIGN.md`,
//! Open Question 1).

mod canonical_form;
pub mod error;
mod name;
mod parsing;
mod rabin;

pub use error::SchemaError;
pub use name::Name;
pub(crate) use parsing::node_category;

use hashbrown::HashMap;
use std::ops::Index;

use crate::options::Options;
use crate::value::Value;

/// A stable index into a [`Schema`]'s node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SchemaKey(usize);

impl SchemaKey {
    pub(crate) fn from_idx(idx: usize) -> Self {
        Self(idx)
    }
    pub fn idx(self) -> usize {
        self.0
    }
}

/// The result of [`Schema::fingerprint_value`] (§4.B
/// `fingerprint_returns_digest`, §6: `fingerprint(algorithm="rabin") ->
/// bytes|int`). `Integer` reinterprets the same 8 digest bytes
/// little-endian, matching the signed 64-bit integers published in the
/// Avro spec's own fingerprint reference vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fingerprint {
    Digest([u8; 8]),
    Integer(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOrder {
    Ascending,
    Descending,
    Ignore,
}

impl Default for FieldOrder {
    fn default() -> Self {
        FieldOrder::Ascending
    }
}

#[derive(Clone, Debug)]
pub struct RecordField {
    pub name: String,
    pub aliases: Vec<String>,
    pub type_: SchemaKey,
    pub default: Option<Value>,
    pub order: FieldOrder,
}

#[derive(Clone, Debug)]
pub struct Record {
    pub name: Name,
    pub aliases: Vec<String>,
    pub fields: Vec<RecordField>,
}

impl Record {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| {
            f.name == name || f.aliases.iter().any(|a| a == name)
        })
    }
}

#[derive(Clone, Debug)]
pub struct Enum {
    pub name: Name,
    pub aliases: Vec<String>,
    pub symbols: Vec<String>,
    pub default_symbol: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Fixed {
    pub name: Name,
    pub aliases: Vec<String>,
    pub size: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Array {
    pub items: SchemaKey,
}

#[derive(Clone, Copy, Debug)]
pub struct Map {
    pub values: SchemaKey,
}

#[derive(Clone, Debug)]
pub struct Union {
    pub variants: Vec<SchemaKey>,
    /// Precomputed per-branch category key (§4.D), computed once at compile
    /// time so dispatch never needs to re-walk the schema graph.
    pub(crate) category_keys: Vec<crate::value::Category>,
}

#[derive(Clone, Debug)]
pub struct Decimal {
    pub precision: usize,
    pub scale: u32,
}

#[derive(Clone, Debug)]
pub enum LogicalType {
    Decimal(Decimal),
    Uuid,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Duration,
    /// Recognized but not acted on beyond round-tripping: a logical type
    /// name the compiler doesn't know how to validate/transform.
    Unknown(String),
}

#[derive(Clone, Debug)]
pub enum RegularType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(Array),
    Map(Map),
    Union(Union),
    Record(Record),
    Enum(Enum),
    Fixed(Fixed),
}

impl RegularType {
    pub fn name(&self) -> Option<&Name> {
        match self {
            RegularType::Record(r) => Some(&r.name),
            RegularType::Enum(e) => Some(&e.name),
            RegularType::Fixed(f) => Some(&f.name),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SchemaNode {
    pub type_: RegularType,
    pub logical_type: Option<LogicalType>,
}

impl From<RegularType> for SchemaNode {
    fn from(type_: RegularType) -> Self {
        Self {
            type_,
            logical_type: None,
        }
    }
}

/// A compiled, immutable Avro schema (§3).
///
/// Bound to the [`Options`] it was compiled with; owns the node arena and
/// the named-type registry (qualified name → arena index, insertion order
/// preserved).
pub struct Schema {
    nodes: Vec<SchemaNode>,
    names: HashMap<String, SchemaKey>,
    /// Insertion order of the registry, for `named_types()` (§6).
    name_order: Vec<String>,
    root: SchemaKey,
    options: Options,
    canonical_form: String,
    fingerprint: [u8; 8],
    source_json: String,
}

impl Schema {
    /// Compiles `json` (an Avro JSON schema) under `options` (§4.C).
    pub fn compile(json: &str, options: Options) -> Result<Self, SchemaError> {
        parsing::compile(json, options)
    }

    pub fn root(&self) -> SchemaKey {
        self.root
    }

    pub fn get(&self, key: SchemaKey) -> &SchemaNode {
        &self.nodes[key.0]
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The registered named types, insertion order preserved (§6).
    pub fn named_types(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.name_order
            .iter()
            .map(move |name| (name.as_str(), &self.nodes[self.names[name].0]))
    }

    pub fn resolve_name(&self, fully_qualified_name: &str) -> Option<SchemaKey> {
        self.names.get(fully_qualified_name).copied()
    }

    /// The Parsing Canonical Form of this schema (§4.C step 7).
    pub fn canonical_form(&self) -> &str {
        &self.canonical_form
    }

    /// The Rabin 64-bit fingerprint of [`Schema::canonical_form`], as raw
    /// digest bytes regardless of `Options::fingerprint_returns_digest` —
    /// used internally (e.g. [`Schema::schema_id_for`]) wherever a stable
    /// byte-identity is needed. See [`Schema::fingerprint_value`] for the
    /// option-shaped public surface (§6: `fingerprint(algorithm="rabin") ->
    /// bytes|int`).
    pub fn fingerprint(&self) -> [u8; 8] {
        self.fingerprint
    }

    /// The schema's fingerprint, shaped by `Options::fingerprint_returns_digest`.
    pub fn fingerprint_value(&self) -> Fingerprint {
        if self.options.fingerprint_returns_digest {
            Fingerprint::Digest(self.fingerprint)
        } else {
            Fingerprint::Integer(i64::from_le_bytes(self.fingerprint))
        }
    }

    /// The original JSON text this schema was compiled from, retained so
    /// object container file headers (§4.H) can record it verbatim rather
    /// than the (semantically equivalent but detail-losing) canonical form.
    pub fn source_json(&self) -> &str {
        &self.source_json
    }

    pub(crate) fn schema_id_for(&self, key: SchemaKey) -> crate::value::SchemaId {
        crate::value::SchemaId {
            fingerprint: self.fingerprint,
            node: key,
        }
    }

    pub fn binary_encode(&self, value: &Value) -> Result<Vec<u8>, crate::ser::SerError> {
        crate::ser::encode(self, value)
    }

    pub fn binary_decode(&self, bytes: &[u8]) -> Result<Value, crate::de::DeError> {
        crate::de::decode(self, bytes)
    }

    /// Decodes `bytes` that were written under `writer`, producing a value
    /// shaped by `self` (the reader schema) per §4.G.
    pub fn binary_decode_resolving(
        &self,
        writer: &Schema,
        bytes: &[u8],
    ) -> Result<Value, crate::de::DeError> {
        crate::de::decode_resolving(writer, self, bytes)
    }

    pub fn json_encode(&self, value: &Value) -> Result<String, crate::ser::SerError> {
        crate::ser::json_encode(self, value)
    }

    pub fn json_decode(&self, json: &str) -> Result<Value, crate::de::DeError> {
        crate::de::json_decode(self, json)
    }
}

impl Index<SchemaKey> for Schema {
    type Output = SchemaNode;
    fn index(&self, key: SchemaKey) -> &SchemaNode {
        &self.nodes[key.0]
    }
}

