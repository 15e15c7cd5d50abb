//! The binary and JSON decoders (§4.A, §4.F, §4.G).
//!
//! Grounded on `serde_avro_fast`'s `de` module: a recursive walk over the
//! schema arena driving a cursor through the input, with a depth counter
//! guarding against pathologically recursive schemas (`allowed_depth`,
//! mirroring that crate's `DeserializerConfig`).

pub mod error;
mod resolution;

pub use error::{DeError, ResolutionError};

use hashbrown::HashMap;
use rust_decimal::Decimal;

use crate::codec;
use crate::options::Options;
use crate::schema::{LogicalType, RegularType, Schema, SchemaKey};
use crate::value::{DurationValue, EnumValue, FixedValue, RecordValue, Value};

/// Maximum schema-graph recursion depth a single decode may traverse, a
/// guard against unbounded recursive schemas (recursive records nested
/// arbitrarily deep in the input are still fine; this only bounds the
/// *schema* recursion, not the data).
const MAX_DEPTH: usize = 64;

pub(crate) fn decode(schema: &Schema, bytes: &[u8]) -> Result<Value, DeError> {
    let mut pos = 0;
    decode_node(schema, schema.root(), bytes, &mut pos, 0)
}

/// Decodes one value starting at `*pos`, advancing it past the bytes
/// consumed. Used by the object container file reader (§4.H) to walk
/// multiple concatenated encodings within one decompressed block.
pub(crate) fn decode_from(schema: &Schema, bytes: &[u8], pos: &mut usize) -> Result<Value, DeError> {
    decode_node(schema, schema.root(), bytes, pos, 0)
}

pub(crate) fn decode_resolving(
    writer: &Schema,
    reader: &Schema,
    bytes: &[u8],
) -> Result<Value, DeError> {
    let mut pos = 0;
    resolution::decode_resolved(
        writer,
        writer.root(),
        reader,
        reader.root(),
        bytes,
        &mut pos,
        0,
    )
}

pub(crate) fn json_decode(schema: &Schema, json: &str) -> Result<Value, DeError> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    json_to_value(schema, schema.root(), &raw, 0)
}

pub(crate) fn decode_node(
    schema: &Schema,
    key: SchemaKey,
    bytes: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Value, DeError> {
    if depth > MAX_DEPTH {
        return Err(DeError::RecursionLimitExceeded);
    }
    let node = schema.get(key);
    let physical = decode_physical(schema, key, bytes, pos, depth)?;
    Ok(match (&node.logical_type, schema.options().logical_types) {
        (Some(lt), true) => apply_logical_decode(lt, physical, schema.options()),
        _ => physical,
    })
}

fn decode_physical(
    schema: &Schema,
    key: SchemaKey,
    bytes: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Value, DeError> {
    let node = schema.get(key);
    Ok(match &node.type_ {
        RegularType::Null => Value::Null,
        RegularType::Boolean => Value::Boolean(codec::decode_bool(bytes, pos)?),
        RegularType::Int => Value::Int(codec::decode_int(bytes, pos)?),
        RegularType::Long => Value::Long(codec::decode_long(bytes, pos)?),
        RegularType::Float => Value::Float(codec::decode_float(bytes, pos)?),
        RegularType::Double => Value::Double(codec::decode_double(bytes, pos)?),
        RegularType::Bytes => Value::Bytes(codec::decode_bytes(bytes, pos)?.to_vec()),
        RegularType::String => Value::String(codec::decode_string(bytes, pos)?),
        RegularType::Array(array) => {
            let mut items = Vec::new();
            loop {
                let count = codec::decode_long(bytes, pos)?;
                if count == 0 {
                    break;
                }
                let count = if count < 0 {
                    let _byte_size = codec::decode_long(bytes, pos)?;
                    (-count) as usize
                } else {
                    count as usize
                };
                items.reserve(count);
                for _ in 0..count {
                    items.push(decode_node(schema, array.items, bytes, pos, depth + 1)?);
                }
            }
            Value::Array(items)
        }
        RegularType::Map(map) => {
            let mut entries = HashMap::new();
            loop {
                let count = codec::decode_long(bytes, pos)?;
                if count == 0 {
                    break;
                }
                let count = if count < 0 {
                    let _byte_size = codec::decode_long(bytes, pos)?;
                    (-count) as usize
                } else {
                    count as usize
                };
                entries.reserve(count);
                for _ in 0..count {
                    let k = codec::decode_string(bytes, pos)?;
                    let v = decode_node(schema, map.values, bytes, pos, depth + 1)?;
                    entries.insert(k, v);
                }
            }
            Value::Map(entries)
        }
        RegularType::Union(union) => {
            let idx = codec::decode_long(bytes, pos)?;
            let variant = usize::try_from(idx)
                .ok()
                .filter(|&i| i < union.variants.len())
                .ok_or(DeError::InvalidUnionTag {
                    index: idx,
                    union_size: union.variants.len(),
                })?;
            let inner = decode_node(schema, union.variants[variant], bytes, pos, depth + 1)?;
            Value::Union(variant, Box::new(inner))
        }
        RegularType::Record(record) => {
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = decode_node(schema, field.type_, bytes, pos, depth + 1)?;
                fields.push((field.name.clone(), value));
            }
            if schema.options().record_decodes_to_dict {
                Value::Map(fields.into_iter().collect())
            } else {
                Value::Record(RecordValue {
                    schema_id: schema.schema_id_for(key),
                    name: record.name.fully_qualified_name().to_owned(),
                    fields,
                })
            }
        }
        RegularType::Enum(e) => {
            let idx = codec::decode_long(bytes, pos)?;
            let index = usize::try_from(idx)
                .ok()
                .filter(|&i| i < e.symbols.len())
                .ok_or(DeError::InvalidEnumIndex {
                    index: idx,
                    symbol_count: e.symbols.len(),
                })?;
            Value::Enum(EnumValue {
                schema_id: schema.schema_id_for(key),
                name: e.name.fully_qualified_name().to_owned(),
                index,
                symbol: e.symbols[index].clone(),
            })
        }
        RegularType::Fixed(fixed) => {
            let raw = codec::decode_fixed(bytes, pos, fixed.size)?;
            Value::Fixed(FixedValue {
                schema_id: schema.schema_id_for(key),
                name: fixed.name.fully_qualified_name().to_owned(),
                bytes: raw.to_vec(),
            })
        }
    })
}

/// Applies a logical-type transform to a freshly decoded physical value
/// (§4.F). Invalid payloads silently fall back to the physical
/// representation rather than erroring — the writer is trusted to have
/// produced valid bytes for its own declared physical type even when the
/// logical annotation can't be honored.
pub(crate) fn apply_logical_decode(
    logical_type: &LogicalType,
    physical: Value,
    options: &Options,
) -> Value {
    match logical_type {
        LogicalType::Decimal(decimal) => {
            let bytes = match &physical {
                Value::Bytes(b) => Some(b.as_slice()),
                Value::Fixed(f) => Some(f.bytes.as_slice()),
                _ => None,
            };
            match bytes.and_then(|b| decode_unscaled_decimal(b, decimal.scale)) {
                Some(d) => Value::Decimal(d),
                None => physical,
            }
        }
        LogicalType::Duration => {
            if let Value::Fixed(fixed) = &physical {
                if fixed.bytes.len() == 12 {
                    let months = u32::from_le_bytes(fixed.bytes[0..4].try_into().unwrap());
                    let days = u32::from_le_bytes(fixed.bytes[4..8].try_into().unwrap());
                    let millis = u32::from_le_bytes(fixed.bytes[8..12].try_into().unwrap());
                    return Value::Duration(DurationValue {
                        months,
                        days,
                        millis,
                    });
                }
            }
            physical
        }
        // A legacy producer that wrote `timestamp-millis` as whole seconds
        // rather than milliseconds (`alternate_timestamp_millis_encoding`):
        // rescale on the way in so the host always sees milliseconds: the
        // inverse of `ser::logical_encode_transform`'s rescale back down.
        LogicalType::TimestampMillis if options.alternate_timestamp_millis_encoding => {
            match physical {
                Value::Long(seconds) => Value::Long(seconds.saturating_mul(1000)),
                other => other,
            }
        }
        // `uuid`/`date`/`time-millis`/`time-micros`/`timestamp-millis`/
        // `timestamp-micros`/unknown logical types reuse the physical
        // representation as-is (§4.F, no dedicated `Value` shape).
        LogicalType::Uuid
        | LogicalType::Date
        | LogicalType::TimeMillis
        | LogicalType::TimeMicros
        | LogicalType::TimestampMillis
        | LogicalType::TimestampMicros
        | LogicalType::Unknown(_) => physical,
    }
}

/// Decodes a two's-complement big-endian unscaled integer into a
/// [`Decimal`], rejecting payloads too wide for `rust_decimal`'s 96-bit
/// mantissa or scales beyond its `MAX_SCALE` (§4.F fallback).
fn decode_unscaled_decimal(bytes: &[u8], scale: u32) -> Option<Decimal> {
    if scale > 28 || bytes.is_empty() || bytes.len() > 12 {
        return None;
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut value: i128 = if negative { -1 } else { 0 };
    for &b in bytes {
        value = (value << 8) | b as i128;
    }
    Decimal::try_from_i128_with_scale(value, scale).ok()
}

/// Encodes a [`Decimal`]'s unscaled value as a minimal-length two's-complement
/// big-endian byte string, the inverse of [`decode_unscaled_decimal`]. Used
/// by the encoder (§4.F) for `bytes`-backed decimals; `fixed`-backed decimals
/// sign-extend the result to the declared size.
pub(crate) fn encode_unscaled_decimal(unscaled: i128) -> Vec<u8> {
    let mut bytes = unscaled.to_be_bytes().to_vec();
    let negative = unscaled < 0;
    while bytes.len() > 1 {
        let (first, second) = (bytes[0], bytes[1]);
        let redundant = if negative {
            first == 0xff && second & 0x80 != 0
        } else {
            first == 0x00 && second & 0x80 == 0
        };
        if redundant {
            bytes.remove(0);
        } else {
            break;
        }
    }
    bytes
}

fn json_to_value(
    schema: &Schema,
    key: SchemaKey,
    json: &serde_json::Value,
    depth: usize,
) -> Result<Value, DeError> {
    if depth > MAX_DEPTH {
        return Err(DeError::RecursionLimitExceeded);
    }
    let node = schema.get(key);
    let physical = json_to_physical(schema, key, json, depth)?;
    Ok(match (&node.logical_type, schema.options().logical_types) {
        (Some(lt), true) => apply_logical_decode(lt, physical, schema.options()),
        _ => physical,
    })
}

fn json_to_physical(
    schema: &Schema,
    key: SchemaKey,
    json: &serde_json::Value,
    depth: usize,
) -> Result<Value, DeError> {
    use serde_json::Value as Json;
    let node = schema.get(key);
    Ok(match &node.type_ {
        RegularType::Null => Value::Null,
        RegularType::Boolean => Value::Boolean(json.as_bool().ok_or_else(|| {
            DeError::InvalidLogicalValue("expected JSON boolean".to_owned())
        })?),
        RegularType::Int => Value::Int(
            json.as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON int".to_owned()))?,
        ),
        RegularType::Long => Value::Long(
            json.as_i64()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON long".to_owned()))?,
        ),
        RegularType::Float => Value::Float(
            json.as_f64()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON float".to_owned()))?
                as f32,
        ),
        RegularType::Double => Value::Double(json.as_f64().ok_or_else(|| {
            DeError::InvalidLogicalValue("expected JSON double".to_owned())
        })?),
        RegularType::Bytes => Value::Bytes(json_avro_bytes(json)?),
        RegularType::String => Value::String(
            json.as_str()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON string".to_owned()))?
                .to_owned(),
        ),
        RegularType::Array(array) => {
            let items = json
                .as_array()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON array".to_owned()))?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_to_value(schema, array.items, item, depth + 1)?);
            }
            Value::Array(out)
        }
        RegularType::Map(map) => {
            let object = json
                .as_object()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON object".to_owned()))?;
            let mut entries = HashMap::new();
            for (k, v) in object {
                entries.insert(k.clone(), json_to_value(schema, map.values, v, depth + 1)?);
            }
            Value::Map(entries)
        }
        RegularType::Union(union) => {
            if matches!(json, Json::Null) {
                let idx = union
                    .category_keys
                    .iter()
                    .position(|c| *c == crate::value::Category::Null)
                    .ok_or_else(|| {
                        DeError::InvalidLogicalValue("union has no null branch".to_owned())
                    })?;
                return Ok(Value::Union(
                    idx,
                    Box::new(Value::Null),
                ));
            }
            let object = json.as_object().ok_or_else(|| {
                DeError::InvalidLogicalValue(
                    "expected JSON union envelope {\"type\": value}".to_owned(),
                )
            })?;
            let (type_name, inner) = object.iter().next().ok_or_else(|| {
                DeError::InvalidLogicalValue("empty union envelope object".to_owned())
            })?;
            let branch = union
                .variants
                .iter()
                .position(|&v| {
                    category_matches_json_type_name(
                        &crate::schema::node_category(schema.nodes(), v),
                        type_name,
                    )
                })
                .ok_or_else(|| {
                    DeError::InvalidLogicalValue(format!(
                        "no union branch named `{type_name}`"
                    ))
                })?;
            let value = json_to_value(schema, union.variants[branch], inner, depth + 1)?;
            Value::Union(branch, Box::new(value))
        }
        RegularType::Record(record) => {
            let object = json
                .as_object()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON object".to_owned()))?;
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let raw = object.get(&field.name).ok_or_else(|| {
                    DeError::InvalidLogicalValue(format!(
                        "missing field `{}` in JSON record",
                        field.name
                    ))
                })?;
                fields.push((
                    field.name.clone(),
                    json_to_value(schema, field.type_, raw, depth + 1)?,
                ));
            }
            Value::Record(RecordValue {
                schema_id: schema.schema_id_for(key),
                name: record.name.fully_qualified_name().to_owned(),
                fields,
            })
        }
        RegularType::Enum(e) => {
            let symbol = json
                .as_str()
                .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON string symbol".to_owned()))?;
            let index = e.symbols.iter().position(|s| s == symbol).ok_or_else(|| {
                DeError::InvalidLogicalValue(format!("unknown enum symbol `{symbol}`"))
            })?;
            Value::Enum(EnumValue {
                schema_id: schema.schema_id_for(key),
                name: e.name.fully_qualified_name().to_owned(),
                index,
                symbol: symbol.to_owned(),
            })
        }
        RegularType::Fixed(fixed) => {
            let bytes = json_avro_bytes(json)?;
            if bytes.len() != fixed.size {
                return Err(DeError::InvalidLogicalValue(format!(
                    "fixed `{}` expects {} bytes, got {}",
                    fixed.name, fixed.size, bytes.len()
                )));
            }
            Value::Fixed(FixedValue {
                schema_id: schema.schema_id_for(key),
                name: fixed.name.fully_qualified_name().to_owned(),
                bytes,
            })
        }
    })
}

/// Matches a JSON union envelope's `"type"` key (§6: a primitive type name,
/// or a named type's fully-qualified name) against a branch's schema
/// category.
fn category_matches_json_type_name(category: &crate::value::Category, type_name: &str) -> bool {
    use crate::value::Category;
    match category {
        Category::Null => type_name == "null",
        Category::Boolean => type_name == "boolean",
        Category::Int => type_name == "int",
        Category::Long => type_name == "long",
        Category::Float => type_name == "float",
        Category::Double => type_name == "double",
        Category::Bytes => type_name == "bytes",
        Category::String => type_name == "string",
        Category::Array => type_name == "array",
        Category::Map => type_name == "map",
        Category::Fixed(name) | Category::Enum(name) | Category::Record(name) => {
            name == type_name
        }
    }
}

/// Avro's JSON encoding represents `bytes`/`fixed` payloads as a string of
/// one Unicode code point per raw byte (`\u00XX` escapes for the high half).
fn json_avro_bytes(json: &serde_json::Value) -> Result<Vec<u8>, DeError> {
    let s = json
        .as_str()
        .ok_or_else(|| DeError::InvalidLogicalValue("expected JSON string bytes".to_owned()))?;
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        if code > 0xff {
            return Err(DeError::InvalidLogicalValue(
                "byte string contains a code point above U+00FF".to_owned(),
            ));
        }
        out.push(code as u8);
    }
    Ok(out)
}
