//! The binary and JSON encoders (§4.A, §4.E, §4.F).
//!
//! Grounded on `serde_avro_fast`'s `ser` module: a recursive walk over the
//! schema arena, writing into a growable buffer, with union branch
//! selection delegated to [`crate::dispatch`].

pub mod error;

pub use error::SerError;

use crate::codec;
use crate::de::encode_unscaled_decimal;
use crate::dispatch;
use crate::schema::{LogicalType, Record, RegularType, Schema, SchemaKey};
use crate::value::{Category, Value};

const MAX_DEPTH: usize = 64;

pub(crate) fn encode(schema: &Schema, value: &Value) -> Result<Vec<u8>, SerError> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    encode_node(schema, schema.root(), value, &mut out, &mut path, 0)?;
    Ok(out)
}

pub(crate) fn json_encode(schema: &Schema, value: &Value) -> Result<String, SerError> {
    let mut path = Vec::new();
    let json = json_encode_node(schema, schema.root(), value, &mut path)?;
    Ok(serde_json::to_string(&json)?)
}

fn encode_node(
    schema: &Schema,
    key: SchemaKey,
    value: &Value,
    out: &mut Vec<u8>,
    path: &mut Vec<String>,
    depth: usize,
) -> Result<(), SerError> {
    if depth > MAX_DEPTH {
        return Err(SerError::InvalidValue {
            path: path.join("."),
            reason: "exceeded maximum schema nesting depth".into(),
        });
    }
    let node = schema.get(key);

    if let RegularType::Union(union) = &node.type_ {
        return match value {
            Value::Union(idx, inner) => {
                if *idx >= union.variants.len() {
                    return Err(SerError::InvalidValue {
                        path: path.join("."),
                        reason: format!(
                            "union branch index {idx} out of range ({} branches)",
                            union.variants.len()
                        ),
                    });
                }
                codec::encode_long(*idx as i64, out);
                encode_node(schema, union.variants[*idx], inner, out, path, depth + 1)
            }
            other => {
                let idx = dispatch::select_branch(schema, union, other)?;
                codec::encode_long(idx as i64, out);
                encode_node(schema, union.variants[idx], other, out, path, depth + 1)
            }
        };
    }

    let transformed = match &node.logical_type {
        Some(lt) if schema.options().logical_types => logical_encode_transform(lt, value, schema.options()),
        _ => None,
    };
    let effective = transformed.as_ref().unwrap_or(value);

    encode_physical(schema, key, effective, out, path, depth)
}

fn encode_physical(
    schema: &Schema,
    key: SchemaKey,
    value: &Value,
    out: &mut Vec<u8>,
    path: &mut Vec<String>,
    depth: usize,
) -> Result<(), SerError> {
    let node = schema.get(key);
    match (&node.type_, value) {
        (RegularType::Null, Value::Null) => {}
        (RegularType::Boolean, Value::Boolean(v)) => codec::encode_bool(*v, out),
        (RegularType::Int, Value::Int(v)) => codec::encode_int(*v, out),
        (RegularType::Int, Value::Long(v)) => {
            let narrowed = i32::try_from(*v).map_err(|_| SerError::InvalidValue {
                path: path.join("."),
                reason: format!("value {v} does not fit in a 32-bit int"),
            })?;
            codec::encode_int(narrowed, out);
        }
        (RegularType::Long, Value::Long(v)) => codec::encode_long(*v, out),
        (RegularType::Long, Value::Int(v)) => codec::encode_long(*v as i64, out),
        (RegularType::Float, Value::Float(v)) => codec::encode_float(*v, out),
        (RegularType::Float, Value::Int(v)) => codec::encode_float(*v as f32, out),
        (RegularType::Float, Value::Long(v)) => codec::encode_float(*v as f32, out),
        (RegularType::Double, Value::Double(v)) => codec::encode_double(*v, out),
        (RegularType::Double, Value::Int(v)) => codec::encode_double(*v as f64, out),
        (RegularType::Double, Value::Long(v)) => codec::encode_double(*v as f64, out),
        (RegularType::Double, Value::Float(v)) => codec::encode_double(*v as f64, out),
        (RegularType::Bytes, Value::Bytes(v)) => codec::encode_bytes(v, out),
        (RegularType::String, Value::String(v)) => codec::encode_string(v, out),
        (RegularType::Array(array), Value::Array(items)) => {
            if !items.is_empty() {
                codec::encode_long(items.len() as i64, out);
                for (idx, item) in items.iter().enumerate() {
                    path.push(idx.to_string());
                    encode_node(schema, array.items, item, out, path, depth + 1)?;
                    path.pop();
                }
            }
            codec::encode_long(0, out);
        }
        (RegularType::Map(map), Value::Map(entries)) => {
            if !entries.is_empty() {
                codec::encode_long(entries.len() as i64, out);
                for (k, v) in entries.iter() {
                    codec::encode_string(k, out);
                    path.push(k.clone());
                    encode_node(schema, map.values, v, out, path, depth + 1)?;
                    path.pop();
                }
            }
            codec::encode_long(0, out);
        }
        (RegularType::Record(record), Value::Record(_)) | (RegularType::Record(record), Value::Map(_)) => {
            encode_record(schema, key, record, value, out, path, depth)?;
        }
        (RegularType::Enum(e), Value::Enum(ev)) => {
            let index = e
                .symbols
                .iter()
                .position(|s| s == &ev.symbol)
                .ok_or_else(|| SerError::InvalidValue {
                    path: path.join("."),
                    reason: format!("unknown enum symbol `{}`", ev.symbol),
                })?;
            codec::encode_long(index as i64, out);
        }
        (RegularType::Fixed(f), Value::Fixed(fv)) => {
            if fv.bytes.len() != f.size {
                return Err(SerError::InvalidValue {
                    path: path.join("."),
                    reason: format!("fixed `{}` expects {} bytes, got {}", f.name, f.size, fv.bytes.len()),
                });
            }
            out.extend_from_slice(&fv.bytes);
        }
        (RegularType::Fixed(f), Value::Bytes(b)) => {
            if b.len() != f.size {
                return Err(SerError::InvalidValue {
                    path: path.join("."),
                    reason: format!("fixed `{}` expects {} bytes, got {}", f.name, f.size, b.len()),
                });
            }
            out.extend_from_slice(b);
        }
        (declared, got) => {
            return Err(SerError::InvalidValue {
                path: path.join("."),
                reason: format!("value {got:?} does not satisfy declared type {declared:?}"),
            })
        }
    }
    Ok(())
}

fn encode_record(
    schema: &Schema,
    key: SchemaKey,
    record: &Record,
    value: &Value,
    out: &mut Vec<u8>,
    path: &mut Vec<String>,
    depth: usize,
) -> Result<(), SerError> {
    match value {
        Value::Record(rv) => {
            let own_id = schema.schema_id_for(key);
            if rv.schema_id != own_id {
                let name_matches = rv.name == record.name.fully_qualified_name();
                if !schema.options().adapt_record_types
                    || !name_matches
                    || !record_shape_matches(schema, record, rv)
                {
                    return Err(SerError::RecordNotAdaptable {
                        from: rv.name.clone(),
                        to: record.name.fully_qualified_name().to_owned(),
                    });
                }
            }
        }
        Value::Map(_) => {
            if !schema.options().record_can_encode_dict {
                return Err(SerError::InvalidValue {
                    path: path.join("."),
                    reason: "mapping values are not accepted in place of a record (\
                        record_can_encode_dict is disabled)"
                        .into(),
                });
            }
        }
        _ => {
            return Err(SerError::InvalidValue {
                path: path.join("."),
                reason: "expected a record or map value".into(),
            });
        }
    }

    let lookup = |name: &str| -> Option<&Value> {
        match value {
            Value::Record(rv) => rv.field(name),
            Value::Map(m) => m.get(name),
            _ => None,
        }
    };

    for field in &record.fields {
        match lookup(&field.name) {
            Some(v) => {
                path.push(field.name.clone());
                encode_node(schema, field.type_, v, out, path, depth + 1)?;
                path.pop();
            }
            None if schema.options().record_encode_use_defaults && field.default.is_some() => {
                // Defaults are deep-copied per use: no decoded/encoded value
                // ever aliases schema-owned memory (§5).
                let default = field.default.clone().unwrap();
                path.push(field.name.clone());
                encode_node(schema, field.type_, &default, out, path, depth + 1)?;
                path.pop();
            }
            None => {
                return Err(SerError::MissingField {
                    record: record.name.fully_qualified_name().to_owned(),
                    field: field.name.clone(),
                })
            }
        }
    }

    if let Value::Map(m) = value {
        if !schema.options().record_allow_extra_fields {
            for k in m.keys() {
                if record.field_index(k).is_none() {
                    return Err(SerError::UnknownField {
                        record: record.name.fully_qualified_name().to_owned(),
                        field: k.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Record adaptation (§4.E): whether a cross-schema record instance's
/// fields line up with `record`'s declared shape closely enough to reuse,
/// comparing the ordered (field-name, field-type) sequence. The dynamic
/// `Value` carries no reference back to its originating schema (Design
/// Notes §9), so the "field-type canonical form" half of the comparison is
/// approximated by checking that the stored value's own category is
/// compatible with the target field's declared type, rather than by
/// comparing two canonical-form strings.
fn record_shape_matches(schema: &Schema, record: &Record, rv: &crate::value::RecordValue) -> bool {
    if record.fields.len() != rv.fields.len() {
        return false;
    }
    record
        .fields
        .iter()
        .zip(rv.fields.iter())
        .all(|(field, (name, v))| {
            field.name == *name
                && category_compatible(
                    &crate::schema::node_category(schema.nodes(), field.type_),
                    &dispatch::categorize(v),
                    schema.options().types_str_to_bytes,
                )
        })
}

fn category_compatible(target: &Category, value: &Category, types_str_to_bytes: bool) -> bool {
    if target == value {
        return true;
    }
    matches!(
        (target, value),
        (Category::Long, Category::Int)
            | (Category::Double, Category::Int)
            | (Category::Double, Category::Float)
    ) || (*target == Category::Bytes && *value == Category::String && types_str_to_bytes)
}

/// The inverse of [`crate::de::apply_logical_decode`]: converts a dedicated
/// logical-type `Value` (`Decimal`, `Duration`) back into its physical
/// representation. Returns `None` when `value` already carries the raw
/// physical shape (callers then encode it unchanged), matching the
/// round-trip property that decode(encode(v)) == v regardless of which
/// representation the caller hands in.
fn logical_encode_transform(
    logical_type: &LogicalType,
    value: &Value,
    options: &crate::options::Options,
) -> Option<Value> {
    match (logical_type, value) {
        (LogicalType::Decimal(d), Value::Decimal(dec)) => {
            let mut rescaled = *dec;
            rescaled.rescale(d.scale);
            Some(Value::Bytes(encode_unscaled_decimal(rescaled.mantissa())))
        }
        (LogicalType::Duration, Value::Duration(dv)) => {
            let mut bytes = Vec::with_capacity(12);
            bytes.extend_from_slice(&dv.months.to_le_bytes());
            bytes.extend_from_slice(&dv.days.to_le_bytes());
            bytes.extend_from_slice(&dv.millis.to_le_bytes());
            Some(Value::Bytes(bytes))
        }
        // Inverse of the decode-side rescale in `de::apply_logical_decode`:
        // a host-supplied millisecond value is brought back down to the
        // legacy producer's whole-seconds wire representation.
        (LogicalType::TimestampMillis, Value::Long(millis))
            if options.alternate_timestamp_millis_encoding =>
        {
            Some(Value::Long(millis.div_euclid(1000)))
        }
        _ => None,
    }
}

fn json_encode_node(
    schema: &Schema,
    key: SchemaKey,
    value: &Value,
    path: &mut Vec<String>,
) -> Result<serde_json::Value, SerError> {
    use serde_json::Value as Json;
    let node = schema.get(key);

    if let RegularType::Union(union) = &node.type_ {
        let (idx, inner): (usize, &Value) = match value {
            Value::Union(idx, inner) => (*idx, inner),
            other => (dispatch::select_branch(schema, union, other)?, other),
        };
        let branch_key = union.variants[idx];
        if matches!(inner, Value::Null) {
            return Ok(Json::Null);
        }
        let type_name = category_type_name(schema, branch_key);
        let inner_json = json_encode_node(schema, branch_key, inner, path)?;
        let mut map = serde_json::Map::new();
        map.insert(type_name, inner_json);
        return Ok(Json::Object(map));
    }

    let transformed = match &node.logical_type {
        Some(lt) if schema.options().logical_types => logical_encode_transform(lt, value, schema.options()),
        _ => None,
    };
    let effective = transformed.as_ref().unwrap_or(value);

    Ok(match (&node.type_, effective) {
        (RegularType::Null, Value::Null) => Json::Null,
        (RegularType::Boolean, Value::Boolean(v)) => Json::Bool(*v),
        (RegularType::Int, Value::Int(v)) => Json::Number((*v).into()),
        (RegularType::Long, Value::Long(v)) => Json::Number((*v).into()),
        (RegularType::Long, Value::Int(v)) => Json::Number((*v as i64).into()),
        (RegularType::Float, Value::Float(v)) => json_number_from_f64(*v as f64),
        (RegularType::Double, Value::Double(v)) => json_number_from_f64(*v),
        (RegularType::Bytes, Value::Bytes(b)) | (RegularType::Fixed(_), Value::Bytes(b)) => {
            Json::String(avro_bytes_to_json_string(b))
        }
        (RegularType::Fixed(_), Value::Fixed(fv)) => Json::String(avro_bytes_to_json_string(&fv.bytes)),
        (RegularType::String, Value::String(s)) => Json::String(s.clone()),
        (RegularType::Array(array), Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                path.push(idx.to_string());
                out.push(json_encode_node(schema, array.items, item, path)?);
                path.pop();
            }
            Json::Array(out)
        }
        (RegularType::Map(map), Value::Map(entries)) => {
            let mut out = serde_json::Map::new();
            for (k, v) in entries.iter() {
                path.push(k.clone());
                out.insert(k.clone(), json_encode_node(schema, map.values, v, path)?);
                path.pop();
            }
            Json::Object(out)
        }
        (RegularType::Record(record), Value::Record(_)) | (RegularType::Record(record), Value::Map(_)) => {
            if matches!(effective, Value::Map(_)) && !schema.options().record_can_encode_dict {
                return Err(SerError::InvalidValue {
                    path: path.join("."),
                    reason: "mapping values are not accepted in place of a record (\
                        record_can_encode_dict is disabled)"
                        .into(),
                });
            }
            let lookup = |name: &str| -> Option<&Value> {
                match effective {
                    Value::Record(rv) => rv.field(name),
                    Value::Map(m) => m.get(name),
                    _ => None,
                }
            };
            let mut out = serde_json::Map::new();
            for field in &record.fields {
                let default = if schema.options().record_encode_use_defaults {
                    field.default.as_ref()
                } else {
                    None
                };
                let v = lookup(&field.name).or(default).ok_or_else(|| SerError::MissingField {
                    record: record.name.fully_qualified_name().to_owned(),
                    field: field.name.clone(),
                })?;
                path.push(field.name.clone());
                out.insert(field.name.clone(), json_encode_node(schema, field.type_, v, path)?);
                path.pop();
            }
            if let Value::Map(m) = effective {
                if !schema.options().record_allow_extra_fields {
                    for k in m.keys() {
                        if record.field_index(k).is_none() {
                            return Err(SerError::UnknownField {
                                record: record.name.fully_qualified_name().to_owned(),
                                field: k.clone(),
                            });
                        }
                    }
                }
            }
            Json::Object(out)
        }
        (RegularType::Enum(_), Value::Enum(ev)) => Json::String(ev.symbol.clone()),
        (declared, got) => {
            return Err(SerError::InvalidValue {
                path: path.join("."),
                reason: format!("value {got:?} does not satisfy declared type {declared:?}"),
            })
        }
    })
}

fn json_number_from_f64(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn avro_bytes_to_json_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn category_type_name(schema: &Schema, key: SchemaKey) -> String {
    match crate::schema::node_category(schema.nodes(), key) {
        Category::Null => "null".to_owned(),
        Category::Boolean => "boolean".to_owned(),
        Category::Int => "int".to_owned(),
        Category::Long => "long".to_owned(),
        Category::Float => "float".to_owned(),
        Category::Double => "double".to_owned(),
        Category::Bytes => "bytes".to_owned(),
        Category::String => "string".to_owned(),
        Category::Array => "array".to_owned(),
        Category::Map => "map".to_owned(),
        Category::Fixed(name) | Category::Enum(name) | Category::Record(name) => name,
    }
}
