//! Writer/reader schema resolution (§4.G): decodes bytes written under one
//! schema into a value shaped by a different (but compatible) schema.
//!
//! Unlike `serde_avro_fast`, which compiles a resolution into a dedicated
//! `ResolvedSchema` up front, this walks both schemas together on every
//! decode. `SPEC_FULL.md` calls out the compiled form as a later
//! optimization (see `DESIGN.md`); correctness comes first.

use hashbrown::HashMap;

use super::error::{DeError, ResolutionError};
use super::{apply_logical_decode, decode_node, MAX_DEPTH};
use crate::codec;
use crate::schema::{RegularType, Schema, SchemaKey};
use crate::value::{EnumValue, FixedValue, RecordValue, Value};

pub(crate) fn decode_resolved(
    writer: &Schema,
    w_key: SchemaKey,
    reader: &Schema,
    r_key: SchemaKey,
    bytes: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Value, DeError> {
    if depth > MAX_DEPTH {
        return Err(DeError::RecursionLimitExceeded);
    }

    let w_node = writer.get(w_key);
    if let RegularType::Union(w_union) = &w_node.type_ {
        let idx = codec::decode_long(bytes, pos)?;
        let branch = usize::try_from(idx)
            .ok()
            .filter(|&i| i < w_union.variants.len())
            .ok_or(DeError::InvalidUnionTag {
                index: idx,
                union_size: w_union.variants.len(),
            })?;
        return decode_resolved(
            writer,
            w_union.variants[branch],
            reader,
            r_key,
            bytes,
            pos,
            depth + 1,
        );
    }

    let r_node = reader.get(r_key);
    if let RegularType::Union(r_union) = &r_node.type_ {
        for (idx, &r_branch) in r_union.variants.iter().enumerate() {
            if resolvable(writer, w_key, reader, r_branch) {
                let inner =
                    decode_resolved(writer, w_key, reader, r_branch, bytes, pos, depth + 1)?;
                return Ok(Value::Union(idx, Box::new(inner)));
            }
        }
        return Err(ResolutionError::NoMatchingReaderBranch {
            writer: describe(writer, w_key),
        }
        .into());
    }

    let physical = decode_resolved_physical(writer, w_key, reader, r_key, bytes, pos, depth)?;
    Ok(
        match (&r_node.logical_type, reader.options().logical_types) {
            (Some(lt), true) => apply_logical_decode(lt, physical, reader.options()),
            _ => physical,
        },
    )
}

/// A coarse, side-effect-free check of whether `w_key` can resolve against
/// `r_key`, used to pick a reader union branch without consuming bytes
/// (§4.G: "the reader's branch is the first that structurally matches").
fn resolvable(writer: &Schema, w_key: SchemaKey, reader: &Schema, r_key: SchemaKey) -> bool {
    use RegularType::*;
    let w = &writer.get(w_key).type_;
    let r = &reader.get(r_key).type_;
    match (w, r) {
        (Null, Null) | (Boolean, Boolean) => true,
        (Int, Int) | (Int, Long) | (Int, Float) | (Int, Double) => true,
        (Long, Long) | (Long, Float) | (Long, Double) => true,
        (Float, Float) | (Float, Double) => true,
        (Double, Double) => true,
        (Bytes, Bytes) | (Bytes, String) => true,
        (String, String) | (String, Bytes) => true,
        (Array(_), Array(_)) | (Map(_), Map(_)) => true,
        (Fixed(wf), Fixed(rf)) => wf.size == rf.size,
        (Enum(_), Enum(_)) => true,
        (Record(wr), Record(rr)) => {
            wr.name.fully_qualified_name() == rr.name.fully_qualified_name()
                || rr.aliases.iter().any(|a| a == wr.name.fully_qualified_name())
        }
        (Union(wu), _) => wu
            .variants
            .iter()
            .any(|&branch| resolvable(writer, branch, reader, r_key)),
        _ => false,
    }
}

fn decode_resolved_physical(
    writer: &Schema,
    w_key: SchemaKey,
    reader: &Schema,
    r_key: SchemaKey,
    bytes: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Value, DeError> {
    use RegularType::*;
    let w_type = &writer.get(w_key).type_;
    let r_type = &reader.get(r_key).type_;

    Ok(match (w_type, r_type) {
        (Null, Null) => Value::Null,
        (Boolean, Boolean) => Value::Boolean(codec::decode_bool(bytes, pos)?),
        (Int, Int) => Value::Int(codec::decode_int(bytes, pos)?),
        (Int, Long) => Value::Long(codec::decode_int(bytes, pos)? as i64),
        (Int, Float) => Value::Float(codec::decode_int(bytes, pos)? as f32),
        (Int, Double) => Value::Double(codec::decode_int(bytes, pos)? as f64),
        (Long, Long) => Value::Long(codec::decode_long(bytes, pos)?),
        (Long, Float) => Value::Float(codec::decode_long(bytes, pos)? as f32),
        (Long, Double) => Value::Double(codec::decode_long(bytes, pos)? as f64),
        (Float, Float) => Value::Float(codec::decode_float(bytes, pos)?),
        (Float, Double) => Value::Double(codec::decode_float(bytes, pos)? as f64),
        (Double, Double) => Value::Double(codec::decode_double(bytes, pos)?),
        (Bytes, Bytes) => Value::Bytes(codec::decode_bytes(bytes, pos)?.to_vec()),
        (Bytes, String) => {
            let raw = codec::decode_bytes(bytes, pos)?.to_vec();
            Value::String(String::from_utf8(raw).map_err(|_| DeError::invalid_utf8())?)
        }
        (String, String) => Value::String(codec::decode_string(bytes, pos)?),
        (String, Bytes) => Value::Bytes(codec::decode_string(bytes, pos)?.into_bytes()),
        (Array(wa), Array(ra)) => {
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
                    items.push(decode_resolved(
                        writer,
                        wa.items,
                        reader,
                        ra.items,
                        bytes,
                        pos,
                        depth + 1,
                    )?);
                }
            }
            Value::Array(items)
        }
        (Map(wm), Map(rm)) => {
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
                    let v = decode_resolved(
                        writer,
                        wm.values,
                        reader,
                        rm.values,
                        bytes,
                        pos,
                        depth + 1,
                    )?;
                    entries.insert(k, v);
                }
            }
            Value::Map(entries)
        }
        (Fixed(wf), Fixed(rf)) if wf.size == rf.size => {
            let raw = codec::decode_fixed(bytes, pos, wf.size)?;
            Value::Fixed(FixedValue {
                schema_id: reader.schema_id_for(r_key),
                name: rf.name.fully_qualified_name().to_owned(),
                bytes: raw.to_vec(),
            })
        }
        (Enum(we), Enum(re)) => {
            let idx = codec::decode_long(bytes, pos)?;
            let w_index = usize::try_from(idx)
                .ok()
                .filter(|&i| i < we.symbols.len())
                .ok_or(DeError::InvalidEnumIndex {
                    index: idx,
                    symbol_count: we.symbols.len(),
                })?;
            let symbol = &we.symbols[w_index];
            let (r_index, resolved_symbol) = match re.symbols.iter().position(|s| s == symbol) {
                Some(i) => (i, symbol.clone()),
                None => match re.default_symbol {
                    Some(d) => (d, re.symbols[d].clone()),
                    None => {
                        return Err(ResolutionError::EnumMismatch {
                            symbol: symbol.clone(),
                        }
                        .into())
                    }
                },
            };
            Value::Enum(EnumValue {
                schema_id: reader.schema_id_for(r_key),
                name: re.name.fully_qualified_name().to_owned(),
                index: r_index,
                symbol: resolved_symbol,
            })
        }
        (Record(wr), Record(rr)) => {
            if wr.name.fully_qualified_name() != rr.name.fully_qualified_name()
                && !rr
                    .aliases
                    .iter()
                    .any(|a| a == wr.name.fully_qualified_name())
            {
                return Err(ResolutionError::RecordNameMismatch {
                    writer: wr.name.fully_qualified_name().to_owned(),
                    reader: rr.name.fully_qualified_name().to_owned(),
                }
                .into());
            }
            let mut produced: Vec<Option<(String, Value)>> = vec![None; rr.fields.len()];
            for w_field in &wr.fields {
                match rr.field_index(&w_field.name) {
                    Some(r_idx) => {
                        let r_field = &rr.fields[r_idx];
                        let v = decode_resolved(
                            writer,
                            w_field.type_,
                            reader,
                            r_field.type_,
                            bytes,
                            pos,
                            depth + 1,
                        )?;
                        produced[r_idx] = Some((r_field.name.clone(), v));
                    }
                    None => {
                        // Writer-only field: still present on the wire, must
                        // be consumed even though the reader discards it.
                        decode_node(writer, w_field.type_, bytes, pos, depth + 1)?;
                    }
                }
            }
            let mut fields = Vec::with_capacity(produced.len());
            for (idx, slot) in produced.into_iter().enumerate() {
                match slot {
                    Some(pair) => fields.push(pair),
                    None => {
                        let r_field = &rr.fields[idx];
                        match &r_field.default {
                            Some(default_value) => {
                                fields.push((r_field.name.clone(), default_value.clone()))
                            }
                            None => {
                                return Err(ResolutionError::MissingReaderField {
                                    record: rr.name.fully_qualified_name().to_owned(),
                                    field: r_field.name.clone(),
                                }
                                .into())
                            }
                        }
                    }
                }
            }
            if reader.options().record_decodes_to_dict {
                Value::Map(fields.into_iter().collect())
            } else {
                Value::Record(RecordValue {
                    schema_id: reader.schema_id_for(r_key),
                    name: rr.name.fully_qualified_name().to_owned(),
                    fields,
                })
            }
        }
        _ => {
            return Err(ResolutionError::TypeMismatch {
                writer: describe(writer, w_key),
                reader: describe(reader, r_key),
            }
            .into())
        }
    })
}

fn describe(schema: &Schema, key: SchemaKey) -> String {
    match schema.get(key).type_.name() {
        Some(name) => name.fully_qualified_name().to_owned(),
        None => format!("{:?}", crate::schema::node_category(schema.nodes(), key)),
    }
}
