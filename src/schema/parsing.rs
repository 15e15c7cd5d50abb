//! The schema compiler (§4.C): walks a parsed JSON schema, builds the node
//! arena, resolves named-type references, and validates field defaults.

use hashbrown::{HashMap, HashSet};
use serde_json::Value as Json;

use super::canonical_form;
use super::error::SchemaError;
use super::name::Name;
use super::rabin;
use super::{
    Array, Decimal, Enum, FieldOrder, Fixed, LogicalType, Map, Record, RecordField, RegularType,
    Schema, SchemaKey, SchemaNode, Union,
};
use crate::options::Options;
use crate::value::{Category, Value};

pub(crate) struct SchemaBuilder {
    nodes: Vec<SchemaNode>,
    names: HashMap<String, SchemaKey>,
    name_order: Vec<String>,
    /// Record field defaults, as raw JSON, deferred until the whole arena
    /// (including self-recursive references) exists (§4.C step 6).
    pending_defaults: Vec<(SchemaKey, Vec<Option<Json>>)>,
}

pub(crate) fn compile(json: &str, options: Options) -> Result<Schema, SchemaError> {
    let raw: Json = serde_json::from_str(json)?;
    let mut builder = SchemaBuilder {
        nodes: Vec::new(),
        names: HashMap::new(),
        name_order: Vec::new(),
        pending_defaults: Vec::new(),
    };
    for (name, node) in &options.externally_defined_types {
        builder.register_external(name, node.clone())?;
    }
    let root = builder.build_node(&raw, None, &options)?;
    let SchemaBuilder {
        mut nodes,
        names,
        name_order,
        pending_defaults,
    } = builder;

    validate_defaults(&mut nodes, pending_defaults, &options)?;

    let canonical_form = canonical_form::compute(&nodes, root);
    let fingerprint = rabin::fingerprint(&canonical_form);

    Ok(Schema {
        nodes,
        names,
        name_order,
        root,
        options,
        canonical_form,
        fingerprint,
        source_json: json.to_owned(),
    })
}

impl SchemaBuilder {
    fn register_external(&mut self, name: &str, node: SchemaNode) -> Result<(), SchemaError> {
        if self.names.contains_key(name) {
            return Err(SchemaError::DuplicateName(name.to_owned()));
        }
        let key = self.push(node);
        self.names.insert(name.to_owned(), key);
        self.name_order.push(name.to_owned());
        Ok(())
    }

    fn push(&mut self, node: SchemaNode) -> SchemaKey {
        self.nodes.push(node);
        SchemaKey::from_idx(self.nodes.len() - 1)
    }

    fn register_name(&mut self, name: &Name, key: SchemaKey) -> Result<(), SchemaError> {
        let fqn = name.fully_qualified_name().to_owned();
        if self.names.contains_key(&fqn) {
            return Err(SchemaError::DuplicateName(fqn));
        }
        self.names.insert(fqn.clone(), key);
        self.name_order.push(fqn);
        Ok(())
    }

    fn register_aliases(&mut self, aliases: &[String], key: SchemaKey) {
        for alias in aliases {
            // Aliases are read-only indirections (Invariant 1); a conflict
            // with a real name is ignored rather than treated as fatal,
            // since aliases exist precisely to let evolved schemas keep
            // referring to a type by an older name.
            self.names.entry(alias.clone()).or_insert(key);
        }
    }

    fn build_node(
        &mut self,
        raw: &Json,
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        match raw {
            Json::String(s) => {
                let key = self.resolve_name_or_primitive(s, enclosing_namespace)?;
                Ok(self.maybe_default_to_uuid(key, options))
            }
            Json::Array(branches) => self.build_union(branches, enclosing_namespace, options),
            Json::Object(map) => self.build_object(map, enclosing_namespace, options),
            other => Err(SchemaError::InvalidName(other.to_string())),
        }
    }

    /// `string_types_default_to_logical_uuid` (§4.B): a bare `string` type
    /// with no explicit `logicalType` is treated as logical `uuid` by
    /// default. Only ever applies to a freshly-built primitive node (never
    /// a reference to a named type, which can't be `RegularType::String`).
    fn maybe_default_to_uuid(&mut self, key: SchemaKey, options: &Options) -> SchemaKey {
        if options.logical_types
            && options.string_types_default_to_logical_uuid
            && matches!(self.nodes[key.idx()].type_, RegularType::String)
            && self.nodes[key.idx()].logical_type.is_none()
        {
            return self.push(SchemaNode {
                type_: RegularType::String,
                logical_type: Some(LogicalType::Uuid),
            });
        }
        key
    }

    fn resolve_name_or_primitive(
        &mut self,
        s: &str,
        enclosing_namespace: Option<&str>,
    ) -> Result<SchemaKey, SchemaError> {
        if let Some(&key) = self.names.get(s) {
            return Ok(key);
        }
        if !s.contains('.') {
            if let Some(ns) = enclosing_namespace {
                let qualified = format!("{ns}.{s}");
                if let Some(&key) = self.names.get(&qualified) {
                    return Ok(key);
                }
            }
        }
        if let Some(primitive) = primitive_from_str(s) {
            return Ok(self.push(primitive.into()));
        }
        Err(SchemaError::UnknownType(s.to_owned()))
    }

    fn build_union(
        &mut self,
        branches: &[Json],
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        if branches.is_empty() && !options.allow_empty_unions {
            return Err(SchemaError::InvalidUnion(
                "union must have at least one branch".into(),
            ));
        }
        let mut variants = Vec::with_capacity(branches.len());
        for branch in branches {
            let key = self.build_node(branch, enclosing_namespace, options)?;
            if matches!(self.nodes[key.idx()].type_, RegularType::Union(_)) {
                return Err(SchemaError::InvalidUnion(
                    "a union may not immediately contain another union".into(),
                ));
            }
            variants.push(key);
        }
        let mut category_keys = Vec::with_capacity(variants.len());
        let mut seen = HashSet::new();
        for &key in &variants {
            let category = node_category(&self.nodes, key);
            if !seen.insert(category.clone()) {
                return Err(SchemaError::InvalidUnion(format!(
                    "duplicate union branch category {category:?}"
                )));
            }
            category_keys.push(category);
        }
        Ok(self.push(
            RegularType::Union(Union {
                variants,
                category_keys,
            })
            .into(),
        ))
    }

    fn build_object(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        let type_val = map
            .get("type")
            .ok_or_else(|| SchemaError::InvalidName("missing 'type' property".into()))?;

        let base_key = match type_val {
            Json::String(kind) => match kind.as_str() {
                "record" => self.build_record(map, enclosing_namespace, options)?,
                "enum" => self.build_enum(map, enclosing_namespace)?,
                "fixed" => self.build_fixed(map, enclosing_namespace)?,
                "array" => self.build_array(map, enclosing_namespace, options)?,
                "map" => self.build_map(map, enclosing_namespace, options)?,
                other => self.resolve_name_or_primitive(other, enclosing_namespace)?,
            },
            Json::Object(inner) => self.build_object(inner, enclosing_namespace, options)?,
            Json::Array(branches) => self.build_union(branches, enclosing_namespace, options)?,
            other => return Err(SchemaError::InvalidName(other.to_string())),
        };

        match map.get("logicalType").and_then(Json::as_str) {
            Some(name) if options.logical_types => {
                self.wrap_logical_type(base_key, name, map, options)
            }
            _ => Ok(self.maybe_default_to_uuid(base_key, options)),
        }
    }

    fn wrap_logical_type(
        &mut self,
        base_key: SchemaKey,
        logical_type_name: &str,
        map: &serde_json::Map<String, Json>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        let physical = self.nodes[base_key.idx()].type_.clone();
        let logical_type = match logical_type_name {
            "decimal" => {
                let precision = map
                    .get("precision")
                    .and_then(Json::as_u64)
                    .ok_or_else(|| SchemaError::InvalidLogicalParams {
                        logical_type: "decimal".into(),
                        reason: "missing 'precision'".into(),
                    })? as usize;
                let scale = map.get("scale").and_then(Json::as_u64).unwrap_or(0) as u32;
                if precision == 0 || scale as usize > precision {
                    return Err(SchemaError::InvalidLogicalParams {
                        logical_type: "decimal".into(),
                        reason: "scale must not exceed precision and precision must be > 0"
                            .into(),
                    });
                }
                match &physical {
                    RegularType::Bytes => {}
                    RegularType::Fixed(f) => {
                        let max_precision = max_decimal_precision_for_fixed_size(f.size);
                        if options.decimal_check_exp_overflow && precision > max_precision {
                            return Err(SchemaError::InvalidLogicalParams {
                                logical_type: "decimal".into(),
                                reason: format!(
                                    "precision {precision} exceeds capacity of fixed({})",
                                    f.size
                                ),
                            });
                        }
                    }
                    _ => {
                        return Err(SchemaError::InvalidLogicalParams {
                            logical_type: "decimal".into(),
                            reason: "decimal must wrap bytes or fixed".into(),
                        })
                    }
                }
                LogicalType::Decimal(Decimal { precision, scale })
            }
            "uuid" => {
                if !matches!(physical, RegularType::String) {
                    return Err(SchemaError::InvalidLogicalParams {
                        logical_type: "uuid".into(),
                        reason: "uuid must wrap string".into(),
                    });
                }
                LogicalType::Uuid
            }
            "date" => {
                require_physical(&physical, "date", RegularType::Int)?;
                LogicalType::Date
            }
            "time-millis" => {
                require_physical(&physical, "time-millis", RegularType::Int)?;
                LogicalType::TimeMillis
            }
            "time-micros" => {
                require_physical(&physical, "time-micros", RegularType::Long)?;
                LogicalType::TimeMicros
            }
            "timestamp-millis" => {
                require_physical(&physical, "timestamp-millis", RegularType::Long)?;
                LogicalType::TimestampMillis
            }
            "timestamp-micros" => {
                require_physical(&physical, "timestamp-micros", RegularType::Long)?;
                LogicalType::TimestampMicros
            }
            "duration" => {
                match &physical {
                    RegularType::Fixed(f) if f.size == 12 => {}
                    _ => {
                        return Err(SchemaError::InvalidLogicalParams {
                            logical_type: "duration".into(),
                            reason: "duration must wrap fixed(12)".into(),
                        })
                    }
                }
                LogicalType::Duration
            }
            other => LogicalType::Unknown(other.to_owned()),
        };
        Ok(self.push(SchemaNode {
            type_: physical,
            logical_type: Some(logical_type),
        }))
    }

    fn build_array(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        let items_json = map
            .get("items")
            .ok_or_else(|| SchemaError::InvalidName("array missing 'items'".into()))?;
        let items = self.build_node(items_json, enclosing_namespace, options)?;
        Ok(self.push(RegularType::Array(Array { items }).into()))
    }

    fn build_map(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        let values_json = map
            .get("values")
            .ok_or_else(|| SchemaError::InvalidName("map missing 'values'".into()))?;
        let values = self.build_node(values_json, enclosing_namespace, options)?;
        Ok(self.push(RegularType::Map(Map { values }).into()))
    }

    fn build_fixed(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
    ) -> Result<SchemaKey, SchemaError> {
        let (name, namespace, aliases) = self.read_name_fields(map, enclosing_namespace)?;
        let size = map
            .get("size")
            .and_then(Json::as_u64)
            .ok_or_else(|| SchemaError::InvalidName("fixed missing 'size'".into()))? as usize;
        let key = self.push(
            RegularType::Fixed(Fixed {
                name: name.clone(),
                aliases: aliases.clone(),
                size,
            })
            .into(),
        );
        let _ = namespace;
        self.register_name(&name, key)?;
        self.register_aliases(&aliases, key);
        Ok(key)
    }

    fn build_enum(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
    ) -> Result<SchemaKey, SchemaError> {
        let (name, namespace, aliases) = self.read_name_fields(map, enclosing_namespace)?;
        let symbols_json = map
            .get("symbols")
            .and_then(Json::as_array)
            .ok_or_else(|| SchemaError::InvalidName("enum missing 'symbols'".into()))?;
        let mut symbols = Vec::with_capacity(symbols_json.len());
        for s in symbols_json {
            let s = s
                .as_str()
                .ok_or_else(|| SchemaError::InvalidName("enum symbol must be a string".into()))?;
            if symbols.contains(&s.to_owned()) {
                return Err(SchemaError::DuplicateName(format!(
                    "duplicate enum symbol {s}"
                )));
            }
            symbols.push(s.to_owned());
        }
        let default_symbol = map
            .get("default")
            .and_then(Json::as_str)
            .and_then(|d| symbols.iter().position(|s| s == d));
        let key = self.push(
            RegularType::Enum(Enum {
                name: name.clone(),
                aliases: aliases.clone(),
                symbols,
                default_symbol,
            })
            .into(),
        );
        let _ = namespace;
        self.register_name(&name, key)?;
        self.register_aliases(&aliases, key);
        Ok(key)
    }

    fn build_record(
        &mut self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
        options: &Options,
    ) -> Result<SchemaKey, SchemaError> {
        let (name, _namespace, aliases) = self.read_name_fields(map, enclosing_namespace)?;
        // Reserve the slot and register the name *before* compiling fields,
        // so self- and mutually-nested recursive references resolve
        // (§4.C step 2).
        let key = self.push(RegularType::Null.into());
        self.register_name(&name, key)?;
        self.register_aliases(&aliases, key);

        let fields_json = map
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| SchemaError::InvalidName("record missing 'fields'".into()))?;
        let field_namespace = name.child_namespace().map(str::to_owned);
        let mut fields = Vec::with_capacity(fields_json.len());
        let mut seen_names = HashSet::new();
        for field_json in fields_json {
            let field_obj = field_json
                .as_object()
                .ok_or_else(|| SchemaError::InvalidName("field must be an object".into()))?;
            let field_name = field_obj
                .get("name")
                .and_then(Json::as_str)
                .ok_or_else(|| SchemaError::InvalidName("field missing 'name'".into()))?
                .to_owned();
            if !seen_names.insert(field_name.clone()) {
                return Err(SchemaError::DuplicateName(format!(
                    "duplicate field name {field_name} in record {}",
                    name.fully_qualified_name()
                )));
            }
            let field_type_json = field_obj
                .get("type")
                .ok_or_else(|| SchemaError::InvalidName("field missing 'type'".into()))?;
            let field_type = self.build_node(field_type_json, field_namespace.as_deref(), options)?;
            let field_aliases = field_obj
                .get("aliases")
                .and_then(Json::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Json::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default();
            let order = match field_obj.get("order").and_then(Json::as_str) {
                Some("descending") => FieldOrder::Descending,
                Some("ignore") => FieldOrder::Ignore,
                _ => FieldOrder::Ascending,
            };
            let default = field_obj.get("default").cloned();
            fields.push((
                RecordField {
                    name: field_name,
                    aliases: field_aliases,
                    type_: field_type,
                    default: None,
                    order,
                },
                default,
            ));
        }

        // Field defaults are validated in a second pass (`validate_defaults`)
        // once the whole schema (including forward self-references) exists;
        // store the raw JSON alongside the field for now.
        let raw_defaults: Vec<Option<Json>> = fields.iter().map(|(_, d)| d.clone()).collect();
        let record = Record {
            name,
            aliases,
            fields: fields.into_iter().map(|(f, _)| f).collect(),
        };
        self.nodes[key.idx()] = RegularType::Record(record).into();
        self.pending_defaults.push((key, raw_defaults));
        Ok(key)
    }

    fn read_name_fields(
        &self,
        map: &serde_json::Map<String, Json>,
        enclosing_namespace: Option<&str>,
    ) -> Result<(Name, Option<String>, Vec<String>), SchemaError> {
        let simple_name = map
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| SchemaError::InvalidName("named type missing 'name'".into()))?;
        let namespace = map
            .get("namespace")
            .and_then(Json::as_str)
            .map(str::to_owned)
            .or_else(|| enclosing_namespace.map(str::to_owned));
        let name = Name::qualify(simple_name, namespace.as_deref());
        let aliases = map
            .get("aliases")
            .and_then(Json::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Json::as_str)
                    .map(|alias| {
                        Name::qualify(alias, namespace.as_deref())
                            .fully_qualified_name()
                            .to_owned()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok((name, namespace, aliases))
    }
}

fn require_physical(
    physical: &RegularType,
    logical_type: &str,
    expected: RegularType,
) -> Result<(), SchemaError> {
    if std::mem::discriminant(physical) == std::mem::discriminant(&expected) {
        Ok(())
    } else {
        Err(SchemaError::InvalidLogicalParams {
            logical_type: logical_type.to_owned(),
            reason: "logical type annotation on unexpected physical type".into(),
        })
    }
}

fn max_decimal_precision_for_fixed_size(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    let bits = size * 8 - 1;
    ((2f64.powi(bits as i32) - 1.0).log10()).floor() as usize
}

fn primitive_from_str(s: &str) -> Option<RegularType> {
    Some(match s {
        "null" => RegularType::Null,
        "boolean" => RegularType::Boolean,
        "int" => RegularType::Int,
        "long" => RegularType::Long,
        "float" => RegularType::Float,
        "double" => RegularType::Double,
        "bytes" => RegularType::Bytes,
        "string" => RegularType::String,
        _ => return None,
    })
}

/// The coarse dispatch tag for a *schema node* (as opposed to a value),
/// used to enforce union-branch uniqueness at compile time (§4.D).
pub(crate) fn node_category(nodes: &[SchemaNode], key: SchemaKey) -> Category {
    match &nodes[key.idx()].type_ {
        RegularType::Null => Category::Null,
        RegularType::Boolean => Category::Boolean,
        RegularType::Int => Category::Int,
        RegularType::Long => Category::Long,
        RegularType::Float => Category::Float,
        RegularType::Double => Category::Double,
        RegularType::Bytes => Category::Bytes,
        RegularType::String => Category::String,
        RegularType::Array(_) => Category::Array,
        RegularType::Map(_) => Category::Map,
        RegularType::Fixed(f) => Category::Fixed(f.name.fully_qualified_name().to_owned()),
        RegularType::Enum(e) => Category::Enum(e.name.fully_qualified_name().to_owned()),
        RegularType::Record(r) => Category::Record(r.name.fully_qualified_name().to_owned()),
        RegularType::Union(_) => unreachable!("nested unions are rejected before this is called"),
    }
}

fn validate_defaults(
    nodes: &mut [SchemaNode],
    pending: Vec<(SchemaKey, Vec<Option<Json>>)>,
    options: &Options,
) -> Result<(), SchemaError> {
    for (record_key, raw_defaults) in pending {
        let field_types: Vec<SchemaKey> = match &nodes[record_key.idx()].type_ {
            RegularType::Record(r) => r.fields.iter().map(|f| f.type_).collect(),
            _ => unreachable!(),
        };
        let record_name = match &nodes[record_key.idx()].type_ {
            RegularType::Record(r) => r.name.fully_qualified_name().to_owned(),
            _ => unreachable!(),
        };
        let mut coerced = Vec::with_capacity(raw_defaults.len());
        for (field_idx, raw) in raw_defaults.into_iter().enumerate() {
            let value = match raw {
                None => None,
                Some(json) => {
                    match coerce_json_default(nodes, field_types[field_idx], &json, options) {
                        Ok(v) => Some(v),
                        Err(reason) => {
                            if options.allow_invalid_default_values {
                                None
                            } else {
                                let field_name = match &nodes[record_key.idx()].type_ {
                                    RegularType::Record(r) => r.fields[field_idx].name.clone(),
                                    _ => unreachable!(),
                                };
                                return Err(SchemaError::InvalidDefault {
                                    record: record_name,
                                    field: field_name,
                                    reason,
                                });
                            }
                        }
                    }
                }
            };
            coerced.push(value);
        }
        if let RegularType::Record(r) = &mut nodes[record_key.idx()].type_ {
            for (field, value) in r.fields.iter_mut().zip(coerced) {
                field.default = value;
            }
        }
    }
    Ok(())
}

/// Coerces a JSON default value into a [`Value`] matching `key`'s type,
/// following the Avro JSON-encoding-of-defaults rules (§4.C step 6).
fn coerce_json_default(
    nodes: &[SchemaNode],
    key: SchemaKey,
    json: &Json,
    options: &Options,
) -> Result<Value, String> {
    let node = &nodes[key.idx()];
    match &node.type_ {
        RegularType::Null => match json {
            Json::Null => Ok(Value::Null),
            _ => Err("expected null default".into()),
        },
        RegularType::Boolean => json
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| "expected boolean default".into()),
        RegularType::Int => json
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int)
            .ok_or_else(|| "expected int default".into()),
        RegularType::Long => json
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| "expected long default".into()),
        RegularType::Float => json
            .as_f64()
            .map(|v| Value::Float(v as f32))
            .ok_or_else(|| "expected float default".into()),
        RegularType::Double => json
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| "expected double default".into()),
        RegularType::Bytes => json
            .as_str()
            .map(|s| Value::Bytes(s.chars().map(|c| c as u32 as u8).collect()))
            .ok_or_else(|| "expected string-encoded bytes default".into()),
        RegularType::String => json
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| "expected string default".into()),
        RegularType::Fixed(f) => {
            let s = json
                .as_str()
                .ok_or_else(|| "expected string-encoded fixed default".to_owned())?;
            let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
            if bytes.len() != f.size {
                return Err(format!(
                    "fixed default length {} does not match size {}",
                    bytes.len(),
                    f.size
                ));
            }
            Ok(Value::Fixed(crate::value::FixedValue {
                schema_id: crate::value::SchemaId {
                    fingerprint: [0; 8],
                    node: key,
                },
                name: f.name.fully_qualified_name().to_owned(),
                bytes,
            }))
        }
        RegularType::Enum(e) => {
            let s = json
                .as_str()
                .ok_or_else(|| "expected string enum default".to_owned())?;
            let index = e
                .symbols
                .iter()
                .position(|sym| sym == s)
                .ok_or_else(|| format!("unknown enum symbol {s}"))?;
            Ok(Value::Enum(crate::value::EnumValue {
                schema_id: crate::value::SchemaId {
                    fingerprint: [0; 8],
                    node: key,
                },
                name: e.name.fully_qualified_name().to_owned(),
                index,
                symbol: s.to_owned(),
            }))
        }
        RegularType::Array(a) => {
            let arr = json
                .as_array()
                .ok_or_else(|| "expected array default".to_owned())?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(coerce_json_default(nodes, a.items, item, options)?);
            }
            Ok(Value::Array(out))
        }
        RegularType::Map(m) => {
            let obj = json
                .as_object()
                .ok_or_else(|| "expected map default".to_owned())?;
            let mut out = hashbrown::HashMap::new();
            for (k, v) in obj {
                out.insert(k.clone(), coerce_json_default(nodes, m.values, v, options)?);
            }
            Ok(Value::Map(out))
        }
        RegularType::Record(r) => {
            let obj = json
                .as_object()
                .ok_or_else(|| "expected record default".to_owned())?;
            let mut out_fields = Vec::with_capacity(r.fields.len());
            for field in &r.fields {
                let field_json = obj.get(&field.name);
                let value = match field_json {
                    Some(v) => coerce_json_default(nodes, field.type_, v, options)?,
                    None => {
                        return Err(format!("missing default field {}", field.name));
                    }
                };
                out_fields.push((field.name.clone(), value));
            }
            Ok(Value::Record(crate::value::RecordValue {
                schema_id: crate::value::SchemaId {
                    fingerprint: [0; 8],
                    node: key,
                },
                name: r.name.fully_qualified_name().to_owned(),
                fields: out_fields,
            }))
        }
        RegularType::Union(u) => {
            // Per the Avro spec, a union default must match the *first*
            // branch's type, unless `allow_union_default_any_member` opts
            // into matching any branch (§4.B).
            if options.allow_union_default_any_member {
                for (idx, &branch) in u.variants.iter().enumerate() {
                    if let Ok(v) = coerce_json_default(nodes, branch, json, options) {
                        return Ok(Value::Union(idx, Box::new(v)));
                    }
                }
                Err("default did not match any union branch".into())
            } else {
                let first = *u
                    .variants
                    .first()
                    .ok_or_else(|| "union has no branches".to_owned())?;
                let v = coerce_json_default(nodes, first, json, options)?;
                Ok(Value::Union(0, Box::new(v)))
            }
        }
    }
}
