//! Union dispatch (§4.D): given a host [`Value`] and a union type, select
//! the matching branch.

use crate::schema::{RegularType, Schema, Union};
use crate::value::{Category, Value};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("value of category {0:?} matches no union branch")]
    NoMatch(Category),
    #[error("value of category {0:?} matches more than one union branch ambiguously")]
    Ambiguous(Category),
}

/// Categorizes `value` per §4.D's value-categorization rules, independent
/// of any particular union (used both for dispatch and for diagnostics).
///
/// A string's *primary* category is always `string`; its candidacy for a
/// `bytes` branch (when `types_str_to_bytes`) is handled separately as a
/// promotion in [`select_branch`].
pub fn categorize(value: &Value) -> Category {
    match value {
        Value::Null => Category::Null,
        Value::Boolean(_) => Category::Boolean,
        Value::Int(_) => Category::Int,
        Value::Long(v) => {
            if i32::try_from(*v).is_ok() {
                Category::Int
            } else {
                Category::Long
            }
        }
        Value::Float(_) => Category::Float,
        Value::Double(_) => Category::Double,
        Value::Bytes(_) => Category::Bytes,
        Value::String(_) => Category::String,
        Value::Array(_) => Category::Array,
        Value::Map(_) => Category::Map,
        Value::Fixed(f) => Category::Fixed(f.name.clone()),
        Value::Enum(e) => Category::Enum(e.name.clone()),
        Value::Record(r) => Category::Record(r.name.clone()),
        Value::Union(_, inner) => categorize(inner),
        Value::Decimal(_) => Category::Bytes,
        Value::Duration(_) => Category::Bytes,
    }
}

/// Selects the union branch index matching `value`, per §4.D's tie-break
/// rules (exact category match wins over promotion match; earlier-declared
/// branch wins among ties).
///
/// A `Value::Map` is routed straight to [`select_map_branch`]: its
/// category (`Category::Map`) would otherwise win an exact match against a
/// `map` branch before record field-superset matching (§4.D step 9) ever
/// gets a chance to run, selecting the wrong branch whenever a union
/// contains both a `record` and a `map` alternative.
pub fn select_branch(
    schema: &Schema,
    union: &Union,
    value: &Value,
) -> Result<usize, DispatchError> {
    let options = schema.options();
    let category = categorize(value);

    if let Value::Map(map) = value {
        return select_map_branch(schema, union, map, category);
    }

    // Exact match first.
    if let Some(idx) = union
        .category_keys
        .iter()
        .position(|key| *key == category)
    {
        return Ok(idx);
    }

    // Promotion matches: int value may select a `long` branch; a float
    // value may select a `double` branch; a string value may select a
    // `bytes` branch when `types_str_to_bytes`.
    let mut candidates = Vec::new();
    for (idx, key) in union.category_keys.iter().enumerate() {
        let promotes = match (&category, key) {
            (Category::Int, Category::Long) => true,
            (Category::Float, Category::Double) => true,
            (Category::String, Category::Bytes) => options.types_str_to_bytes,
            _ => false,
        };
        if promotes {
            candidates.push(idx);
        }
    }
    if let Some(&idx) = candidates.first() {
        return Ok(idx);
    }

    Err(DispatchError::NoMatch(category))
}

/// Mapping dispatch (§4.D step 9) for a `Value::Map` host value: type
/// hint, then record field-superset matching, then a plain `map` branch,
/// in that order — record-superset matching must run *before* a `map`
/// branch is ever picked by exact category.
fn select_map_branch(
    schema: &Schema,
    union: &Union,
    map: &hashbrown::HashMap<String, Value>,
    category: Category,
) -> Result<usize, DispatchError> {
    let options = schema.options();

    if options.record_values_type_hint {
        if let Some(Value::String(type_name)) = map.get("-type") {
            if let Some(idx) = union.variants.iter().position(|&key| {
                matches!(&schema.get(key).type_, RegularType::Record(r) if r.name.fully_qualified_name() == type_name.as_str())
            }) {
                return Ok(idx);
            }
        }
    }

    let mut record_matches = Vec::new();
    for (idx, &key) in union.variants.iter().enumerate() {
        if let RegularType::Record(r) = &schema.get(key).type_ {
            let all_fields_known = map
                .keys()
                .all(|k| k == "-type" || r.fields.iter().any(|f| &f.name == k));
            let superset = r
                .fields
                .iter()
                .all(|f| map.contains_key(&f.name) || f.default.is_some());
            if superset && (options.record_allow_extra_fields || all_fields_known) {
                record_matches.push(idx);
            }
        }
    }
    if record_matches.len() == 1 {
        return Ok(record_matches[0]);
    }
    if record_matches.len() > 1 {
        return Err(DispatchError::Ambiguous(category));
    }

    if let Some(idx) = union
        .variants
        .iter()
        .position(|&key| matches!(&schema.get(key).type_, RegularType::Map(_)))
    {
        return Ok(idx);
    }

    Err(DispatchError::NoMatch(category))
}
