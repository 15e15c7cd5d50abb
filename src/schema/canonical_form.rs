//! Avro Parsing Canonical Form (§4.C step 7): strips non-essential
//! metadata, fully qualifies names, and emits a stable string used both for
//! schema equality and as the Rabin fingerprint input.
//!
//! Logical type annotations are stripped (per AVRO-1721): only the physical
//! type is represented in canonical form.

use hashbrown::HashSet;
use std::fmt::Write;

use super::{RegularType, SchemaKey, SchemaNode};

pub fn compute(nodes: &[SchemaNode], root: SchemaKey) -> String {
    let mut out = String::new();
    let mut written_names: HashSet<String> = HashSet::new();
    write_node(nodes, root, &mut out, &mut written_names);
    out
}

fn write_node(
    nodes: &[SchemaNode],
    key: SchemaKey,
    out: &mut String,
    written_names: &mut HashSet<String>,
) {
    let node = &nodes[key.idx()];
    match &node.type_ {
        RegularType::Null => out.push_str("\"null\""),
        RegularType::Boolean => out.push_str("\"boolean\""),
        RegularType::Int => out.push_str("\"int\""),
        RegularType::Long => out.push_str("\"long\""),
        RegularType::Float => out.push_str("\"float\""),
        RegularType::Double => out.push_str("\"double\""),
        RegularType::Bytes => out.push_str("\"bytes\""),
        RegularType::String => out.push_str("\"string\""),
        RegularType::Array(a) => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_node(nodes, a.items, out, written_names);
            out.push('}');
        }
        RegularType::Map(m) => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_node(nodes, m.values, out, written_names);
            out.push('}');
        }
        RegularType::Union(u) => {
            out.push('[');
            for (i, variant) in u.variants.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_node(nodes, *variant, out, written_names);
            }
            out.push(']');
        }
        RegularType::Fixed(f) => {
            let fqn = f.name.fully_qualified_name().to_owned();
            if written_names.contains(&fqn) {
                write_quoted(out, &fqn);
                return;
            }
            written_names.insert(fqn.clone());
            out.push_str("{\"name\":");
            write_quoted(out, &fqn);
            out.push_str(",\"type\":\"fixed\",\"size\":");
            let _ = write!(out, "{}", f.size);
            out.push('}');
        }
        RegularType::Enum(e) => {
            let fqn = e.name.fully_qualified_name().to_owned();
            if written_names.contains(&fqn) {
                write_quoted(out, &fqn);
                return;
            }
            written_names.insert(fqn.clone());
            out.push_str("{\"name\":");
            write_quoted(out, &fqn);
            out.push_str(",\"type\":\"enum\",\"symbols\":[");
            for (i, symbol) in e.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_quoted(out, symbol);
            }
            out.push_str("]}");
        }
        RegularType::Record(r) => {
            let fqn = r.name.fully_qualified_name().to_owned();
            if written_names.contains(&fqn) {
                write_quoted(out, &fqn);
                return;
            }
            written_names.insert(fqn.clone());
            out.push_str("{\"name\":");
            write_quoted(out, &fqn);
            out.push_str(",\"type\":\"record\",\"fields\":[");
            for (i, field) in r.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_quoted(out, &field.name);
                out.push_str(",\"type\":");
                write_node(nodes, field.type_, out, written_names);
                out.push('}');
            }
            out.push_str("]}");
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::super::Schema;
    use crate::options::Options;

    #[test]
    fn primitive_canonical_form() {
        let schema = Schema::compile("\"null\"", Options::default()).unwrap();
        assert_eq!(schema.canonical_form(), "\"null\"");
    }

    #[test]
    fn stable_under_reparse() {
        let json = r#"{"type":"record","name":"Example","fields":[{"name":"name","type":"string"},{"name":"age","type":"int"}]}"#;
        let schema = Schema::compile(json, Options::default()).unwrap();
        let cf = schema.canonical_form().to_owned();
        let reparsed = Schema::compile(&cf, Options::default()).unwrap();
        assert_eq!(reparsed.canonical_form(), cf);
    }
}
