use avro_fast::{Options, Schema};
use pretty_assertions::assert_eq;

fn schema(json: &str) -> Schema {
    Schema::compile(json, Options::default()).expect("failed to compile schema")
}

/// Testable property 2 (spec §8): re-parsing a canonical form yields the
/// same canonical form again.
#[test]
fn canonical_form_is_a_fixed_point() {
    let s = schema(
        r#"{
            "type": "record",
            "name": "Example",
            "doc": "a doc comment, stripped by canonicalization",
            "fields": [
                {"name": "name", "type": "string", "doc": "also stripped"},
                {"name": "age", "type": "int", "default": 0}
            ]
        }"#,
    );
    let canonical = s.canonical_form().to_owned();
    let reparsed = schema(&canonical);
    assert_eq!(reparsed.canonical_form(), canonical);
}

/// Testable property 3 (spec §8): equal canonical forms imply equal
/// fingerprints, even when the source JSON differs cosmetically.
#[test]
fn fingerprint_depends_only_on_canonical_form() {
    let a = schema(r#"{"type": "record", "name": "Example", "fields": [{"name": "f", "type": "long"}]}"#);
    let b = schema(
        r#"{
            "name"   :   "Example",
            "type"   :   "record",
            "fields" :   [ { "name" : "f", "type" : "long", "doc": "unrelated" } ]
        }"#,
    );
    assert_eq!(a.canonical_form(), b.canonical_form());
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn named_types_are_registered_in_insertion_order() {
    let s = schema(
        r#"{
            "type": "record",
            "name": "Outer",
            "fields": [
                {"name": "inner", "type": {"type": "record", "name": "Inner", "fields": [{"name": "x", "type": "int"}]}}
            ]
        }"#,
    );
    let names: Vec<&str> = s.named_types().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Outer", "Inner"]);
}

#[test]
fn recursive_schema_resolves_through_the_name_registry() {
    let s = schema(
        r#"{
            "type": "record",
            "name": "LinkedList",
            "fields": [
                {"name": "value", "type": "long"},
                {"name": "next", "type": ["null", "LinkedList"]}
            ]
        }"#,
    );
    assert!(s.resolve_name("LinkedList").is_some());
}
