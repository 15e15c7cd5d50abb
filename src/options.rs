//! The frozen configuration record threaded through schema compilation and
//! the codecs (§4.B).
//!
//! Realized as a plain struct with public fields plus a builder, rather
//! than a `HashMap<String, bool>`, so every recognized flag is checked at
//! compile time; [`Options::from_entries`] is the escape hatch for callers
//! that build the option set dynamically (e.g. from a config file) and need
//! unknown-key rejection at construction (§4.B, last line).

use hashbrown::HashMap;

use crate::schema::SchemaNode;

#[derive(Clone, Debug)]
pub struct Options {
    pub record_decodes_to_dict: bool,
    pub record_can_encode_dict: bool,
    pub record_values_type_hint: bool,
    pub record_allow_extra_fields: bool,
    pub record_encode_use_defaults: bool,
    pub adapt_record_types: bool,
    /// Recognized and round-tripped through [`Options::from_entries`]/the
    /// builder, but not consulted by the encoder: the dynamic [`Value`]
    /// model represents both a genuine array and a host-language tuple as
    /// `Value::Array`, so a 2-element array branch selector would be
    /// indistinguishable from an ordinary `array`-typed union branch. See
    /// `DESIGN.md` for the full rationale.
    ///
    /// [`Value`]: crate::value::Value
    pub allow_tuple_notation: bool,
    pub allow_invalid_default_values: bool,
    pub allow_empty_unions: bool,
    pub allow_union_default_any_member: bool,
    pub fingerprint_returns_digest: bool,
    pub types_str_to_bytes: bool,
    pub logical_types: bool,
    pub string_types_default_to_logical_uuid: bool,
    pub decimal_check_exp_overflow: bool,
    pub alternate_timestamp_millis_encoding: bool,
    pub externally_defined_types: HashMap<String, SchemaNode>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            record_decodes_to_dict: false,
            record_can_encode_dict: true,
            record_values_type_hint: false,
            record_allow_extra_fields: true,
            record_encode_use_defaults: true,
            adapt_record_types: true,
            allow_tuple_notation: false,
            allow_invalid_default_values: false,
            allow_empty_unions: false,
            allow_union_default_any_member: false,
            fingerprint_returns_digest: true,
            types_str_to_bytes: true,
            logical_types: true,
            string_types_default_to_logical_uuid: false,
            decimal_check_exp_overflow: true,
            alternate_timestamp_millis_encoding: false,
            externally_defined_types: HashMap::new(),
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder(Options::default())
    }

    /// Builds an `Options` from `(key, value)` pairs (e.g. sourced from a
    /// config file), rejecting any key that isn't a recognized flag.
    pub fn from_entries<I>(entries: I) -> Result<Self, UnknownOptionKey>
    where
        I: IntoIterator<Item = (String, bool)>,
    {
        let mut options = Options::default();
        for (key, value) in entries {
            match key.as_str() {
                "record_decodes_to_dict" => options.record_decodes_to_dict = value,
                "record_can_encode_dict" => options.record_can_encode_dict = value,
                "record_values_type_hint" => options.record_values_type_hint = value,
                "record_allow_extra_fields" => options.record_allow_extra_fields = value,
                "record_encode_use_defaults" => options.record_encode_use_defaults = value,
                "adapt_record_types" => options.adapt_record_types = value,
                "allow_tuple_notation" => options.allow_tuple_notation = value,
                "allow_invalid_default_values" => options.allow_invalid_default_values = value,
                "allow_empty_unions" => options.allow_empty_unions = value,
                "allow_union_default_any_member" => {
                    options.allow_union_default_any_member = value
                }
                "fingerprint_returns_digest" => options.fingerprint_returns_digest = value,
                "types_str_to_bytes" => options.types_str_to_bytes = value,
                "logical_types" => options.logical_types = value,
                "string_types_default_to_logical_uuid" => {
                    options.string_types_default_to_logical_uuid = value
                }
                "decimal_check_exp_overflow" => options.decimal_check_exp_overflow = value,
                "alternate_timestamp_millis_encoding" => {
                    options.alternate_timestamp_millis_encoding = value
                }
                other => return Err(UnknownOptionKey(other.to_owned())),
            }
        }
        Ok(options)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown option key `{0}`")]
pub struct UnknownOptionKey(pub String);

/// Fluent builder over [`Options`]; every setter takes `self` by value so
/// calls chain without an intermediate binding.
pub struct OptionsBuilder(Options);

macro_rules! bool_setter {
    ($name:ident) => {
        pub fn $name(mut self, value: bool) -> Self {
            self.0.$name = value;
            self
        }
    };
}

impl OptionsBuilder {
    bool_setter!(record_decodes_to_dict);
    bool_setter!(record_can_encode_dict);
    bool_setter!(record_values_type_hint);
    bool_setter!(record_allow_extra_fields);
    bool_setter!(record_encode_use_defaults);
    bool_setter!(adapt_record_types);
    bool_setter!(allow_tuple_notation);
    bool_setter!(allow_invalid_default_values);
    bool_setter!(allow_empty_unions);
    bool_setter!(allow_union_default_any_member);
    bool_setter!(fingerprint_returns_digest);
    bool_setter!(types_str_to_bytes);
    bool_setter!(logical_types);
    bool_setter!(string_types_default_to_logical_uuid);
    bool_setter!(decimal_check_exp_overflow);
    bool_setter!(alternate_timestamp_millis_encoding);

    pub fn externally_defined_types(
        mut self,
        types: HashMap<String, SchemaNode>,
    ) -> Self {
        self.0.externally_defined_types = types;
        self
    }

    pub fn build(self) -> Options {
        self.0
    }
}
