/// Failure modes of [`crate::schema::Schema::compile`] (§4.C).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("duplicate name `{0}` in schema registry")]
    DuplicateName(String),
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error("invalid default for field `{field}` of `{record}`: {reason}")]
    InvalidDefault {
        record: String,
        field: String,
        reason: String,
    },
    #[error("invalid union: {0}")]
    InvalidUnion(String),
    #[error("invalid logical type parameters for `{logical_type}`: {reason}")]
    InvalidLogicalParams {
        logical_type: String,
        reason: String,
    },
    #[error("unknown option key `{0}`")]
    UnknownOption(String),
}
