/// Failure modes of [`crate::schema::Schema::binary_decode`] and friends
/// (§7).
#[derive(Debug, thiserror::Error)]
pub enum DeError {
    #[error("unexpected end of input while decoding")]
    TruncatedInput,
    #[error("varint occupied more groups than the type allows")]
    IntegerOverflow,
    #[error("string payload was not valid UTF-8")]
    InvalidUtf8,
    #[error("union tag {index} is out of range for a union of {union_size} branches")]
    InvalidUnionTag { index: i64, union_size: usize },
    #[error("unknown enum symbol index {index} (enum has {symbol_count} symbols)")]
    InvalidEnumIndex { index: i64, symbol_count: usize },
    #[error("schema resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("malformed logical-type payload: {0}")]
    InvalidLogicalValue(String),
    #[error("schema nesting exceeded the maximum allowed recursion depth")]
    RecursionLimitExceeded,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeError {
    pub(crate) fn unexpected_eof() -> Self {
        DeError::TruncatedInput
    }
    pub(crate) fn integer_overflow() -> Self {
        DeError::IntegerOverflow
    }
    pub(crate) fn invalid_utf8() -> Self {
        DeError::InvalidUtf8
    }
}

/// Writer/reader schema incompatibilities discovered while resolving
/// (§4.G).
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("reader field `{field}` of `{record}` has no matching writer field and no default")]
    MissingReaderField { record: String, field: String },
    #[error("writer symbol `{symbol}` has no equivalent in the reader enum and no default symbol is declared")]
    EnumMismatch { symbol: String },
    #[error("writer schema `{writer}` is incompatible with reader schema `{reader}`")]
    TypeMismatch { writer: String, reader: String },
    #[error("writer record `{writer}` does not match reader record `{reader}` by name or alias")]
    RecordNameMismatch { writer: String, reader: String },
    #[error("no reader union branch accepts the writer's type `{writer}`")]
    NoMatchingReaderBranch { writer: String },
}
