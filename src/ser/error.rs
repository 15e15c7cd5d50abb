use crate::dispatch::DispatchError;
use crate::value::Category;

/// Failure modes of [`crate::schema::Schema::binary_encode`] and friends
/// (§7).
#[derive(Debug, thiserror::Error)]
pub enum SerError {
    #[error("value at `{path}` did not satisfy its declared type: {reason}")]
    InvalidValue { path: String, reason: String },
    #[error("record `{record}` is missing required field `{field}`")]
    MissingField { record: String, field: String },
    #[error("record `{record}` has no declared field `{field}`")]
    UnknownField { record: String, field: String },
    #[error("value of category {0:?} matches more than one union branch")]
    DispatchAmbiguous(Category),
    #[error("value of category {0:?} matches no union branch")]
    DispatchNoMatch(Category),
    #[error("record instance of `{from}` cannot be adapted to `{to}`")]
    RecordNotAdaptable { from: String, to: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<DispatchError> for SerError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoMatch(category) => SerError::DispatchNoMatch(category),
            DispatchError::Ambiguous(category) => SerError::DispatchAmbiguous(category),
        }
    }
}
