/// Failure modes of [`super::Reader`]/[`super::Writer`] (§7).
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("input does not begin with the object container file magic `Obj\\x01`")]
    NotObjectContainerFile,
    #[error("block ended before its declared object count or sync marker was fully read")]
    TruncatedBlock,
    #[error("sync marker after a data block did not match the header's sync marker")]
    CorruptSync,
    #[error("codec `{0}` is not supported (enable the matching crate feature)")]
    UnsupportedCodec(String),
    #[error(transparent)]
    Schema(#[from] crate::schema::SchemaError),
    #[error(transparent)]
    De(#[from] crate::de::DeError),
    #[error(transparent)]
    Ser(#[from] crate::ser::SerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
