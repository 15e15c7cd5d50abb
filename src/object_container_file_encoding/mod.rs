//! Object container files (§4.H): the `Obj\x01`-prefixed framing that
//! bundles a schema, a codec, and a sequence of (optionally compressed)
//! binary-encoded values into one self-describing file.
//!
//! Grounded on `serde_avro_fast`'s `object_container_file_encoding`
//! module (header layout, sync-marker block framing, builder-style
//! writer), adapted to this crate's dynamic [`crate::Value`] instead of
//! `serde`.

mod compression;
mod error;
mod reader;
mod writer;

pub use compression::{Compression, CompressionLevel};
pub use error::ContainerError;
pub use reader::Reader;
pub use writer::{Writer, WriterBuilder, DEFAULT_BLOCK_SIZE};

/// The 4-byte magic every object container file begins with: `Obj` followed
/// by the format version byte `0x01`.
pub(crate) const MAGIC: [u8; 4] = [b'O', b'b', b'j', 1u8];
