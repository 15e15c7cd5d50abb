//! Reads the object container file framing (§4.H): header, then a
//! sequence of length-delimited, optionally-compressed data blocks.
//! Grounded on `serde_avro_fast`'s
//! `object_container_file_encoding::reader`, adapted to decode into this
//! crate's dynamic [`Value`] rather than a `serde::Deserialize` type.

use std::io::Read;

use hashbrown::HashMap;

use super::compression::Compression;
use super::error::ContainerError;
use super::MAGIC;
use crate::options::Options;
use crate::schema::Schema;
use crate::value::Value;

fn read_byte(reader: &mut impl Read) -> Result<u8, ContainerError> {
    let mut buf = [0u8; 1];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(buf[0]),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ContainerError::TruncatedBlock)
        }
        Err(e) => Err(e.into()),
    }
}

/// Reads a single byte, but treats EOF on the *first* byte of a read as a
/// clean end of stream rather than truncation — used only at block
/// boundaries, where stopping is valid.
fn read_byte_opt(reader: &mut impl Read) -> Result<Option<u8>, ContainerError> {
    let mut buf = [0u8; 1];
    match reader.read(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => read_byte_opt(reader),
        Err(e) => Err(e.into()),
    }
}

fn read_exact_bytes(reader: &mut impl Read, len: usize) -> Result<Vec<u8>, ContainerError> {
    let mut buf = vec![0u8; len];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ContainerError::TruncatedBlock)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_varint_from(reader: &mut impl Read, first: u8) -> Result<u64, ContainerError> {
    let mut value = (first & 0x7F) as u64;
    let mut shift = 7;
    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = read_byte(reader)?;
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
    }
    Ok(value)
}

fn zigzag_decode_i64(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Reads an Avro `long`, returning `Ok(None)` only when the stream ends
/// cleanly before the first byte is read (a valid place to stop: between
/// data blocks).
fn read_long_opt(reader: &mut impl Read) -> Result<Option<i64>, ContainerError> {
    match read_byte_opt(reader)? {
        None => Ok(None),
        Some(first) => Ok(Some(zigzag_decode_i64(read_varint_from(reader, first)?))),
    }
}

fn read_long(reader: &mut impl Read) -> Result<i64, ContainerError> {
    let first = read_byte(reader)?;
    Ok(zigzag_decode_i64(read_varint_from(reader, first)?))
}

fn read_avro_bytes(reader: &mut impl Read) -> Result<Vec<u8>, ContainerError> {
    let len = read_long(reader)?;
    if len < 0 {
        return Err(ContainerError::TruncatedBlock);
    }
    read_exact_bytes(reader, len as usize)
}

fn read_avro_string(reader: &mut impl Read) -> Result<String, ContainerError> {
    let bytes = read_avro_bytes(reader)?;
    String::from_utf8(bytes).map_err(|_| ContainerError::TruncatedBlock)
}

fn read_metadata_map(reader: &mut impl Read) -> Result<HashMap<String, Vec<u8>>, ContainerError> {
    let mut map = HashMap::new();
    loop {
        let mut count = read_long(reader)?;
        if count == 0 {
            break;
        }
        if count < 0 {
            let _byte_size = read_long(reader)?;
            count = -count;
        }
        for _ in 0..count {
            let key = read_avro_string(reader)?;
            let value = read_avro_bytes(reader)?;
            map.insert(key, value);
        }
    }
    Ok(map)
}

/// A streaming object container file reader (§4.H). Yields one decoded
/// [`Value`] per object, in file order, across however many data blocks
/// the file contains.
pub struct Reader<R: Read> {
    reader: R,
    schema: Schema,
    compression: Compression,
    sync_marker: [u8; 16],
    current_block: Vec<u8>,
    block_pos: usize,
    remaining_in_block: u64,
    exhausted: bool,
}

impl<R: Read> Reader<R> {
    /// Reads and parses the header (magic, metadata map, sync marker),
    /// compiling the embedded `avro.schema` under `options`.
    pub fn new(mut reader: R, options: Options) -> Result<Self, ContainerError> {
        let magic = read_exact_bytes(&mut reader, 4)
            .map_err(|_| ContainerError::NotObjectContainerFile)?;
        if magic != MAGIC {
            return Err(ContainerError::NotObjectContainerFile);
        }

        let metadata = read_metadata_map(&mut reader)?;
        let schema_json = metadata
            .get("avro.schema")
            .ok_or(ContainerError::NotObjectContainerFile)?;
        let schema_json = std::str::from_utf8(schema_json)
            .map_err(|_| ContainerError::NotObjectContainerFile)?;
        let schema = Schema::compile(schema_json, options)?;

        let codec_name = match metadata.get("avro.codec") {
            Some(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| ContainerError::NotObjectContainerFile)?
                .to_owned(),
            None => "null".to_owned(),
        };
        let compression = Compression::from_name(&codec_name)?;

        let mut sync_marker = [0u8; 16];
        sync_marker.copy_from_slice(&read_exact_bytes(&mut reader, 16)?);

        Ok(Self {
            reader,
            schema,
            compression,
            sync_marker,
            current_block: Vec::new(),
            block_pos: 0,
            remaining_in_block: 0,
            exhausted: false,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Reads `[count][size][data]`, but deliberately defers reading the
    /// trailing sync marker: it's validated only once the last object of
    /// the block has been decoded, so a corrupt/truncated sync marker
    /// surfaces as the failure of that last object rather than blocking
    /// every object the block actually contains.
    fn load_next_block(&mut self) -> Result<bool, ContainerError> {
        let count = match read_long_opt(&mut self.reader)? {
            None => return Ok(false),
            Some(n) if n <= 0 => return Ok(false),
            Some(n) => n as u64,
        };
        let byte_size = read_long(&mut self.reader)?;
        if byte_size < 0 {
            return Err(ContainerError::TruncatedBlock);
        }
        let compressed = read_exact_bytes(&mut self.reader, byte_size as usize)?;
        self.current_block = self.compression.decompress(&compressed)?;
        self.block_pos = 0;
        self.remaining_in_block = count;
        Ok(true)
    }

    fn check_sync_marker(&mut self) -> Result<(), ContainerError> {
        let sync = read_exact_bytes(&mut self.reader, 16)?;
        if sync != self.sync_marker {
            return Err(ContainerError::CorruptSync);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = Result<Value, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.remaining_in_block == 0 {
            match self.load_next_block() {
                Ok(true) => {}
                Ok(false) => {
                    self.exhausted = true;
                    return None;
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
        let value = match crate::de::decode_from(&self.schema, &self.current_block, &mut self.block_pos) {
            Ok(value) => value,
            Err(e) => {
                self.exhausted = true;
                return Some(Err(e.into()));
            }
        };
        self.remaining_in_block -= 1;
        if self.remaining_in_block == 0 {
            if let Err(e) = self.check_sync_marker() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        Some(Ok(value))
    }
}
