//! Writes the object container file framing (§4.H): header, then
//! length-delimited, optionally-compressed data blocks terminated by the
//! header's sync marker. Grounded on `serde_avro_fast`'s
//! `object_container_file_encoding::writer`, adapted to this crate's
//! value-level encoder instead of `serde::Serialize`.

use std::io::Write;

use rand::RngCore;

use super::compression::Compression;
use super::error::ContainerError;
use super::MAGIC;
use crate::codec;
use crate::schema::Schema;
use crate::value::Value;

/// Blocks are flushed once their buffered, uncompressed size reaches this
/// many bytes, matching the teacher's default target block size.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

pub struct WriterBuilder {
    compression: Compression,
    block_size: usize,
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::Null,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl WriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn build<'s, W: Write>(
        self,
        schema: &'s Schema,
        mut writer: W,
    ) -> Result<Writer<'s, W>, ContainerError> {
        let mut sync_marker = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut sync_marker);

        writer.write_all(&MAGIC)?;
        write_header_metadata(&mut writer, schema, &self.compression)?;
        writer.write_all(&sync_marker)?;

        Ok(Writer {
            schema,
            writer: Some(writer),
            compression: self.compression,
            sync_marker,
            block_buf: Vec::new(),
            n_in_block: 0,
            max_block_bytes: self.block_size,
        })
    }
}

fn write_header_metadata<W: Write>(
    writer: &mut W,
    schema: &Schema,
    compression: &Compression,
) -> Result<(), ContainerError> {
    let mut buf = Vec::new();
    codec::encode_long(2, &mut buf);
    codec::encode_string("avro.schema", &mut buf);
    codec::encode_bytes(schema.source_json().as_bytes(), &mut buf);
    codec::encode_string("avro.codec", &mut buf);
    codec::encode_bytes(compression.name().as_bytes(), &mut buf);
    codec::encode_long(0, &mut buf);
    writer.write_all(&buf)?;
    Ok(())
}

/// A streaming object container file writer (§4.H).
///
/// Buffers encoded values and flushes a data block once the buffer
/// reaches the configured block size, or when [`Writer::finish`] is
/// called.
pub struct Writer<'s, W: Write> {
    schema: &'s Schema,
    writer: Option<W>,
    compression: Compression,
    sync_marker: [u8; 16],
    block_buf: Vec<u8>,
    n_in_block: u64,
    max_block_bytes: usize,
}

impl<'s, W: Write> Writer<'s, W> {
    pub fn append(&mut self, value: &Value) -> Result<(), ContainerError> {
        let encoded = crate::ser::encode(self.schema, value)?;
        self.block_buf.extend_from_slice(&encoded);
        self.n_in_block += 1;
        if self.block_buf.len() >= self.max_block_bytes {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Forces the currently buffered block to be written out, even if it
    /// hasn't reached the target block size.
    pub fn flush_block(&mut self) -> Result<(), ContainerError> {
        if self.n_in_block == 0 {
            return Ok(());
        }
        let writer = self.writer.as_mut().expect("writer taken after finish");
        let compressed = self.compression.compress(&self.block_buf)?;

        let mut framing = Vec::new();
        codec::encode_long(self.n_in_block as i64, &mut framing);
        codec::encode_long(compressed.len() as i64, &mut framing);
        writer.write_all(&framing)?;
        writer.write_all(&compressed)?;
        writer.write_all(&self.sync_marker)?;

        self.block_buf.clear();
        self.n_in_block = 0;
        Ok(())
    }

    /// Flushes any buffered block and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, ContainerError> {
        self.flush_block()?;
        Ok(self.writer.take().expect("writer taken after finish"))
    }
}

impl<'s, W: Write> Drop for Writer<'s, W> {
    fn drop(&mut self) {
        let _ = self.flush_block();
    }
}
