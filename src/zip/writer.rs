//! In-memory ZIP archive writer.
//!
//! Entries are appended as local header plus data, in call order; the
//! Central Directory and EOCD are emitted by [`ZipWriter::finish`]. The
//! writer never produces ZIP64 records, so every size and offset must fit
//! the classic 32-bit fields.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use anyhow::{Context, Result, bail};

use super::structures::*;

/// MS-DOS attribute for directory entries
const DIRECTORY_ATTRS: u32 = 0x10;

struct CentralRecord {
    file_name: String,
    compression_method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    external_attrs: u32,
    lfh_offset: u32,
}

impl CentralRecord {
    fn header(&self) -> EntryHeader<'_> {
        EntryHeader {
            file_name: &self.file_name,
            flags: FLAG_UTF8,
            compression_method: self.compression_method,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
        }
    }
}

/// Builds a complete archive in a byte buffer
pub struct ZipWriter {
    buf: Vec<u8>,
    central: Vec<CentralRecord>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            central: Vec::new(),
        }
    }

    /// Append an entry compressed with DEFLATE
    pub fn add_deflated(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        self.add_entry(name, CompressionMethod::Deflate, data, &compressed, 0)
    }

    /// Append an entry stored without compression
    pub fn add_stored(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.add_entry(name, CompressionMethod::Stored, data, data, 0)
    }

    /// Append a directory marker; a trailing `/` is added when missing
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        self.add_entry(&name, CompressionMethod::Stored, &[], &[], DIRECTORY_ATTRS)
    }

    fn add_entry(
        &mut self,
        name: &str,
        method: CompressionMethod,
        data: &[u8],
        payload: &[u8],
        external_attrs: u32,
    ) -> Result<()> {
        if name.len() > u16::MAX as usize {
            bail!("Entry name too long ({} bytes)", name.len());
        }
        if self.central.len() >= u16::MAX as usize {
            bail!("Too many entries for a ZIP archive without ZIP64");
        }

        let record = CentralRecord {
            file_name: name.to_string(),
            compression_method: method,
            crc32: crc32fast::hash(data),
            compressed_size: u32::try_from(payload.len())
                .with_context(|| format!("Entry {} exceeds 4 GiB compressed", name))?,
            uncompressed_size: u32::try_from(data.len())
                .with_context(|| format!("Entry {} exceeds 4 GiB", name))?,
            external_attrs,
            lfh_offset: u32::try_from(self.buf.len())
                .context("Archive exceeds 4 GiB without ZIP64")?,
        };

        record.header().write_local(&mut self.buf)?;
        self.buf.extend_from_slice(payload);
        self.central.push(record);
        Ok(())
    }

    /// Write the Central Directory and EOCD, returning the archive bytes
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset =
            u32::try_from(self.buf.len()).context("Archive exceeds 4 GiB without ZIP64")?;

        for record in &self.central {
            record
                .header()
                .write_central(&mut self.buf, record.external_attrs, record.lfh_offset)?;
        }

        let cd_size = u32::try_from(self.buf.len() - cd_offset as usize)
            .context("Central Directory exceeds 4 GiB")?;
        let entries = u16::try_from(self.central.len())?;

        EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
        .write_to(&mut self.buf)?;

        Ok(self.buf)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}
