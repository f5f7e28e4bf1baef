use bzip2::read::BzDecoder;
use deflate64::Deflate64Decoder;
use flate2::read::DeflateDecoder;
use lzma_rs::decompress::{Options, UnpackedSize};
use std::io::{self, Read, Write};

use crate::io::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, FLAG_LZMA_EOS, ZipFileEntry};

/// General purpose flag bit 0: entry is encrypted
const FLAG_ENCRYPTED: u16 = 1;

/// Size of the LZMA properties block ZIP stores ahead of the stream
const LZMA_PROPERTIES_SIZE: usize = 5;

/// ZIP entry reader over a random-access source
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract entry data to memory, decoding it and checking the CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            bail!("Encrypted entry is not supported: {}", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        // The declared size must fit the archive before anything is allocated
        let data_end = data_offset
            .checked_add(entry.compressed_size)
            .filter(|end| *end <= self.parser.reader().size())
            .with_context(|| format!("Data for {} extends past end of archive", entry.file_name))?;
        let compressed_len = usize::try_from(data_end - data_offset)
            .with_context(|| format!("Entry too large: {}", entry.file_name))?;

        let mut compressed = vec![0u8; compressed_len];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut compressed)
            .await
            .with_context(|| format!("Truncated data for {}", entry.file_name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                decode(DeflateDecoder::new(compressed.as_slice()), entry, "DEFLATE")?
            }
            CompressionMethod::Deflate64 => {
                decode(Deflate64Decoder::new(compressed.as_slice()), entry, "Deflate64")?
            }
            CompressionMethod::Bzip2 => {
                decode(BzDecoder::new(compressed.as_slice()), entry, "BZIP2")?
            }
            CompressionMethod::Lzma => decode_lzma(&compressed, entry)?,
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method {} for {}",
                method,
                entry.file_name
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let crc = crc32fast::hash(&data);
        if crc != entry.crc32 {
            bail!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc
            );
        }

        Ok(data)
    }
}

/// Read a decoder to the end, stopping one byte past the declared size.
fn decode<D: Read>(decoder: D, entry: &ZipFileEntry, method: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(capacity_hint(entry));
    decoder
        .take(entry.uncompressed_size.saturating_add(1))
        .read_to_end(&mut out)
        .with_context(|| format!("Corrupt {} stream for {}", method, entry.file_name))?;
    Ok(out)
}

/// ZIP frames LZMA as a 2-byte version, a 2-byte properties length, the
/// properties and then the raw stream without the `.lzma` size field.
fn decode_lzma(compressed: &[u8], entry: &ZipFileEntry) -> Result<Vec<u8>> {
    if compressed.len() < 4 + LZMA_PROPERTIES_SIZE {
        bail!("Truncated LZMA header for {}", entry.file_name);
    }
    let properties_len = u16::from_le_bytes([compressed[2], compressed[3]]) as usize;
    if properties_len != LZMA_PROPERTIES_SIZE {
        bail!(
            "Invalid LZMA properties length {} for {}",
            properties_len,
            entry.file_name
        );
    }

    let unpacked_size = if entry.flags & FLAG_LZMA_EOS != 0 {
        UnpackedSize::UseProvided(None)
    } else {
        UnpackedSize::UseProvided(Some(entry.uncompressed_size))
    };
    let options = Options {
        unpacked_size,
        ..Options::default()
    };

    let mut out = BoundedWriter {
        buf: Vec::with_capacity(capacity_hint(entry)),
        limit: entry.uncompressed_size.saturating_add(1),
    };
    lzma_rs::lzma_decompress_with_options(&mut &compressed[4..], &mut out, &options)
        .map_err(|e| anyhow!("Corrupt LZMA stream for {}: {:?}", entry.file_name, e))?;
    Ok(out.buf)
}

/// The declared size is only a hint; cap the reservation by a sane ratio
fn capacity_hint(entry: &ZipFileEntry) -> usize {
    entry
        .uncompressed_size
        .min(entry.compressed_size.saturating_mul(1032).saturating_add(64)) as usize
}

/// Output sink that refuses to grow past `limit` bytes
struct BoundedWriter {
    buf: Vec<u8>,
    limit: u64,
}

impl Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() as u64 + data.len() as u64 > self.limit {
            return Err(io::Error::other("decoded data exceeds declared size"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
