use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::io::MemoryReader;
use crate::item::{Item, META_COMPRESSED_SIZE, META_FILE_NAME, META_UNCOMPRESSED_SIZE};
use crate::zip::{ZipExtractor, ZipFileEntry};

/// Unpacks a single ZIP archive item into one item per file entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompressor;

impl Decompressor {
    pub fn new() -> Self {
        Self
    }

    /// Read every non-directory entry of the one input archive, in stored order.
    ///
    /// Either all entries are returned or an error is; partial results are
    /// dropped on failure or cancellation.
    pub async fn decompress(
        &self,
        items: &[Item],
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>> {
        cancel.check()?;

        let [input] = items else {
            return Err(Error::Cardinality {
                expected: 1,
                actual: items.len(),
            });
        };

        let archive = match input.raw_bytes() {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(Error::InvalidData(
                    "payload must contain a valid ZIP archive".to_string(),
                ));
            }
        };

        let extractor = ZipExtractor::new(MemoryReader::new(archive));
        let entries = extractor
            .list_files()
            .await
            .map_err(Error::invalid_archive)?;

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            cancel.check()?;

            if entry.is_directory {
                tracing::debug!(name = %entry.file_name, "skipping directory entry");
                continue;
            }

            let data = extractor
                .extract_to_memory(entry)
                .await
                .map_err(Error::invalid_archive)?;
            tracing::trace!(name = %entry.file_name, bytes = data.len(), "extracted entry");
            results.push(item_from_entry(entry, data));
        }

        tracing::info!(
            archive = input.id(),
            entries = entries.len(),
            items = results.len(),
            "decompressed archive"
        );
        Ok(results)
    }
}

fn item_from_entry(entry: &ZipFileEntry, data: Vec<u8>) -> Item {
    Item::builder(entry.file_name.clone())
        .format(entry.extension())
        .raw_bytes(data)
        .metadata(META_FILE_NAME, entry.base_name())
        .metadata(META_COMPRESSED_SIZE, entry.compressed_size)
        .metadata(META_UNCOMPRESSED_SIZE, entry.uncompressed_size)
        .build()
}
