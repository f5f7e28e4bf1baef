use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::guid::GuidProvider;
use crate::item::{Item, Payload};
use crate::zip::ZipWriter;

/// Format tag of the archive item produced by compress.
pub const ARCHIVE_FORMAT: &str = "Zip";

/// Caller-supplied settings for compress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressOptions {
    /// Base name of the archive item; a fresh GUID when absent.
    pub file_name: Option<String>,
}

impl CompressOptions {
    pub fn with_file_name(name: impl Into<String>) -> Self {
        Self {
            file_name: Some(name.into()),
        }
    }
}

/// Packs items into a single ZIP archive item.
pub struct Compressor {
    guid: Arc<dyn GuidProvider>,
}

impl Compressor {
    pub fn new(guid: Arc<dyn GuidProvider>) -> Self {
        Self { guid }
    }

    /// Write every non-empty item as an entry named by its id, in input order.
    ///
    /// Raw bytes are stored as-is and text as UTF-8. Items with no data are
    /// skipped. A structured payload anywhere in the input aborts the whole
    /// operation.
    pub fn compress(
        &self,
        items: &[Item],
        options: &CompressOptions,
        cancel: &CancellationToken,
    ) -> Result<Item> {
        cancel.check()?;

        let mut writer = ZipWriter::new();
        let mut entries = 0usize;
        for item in items {
            cancel.check()?;

            let data = match item.payload() {
                Payload::RawBytes(bytes) if !bytes.is_empty() => bytes.as_slice(),
                Payload::Content(text) if !text.is_empty() => text.as_bytes(),
                Payload::StructuredData(map) if !map.is_empty() => {
                    return Err(Error::UnsupportedOperation(
                        "structured data compression is not supported".to_string(),
                    ));
                }
                _ => {
                    tracing::debug!(id = item.id(), "skipping item without data");
                    continue;
                }
            };

            writer
                .add_deflated(item.id(), data)
                .map_err(Error::archive_build)?;
            entries += 1;
            tracing::debug!(id = item.id(), bytes = data.len(), "added entry");
        }

        let archive = writer.finish().map_err(Error::archive_build)?;

        let base = match &options.file_name {
            Some(name) => name.clone(),
            None => self.guid.new_guid().to_string(),
        };
        let id = format!("{}.zip", base);
        tracing::info!(%id, entries, bytes = archive.len(), "compressed items");

        Ok(Item::builder(id)
            .format(ARCHIVE_FORMAT)
            .raw_bytes(archive)
            .build())
    }
}
