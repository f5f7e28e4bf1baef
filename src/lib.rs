//! # zipitem
//!
//! Pack named in-memory items into a ZIP archive and unpack them again.
//!
//! An [`Item`] carries raw bytes, text, or a structured record. `compress`
//! writes each item as a DEFLATE entry named by the item's id and returns one
//! archive item; `decompress` reads an archive item back into one item per
//! file entry, with the entry's base name and sizes as metadata. Everything
//! happens in memory: no temporary files, no network.
//!
//! ## Features
//!
//! - Case-insensitive operation dispatch through [`ZipPlugin`]
//! - Raw string input, base64-decoded when it looks like base64
//! - Reads any STORED/DEFLATE archive, including ZIP64 and commented ones
//! - Cooperative cancellation via [`CancellationToken`]
//! - Injectable GUID generation for deterministic archive names
//!
//! ## Example
//!
//! ```no_run
//! use zipitem::{CancellationToken, Item, Request, ZipPlugin};
//!
//! #[tokio::main]
//! async fn main() -> zipitem::Result<()> {
//!     let plugin = ZipPlugin::new();
//!     plugin.initialize()?;
//!     let cancel = CancellationToken::new();
//!
//!     let items = vec![
//!         Item::from_content("a.txt", "hi"),
//!         Item::from_bytes("b.bin", vec![1, 2, 3]),
//!     ];
//!     let archive = plugin
//!         .execute(Request::new("compress", items).file_name("bundle"), &cancel)
//!         .await?;
//!
//!     let archive = archive.into_items().remove(0);
//!     let unpacked = plugin
//!         .execute(Request::new("decompress", archive), &cancel)
//!         .await?;
//!     for item in unpacked.into_items() {
//!         println!("{} ({:?})", item.id(), item.format());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod cli;
pub mod error;
pub mod guard;
pub mod guid;
pub mod handler;
pub mod io;
pub mod item;
pub mod plugin;
pub mod zip;

pub use cancel::CancellationToken;
pub use cli::Cli;
pub use error::{Error, ErrorKind, Result};
pub use guard::{AllowAllGuard, InvocationGuard};
pub use guid::{Guid, GuidProvider, RandomGuidProvider};
pub use handler::{CompressOptions, Compressor, Decompressor, Operation};
pub use io::{MemoryReader, ReadAt};
pub use item::{Item, ItemBuilder, MetadataValue, Payload, StructuredData};
pub use plugin::{InputData, Output, Request, ZipPlugin};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
