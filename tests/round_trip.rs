use std::fmt;
use std::sync::Arc;

use rstest::rstest;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use zipitem::item::{META_COMPRESSED_SIZE, META_FILE_NAME, META_UNCOMPRESSED_SIZE};
use zipitem::{
    CancellationToken, CompressOptions, Compressor, Decompressor, Error, ErrorKind, Guid,
    GuidProvider, Item, Payload, StructuredData, ZipWriter,
};

struct FixedGuid;

impl GuidProvider for FixedGuid {
    fn new_guid(&self) -> Guid {
        Guid::from_bytes([0x11; 16])
    }
}

fn compressor() -> Compressor {
    Compressor::new(Arc::new(FixedGuid))
}

fn structured() -> Item {
    let mut map = StructuredData::new();
    map.insert("key".to_string(), "value".to_string());
    Item::builder("record").structured_data(map).build()
}

fn archive_bytes(item: &Item) -> &[u8] {
    item.raw_bytes().expect("archive item carries raw bytes")
}

#[tokio::test]
async fn test_compress_then_decompress_example() {
    let cancel = CancellationToken::new();
    let items = vec![
        Item::from_content("a.txt", "hi"),
        Item::from_bytes("b.bin", vec![1, 2, 3]),
    ];

    let archive = compressor()
        .compress(&items, &CompressOptions::default(), &cancel)
        .unwrap();
    assert_eq!(archive.id(), "11111111-1111-1111-1111-111111111111.zip");
    assert_eq!(archive.kind(), "Data");
    assert_eq!(archive.format(), Some("Zip"));

    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();
    assert_eq!(out.len(), 2);

    assert_eq!(out[0].id(), "a.txt");
    assert_eq!(out[0].raw_bytes(), Some(&b"hi"[..]));
    assert_eq!(out[0].format(), Some("txt"));

    assert_eq!(out[1].id(), "b.bin");
    assert_eq!(out[1].raw_bytes(), Some(&[1u8, 2, 3][..]));
    assert_eq!(out[1].format(), Some("bin"));
}

#[tokio::test]
async fn test_file_name_option_names_archive() {
    let archive = compressor()
        .compress(
            &[Item::from_content("x", "y")],
            &CompressOptions::with_file_name("bundle"),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(archive.id(), "bundle.zip");
}

#[tokio::test]
async fn test_mixed_order_and_nested_paths() {
    let cancel = CancellationToken::new();
    let items = vec![
        Item::from_bytes("z/last.dat", vec![9; 300]),
        Item::from_content("docs/readme.md", "# Title\n\nbody ünïcode"),
        Item::from_bytes("first", vec![0, 255]),
        Item::from_content("docs/notes.TXT", "notes"),
    ];

    let archive = compressor()
        .compress(&items, &CompressOptions::default(), &cancel)
        .unwrap();
    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();

    let ids: Vec<_> = out.iter().map(|i| i.id()).collect();
    assert_eq!(ids, ["z/last.dat", "docs/readme.md", "first", "docs/notes.TXT"]);

    for (original, unpacked) in items.iter().zip(&out) {
        let expected = match original.payload() {
            Payload::RawBytes(bytes) => bytes.clone(),
            Payload::Content(text) => text.as_bytes().to_vec(),
            other => panic!("unexpected payload {:?}", other),
        };
        assert_eq!(unpacked.raw_bytes(), Some(expected.as_slice()));
    }

    assert_eq!(out[1].format(), Some("md"));
    assert_eq!(out[2].format(), Some(""));
    assert_eq!(out[3].format(), Some("TXT"));
    assert_eq!(
        out[1].metadata_value(META_FILE_NAME).and_then(|v| v.as_text()),
        Some("readme.md")
    );
}

#[tokio::test]
async fn test_empty_input_makes_empty_archive() {
    let cancel = CancellationToken::new();
    let archive = compressor()
        .compress(&[], &CompressOptions::default(), &cancel)
        .unwrap();
    assert_eq!(archive_bytes(&archive).len(), 22);

    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_items_without_data_are_skipped() {
    let cancel = CancellationToken::new();
    let items = vec![
        Item::builder("nothing").build(),
        Item::from_bytes("empty-bytes", Vec::<u8>::new()),
        Item::from_content("empty-text", ""),
        Item::builder("empty-record")
            .structured_data(StructuredData::new())
            .build(),
        Item::from_content("kept", "data"),
    ];

    let archive = compressor()
        .compress(&items, &CompressOptions::default(), &cancel)
        .unwrap();
    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), "kept");
}

#[tokio::test]
async fn test_duplicate_ids_keep_writer_order() {
    let cancel = CancellationToken::new();
    let items = vec![
        Item::from_content("same.txt", "first"),
        Item::from_content("same.txt", "second"),
    ];

    let archive = compressor()
        .compress(&items, &CompressOptions::default(), &cancel)
        .unwrap();
    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].raw_bytes(), Some(&b"first"[..]));
    assert_eq!(out[1].raw_bytes(), Some(&b"second"[..]));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
fn test_structured_data_fails_at_any_position(#[case] position: usize) {
    let mut items = vec![
        Item::from_content("a.txt", "a"),
        Item::from_bytes("b.bin", vec![1]),
    ];
    items.insert(position, structured());

    let err = compressor()
        .compress(&items, &CompressOptions::default(), &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert!(err.to_string().contains("structured data compression is not supported"));
}

#[tokio::test]
async fn test_metadata_sizes_match_entry() {
    let cancel = CancellationToken::new();
    let text = "the quick brown fox jumps over the lazy dog. ".repeat(40);

    let archive = compressor()
        .compress(
            &[Item::from_content("dir/fox.txt", text.clone())],
            &CompressOptions::default(),
            &cancel,
        )
        .unwrap();
    let out = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap();

    let uncompressed = out[0]
        .metadata_value(META_UNCOMPRESSED_SIZE)
        .and_then(|v| v.as_size())
        .unwrap();
    let compressed = out[0]
        .metadata_value(META_COMPRESSED_SIZE)
        .and_then(|v| v.as_size())
        .unwrap();

    assert_eq!(uncompressed, text.len() as u64);
    assert!(compressed > 0 && compressed < uncompressed);
    assert_eq!(
        out[0].metadata_value(META_FILE_NAME).and_then(|v| v.as_text()),
        Some("fox.txt")
    );
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(3)]
#[tokio::test]
async fn test_decompress_requires_one_item(#[case] count: usize) {
    let items = vec![Item::from_bytes("x.zip", vec![1]); count];
    let err = Decompressor::new()
        .decompress(&items, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cardinality { expected: 1, actual } if actual == count));
}

#[tokio::test]
async fn test_decompress_rejects_missing_payload() {
    let cancel = CancellationToken::new();
    for item in [
        Item::builder("none.zip").build(),
        Item::from_bytes("empty.zip", Vec::<u8>::new()),
        Item::from_content("text.zip", "not bytes"),
    ] {
        let err = Decompressor::new()
            .decompress(&[item], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)), "got {:?}", err);
        assert_eq!(err.kind(), ErrorKind::DataValidity);
    }
}

#[tokio::test]
async fn test_decompress_rejects_garbage() {
    let err = Decompressor::new()
        .decompress(
            &[Item::from_bytes("junk", vec![7, 1, 2, 3, 4, 5, 6, 7, 8, 9])],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)));
    assert_eq!(err.kind(), ErrorKind::DataValidity);
}

#[tokio::test]
async fn test_directory_entries_are_skipped() {
    let mut writer = ZipWriter::new();
    writer.add_directory("docs").unwrap();
    writer.add_deflated("docs/a.txt", b"alpha").unwrap();
    writer.add_directory("docs/empty/").unwrap();
    writer.add_stored("b.txt", b"beta").unwrap();
    let bytes = writer.finish().unwrap();

    let out = Decompressor::new()
        .decompress(&[Item::from_bytes("x.zip", bytes)], &CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<_> = out.iter().map(|i| i.id()).collect();
    assert_eq!(ids, ["docs/a.txt", "b.txt"]);
    assert_eq!(out[1].raw_bytes(), Some(&b"beta"[..]));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = compressor()
        .compress(
            &[Item::from_content("a", "b")],
            &CompressOptions::default(),
            &cancel,
        )
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let err = Decompressor::new()
        .decompress(&[Item::from_bytes("a.zip", vec![1])], &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

/// Cancels `token` as soon as an event with `message` is emitted.
struct CancelOnEvent {
    message: &'static str,
    token: CancellationToken,
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for CancelOnEvent {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if visitor.0.as_deref() == Some(self.message) {
            self.token.cancel();
        }
    }
}

fn cancel_on(message: &'static str, token: CancellationToken) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry().with(CancelOnEvent { message, token })
}

#[test]
fn test_cancelled_between_items() {
    let cancel = CancellationToken::new();
    let items = vec![
        Item::from_content("a.txt", "a"),
        Item::from_content("b.txt", "b"),
    ];

    let result = tracing::subscriber::with_default(cancel_on("added entry", cancel.clone()), || {
        compressor().compress(&items, &CompressOptions::default(), &cancel)
    });

    assert!(cancel.is_cancelled());
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_between_entries() {
    let cancel = CancellationToken::new();
    let archive = compressor()
        .compress(
            &[
                Item::from_content("a.txt", "a"),
                Item::from_content("b.txt", "b"),
            ],
            &CompressOptions::default(),
            &cancel,
        )
        .unwrap();

    let _guard = tracing::subscriber::set_default(cancel_on("extracted entry", cancel.clone()));
    let err = Decompressor::new()
        .decompress(&[archive], &cancel)
        .await
        .unwrap_err();

    assert!(cancel.is_cancelled());
    assert!(matches!(err, Error::Cancelled));
}

/// Single STORED entry holding `abc` whose central record takes its
/// compressed size from a ZIP64 extra field.
fn zip64_sized_archive(compressed_size: u64) -> Vec<u8> {
    fn u16le(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    fn u32le(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_le_bytes());
    }

    let name = b"x.bin";
    let data = b"abc";
    let crc = crc32fast::hash(data);

    let mut out = Vec::new();
    out.extend_from_slice(b"PK\x03\x04");
    for v in [45, 0, 0, 0, 0] {
        u16le(&mut out, v);
    }
    u32le(&mut out, crc);
    u32le(&mut out, 0xFFFF_FFFF);
    u32le(&mut out, 0xFFFF_FFFF);
    u16le(&mut out, name.len() as u16);
    u16le(&mut out, 0);
    out.extend_from_slice(name);
    out.extend_from_slice(data);

    let cd_offset = out.len() as u32;
    out.extend_from_slice(b"PK\x01\x02");
    for v in [45, 45, 0, 0, 0, 0] {
        u16le(&mut out, v);
    }
    u32le(&mut out, crc);
    u32le(&mut out, 0xFFFF_FFFF);
    u32le(&mut out, 0xFFFF_FFFF);
    for v in [name.len() as u16, 20, 0, 0, 0] {
        u16le(&mut out, v);
    }
    u32le(&mut out, 0);
    u32le(&mut out, 0);
    out.extend_from_slice(name);
    u16le(&mut out, 0x0001);
    u16le(&mut out, 16);
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed_size.to_le_bytes());
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(b"PK\x05\x06");
    for v in [0, 0, 1, 1] {
        u16le(&mut out, v);
    }
    u32le(&mut out, cd_size);
    u32le(&mut out, cd_offset);
    u16le(&mut out, 0);
    out
}

#[tokio::test]
async fn test_zip64_sized_entry_reads_back() {
    let out = Decompressor::new()
        .decompress(
            &[Item::from_bytes("x.zip", zip64_sized_archive(3))],
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(out[0].raw_bytes(), Some(&b"abc"[..]));
}

#[rstest]
#[case(u64::MAX)]
#[case(1 << 40)]
#[case(4)]
#[tokio::test]
async fn test_size_beyond_archive_is_invalid(#[case] compressed_size: u64) {
    let err = Decompressor::new()
        .decompress(
            &[Item::from_bytes("x.zip", zip64_sized_archive(compressed_size))],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)), "got {:?}", err);
    assert_eq!(err.kind(), ErrorKind::DataValidity);
}
