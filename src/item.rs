//! The item model shared by every operation.
//!
//! An [`Item`] is a named piece of data with exactly one [`Payload`]
//! representation. Handlers never mutate their inputs: they build new items
//! with [`ItemBuilder`], attaching metadata before the item is handed out.

use std::collections::BTreeMap;
use std::fmt;

/// Discriminator carried by every item this crate produces.
pub const DATA_KIND: &str = "Data";

/// Metadata key holding an entry's base name.
pub const META_FILE_NAME: &str = "FileName";
/// Metadata key holding an entry's stored compressed byte count.
pub const META_COMPRESSED_SIZE: &str = "CompressedSize";
/// Metadata key holding an entry's stored uncompressed byte count.
pub const META_UNCOMPRESSED_SIZE: &str = "UncompressedSize";

/// Ordered key/value record, the unsupported structured payload.
pub type StructuredData = BTreeMap<String, String>;

/// The data an item carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Empty,
    RawBytes(Vec<u8>),
    Content(String),
    StructuredData(StructuredData),
}

impl Payload {
    /// `true` when no representation carries any data.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::RawBytes(bytes) => bytes.is_empty(),
            Payload::Content(text) => text.is_empty(),
            Payload::StructuredData(map) => map.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    Size(u64),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Size(_) => None,
        }
    }

    pub fn as_size(&self) -> Option<u64> {
        match self {
            MetadataValue::Size(n) => Some(*n),
            MetadataValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => f.write_str(s),
            MetadataValue::Size(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Size(value)
    }
}

/// A named unit of data flowing through compress and decompress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: String,
    kind: String,
    payload: Payload,
    format: Option<String>,
    metadata: BTreeMap<String, MetadataValue>,
}

impl Item {
    pub fn builder(id: impl Into<String>) -> ItemBuilder {
        ItemBuilder::new(id)
    }

    /// Shorthand for a `Data` item carrying raw bytes.
    pub fn from_bytes(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        ItemBuilder::new(id).raw_bytes(bytes).build()
    }

    /// Shorthand for a `Data` item carrying text.
    pub fn from_content(id: impl Into<String>, content: impl Into<String>) -> Self {
        ItemBuilder::new(id).content(content).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }

    /// The raw bytes, if that is the payload representation.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::RawBytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// Builds an [`Item`] in one step, metadata included.
///
/// Setting more than one payload representation resolves by precedence:
/// raw bytes over content over structured data. Empty representations never
/// displace a non-empty one.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    id: String,
    kind: String,
    raw_bytes: Option<Vec<u8>>,
    content: Option<String>,
    structured: Option<StructuredData>,
    format: Option<String>,
    metadata: BTreeMap<String, MetadataValue>,
}

impl ItemBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: DATA_KIND.to_string(),
            raw_bytes: None,
            content: None,
            structured: None,
            format: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn raw_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.raw_bytes = Some(bytes.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn structured_data(mut self, data: StructuredData) -> Self {
        self.structured = Some(data);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Item {
        let payload = match (self.raw_bytes, self.content, self.structured) {
            (Some(bytes), _, _) if !bytes.is_empty() => Payload::RawBytes(bytes),
            (_, Some(text), _) if !text.is_empty() => Payload::Content(text),
            (_, _, Some(map)) if !map.is_empty() => Payload::StructuredData(map),
            (Some(bytes), _, _) => Payload::RawBytes(bytes),
            (None, Some(text), _) => Payload::Content(text),
            (None, None, Some(map)) => Payload::StructuredData(map),
            (None, None, None) => Payload::Empty,
        };

        Item {
            id: self.id,
            kind: self.kind,
            payload,
            format: self.format,
            metadata: self.metadata,
        }
    }
}
