//! Operation dispatch: the entry point host applications call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::guard::{AllowAllGuard, InvocationGuard};
use crate::guid::{GuidProvider, RandomGuidProvider};
use crate::handler::{CompressOptions, Compressor, Decompressor, Operation};
use crate::item::Item;

/// Free-form input accepted by [`ZipPlugin::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputData {
    Item(Item),
    Items(Vec<Item>),
    /// Base64 text is decoded; anything else is taken as UTF-8 bytes.
    Text(String),
}

impl From<Item> for InputData {
    fn from(item: Item) -> Self {
        InputData::Item(item)
    }
}

impl From<Vec<Item>> for InputData {
    fn from(items: Vec<Item>) -> Self {
        InputData::Items(items)
    }
}

impl From<String> for InputData {
    fn from(text: String) -> Self {
        InputData::Text(text)
    }
}

/// One call into the plugin.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub operation: String,
    pub data: Option<InputData>,
    pub options: CompressOptions,
}

impl Request {
    pub fn new(operation: impl Into<String>, data: impl Into<InputData>) -> Self {
        Self {
            operation: operation.into(),
            data: Some(data.into()),
            options: CompressOptions::default(),
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.options.file_name = Some(name.into());
        self
    }
}

/// Result of [`ZipPlugin::execute`]: compress yields one item, decompress many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Item(Item),
    Items(Vec<Item>),
}

impl Output {
    pub fn into_items(self) -> Vec<Item> {
        match self {
            Output::Item(item) => vec![item],
            Output::Items(items) => items,
        }
    }
}

/// Compress/decompress dispatcher.
///
/// Holds only immutable capabilities plus a one-shot initialization flag,
/// so one instance can serve concurrent calls.
pub struct ZipPlugin {
    guid: Arc<dyn GuidProvider>,
    guard: Arc<dyn InvocationGuard>,
    compressor: Compressor,
    decompressor: Decompressor,
    initialized: AtomicBool,
}

impl ZipPlugin {
    pub fn new() -> Self {
        Self::with_capabilities(Arc::new(RandomGuidProvider), Arc::new(AllowAllGuard))
    }

    pub fn with_capabilities(
        guid: Arc<dyn GuidProvider>,
        guard: Arc<dyn InvocationGuard>,
    ) -> Self {
        Self {
            compressor: Compressor::new(Arc::clone(&guid)),
            decompressor: Decompressor::new(),
            guid,
            guard,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn supported_operations(&self) -> Vec<&'static str> {
        Operation::ALL.iter().map(Operation::as_str).collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn initialize(&self) -> Result<()> {
        self.check_guard()?;
        self.initialized.store(true, Ordering::Release);
        tracing::debug!("zip plugin initialized");
        Ok(())
    }

    pub async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Output> {
        cancel.check()?;
        self.check_guard()?;
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let operation: Operation = request.operation.parse()?;
        let items = self.normalize_inputs(operation, request.data)?;
        tracing::debug!(%operation, items = items.len(), "executing");

        match operation {
            Operation::Compress => self
                .compressor
                .compress(&items, &request.options, cancel)
                .map(Output::Item),
            Operation::Decompress => self
                .decompressor
                .decompress(&items, cancel)
                .await
                .map(Output::Items),
        }
    }

    fn check_guard(&self) -> Result<()> {
        match self.guard.deny_reason() {
            Some(reason) => Err(Error::AccessDenied(reason)),
            None => Ok(()),
        }
    }

    fn normalize_inputs(
        &self,
        operation: Operation,
        data: Option<InputData>,
    ) -> Result<Vec<Item>> {
        let items = match data {
            None => {
                return Err(Error::InvalidArgument(
                    "input data cannot be null".to_string(),
                ));
            }
            Some(InputData::Item(item)) => vec![item],
            Some(InputData::Items(items)) => items,
            Some(InputData::Text(text)) => {
                vec![Item::from_bytes(self.guid.new_guid().to_string(), text_to_bytes(text))]
            }
        };

        if operation == Operation::Decompress && items.len() != 1 {
            return Err(Error::Cardinality {
                expected: 1,
                actual: items.len(),
            });
        }

        Ok(items)
    }
}

impl Default for ZipPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode padded standard base64, falling back to the text's UTF-8 bytes.
fn text_to_bytes(text: String) -> Vec<u8> {
    let trimmed = text.trim();
    if !trimmed.is_empty()
        && trimmed.len() % 4 == 0
        && let Ok(decoded) = STANDARD.decode(trimmed)
    {
        return decoded;
    }
    text.into_bytes()
}
