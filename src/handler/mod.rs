//! The two archive operations and their name lookup.

mod compress;
mod decompress;

pub use compress::{ARCHIVE_FORMAT, CompressOptions, Compressor};
pub use decompress::Decompressor;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The closed set of operations the plugin dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Decompress,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Compress, Operation::Decompress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Compress => "compress",
            Operation::Decompress => "decompress",
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedOperation(format!("operation '{}' is not supported", s)))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("compress".parse::<Operation>().unwrap(), Operation::Compress);
        assert_eq!("DeCompress".parse::<Operation>().unwrap(), Operation::Decompress);
    }

    #[test]
    fn test_unknown_operation() {
        let err = "extract".parse::<Operation>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
        assert!(err.to_string().contains("'extract'"));
    }
}
