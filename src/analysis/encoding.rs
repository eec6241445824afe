//! Permissive decoding of raw document bytes.

use serde::{Deserialize, Serialize};

/// Character encoding of raw document bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8; invalid sequences become U+FFFD.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Decode `bytes`. Never fails.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}
