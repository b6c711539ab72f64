//! Byte-to-text decoding
//!
//! UTF-8 is the canonical encoding. A leading UTF-8 byte-order mark is
//! stripped. Content that is not valid UTF-8 can optionally be recovered
//! through a legacy encoding chosen by the operator.

use encoding_rs::Encoding;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors produced while decoding file content or resolving encodings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes are valid in neither the canonical nor the legacy encoding
    #[error("content is not valid UTF-8 or the configured fallback encoding")]
    Undecodable,

    /// The legacy encoding label is not known
    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),
}

/// A legacy encoding used as the second decoding attempt
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LegacyEncoding(&'static Encoding);

impl LegacyEncoding {
    /// Resolve an encoding label such as `cp1251`, `latin1` or `shift_jis`
    pub fn from_label(label: &str) -> Result<Self, DecodeError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name of the resolved encoding
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl fmt::Debug for LegacyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LegacyEncoding").field(&self.name()).finish()
    }
}

/// Which decoding attempt produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Already UTF-8 (with or without BOM)
    Canonical,
    /// Recovered from the legacy encoding
    Recoded(LegacyEncoding),
}

/// Decoded file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    pub source: SourceEncoding,
}

/// Decode raw bytes, falling back to `legacy` when they are not UTF-8
pub fn decode(raw: &[u8], legacy: Option<LegacyEncoding>) -> Result<Decoded<'_>, DecodeError> {
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    if let Ok(text) = std::str::from_utf8(body) {
        return Ok(Decoded {
            text: Cow::Borrowed(text),
            source: SourceEncoding::Canonical,
        });
    }

    let legacy = legacy.ok_or(DecodeError::Undecodable)?;
    legacy
        .0
        .decode_without_bom_handling_and_without_replacement(raw)
        .map(|text| Decoded {
            text,
            source: SourceEncoding::Recoded(legacy),
        })
        .ok_or(DecodeError::Undecodable)
}
