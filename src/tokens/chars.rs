//! Character tokens under a named text encoding
//!
//! Characters are variable-width in bytes, so token positions come from an
//! [`OffsetTable`] built on first use and cached for the life of the store.
//! Byte sequences that do not decode form single-unit tokens, which keeps
//! every byte of the source covered by exactly one token.

use super::offsets::{split_with, OffsetTable};
use super::{Source, TokenStore};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Supported source encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

impl TextEncoding {
    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Byte length of the character at the start of `rest` (non-empty)
    pub fn char_len(&self, rest: &[u8]) -> usize {
        match self {
            TextEncoding::Utf8 => utf8_char_len(rest),
            TextEncoding::Utf16Le => utf16_char_len(rest, u16::from_le_bytes),
            TextEncoding::Utf16Be => utf16_char_len(rest, u16::from_be_bytes),
            TextEncoding::Latin1 | TextEncoding::Ascii => 1,
        }
    }

    /// Encode text into this encoding.
    ///
    /// Characters the encoding can't represent become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }

    /// Decode bytes for display, replacing undecodable input
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16Le => decode_utf16_lossy(bytes, u16::from_le_bytes),
            TextEncoding::Utf16Be => decode_utf16_lossy(bytes, u16::from_be_bytes),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{fffd}' })
                .collect(),
        }
    }
}

pub(super) fn utf8_char_len(rest: &[u8]) -> usize {
    let claimed = match rest[0] {
        0x00..=0x7F => return 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return 1,
    };
    if rest.len() >= claimed && std::str::from_utf8(&rest[..claimed]).is_ok() {
        claimed
    } else {
        1
    }
}

fn utf16_char_len(rest: &[u8], unit: fn([u8; 2]) -> u16) -> usize {
    if rest.len() < 2 {
        return rest.len();
    }
    let first = unit([rest[0], rest[1]]);
    if (0xD800..0xDC00).contains(&first) && rest.len() >= 4 {
        let second = unit([rest[2], rest[3]]);
        if (0xDC00..0xE000).contains(&second) {
            return 4;
        }
    }
    2
}

fn decode_utf16_lossy(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    let mut text: String = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if bytes.len() % 2 == 1 {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-16le" | "utf16le" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(TextEncoding::Utf16Be),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            _ => Err(Error::UnknownEncoding(s.to_string())),
        }
    }
}

/// One token per decoded character
pub struct CharTokens {
    source: Source,
    encoding: TextEncoding,
    offsets: OnceLock<OffsetTable>,
}

impl CharTokens {
    pub fn new(source: Source, encoding: TextEncoding) -> Self {
        Self {
            source,
            encoding,
            offsets: OnceLock::new(),
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Offset table, scanned from the buffer on first call
    pub fn offsets(&self) -> &OffsetTable {
        self.offsets
            .get_or_init(|| OffsetTable::build(&self.source, |rest| self.encoding.char_len(rest)))
    }

    /// Use a persisted table instead of scanning; `false` if one is already set
    pub fn preload_offsets(&self, table: OffsetTable) -> bool {
        self.offsets.set(table).is_ok()
    }
}

impl TokenStore for CharTokens {
    fn token_count(&self) -> usize {
        self.offsets().len()
    }

    fn file_length(&self) -> u64 {
        self.source.len() as u64
    }

    #[inline]
    fn token(&self, index: usize) -> &[u8] {
        &self.source[self.offsets().range(index)]
    }

    fn split_tokens<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        split_with(bytes, |rest| self.encoding.char_len(rest))
    }
}
