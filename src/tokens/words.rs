use super::chars::utf8_char_len;
use super::offsets::{split_with, OffsetTable};
use super::{Source, TokenStore};
use std::sync::OnceLock;

/// One token per maximal run of whitespace or non-whitespace characters
///
/// The buffer is read as UTF-8 and whitespace follows `char::is_whitespace`,
/// so U+00A0 and U+3000 separate words too. Bytes that do not decode count as
/// non-whitespace. Words and the gaps between them alternate, so
/// concatenating any window of tokens and splitting it again yields the same
/// tokens.
pub struct WordTokens {
    source: Source,
    offsets: OnceLock<OffsetTable>,
}

/// Whitespace class and byte length of the character at the start of `rest`
fn classify(rest: &[u8]) -> (bool, usize) {
    if rest[0].is_ascii() {
        return (char::from(rest[0]).is_whitespace(), 1);
    }
    let len = utf8_char_len(rest);
    let space = std::str::from_utf8(&rest[..len])
        .ok()
        .and_then(|c| c.chars().next())
        .is_some_and(char::is_whitespace);
    (space, len)
}

/// Length of the whitespace or non-whitespace run at the start of `rest`
fn run_len(rest: &[u8]) -> usize {
    let (space, mut len) = classify(rest);
    while len < rest.len() {
        let (next, width) = classify(&rest[len..]);
        if next != space {
            break;
        }
        len += width;
    }
    len
}

impl WordTokens {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            offsets: OnceLock::new(),
        }
    }

    /// Offset table, scanned from the buffer on first call
    pub fn offsets(&self) -> &OffsetTable {
        self.offsets
            .get_or_init(|| OffsetTable::build(&self.source, run_len))
    }

    /// Use a persisted table instead of scanning; `false` if one is already set
    pub fn preload_offsets(&self, table: OffsetTable) -> bool {
        self.offsets.set(table).is_ok()
    }
}

impl TokenStore for WordTokens {
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
        split_with(bytes, run_len)
    }
}
