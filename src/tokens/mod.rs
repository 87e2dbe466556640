//! Circular token stores
//!
//! A token store presents a fixed byte buffer as a finite sequence of tokens
//! that wraps around: reading past the last token continues at token 0. All
//! indexing, search and compression code works through the [`TokenStore`]
//! trait and never touches the raw buffer directly.
//!
//! ## Variants
//!
//! - [`ByteTokens`] - one token per byte
//! - [`CharTokens`] - one token per decoded character
//! - [`WordTokens`] - one token per whitespace or non-whitespace run
//! - [`DictionaryTokens`] - one token per compressed dictionary id
//!
//! [`TokenSource`] selects one of the file-backed variants at runtime from a
//! [`Tokenization`].

pub mod bytes;
pub mod chars;
pub mod dictionary;
pub mod offsets;
pub mod source;
pub mod words;

pub use bytes::ByteTokens;
pub use chars::{CharTokens, TextEncoding};
pub use dictionary::DictionaryTokens;
pub use offsets::OffsetTable;
pub use source::Source;
pub use words::WordTokens;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Random-access, wrap-around view of a token sequence
///
/// Tokens are byte strings in the source encoding. Tokens compare bytewise
/// and token sequences compare lexicographically token by token.
pub trait TokenStore: Sync {
    /// Total number of tokens (always at least 1)
    fn token_count(&self) -> usize;

    /// Total number of bytes behind the tokens
    fn file_length(&self) -> u64;

    /// Bytes of token `index`, which must be below `token_count()`
    fn token(&self, index: usize) -> &[u8];

    /// Split a caller-supplied string the way this store splits its buffer
    fn split_tokens<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]>;

    /// Token at a circular position
    #[inline]
    fn token_at(&self, position: usize) -> &[u8] {
        self.token(position % self.token_count())
    }

    /// The `n` tokens starting `skip` tokens after `position`, concatenated
    fn read_string(&self, position: usize, n: usize, skip: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for token in self.window(position, n, skip) {
            out.extend_from_slice(token);
        }
        out
    }

    /// The `n` tokens starting `skip` tokens after `position`
    fn window(&self, position: usize, n: usize, skip: usize) -> Vec<&[u8]> {
        let count = self.token_count();
        let mut index = advance(position % count, skip, count);
        let mut tokens = Vec::with_capacity(n);
        for _ in 0..n {
            tokens.push(self.token(index));
            index = advance(index, 1, count);
        }
        tokens
    }

    /// Infinite iterator over tokens starting at `position`
    fn cursor(&self, position: usize) -> TokenCursor<'_, Self>
    where
        Self: Sized,
    {
        TokenCursor::new(self, position)
    }

    /// Compare the circular suffixes at `a` and `b`.
    ///
    /// The first `shared` tokens are known to be equal and are skipped.
    /// After `token_count()` more equal tokens the two suffixes are the same
    /// infinite sequence, so ties fall back to position order.
    fn compare_suffixes(&self, a: usize, b: usize, shared: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let count = self.token_count();
        let mut i = advance(a % count, shared, count);
        let mut j = advance(b % count, shared, count);
        for _ in 0..count {
            match self.token(i).cmp(self.token(j)) {
                Ordering::Equal => {}
                ord => return ord,
            }
            i = advance(i, 1, count);
            j = advance(j, 1, count);
        }
        a.cmp(&b)
    }

    /// Number of leading tokens the suffixes at `a` and `b` share, up to `limit`
    fn common_prefix_len(&self, a: usize, b: usize, limit: usize) -> usize {
        let count = self.token_count();
        let mut i = a % count;
        let mut j = b % count;
        for k in 0..limit {
            if self.token(i) != self.token(j) {
                return k;
            }
            i = advance(i, 1, count);
            j = advance(j, 1, count);
        }
        limit
    }

    /// Compare the suffix at `position` against a finite query.
    ///
    /// Only `query.len()` tokens of the suffix are inspected, so `Equal`
    /// means the query is a prefix of the suffix.
    fn compare_prefix(&self, position: usize, query: &[&[u8]]) -> Ordering {
        let count = self.token_count();
        let mut index = position % count;
        for &expected in query {
            match self.token(index).cmp(expected) {
                Ordering::Equal => {}
                ord => return ord,
            }
            index = advance(index, 1, count);
        }
        Ordering::Equal
    }
}

/// `(index + by) mod count` without overflowing for large `by`
#[inline]
pub(crate) fn advance(index: usize, by: usize, count: usize) -> usize {
    let by = by % count;
    if index >= count - by {
        index - (count - by)
    } else {
        index + by
    }
}

/// Restartable, never-ending iterator over a token store
///
/// Advancing past the last token wraps to token 0. Two cursors over the
/// same store never affect each other.
pub struct TokenCursor<'a, S: TokenStore + ?Sized> {
    store: &'a S,
    position: usize,
}

impl<'a, S: TokenStore + ?Sized> TokenCursor<'a, S> {
    pub fn new(store: &'a S, position: usize) -> Self {
        Self {
            store,
            position: position % store.token_count(),
        }
    }

    /// Index of the token the next call to `next` returns
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<S: TokenStore + ?Sized> Clone for TokenCursor<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            position: self.position,
        }
    }
}

impl<'a, S: TokenStore + ?Sized> Iterator for TokenCursor<'a, S> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let token = self.store.token(self.position);
        self.position = advance(self.position, 1, self.store.token_count());
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// How a byte buffer is split into tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tokenization {
    #[default]
    Bytes,
    Chars(TextEncoding),
    Words,
}

impl Tokenization {
    /// Encode caller text the way sources of this tokenization store it
    ///
    /// Byte and word sources are taken as UTF-8.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Tokenization::Chars(encoding) => encoding.encode(text),
            Tokenization::Bytes | Tokenization::Words => text.as_bytes().to_vec(),
        }
    }

    /// Decode token bytes for display
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            Tokenization::Chars(encoding) => encoding.decode_lossy(bytes),
            Tokenization::Bytes | Tokenization::Words => {
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

impl fmt::Display for Tokenization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tokenization::Bytes => write!(f, "bytes"),
            Tokenization::Chars(encoding) => write!(f, "chars:{}", encoding),
            Tokenization::Words => write!(f, "words"),
        }
    }
}

impl FromStr for Tokenization {
    type Err = Error;

    /// Accepts `bytes`, `words`, `chars` (UTF-8) or `chars:<encoding>`
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.split_once(':') {
            Some(("chars", encoding)) => Ok(Tokenization::Chars(encoding.parse()?)),
            Some(_) => Err(Error::UnknownTokenization(s.to_string())),
            None => match lower.as_str() {
                "bytes" => Ok(Tokenization::Bytes),
                "words" => Ok(Tokenization::Words),
                "chars" => Ok(Tokenization::Chars(TextEncoding::Utf8)),
                _ => Err(Error::UnknownTokenization(s.to_string())),
            },
        }
    }
}

impl From<Tokenization> for String {
    fn from(tokenization: Tokenization) -> Self {
        tokenization.to_string()
    }
}

impl TryFrom<String> for Tokenization {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A file-backed token store chosen at runtime
pub enum TokenSource {
    Bytes(ByteTokens),
    Chars(CharTokens),
    Words(WordTokens),
}

impl TokenSource {
    /// Memory-map `path` and tokenize it
    pub fn open(path: &Path, tokenization: Tokenization) -> Result<Self> {
        Ok(Self::new(Source::open(path)?, tokenization))
    }

    /// Tokenize an in-memory buffer
    pub fn from_bytes(data: Vec<u8>, tokenization: Tokenization) -> Result<Self> {
        Ok(Self::new(Source::from_vec(data)?, tokenization))
    }

    fn new(source: Source, tokenization: Tokenization) -> Self {
        match tokenization {
            Tokenization::Bytes => TokenSource::Bytes(ByteTokens::new(source)),
            Tokenization::Chars(encoding) => {
                TokenSource::Chars(CharTokens::new(source, encoding))
            }
            Tokenization::Words => TokenSource::Words(WordTokens::new(source)),
        }
    }

    pub fn tokenization(&self) -> Tokenization {
        match self {
            TokenSource::Bytes(_) => Tokenization::Bytes,
            TokenSource::Chars(tokens) => Tokenization::Chars(tokens.encoding()),
            TokenSource::Words(_) => Tokenization::Words,
        }
    }

    /// Offset table of a variable-width tokenization (`None` for bytes)
    pub fn offsets(&self) -> Option<&OffsetTable> {
        match self {
            TokenSource::Bytes(_) => None,
            TokenSource::Chars(tokens) => Some(tokens.offsets()),
            TokenSource::Words(tokens) => Some(tokens.offsets()),
        }
    }

    /// Install a previously persisted offset table.
    ///
    /// Returns `false` if the table was already built or this is a byte store.
    pub fn preload_offsets(&self, table: OffsetTable) -> bool {
        match self {
            TokenSource::Bytes(_) => false,
            TokenSource::Chars(tokens) => tokens.preload_offsets(table),
            TokenSource::Words(tokens) => tokens.preload_offsets(table),
        }
    }
}

impl TokenStore for TokenSource {
    fn token_count(&self) -> usize {
        match self {
            TokenSource::Bytes(tokens) => tokens.token_count(),
            TokenSource::Chars(tokens) => tokens.token_count(),
            TokenSource::Words(tokens) => tokens.token_count(),
        }
    }

    fn file_length(&self) -> u64 {
        match self {
            TokenSource::Bytes(tokens) => tokens.file_length(),
            TokenSource::Chars(tokens) => tokens.file_length(),
            TokenSource::Words(tokens) => tokens.file_length(),
        }
    }

    #[inline]
    fn token(&self, index: usize) -> &[u8] {
        match self {
            TokenSource::Bytes(tokens) => tokens.token(index),
            TokenSource::Chars(tokens) => tokens.token(index),
            TokenSource::Words(tokens) => tokens.token(index),
        }
    }

    fn split_tokens<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        match self {
            TokenSource::Bytes(tokens) => tokens.split_tokens(bytes),
            TokenSource::Chars(tokens) => tokens.split_tokens(bytes),
            TokenSource::Words(tokens) => tokens.split_tokens(bytes),
        }
    }
}
