use super::TokenStore;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::store::ArrayStore;

/// One token per compressed id; token value is the codec entry for that id
///
/// This is the decode-side view of a compressed stream: reading all tokens
/// in order reproduces the original buffer.
pub struct DictionaryTokens<'a> {
    codec: &'a Codec,
    ids: Vec<u32>,
    file_length: u64,
}

impl<'a> DictionaryTokens<'a> {
    /// Check every id against the codec and total the decoded length
    pub fn new(codec: &'a Codec, compressed: &ArrayStore) -> Result<Self> {
        let ids = compressed.to_vec();
        if ids.is_empty() {
            return Err(Error::EmptyOrOversizeSource { len: 0 });
        }

        let mut file_length = 0u64;
        for &id in &ids {
            let entry = codec.get(id).ok_or(Error::IdNotFound {
                id,
                len: codec.len(),
            })?;
            file_length += entry.len() as u64;
        }

        Ok(Self {
            codec,
            ids,
            file_length,
        })
    }
}

impl TokenStore for DictionaryTokens<'_> {
    fn token_count(&self) -> usize {
        self.ids.len()
    }

    fn file_length(&self) -> u64 {
        self.file_length
    }

    #[inline]
    fn token(&self, index: usize) -> &[u8] {
        self.codec.entry(self.ids[index] as usize)
    }

    /// Each id stands for an arbitrary entry, so a caller string is one token
    fn split_tokens<'b>(&self, bytes: &'b [u8]) -> Vec<&'b [u8]> {
        if bytes.is_empty() {
            Vec::new()
        } else {
            vec![bytes]
        }
    }
}
