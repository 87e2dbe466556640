use super::{Source, TokenStore};

/// One token per byte; token `i` sits at byte offset `i`
pub struct ByteTokens {
    source: Source,
}

impl ByteTokens {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    /// The raw buffer
    pub fn bytes(&self) -> &[u8] {
        &self.source
    }
}

impl TokenStore for ByteTokens {
    #[inline]
    fn token_count(&self) -> usize {
        self.source.len()
    }

    fn file_length(&self) -> u64 {
        self.source.len() as u64
    }

    #[inline]
    fn token(&self, index: usize) -> &[u8] {
        &self.source[index..index + 1]
    }

    fn split_tokens<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        bytes.chunks(1).collect()
    }

    fn read_string(&self, position: usize, n: usize, skip: usize) -> Vec<u8> {
        let count = self.source.len();
        let start = super::advance(position % count, skip, count);
        let mut out = Vec::with_capacity(n);

        // Copy whole runs up to the end of the buffer instead of byte by byte
        let mut remaining = n;
        let mut offset = start;
        while remaining > 0 {
            let run = remaining.min(count - offset);
            out.extend_from_slice(&self.source[offset..offset + run]);
            remaining -= run;
            offset = 0;
        }
        out
    }
}
