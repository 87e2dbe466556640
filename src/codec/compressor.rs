//! Greedy token-substitution compression and expansion
//!
//! Output files:
//! - compressed array: one little-endian `u32` codec id per matched entry
//! - dictionary: the codec entries in id order, length-prefixed
//!
//! The matched entries tile the token stream exactly: no gaps, no overlap.

use super::trie::CodecTrie;
use super::Codec;
use crate::error::{Error, Result};
use crate::store::{ArrayStore, ArrayWriter, DictionaryStore};
use crate::tokens::{DictionaryTokens, TokenStore};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Result of a successful compression
pub struct CompressedOutput {
    /// Codec ids in stream order
    pub compressed: ArrayStore,
    /// Codec entries in id order
    pub dictionary: DictionaryStore,
    /// Number of ids written
    pub entries: usize,
    /// Tokens covered by the written ids (always the store's token count)
    pub tokens_covered: usize,
}

impl CompressedOutput {
    /// Entries written per input token
    pub fn ratio(&self) -> f64 {
        self.entries as f64 / self.tokens_covered.max(1) as f64
    }
}

/// Compresses a token store against a codec
pub struct Compressor<'a, S: TokenStore> {
    store: &'a S,
}

impl<'a, S: TokenStore> Compressor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Encode the whole stream into codec ids held in memory
    pub fn encode(&self, codec: &Codec) -> Result<Vec<u32>> {
        let trie = CodecTrie::build(self.store, codec);
        let mut ids = Vec::new();
        self.tile(&trie, |id| {
            ids.push(id);
            Ok(())
        })?;
        Ok(ids)
    }

    /// Compress into `array_path` and write the codec to `dictionary_path`.
    ///
    /// Either both files are complete or neither is left behind.
    pub fn write_compressed(
        &self,
        codec: &Codec,
        array_path: &Path,
        dictionary_path: &Path,
    ) -> Result<CompressedOutput> {
        match self.write_files(codec, array_path, dictionary_path) {
            Ok(output) => Ok(output),
            Err(err) => {
                let _ = fs::remove_file(array_path);
                let _ = fs::remove_file(dictionary_path);
                Err(err)
            }
        }
    }

    fn write_files(
        &self,
        codec: &Codec,
        array_path: &Path,
        dictionary_path: &Path,
    ) -> Result<CompressedOutput> {
        let trie = CodecTrie::build(self.store, codec);
        debug!(
            entries = codec.len(),
            max_depth = trie.max_depth(),
            "built codec trie"
        );

        let mut writer = ArrayWriter::create(array_path)?;
        let tokens_covered = self.tile(&trie, |id| writer.append(id).map(|_| ()))?;
        let entries = writer.len();
        let compressed = writer.finish()?;
        let dictionary = codec.write(dictionary_path)?;

        info!(
            tokens = tokens_covered,
            entries,
            codec = codec.len(),
            "compressed token stream"
        );

        Ok(CompressedOutput {
            compressed,
            dictionary,
            entries,
            tokens_covered,
        })
    }

    /// Walk the stream from token 0, emitting the id of the longest match at
    /// each step. Returns the number of tokens consumed.
    fn tile(&self, trie: &CodecTrie, mut emit: impl FnMut(u32) -> Result<()>) -> Result<usize> {
        let count = self.store.token_count();
        let mut position = 0;

        while position < count {
            let (id, len) = trie
                .longest_match(self.store, position)
                .ok_or(Error::NoCodecMatch { position })?;
            emit(id)?;
            position += len;
        }

        debug_assert_eq!(position, count);
        Ok(position)
    }
}

/// Decode a compressed stream back into the original bytes
pub fn expand(codec: &Codec, compressed: &ArrayStore) -> Result<Vec<u8>> {
    let tokens = DictionaryTokens::new(codec, compressed)?;
    let mut out = Vec::with_capacity(tokens.file_length() as usize);
    for index in 0..tokens.token_count() {
        out.extend_from_slice(tokens.token(index));
    }
    Ok(out)
}

/// Decode a compressed stream into a writer, returning the bytes written
pub fn expand_into<W: Write>(codec: &Codec, compressed: &ArrayStore, writer: &mut W) -> Result<u64> {
    let tokens = DictionaryTokens::new(codec, compressed)?;
    for index in 0..tokens.token_count() {
        writer.write_all(tokens.token(index))?;
    }
    writer.flush()?;
    Ok(tokens.file_length())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{TokenSource, Tokenization};
    use tempfile::tempdir;

    const CORPUS: &[u8] = b"This is a test data file.\n";

    fn codec_with(store: &TokenSource, extra: &[&str]) -> Codec {
        let mut entries = Codec::alphabet(store);
        entries.extend(extra.iter().map(|e| e.as_bytes().to_vec()));
        Codec::new(entries).unwrap()
    }

    #[test]
    fn test_compress_and_expand() {
        let dir = tempdir().unwrap();
        let store = TokenSource::from_bytes(CORPUS.to_vec(), Tokenization::Bytes).unwrap();
        let codec = codec_with(&store, &["is"]);

        let output = Compressor::new(&store)
            .write_compressed(&codec, &dir.path().join("c.cmp"), &dir.path().join("c.dict"))
            .unwrap();

        assert_eq!(output.tokens_covered, 26);
        assert!(output.entries < 26);
        assert_eq!(output.compressed.len(), output.entries);
        assert_eq!(output.dictionary.len(), codec.len());
        assert_eq!(expand(&codec, &output.compressed).unwrap(), CORPUS);
    }

    #[test]
    fn test_missing_token_aborts_and_cleans_up() {
        let dir = tempdir().unwrap();
        let array_path = dir.path().join("c.cmp");
        let dictionary_path = dir.path().join("c.dict");
        let store = TokenSource::from_bytes(b"abcd".to_vec(), Tokenization::Bytes).unwrap();
        let codec = Codec::new(vec![b"a".to_vec(), b"b".to_vec(), b"d".to_vec()]).unwrap();

        let result = Compressor::new(&store).write_compressed(&codec, &array_path, &dictionary_path);
        assert!(matches!(result, Err(Error::NoCodecMatch { position: 2 })));
        assert!(!array_path.exists());
        assert!(!dictionary_path.exists());
    }

    #[test]
    fn test_encode_words() {
        let store =
            TokenSource::from_bytes(b"to be or not to be".to_vec(), Tokenization::Words).unwrap();
        let codec = codec_with(&store, &["to be"]);
        let ids = Compressor::new(&store).encode(&codec).unwrap();

        let to_be = codec.len() as u32 - 1;
        assert_eq!(ids.first(), Some(&to_be));
        assert_eq!(ids.last(), Some(&to_be));
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_expand_into_writer() {
        let dir = tempdir().unwrap();
        let store = TokenSource::from_bytes(b"abab".to_vec(), Tokenization::Bytes).unwrap();
        let codec = codec_with(&store, &["ab"]);
        let output = Compressor::new(&store)
            .write_compressed(&codec, &dir.path().join("c.cmp"), &dir.path().join("c.dict"))
            .unwrap();
        assert_eq!(output.compressed.to_vec(), vec![2, 2]);

        let mut out = Vec::new();
        let written = expand_into(&codec, &output.compressed, &mut out).unwrap();
        assert_eq!(written, 4);
        assert_eq!(out, b"abab");
    }
}
