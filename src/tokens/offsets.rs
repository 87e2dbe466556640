//! Token index → byte offset tables for variable-width tokenizations
//!
//! The table is built by a single end-to-end scan of the buffer and can be
//! persisted as an [`ArrayStore`] file (`token_count` little-endian `u32`
//! start offsets) so later runs skip the scan.

use crate::error::{Error, Result};
use crate::store::{ArrayStore, ArrayWriter};
use std::ops::Range;
use std::path::Path;

/// Start offset of every token in a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    starts: Vec<u32>,
    file_length: u32,
}

impl OffsetTable {
    /// Scan `data` once, asking `token_len` for the byte length of the token
    /// beginning at each boundary.
    ///
    /// `token_len` receives the remaining buffer and must return a value in
    /// `1..=rest.len()`.
    pub fn build(data: &[u8], token_len: impl Fn(&[u8]) -> usize) -> Self {
        let mut starts = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            starts.push(offset as u32);
            let len = token_len(&data[offset..]).clamp(1, data.len() - offset);
            offset += len;
        }

        Self {
            starts,
            file_length: data.len() as u32,
        }
    }

    /// Load a persisted table, checking it against the buffer length
    pub fn load(path: &Path, file_length: u64) -> Result<Self> {
        let store = ArrayStore::open(path)?;
        let starts = store.to_vec();

        let valid = starts.first() == Some(&0)
            && starts.windows(2).all(|w| w[0] < w[1])
            && starts.last().is_some_and(|&last| (last as u64) < file_length);
        if !valid {
            return Err(Error::corrupt_index(format!(
                "offset table {} does not describe a {} byte source",
                path.display(),
                file_length
            )));
        }

        Ok(Self {
            starts,
            file_length: file_length as u32,
        })
    }

    /// Write the table as an array store
    pub fn persist(&self, path: &Path) -> Result<ArrayStore> {
        let mut writer = ArrayWriter::create(path)?;
        for &start in &self.starts {
            writer.append(start)?;
        }
        writer.finish()
    }

    /// Number of tokens
    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Byte offset of token `index`
    #[inline]
    pub fn offset(&self, index: usize) -> usize {
        self.starts[index] as usize
    }

    /// Byte range of token `index`
    #[inline]
    pub fn range(&self, index: usize) -> Range<usize> {
        let start = self.starts[index] as usize;
        let end = self
            .starts
            .get(index + 1)
            .map_or(self.file_length as usize, |&next| next as usize);
        start..end
    }
}

/// Split `bytes` with the same boundary rule used to build a table
pub(crate) fn split_with<'a>(bytes: &'a [u8], token_len: impl Fn(&[u8]) -> usize) -> Vec<&'a [u8]> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let len = token_len(&bytes[offset..]).clamp(1, bytes.len() - offset);
        tokens.push(&bytes[offset..offset + len]);
        offset += len;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pairs(rest: &[u8]) -> usize {
        rest.len().min(2)
    }

    #[test]
    fn test_build_ranges() {
        let table = OffsetTable::build(b"abcde", pairs);
        assert_eq!(table.len(), 3);
        assert_eq!(table.range(0), 0..2);
        assert_eq!(table.range(1), 2..4);
        assert_eq!(table.range(2), 4..5);
        assert_eq!(table.offset(2), 4);
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.offsets");
        let table = OffsetTable::build(b"abcdefg", pairs);

        table.persist(&path).unwrap();
        assert_eq!(OffsetTable::load(&path, 7).unwrap(), table);
    }

    #[test]
    fn test_load_rejects_mismatched_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.offsets");
        OffsetTable::build(b"abcdefg", pairs).persist(&path).unwrap();

        // last start is 6, which is past a 5 byte source
        assert!(matches!(
            OffsetTable::load(&path, 5),
            Err(Error::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_split_with() {
        assert_eq!(split_with(b"abcde", pairs), vec![&b"ab"[..], &b"cd"[..], &b"e"[..]]);
        assert!(split_with(b"", pairs).is_empty());
    }
}
