//! Append-only store of length-prefixed byte strings
//!
//! Used for the compression dictionary. Layout, repeated per entry:
//! - 4 bytes (little-endian u32): payload length
//! - N bytes: payload
//!
//! Ids are positions in the file (0, 1, 2, ...). A file cut short in the
//! middle of an entry reads back as if it ended at the last complete entry.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

const LENGTH_PREFIX: usize = 4;

/// Sequential writer for a dictionary file
pub struct DictionaryWriter {
    path: PathBuf,
    file: BufWriter<File>,
    count: u32,
}

impl DictionaryWriter {
    /// Create (or truncate) the dictionary at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::with_capacity(65536, file),
            count: 0,
        })
    }

    /// Append an entry, returning its id
    pub fn append(&mut self, bytes: &[u8]) -> Result<u32> {
        let len = u32::try_from(bytes.len()).map_err(|_| Error::EmptyOrOversizeSource {
            len: bytes.len() as u64,
        })?;
        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(bytes)?;

        let id = self.count;
        self.count += 1;
        Ok(id)
    }

    /// Number of entries appended so far
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and reopen the file for reading
    pub fn finish(mut self) -> Result<DictionaryStore> {
        self.file.flush()?;
        drop(self.file);
        DictionaryStore::open(&self.path)
    }
}

/// Read-only dictionary with random access by id
pub struct DictionaryStore {
    data: Vec<u8>,
    /// Payload range of each complete entry
    entries: Vec<Range<usize>>,
}

impl DictionaryStore {
    /// Load a dictionary file, indexing every complete entry
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    fn from_bytes(data: Vec<u8>) -> Self {
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset + LENGTH_PREFIX <= data.len() {
            let len = u32::from_le_bytes(
                data[offset..offset + LENGTH_PREFIX]
                    .try_into()
                    .expect("prefix slice is 4 bytes"),
            ) as usize;
            let start = offset + LENGTH_PREFIX;
            let Some(end) = start.checked_add(len).filter(|&end| end <= data.len()) else {
                break;
            };
            entries.push(start..end);
            offset = end;
        }

        Self { data, entries }
    }

    /// Number of complete entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch an entry by id
    pub fn get(&self, id: u32) -> Result<&[u8]> {
        self.entries
            .get(id as usize)
            .map(|range| &self.data[range.clone()])
            .ok_or(Error::IdNotFound {
                id,
                len: self.entries.len(),
            })
    }

    /// All entries in id order
    pub fn read_all(&self) -> Vec<Vec<u8>> {
        self.entries
            .iter()
            .map(|range| self.data[range.clone()].to_vec())
            .collect()
    }
}
