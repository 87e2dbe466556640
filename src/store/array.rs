//! Fixed-width integer arrays backed by memory-mapped files
//!
//! Entries are little-endian `u32`. The file holds nothing but the entries,
//! so a store of `len` entries is exactly `len * 4` bytes. Reopening a file
//! whose size is not a multiple of 4 ignores the trailing partial entry.

use crate::error::{Error, Result};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Size of one array entry in bytes
pub const ENTRY_SIZE: usize = 4;

/// Random-access array of `u32` values
///
/// Used both as the mutable suffix array permutation and, once written, as
/// the compressed output stream.
pub struct ArrayStore {
    path: Option<PathBuf>,
    map: MmapMut,
    len: usize,
}

impl ArrayStore {
    /// Create a pre-sized store at `path`, filled with `0..len`
    pub fn create(path: &Path, len: usize) -> Result<Self> {
        let byte_len = checked_byte_len(len)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len(byte_len as u64)?;

        let mut store = Self {
            path: Some(path.to_path_buf()),
            map: map_file(&file, byte_len)?,
            len,
        };
        store.fill_identity();
        Ok(store)
    }

    /// Create a pre-sized store in anonymous memory, filled with `0..len`
    pub fn anonymous(len: usize) -> Result<Self> {
        let byte_len = checked_byte_len(len)?;
        let mut store = Self {
            path: None,
            map: MmapMut::map_anon(byte_len.max(ENTRY_SIZE))?,
            len,
        };
        store.fill_identity();
        Ok(store)
    }

    /// Open an existing store read-write
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let byte_len = file.metadata()?.len() as usize;
        let len = byte_len / ENTRY_SIZE;

        Ok(Self {
            path: Some(path.to_path_buf()),
            map: map_file(&file, byte_len)?,
            len,
        })
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bounds-checked read
    pub fn get(&self, index: usize) -> Result<u32> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(self.at(index))
    }

    /// Bounds-checked write
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.slots().set(index, value);
        Ok(())
    }

    /// Read an entry the caller already knows is in range
    #[inline]
    pub(crate) fn at(&self, index: usize) -> u32 {
        let offset = index * ENTRY_SIZE;
        u32::from_le_bytes(
            self.map[offset..offset + ENTRY_SIZE]
                .try_into()
                .expect("entry slice is 4 bytes"),
        )
    }

    /// Iterate over all entries in order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).map(move |i| self.at(i))
    }

    /// Copy all entries into a vector
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Reset to the identity permutation `0..len`
    pub fn fill_identity(&mut self) {
        let mut slots = self.slots();
        for i in 0..slots.len() {
            slots.set(i, i as u32);
        }
    }

    /// Flush mapped pages to the backing file
    pub fn flush(&self) -> Result<()> {
        if self.path.is_some() {
            self.map.flush()?;
        }
        Ok(())
    }

    /// Mutable view over every entry
    pub(crate) fn slots(&mut self) -> Slots<'_> {
        let byte_len = self.len * ENTRY_SIZE;
        Slots::new(&mut self.map[..byte_len])
    }
}

/// Append-only writer producing an [`ArrayStore`] file
///
/// Positions are assigned sequentially from 0. Data reaches the file through
/// a buffered writer, so an interrupted writer leaves the file truncated at
/// some entry boundary (or with a partial entry that `open` ignores).
pub struct ArrayWriter {
    path: PathBuf,
    file: BufWriter<File>,
    len: usize,
}

impl ArrayWriter {
    /// Create (or truncate) the file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::with_capacity(65536, file),
            len: 0,
        })
    }

    /// Append a value and return its position
    pub fn append(&mut self, value: u32) -> Result<usize> {
        if self.len >= u32::MAX as usize {
            return Err(Error::IndexOutOfRange {
                index: self.len,
                len: u32::MAX as usize,
            });
        }
        self.file.write_all(&value.to_le_bytes())?;
        let position = self.len;
        self.len += 1;
        Ok(position)
    }

    /// Number of entries appended so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and reopen the file as a random-access store
    pub fn finish(mut self) -> Result<ArrayStore> {
        self.file.flush()?;
        drop(self.file);
        ArrayStore::open(&self.path)
    }
}

/// Mutable little-endian `u32` view over a byte range of an array store
///
/// Builders hand disjoint `Slots` to different buckets, so sub-ranges can
/// be refined independently (and in parallel).
pub(crate) struct Slots<'a> {
    bytes: &'a mut [u8],
}

impl<'a> Slots<'a> {
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len() % ENTRY_SIZE, 0);
        Self { bytes }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bytes.len() / ENTRY_SIZE
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> u32 {
        let offset = index * ENTRY_SIZE;
        u32::from_le_bytes(
            self.bytes[offset..offset + ENTRY_SIZE]
                .try_into()
                .expect("entry slice is 4 bytes"),
        )
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: u32) {
        let offset = index * ENTRY_SIZE;
        self.bytes[offset..offset + ENTRY_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// Reborrow the entries in `[from, to)`
    pub(crate) fn range(&mut self, from: usize, to: usize) -> Slots<'_> {
        Slots::new(&mut self.bytes[from * ENTRY_SIZE..to * ENTRY_SIZE])
    }

    /// Split into `[0, mid)` and `[mid, len)`
    pub(crate) fn split_at(self, mid: usize) -> (Slots<'a>, Slots<'a>) {
        let (left, right) = self.bytes.split_at_mut(mid * ENTRY_SIZE);
        (Slots::new(left), Slots::new(right))
    }

    pub(crate) fn to_vec(&self) -> Vec<u32> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Overwrite the leading entries with `values`
    pub(crate) fn write_from(&mut self, values: &[u32]) {
        for (i, &value) in values.iter().enumerate() {
            self.set(i, value);
        }
    }
}

/// Byte length of `len` entries, rejecting counts the `u32` width can't address
fn checked_byte_len(len: usize) -> Result<usize> {
    if len > u32::MAX as usize {
        return Err(Error::EmptyOrOversizeSource {
            len: len as u64,
        });
    }
    Ok(len * ENTRY_SIZE)
}

/// Map a file read-write; empty files get a one-entry anonymous placeholder
fn map_file(file: &File, byte_len: usize) -> Result<MmapMut> {
    if byte_len == 0 {
        return Ok(MmapMut::map_anon(ENTRY_SIZE)?);
    }
    // SAFETY: the file is owned by this store for its lifetime; external
    // resizing while mapped is undefined and not supported.
    Ok(unsafe { MmapMut::map_mut(file)? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_is_identity() {
        let dir = tempdir().unwrap();
        let store = ArrayStore::create(&dir.path().join("sa.bin"), 6).unwrap();
        assert_eq!(store.to_vec(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(fs::metadata(dir.path().join("sa.bin")).unwrap().len(), 24);
    }

    #[test]
    fn test_get_set_bounds() {
        let mut store = ArrayStore::anonymous(3).unwrap();
        store.set(1, 42).unwrap();
        assert_eq!(store.get(1).unwrap(), 42);

        assert!(matches!(
            store.get(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            store.set(10, 1),
            Err(Error::IndexOutOfRange { index: 10, len: 3 })
        ));
    }

    #[test]
    fn test_persisted_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sa.bin");
        {
            let mut store = ArrayStore::create(&path, 4).unwrap();
            store.set(0, 3).unwrap();
            store.set(3, 0).unwrap();
            store.flush().unwrap();
        }

        let store = ArrayStore::open(&path).unwrap();
        assert_eq!(store.to_vec(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_append_positions() {
        let dir = tempdir().unwrap();
        let mut writer = ArrayWriter::create(&dir.path().join("out.cmp")).unwrap();
        assert_eq!(writer.append(9).unwrap(), 0);
        assert_eq!(writer.append(8).unwrap(), 1);
        assert_eq!(writer.append(7).unwrap(), 2);

        let store = writer.finish().unwrap();
        assert_eq!(store.to_vec(), vec![9, 8, 7]);
    }

    #[test]
    fn test_truncated_tail_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.bin");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&6u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);
        fs::write(&path, bytes).unwrap();

        let store = ArrayStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.to_vec(), vec![5, 6]);
    }

    #[test]
    fn test_empty_writer() {
        let dir = tempdir().unwrap();
        let store = ArrayWriter::create(&dir.path().join("empty.cmp"))
            .unwrap()
            .finish()
            .unwrap();
        assert!(store.is_empty());
        assert!(store.get(0).is_err());
    }

    #[test]
    fn test_slots_split() {
        let mut store = ArrayStore::anonymous(5).unwrap();
        let slots = store.slots();
        let (mut left, mut right) = slots.split_at(2);
        left.set(0, 10);
        right.set(0, 20);
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 3);
        assert_eq!(store.to_vec(), vec![10, 1, 20, 3, 4]);
    }
}
