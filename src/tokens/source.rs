use crate::error::{Error, Result};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

/// Immutable byte buffer behind a token store
pub enum Source {
    /// Memory-mapped file
    Mapped(Mmap),
    /// In-memory buffer
    Owned(Vec<u8>),
}

impl Source {
    /// Memory-map a file read-only
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        check_len(len)?;
        // SAFETY: the source is treated as immutable; changing the file while
        // it is mapped is undefined behavior we do not guard against.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Source::Mapped(mmap))
    }

    /// Wrap an owned buffer
    pub fn from_vec(data: Vec<u8>) -> Result<Self> {
        check_len(data.len() as u64)?;
        Ok(Source::Owned(data))
    }
}

impl Deref for Source {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            Source::Mapped(mmap) => mmap,
            Source::Owned(data) => data,
        }
    }
}

/// Sources must be non-empty and addressable with `u32` offsets
fn check_len(len: u64) -> Result<()> {
    if len == 0 || len > u32::MAX as u64 {
        return Err(Error::EmptyOrOversizeSource { len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_open_mapped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, b"mapped bytes").unwrap();

        let source = Source::open(&path).unwrap();
        assert!(matches!(source, Source::Mapped(_)));
        assert_eq!(&source[..], b"mapped bytes");
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, b"").unwrap();

        assert!(matches!(
            Source::open(&path),
            Err(Error::EmptyOrOversizeSource { len: 0 })
        ));
    }
}
