use crate::error::Result;
use crate::tokens::Tokenization;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current version of the index metadata format
pub const INDEX_VERSION: u32 = 1;

/// Suffix array file extension, appended to the source file name
pub const INDEX_EXTENSION: &str = "sa";

/// Persisted offset table extension
pub const OFFSETS_EXTENSION: &str = "offsets";

/// Dictionary (codec) extension
pub const DICTIONARY_EXTENSION: &str = "dict";

/// Compressed id stream extension
pub const COMPRESSED_EXTENSION: &str = "cmp";

/// Index metadata stored next to the index array as `<index>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub token_count: u64,
    pub file_length: u64,
    pub tokenization: Tokenization,
    /// Window passed to the last `build_index`
    pub window: usize,
    pub built: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl IndexMeta {
    pub fn new(token_count: usize, file_length: u64, tokenization: Tokenization) -> Self {
        let now = unix_now();
        Self {
            version: INDEX_VERSION,
            token_count: token_count as u64,
            file_length,
            tokenization,
            window: 0,
            built: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Read a metadata sidecar
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Write a metadata sidecar as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Record a completed build
    pub fn mark_built(&mut self, window: usize) {
        self.window = window;
        self.built = true;
        self.updated_at = unix_now();
    }
}

/// Seconds since the unix epoch (0 if the clock is before it)
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `<path>.<extension>`, keeping any extension `path` already has
pub fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Index array written for `source`
pub fn index_path(source: &Path) -> PathBuf {
    sibling_path(source, INDEX_EXTENSION)
}

/// Metadata sidecar of an index array
pub fn meta_path(index: &Path) -> PathBuf {
    sibling_path(index, "json")
}

pub fn offsets_path(source: &Path) -> PathBuf {
    sibling_path(source, OFFSETS_EXTENSION)
}

pub fn dictionary_path(source: &Path) -> PathBuf {
    sibling_path(source, DICTIONARY_EXTENSION)
}

pub fn compressed_path(source: &Path) -> PathBuf {
    sibling_path(source, COMPRESSED_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let source = Path::new("/data/corpus.txt");
        assert_eq!(index_path(source), PathBuf::from("/data/corpus.txt.sa"));
        assert_eq!(
            meta_path(&index_path(source)),
            PathBuf::from("/data/corpus.txt.sa.json")
        );
        assert_eq!(offsets_path(source), PathBuf::from("/data/corpus.txt.offsets"));
        assert_eq!(dictionary_path(source), PathBuf::from("/data/corpus.txt.dict"));
        assert_eq!(compressed_path(source), PathBuf::from("/data/corpus.txt.cmp"));
    }

    #[test]
    fn test_meta_json() {
        let mut meta = IndexMeta::new(26, 26, Tokenization::Words);
        assert!(!meta.built);
        meta.mark_built(3);

        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"tokenization\":\"words\""));
        let back: IndexMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.window, 3);
    }

    #[test]
    fn test_meta_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.sa.json");
        let meta = IndexMeta::new(4, 9, Tokenization::Bytes);
        meta.save(&path).unwrap();
        assert_eq!(IndexMeta::load(&path).unwrap(), meta);
    }
}
