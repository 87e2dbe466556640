use crate::error::Result;
use crate::index::types::{
    compressed_path, dictionary_path, index_path, meta_path, offsets_path, IndexMeta,
};
use crate::store::{ArrayStore, DictionaryStore, ENTRY_SIZE};
use std::fs;
use std::path::Path;

/// Sizes of every artifact written next to a source file
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub source_size: u64,
    pub meta: Option<IndexMeta>,
    pub index_size: Option<u64>,
    pub offsets_size: Option<u64>,
    pub dictionary_entries: Option<usize>,
    pub compressed_entries: Option<usize>,
}

impl IndexStats {
    /// Inspect the artifacts of `source`; missing files are `None`
    pub fn collect(source: &Path) -> Result<Self> {
        let index = index_path(source);
        let sidecar = meta_path(&index);

        let meta = if sidecar.exists() {
            Some(IndexMeta::load(&sidecar)?)
        } else {
            None
        };

        let dictionary = dictionary_path(source);
        let dictionary_entries = if dictionary.exists() {
            Some(DictionaryStore::open(&dictionary)?.len())
        } else {
            None
        };

        let compressed = compressed_path(source);
        let compressed_entries = if compressed.exists() {
            Some(ArrayStore::open(&compressed)?.len())
        } else {
            None
        };

        Ok(Self {
            source_size: fs::metadata(source)?.len(),
            meta,
            index_size: file_size(&index),
            offsets_size: file_size(&offsets_path(source)),
            dictionary_entries,
            compressed_entries,
        })
    }

    /// Compressed ids per source token, if both are known
    pub fn compression_ratio(&self) -> Option<f64> {
        let tokens = self.meta.as_ref()?.token_count;
        let entries = self.compressed_entries?;
        Some(entries as f64 / tokens.max(1) as f64)
    }
}

/// Display index statistics
pub fn show_stats(source: &Path) -> Result<()> {
    let stats = IndexStats::collect(source)?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Source:           {}", source.display());
    println!("Source size:      {}", format_size(stats.source_size));

    match &stats.meta {
        Some(meta) => {
            println!("Index version:    {}", meta.version);
            println!("Tokenization:     {}", meta.tokenization);
            println!("Token count:      {}", meta.token_count);
            println!(
                "Built:            {}",
                if meta.built { "yes" } else { "no" }
            );
            if meta.built {
                println!("Window:           {}", meta.window);
            }
            println!();
            println!("Created:          {}", format_timestamp(meta.created_at));
            println!("Updated:          {}", format_timestamp(meta.updated_at));
        }
        None => println!("Index:            not found"),
    }

    println!();
    if let Some(size) = stats.index_size {
        println!(
            "Index size:       {} ({} entries)",
            format_size(size),
            size / ENTRY_SIZE as u64
        );
    }
    if let Some(size) = stats.offsets_size {
        println!("Offsets size:     {}", format_size(size));
    }
    if let Some(entries) = stats.dictionary_entries {
        println!("Dictionary:       {} entries", entries);
    }
    if let Some(entries) = stats.compressed_entries {
        println!("Compressed:       {} ids", entries);
    }
    if let Some(ratio) = stats.compression_ratio() {
        println!("Ids per token:    {:.3}", ratio);
    }

    Ok(())
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format unix timestamp
fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Tokenization;
    use tempfile::tempdir;

    #[test]
    fn test_collect_missing_artifacts() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("plain.txt");
        fs::write(&source, b"hello").unwrap();

        let stats = IndexStats::collect(&source).unwrap();
        assert_eq!(stats.source_size, 5);
        assert!(stats.meta.is_none());
        assert!(stats.index_size.is_none());
        assert!(stats.compression_ratio().is_none());
    }

    #[test]
    fn test_collect_with_meta() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("plain.txt");
        fs::write(&source, b"hello").unwrap();
        IndexMeta::new(5, 5, Tokenization::Bytes)
            .save(&meta_path(&index_path(&source)))
            .unwrap();
        ArrayStore::create(&index_path(&source), 5).unwrap();

        let stats = IndexStats::collect(&source).unwrap();
        assert_eq!(stats.meta.unwrap().token_count, 5);
        assert_eq!(stats.index_size, Some(20));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
    }
}
