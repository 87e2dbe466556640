use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cxi::codec::{expand_into, Codec, Compressor};
use cxi::config::EngineConfig;
use cxi::index::{
    compressed_path, dictionary_path, index_path, meta_path, offsets_path, show_stats, Candidate,
    IndexMeta, SuffixIndex,
};
use cxi::store::{ArrayStore, DictionaryStore};
use cxi::tokens::{OffsetTable, TokenSource, TokenStore, Tokenization};
use cxi::utils::{finish, spinner};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cxi")]
#[command(about = "Circular token index, substring search and dictionary compression")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration (JSON); defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress spinners and summaries
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the suffix index for a file
    Index {
        file: PathBuf,

        /// Tokenization: bytes, words, chars or chars:<encoding>
        #[arg(short, long, default_value = "bytes")]
        tokens: Tokenization,

        /// Bucket window in tokens (defaults to the configured window)
        #[arg(short, long)]
        window: Option<usize>,
    },
    /// List every position where a string occurs
    Find {
        file: PathBuf,

        query: String,

        /// Maximum positions to print
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Show repeated substrings worth adding to a dictionary
    Mine {
        file: PathBuf,

        /// Minimum fitness (exclusive)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        threshold: i64,

        /// Maximum number of candidates
        #[arg(short = 'n', long, default_value_t = 256)]
        count: usize,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compress a file against a mined dictionary
    Compress {
        file: PathBuf,

        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        threshold: i64,

        #[arg(short = 'n', long, default_value_t = 256)]
        count: usize,
    },
    /// Restore the original bytes from a dictionary and compressed stream
    Expand {
        dictionary: PathBuf,

        compressed: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show index and compression statistics
    Stats { file: PathBuf },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Index {
            file,
            tokens,
            window,
        } => {
            build_index(&file, tokens, window.unwrap_or(config.window), config, cli.quiet)?;
        }
        Commands::Find { file, query, limit } => {
            find(&file, &query, limit, config)?;
        }
        Commands::Mine {
            file,
            threshold,
            count,
            json,
        } => {
            let index = open_index(&file, config)?;
            let candidates = index.find_compression_prefixes(threshold, count)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                print_candidates(&candidates, index.meta().tokenization);
            }
        }
        Commands::Compress {
            file,
            threshold,
            count,
        } => {
            compress(&file, threshold, count, config, cli.quiet)?;
        }
        Commands::Expand {
            dictionary,
            compressed,
            output,
        } => {
            expand(&dictionary, &compressed, output.as_deref())?;
        }
        Commands::Stats { file } => {
            show_stats(&file).with_context(|| format!("Failed to read stats for {}", file.display()))?;
        }
    }

    Ok(())
}

/// Open `file` with `tokenization`, reusing a persisted offset table if one fits
fn open_source(file: &Path, tokenization: Tokenization) -> Result<TokenSource> {
    let store = TokenSource::open(file, tokenization)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let offsets = offsets_path(file);
    if tokenization != Tokenization::Bytes && offsets.exists() {
        match OffsetTable::load(&offsets, store.file_length()) {
            Ok(table) => {
                store.preload_offsets(table);
            }
            Err(err) => warn!(path = %offsets.display(), %err, "ignoring stale offset table"),
        }
    }

    Ok(store)
}

fn open_index(file: &Path, config: EngineConfig) -> Result<SuffixIndex<TokenSource>> {
    let path = index_path(file);
    let meta = IndexMeta::load(&meta_path(&path)).with_context(|| {
        format!(
            "No index for {} (run `cxi index {}` first)",
            file.display(),
            file.display()
        )
    })?;

    let store = open_source(file, meta.tokenization)?;
    SuffixIndex::open(store, &path, config)
        .with_context(|| format!("Failed to open index {}", path.display()))
}

fn build_index(
    file: &Path,
    tokenization: Tokenization,
    window: usize,
    config: EngineConfig,
    quiet: bool,
) -> Result<()> {
    if window == 0 {
        bail!("--window must be at least 1");
    }

    let progress = spinner("Tokenizing...", quiet);
    let store = TokenSource::open(file, tokenization)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    if let Some(table) = store.offsets() {
        table
            .persist(&offsets_path(file))
            .context("Failed to write offset table")?;
    }

    if let Some(spinner) = &progress {
        spinner.set_message("Sorting suffixes...");
    }
    let path = index_path(file);
    let meta = IndexMeta::new(store.token_count(), store.file_length(), tokenization);
    let mut index = SuffixIndex::create(store, &path, meta, config)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    index.build_index(window)?;
    finish(progress, "Index complete");

    if !quiet {
        println!(
            "Indexed {} tokens ({} bytes, {}) into {}",
            index.len(),
            index.store().file_length(),
            tokenization,
            path.display()
        );
    }
    Ok(())
}

fn find(file: &Path, query: &str, limit: usize, config: EngineConfig) -> Result<()> {
    let index = open_index(file, config)?;
    let encoded = index.meta().tokenization.encode(query);
    let positions = index.find(&encoded)?;
    let offsets = index.store().offsets();

    println!("{} occurrence(s) of {:?}", positions.len(), query);
    for &position in positions.iter().take(limit) {
        let byte = offsets.map_or(position as usize, |table| table.offset(position as usize));
        println!("  token {:>10}  byte {:>10}", position, byte);
    }
    if positions.len() > limit {
        println!("  ... and {} more", positions.len() - limit);
    }
    Ok(())
}

fn print_candidates(candidates: &[Candidate], tokenization: Tokenization) {
    if candidates.is_empty() {
        println!("No candidates above threshold.");
        return;
    }

    println!("{:>8} {:>8} {:>6}  text", "fitness", "count", "tokens");
    for candidate in candidates {
        println!(
            "{:>8} {:>8} {:>6}  {:?}",
            candidate.fitness,
            candidate.occurrences,
            candidate.tokens,
            candidate.text(tokenization)
        );
    }
}

fn compress(file: &Path, threshold: i64, count: usize, config: EngineConfig, quiet: bool) -> Result<()> {
    let index = open_index(file, config)?;

    let progress = spinner("Mining dictionary...", quiet);
    let candidates = index.find_compression_prefixes(threshold, count)?;
    let codec = Codec::from_candidates(index.store(), &candidates)?;

    if let Some(spinner) = &progress {
        spinner.set_message("Compressing...");
    }
    let compressed = compressed_path(file);
    let dictionary = dictionary_path(file);
    let output = Compressor::new(index.store())
        .write_compressed(&codec, &compressed, &dictionary)
        .with_context(|| format!("Failed to compress {}", file.display()))?;
    finish(progress, "Compression complete");

    if !quiet {
        println!(
            "{} tokens -> {} ids ({:.1}%), {} dictionary entries",
            output.tokens_covered,
            output.entries,
            output.ratio() * 100.0,
            output.dictionary.len()
        );
        println!("Compressed: {}", compressed.display());
        println!("Dictionary: {}", dictionary.display());
    }
    Ok(())
}

fn expand(dictionary: &Path, compressed: &Path, output: Option<&Path>) -> Result<()> {
    let store = DictionaryStore::open(dictionary)
        .with_context(|| format!("Failed to open dictionary {}", dictionary.display()))?;
    let codec = Codec::from_dictionary(&store)?;
    let ids = ArrayStore::open(compressed)
        .with_context(|| format!("Failed to open {}", compressed.display()))?;

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
            );
            expand_into(&codec, &ids, &mut writer)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            expand_into(&codec, &ids, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
