//! # CXI - Circular Token Index
//!
//! CXI indexes a single file as a circular sequence of tokens (bytes,
//! decoded characters or whitespace-delimited words), answers exact
//! substring queries over it, mines repeated substrings as dictionary
//! entries and compresses the file against that dictionary.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`tokens`] - Wrap-around token views over a byte buffer
//! - [`store`] - Memory-mapped `u32` arrays and the dictionary blob file
//! - [`index`] - Suffix array building, search and candidate mining
//! - [`codec`] - Dictionary construction, compression and expansion
//! - [`config`] - Engine tuning parameters
//! - [`utils`] - Progress display for the command-line driver
//!
//! ## Quick Start
//!
//! ```no_run
//! use cxi::codec::{expand, Codec, Compressor};
//! use cxi::config::EngineConfig;
//! use cxi::index::SuffixIndex;
//! use cxi::tokens::{TokenSource, Tokenization};
//! use std::path::Path;
//!
//! # fn main() -> cxi::Result<()> {
//! let store = TokenSource::open(Path::new("corpus.txt"), Tokenization::Bytes)?;
//! let mut index = SuffixIndex::anonymous(store, EngineConfig::default())?;
//! index.build_index(2)?;
//!
//! let positions = index.find(b"is")?;
//! let candidates = index.find_compression_prefixes(0, 100)?;
//!
//! let codec = Codec::from_candidates(index.store(), &candidates)?;
//! let output = Compressor::new(index.store()).write_compressed(
//!     &codec,
//!     Path::new("corpus.txt.cmp"),
//!     Path::new("corpus.txt.dict"),
//! )?;
//! let original = expand(&codec, &output.compressed)?;
//! # let _ = (positions, original);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod store;
pub mod tokens;
pub mod utils;

pub use error::{Error, Result};
