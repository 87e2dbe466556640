//! Error types for the indexing engine
//!
//! Every failure in this crate is surfaced immediately to the caller. None of
//! them are retryable: they describe misuse (bad arguments, querying an
//! unbuilt index) or a broken invariant, never a transient fault.

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Backing buffer is empty or too large for the `u32` array width
    #[error("source is empty or exceeds the addressable size: {len} bytes")]
    EmptyOrOversizeSource {
        /// Length of the rejected buffer
        len: u64,
    },

    /// Array access outside `[0, len)`
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Dictionary lookup beyond the stored entries
    #[error("dictionary id {id} not found ({len} entries stored)")]
    IdNotFound { id: u32, len: usize },

    /// Query issued before `build_index`
    #[error("suffix index has not been built")]
    IndexNotBuilt,

    /// The codec has no entry matching at this token position
    #[error("no codec entry matches at token position {position}")]
    NoCodecMatch { position: usize },

    /// A bucket scatter did not place every member of its range.
    ///
    /// This is an internal invariant violation and is not recoverable.
    #[error("bucket scatter placed {placed} of range {from}..{to}")]
    ConflictingBucket { from: usize, to: usize, placed: usize },

    /// Bucket window must be at least one token
    #[error("window must be at least 1 token")]
    InvalidWindow,

    /// Codec entries must be non-empty and unique
    #[error("invalid codec: {reason}")]
    InvalidCodec { reason: String },

    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("unknown tokenization: {0}")]
    UnknownTokenization(String),

    /// Persisted index does not match its token store
    #[error("corrupt index: {reason}")]
    CorruptIndex { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid codec error
    pub fn invalid_codec<S: Into<String>>(reason: S) -> Self {
        Self::InvalidCodec {
            reason: reason.into(),
        }
    }

    /// Create a corrupt index error
    pub fn corrupt_index<S: Into<String>>(reason: S) -> Self {
        Self::CorruptIndex {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
