//! Error types for the blockidx index.

use std::io;
use thiserror::Error;

/// The result type used throughout blockidx.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for index operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred while opening, seeking, reading or writing a file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid index file (header magic mismatch).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A file that must not exist yet is already present.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A required input file is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The key is already stored in the root node.
    #[error("Key {0} already exists")]
    DuplicateKey(u64),

    /// The root node holds its maximum number of keys and cannot be split.
    #[error("Node full: capacity of {capacity} keys reached, splitting not implemented")]
    NodeFull {
        /// Maximum number of keys a node can hold.
        capacity: usize,
    },

    /// A CSV row could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number in the CSV input.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The file layout is damaged in a way the codecs can detect.
    #[error("Data corruption: {0}")]
    Corruption(String),
}

impl Error {
    /// Creates a new invalid format error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Creates a new already exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Error::AlreadyExists(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Returns true for per-key business rejections (duplicate key, full node).
    ///
    /// A bulk load records these and moves on to the next row; every other
    /// error aborts it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::DuplicateKey(_) | Error::NodeFull { .. })
    }
}
