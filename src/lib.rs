//! # blockidx - A Single-File Block Index
//!
//! blockidx stores `u64` keys and values in a single file made of fixed-size
//! 512-byte blocks. Block 0 is the file header; every other block is one
//! B-tree node holding up to 19 sorted key/value pairs and 20 child pointers.
//!
//! ## Architecture
//!
//! - **Format**: big-endian codecs for the header and node blocks
//! - **Storage**: stateless block reads/writes, one open/seek/close per call
//! - **Index**: create, insert, search, scan, CSV extract and CSV load
//!
//! No state is kept in memory between calls. The root id and the block
//! allocator live in the header and are re-read by every operation.
//!
//! Only the root node ever receives keys; node splitting is not implemented,
//! so an index holds at most [`format::MAX_KEYS`] entries.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use blockidx::{BTreeIndex, Options};
//!
//! # fn main() -> Result<(), blockidx::Error> {
//! let index = BTreeIndex::create("./data.idx", Options::default())?;
//!
//! index.insert(15, 100)?;
//! index.insert(7, 200)?;
//!
//! if let Some(value) = index.search(7)? {
//!     println!("Found: {}", value);
//! }
//!
//! index.extract("./data.csv")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod csv;
pub mod error;
pub mod format;
pub mod index;
pub mod iterator;
pub mod storage;

// Re-exports
pub use config::Options;
pub use error::{Error, Result};
pub use index::{BTreeIndex, InsertOutcome, LoadReport};
pub use iterator::EntryIterator;
