//! Block store over a single index file.
//!
//! The store keeps no file handle between calls: every read or write opens the
//! file, seeks to `block_id * BLOCK_SIZE`, performs the operation and closes it
//! again. Nothing is cached, so two `BlockStore` values on the same path
//! always observe the file as it currently is on disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blockidx::format::{Header, BLOCK_SIZE};
//! use blockidx::storage::BlockStore;
//!
//! # fn main() -> Result<(), blockidx::Error> {
//! let store = BlockStore::new("data.idx");
//! store.create_new(&Header::default().encode())?;
//!
//! let block = store.read_block(0)?;
//! assert_eq!(block.len(), BLOCK_SIZE);
//! # Ok(())
//! # }
//! ```

pub mod scanner;

pub use scanner::BlockScanner;

use crate::error::{Error, Result};
use crate::format::BLOCK_SIZE;
use bytes::Bytes;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Byte offset of a block in the file.
///
/// Block ids come straight from disk, so an id whose offset does not fit in
/// a `u64` is reported as corruption.
pub fn block_offset(block_id: u64) -> Result<u64> {
    block_id.checked_mul(BLOCK_SIZE as u64).ok_or_else(|| {
        Error::corruption(format!("Block id {} is out of addressable range", block_id))
    })
}

/// Stateless fixed-size block reader/writer for one file path.
#[derive(Debug, Clone)]
pub struct BlockStore {
    path: PathBuf,
    sync_writes: bool,
}

impl BlockStore {
    /// Create a store for the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), sync_writes: false }
    }

    /// Fsync the file after every write
    pub fn with_sync(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read one block.
    ///
    /// Fails with an I/O error if the file is missing or ends before the
    /// block does.
    pub fn read_block(&self, block_id: u64) -> Result<Bytes> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(block_offset(block_id)?))?;

        let mut buf = vec![0u8; BLOCK_SIZE];
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                log::debug!("Short read of block {} in {:?}", block_id, self.path);
            }
            Error::Io(e)
        })?;

        log::trace!("Read block {} from {:?}", block_id, self.path);
        Ok(Bytes::from(buf))
    }

    /// Write one block in place. `data` must be exactly one block long.
    pub fn write_block(&self, block_id: u64, data: &[u8]) -> Result<()> {
        Self::check_block_len(data)?;

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(block_offset(block_id)?))?;
        file.write_all(data)?;
        if self.sync_writes {
            file.sync_all()?;
        }

        log::trace!("Wrote block {} to {:?}", block_id, self.path);
        Ok(())
    }

    /// Create the file exclusively and write `data` as block 0.
    ///
    /// Fails with `AlreadyExists` if anything is already at the path.
    pub fn create_new(&self, data: &[u8]) -> Result<()> {
        Self::check_block_len(data)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::already_exists(format!("{}", self.path.display())));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        file.write_all(data)?;
        if self.sync_writes {
            file.sync_all()?;
        }

        log::debug!("Created block file {:?}", self.path);
        Ok(())
    }

    /// Number of whole blocks in the file, header included
    pub fn num_blocks(&self) -> Result<u64> {
        let len = std::fs::metadata(&self.path)?.len();
        let block_size = BLOCK_SIZE as u64;
        if len % block_size != 0 {
            return Err(Error::corruption(format!(
                "File size {} is not a multiple of the block size {}",
                len, block_size
            )));
        }
        Ok(len / block_size)
    }

    /// Sequentially read every block from `first_id` to the end of the file.
    ///
    /// The scanner holds its own handle for the duration of the scan.
    pub fn scan_from(&self, first_id: u64) -> Result<BlockScanner> {
        BlockScanner::open(&self.path, first_id)
    }

    fn check_block_len(data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(Error::invalid_argument(format!(
                "Block payload must be {} bytes, got {}",
                BLOCK_SIZE,
                data.len()
            )));
        }
        Ok(())
    }
}
