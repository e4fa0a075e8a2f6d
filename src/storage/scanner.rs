//! Sequential block scanner.

use crate::error::{Error, Result};
use crate::format::BLOCK_SIZE;
use crate::storage::block_offset;
use bytes::Bytes;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Reads consecutive blocks from a starting block id up to end of file.
///
/// Yields `(block_id, block)` pairs. A trailing partial block is reported as
/// corruption and ends the scan.
pub struct BlockScanner {
    reader: BufReader<File>,
    next_id: u64,
    end_offset: u64,
    done: bool,
}

impl BlockScanner {
    /// Open a scanner positioned at `first_id`
    pub fn open<P: AsRef<Path>>(path: P, first_id: u64) -> Result<Self> {
        let mut file = File::open(path)?;
        let end_offset = file.metadata()?.len();
        file.seek(SeekFrom::Start(block_offset(first_id)?))?;

        Ok(Self {
            reader: BufReader::with_capacity(BLOCK_SIZE * 16, file),
            next_id: first_id,
            end_offset,
            done: false,
        })
    }

    fn read_next(&mut self) -> Result<Option<(u64, Bytes)>> {
        let offset = block_offset(self.next_id)?;
        if offset >= self.end_offset {
            return Ok(None);
        }
        if self.end_offset - offset < BLOCK_SIZE as u64 {
            return Err(Error::corruption(format!(
                "Partial block {} at end of file ({} of {} bytes)",
                self.next_id,
                self.end_offset - offset,
                BLOCK_SIZE
            )));
        }

        let mut buf = vec![0u8; BLOCK_SIZE];
        self.reader.read_exact(&mut buf)?;

        let id = self.next_id;
        self.next_id += 1;
        Ok(Some((id, Bytes::from(buf))))
    }
}

impl Iterator for BlockScanner {
    type Item = Result<(u64, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
