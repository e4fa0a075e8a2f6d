//! Index file header.
//!
//! The header is a 24-byte structure at the start of block 0 that records
//! where the root node lives and which block id will be handed out next.

use crate::error::{Error, Result};
use crate::format::{BLOCK_SIZE, HEADER_SIZE, MAGIC, NULL_BLOCK};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Header stored in block 0.
///
/// Format:
/// ```text
/// [magic: 8 bytes]          // "4348PRJ3"
/// [root_id: u64 BE]         // 0 = empty tree
/// [next_block_id: u64 BE]   // allocator counter, starts at 1
/// [padding: 488 bytes]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Block id of the root node, or 0 if the tree is empty
    pub root_id: u64,
    /// Next block id to allocate; only ever increases
    pub next_block_id: u64,
}

impl Default for Header {
    fn default() -> Self {
        Self { root_id: NULL_BLOCK, next_block_id: 1 }
    }
}

impl Header {
    /// Create a new Header
    pub fn new(root_id: u64, next_block_id: u64) -> Self {
        Self { root_id, next_block_id }
    }

    /// Whether no root node has been allocated yet
    pub fn is_empty(&self) -> bool {
        self.root_id == NULL_BLOCK
    }

    /// Hand out the next block id and advance the counter.
    ///
    /// Fails with `Corruption` if the counter cannot advance.
    pub fn allocate(&mut self) -> Result<u64> {
        let id = self.next_block_id;
        self.next_block_id = id.checked_add(1).ok_or_else(|| {
            Error::corruption(format!("Block allocator exhausted at id {}", id))
        })?;
        Ok(id)
    }

    /// Encode the header into a full, zero-padded block
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(BLOCK_SIZE);
        buf.put_slice(MAGIC);
        buf.put_u64(self.root_id);
        buf.put_u64(self.next_block_id);
        buf.resize(BLOCK_SIZE, 0);
        buf.freeze()
    }

    /// Decode a header from the start of a block
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE || &data[..MAGIC.len()] != MAGIC {
            return Err(Error::invalid_format("invalid index file"));
        }

        let mut buf = &data[MAGIC.len()..HEADER_SIZE];
        let root_id = buf.get_u64();
        let next_block_id = buf.get_u64();

        Ok(Self { root_id, next_block_id })
    }
}
