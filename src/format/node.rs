//! Tree node format and node-local operations.
//!
//! A node occupies one whole block. Only the first `num_keys` slots of
//! `keys` and `values` carry data; the remaining slots are written as zero.

use crate::error::{Error, Result};
use crate::format::{BLOCK_SIZE, MAX_CHILDREN, MAX_KEYS, NODE_PAYLOAD_SIZE, NULL_BLOCK};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A B-tree node stored in a single block.
///
/// Format:
/// ```text
/// [block_id: u64]           // offset 0
/// [parent_id: u64]          // offset 8, 0 = root
/// [num_keys: u64]           // offset 16
/// [keys: 19 x u64]          // offset 24
/// [values: 19 x u64]        // offset 176
/// [children: 20 x u64]      // offset 328, 0 = absent
/// [padding: 24 bytes]       // offset 488
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Block id this node is stored at
    pub block_id: u64,
    /// Block id of the parent node, 0 for the root
    pub parent_id: u64,
    /// Number of meaningful key/value slots
    pub num_keys: u64,
    /// Keys, strictly increasing over the first `num_keys` slots
    pub keys: [u64; MAX_KEYS],
    /// Values, paired positionally with `keys`
    pub values: [u64; MAX_KEYS],
    /// Child block pointers
    pub children: [u64; MAX_CHILDREN],
}

impl Node {
    /// Create an empty node at the given block
    pub fn new(block_id: u64, parent_id: u64) -> Self {
        Self {
            block_id,
            parent_id,
            num_keys: 0,
            keys: [0; MAX_KEYS],
            values: [0; MAX_KEYS],
            children: [NULL_BLOCK; MAX_CHILDREN],
        }
    }

    /// Create a root node holding a single entry
    pub fn new_root(block_id: u64, key: u64, value: u64) -> Self {
        let mut node = Self::new(block_id, NULL_BLOCK);
        node.keys[0] = key;
        node.values[0] = value;
        node.num_keys = 1;
        node
    }

    /// Number of usable entries.
    ///
    /// Clamped to `MAX_KEYS` so a damaged count never indexes past the arrays.
    pub fn len(&self) -> usize {
        usize::try_from(self.num_keys).map_or(MAX_KEYS, |n| n.min(MAX_KEYS))
    }

    /// Whether the node holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the node has no free key slot left
    pub fn is_full(&self) -> bool {
        self.num_keys >= MAX_KEYS as u64
    }

    /// Look up the value stored for `key`
    pub fn find(&self, key: u64) -> Option<u64> {
        self.keys[..self.len()]
            .iter()
            .position(|&k| k == key)
            .map(|i| self.values[i])
    }

    /// Whether `key` is stored in this node
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Insert a pair keeping the keys sorted.
    ///
    /// The pair goes in front of the first key that is >= `key`. Fails with
    /// `DuplicateKey` if the key is present and `reject_duplicates` is set, or
    /// with `NodeFull` when every slot is taken. The node is untouched on error.
    pub fn insert_sorted(&mut self, key: u64, value: u64, reject_duplicates: bool) -> Result<()> {
        if reject_duplicates && self.contains(key) {
            return Err(Error::DuplicateKey(key));
        }
        if self.is_full() {
            return Err(Error::NodeFull { capacity: MAX_KEYS });
        }

        let len = self.len();
        let idx = self.keys[..len].iter().position(|&k| k >= key).unwrap_or(len);

        self.keys.copy_within(idx..len, idx + 1);
        self.values.copy_within(idx..len, idx + 1);
        self.keys[idx] = key;
        self.values[idx] = value;
        self.num_keys += 1;

        Ok(())
    }

    /// Iterate over the stored `(key, value)` pairs in slot order
    pub fn entries(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        let len = self.len();
        self.keys[..len].iter().copied().zip(self.values[..len].iter().copied())
    }

    /// Encode the node into a full, zero-padded block
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(BLOCK_SIZE);
        buf.put_u64(self.block_id);
        buf.put_u64(self.parent_id);
        buf.put_u64(self.num_keys);
        for key in &self.keys {
            buf.put_u64(*key);
        }
        for value in &self.values {
            buf.put_u64(*value);
        }
        for child in &self.children {
            buf.put_u64(*child);
        }
        debug_assert_eq!(buf.len(), NODE_PAYLOAD_SIZE);
        buf.resize(BLOCK_SIZE, 0);
        buf.freeze()
    }

    /// Decode a node from a block.
    ///
    /// There is no checksum: any 488 bytes decode into some node.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < NODE_PAYLOAD_SIZE {
            return Err(Error::corruption(format!(
                "Node block too short: expected at least {}, got {}",
                NODE_PAYLOAD_SIZE,
                data.len()
            )));
        }

        let mut buf = &data[..NODE_PAYLOAD_SIZE];
        let block_id = buf.get_u64();
        let parent_id = buf.get_u64();
        let num_keys = buf.get_u64();

        let mut node = Self::new(block_id, parent_id);
        node.num_keys = num_keys;
        for key in node.keys.iter_mut() {
            *key = buf.get_u64();
        }
        for value in node.values.iter_mut() {
            *value = buf.get_u64();
        }
        for child in node.children.iter_mut() {
            *child = buf.get_u64();
        }

        Ok(node)
    }
}
