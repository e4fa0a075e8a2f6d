//! On-disk block format.
//!
//! An index file is a sequence of fixed-size blocks. Block 0 holds the file
//! header, every later block holds one tree node. All integers are big-endian.
//!
//! ## File Format
//!
//! ```text
//! [Block 0: Header]   magic | root_id | next_block_id | zero padding
//! [Block 1: Node]     block_id | parent_id | num_keys | keys | values | children | padding
//! ...
//! [Block N: Node]
//! ```
//!
//! The byte offset of a block is `block_id * BLOCK_SIZE`.

pub mod header;
pub mod node;

pub use header::Header;
pub use node::Node;

/// Size of every block in the file.
pub const BLOCK_SIZE: usize = 512;

/// Magic tag stored in the first 8 bytes of the header block.
pub const MAGIC: &[u8; 8] = b"4348PRJ3";

/// Encoded size of the header payload (magic + root id + next block id).
pub const HEADER_SIZE: usize = 24;

/// Maximum number of keys (and values) stored in one node.
pub const MAX_KEYS: usize = 19;

/// Maximum number of child pointers stored in one node.
pub const MAX_CHILDREN: usize = MAX_KEYS + 1;

/// Encoded size of a node payload before padding.
pub const NODE_PAYLOAD_SIZE: usize = 24 + MAX_KEYS * 8 * 2 + MAX_CHILDREN * 8;

/// Block id reserved for the header; as a root or child pointer it means "none".
pub const NULL_BLOCK: u64 = 0;

const _: () = assert!(NODE_PAYLOAD_SIZE <= BLOCK_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(NODE_PAYLOAD_SIZE, 488);
        assert_eq!(MAGIC.len(), 8);
        assert_eq!(MAX_CHILDREN, 20);
    }
}
