//! Full-file scan over stored key/value pairs.
//!
//! Walks every node block from block 1 to the end of the file and yields the
//! first `num_keys` entries of each node in stored order.

use crate::error::Result;
use crate::format::{Node, MAX_KEYS};
use crate::storage::BlockScanner;

/// An iterator over `(key, value)` pairs across all node blocks.
///
/// Entries come out one node at a time, in the order the nodes sit on disk
/// and, within a node, in slot order.
///
/// # Example
///
/// ```rust,no_run
/// use blockidx::{BTreeIndex, Options};
///
/// # fn main() -> Result<(), blockidx::Error> {
/// let index = BTreeIndex::open("./data.idx", Options::default())?;
///
/// for entry in index.iter()? {
///     let (key, value) = entry?;
///     println!("{}: {}", key, value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EntryIterator {
    scanner: BlockScanner,
    /// Entries of the node currently being drained
    pending: Vec<(u64, u64)>,
    position: usize,
    failed: bool,
}

impl EntryIterator {
    pub(crate) fn new(scanner: BlockScanner) -> Self {
        Self { scanner, pending: Vec::with_capacity(MAX_KEYS), position: 0, failed: false }
    }

    fn load_next_node(&mut self) -> Option<Result<()>> {
        let (block_id, block) = match self.scanner.next()? {
            Ok(item) => item,
            Err(e) => return Some(Err(e)),
        };
        match Node::decode(&block) {
            Ok(node) => {
                log::trace!("Scanned block {} with {} keys", block_id, node.len());
                self.pending.clear();
                self.pending.extend(node.entries());
                self.position = 0;
                Some(Ok(()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl Iterator for EntryIterator {
    type Item = Result<(u64, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.position >= self.pending.len() {
            match self.load_next_node()? {
                Ok(()) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        let entry = self.pending[self.position];
        self.position += 1;
        Some(Ok(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Header, BLOCK_SIZE};
    use crate::storage::BlockStore;
    use tempfile::TempDir;

    #[test]
    fn test_iterates_all_nodes_in_block_order() {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::new(dir.path().join("t.idx"));
        store.create_new(&Header::new(1, 4).encode()).unwrap();

        let mut first = Node::new_root(1, 10, 100);
        first.insert_sorted(5, 50, true).unwrap();
        let empty = Node::new(2, 1);
        let third = Node::new_root(3, 1, 11);

        store.write_block(1, &first.encode()).unwrap();
        store.write_block(2, &empty.encode()).unwrap();
        store.write_block(3, &third.encode()).unwrap();

        let entries: Vec<_> = EntryIterator::new(store.scan_from(1).unwrap())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries, vec![(5, 50), (10, 100), (1, 11)]);
    }

    #[test]
    fn test_stops_after_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.idx");
        let mut data = Header::new(1, 2).encode().to_vec();
        data.extend_from_slice(&Node::new_root(1, 3, 4).encode());
        data.extend_from_slice(&[0u8; BLOCK_SIZE / 2]);
        std::fs::write(&path, data).unwrap();

        let mut iter = EntryIterator::new(BlockStore::new(&path).scan_from(1).unwrap());
        assert_eq!(iter.next().unwrap().unwrap(), (3, 4));
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
