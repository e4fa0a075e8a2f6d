//! Index engine.
//!
//! `BTreeIndex` ties the header and node codecs to the block store. It holds
//! only a path and options; every operation re-reads the header from disk,
//! so the root id and block allocator are read-modify-write state of the
//! file rather than of the process.

use crate::config::Options;
use crate::csv;
use crate::error::{Error, Result};
use crate::format::{Header, Node};
use crate::iterator::EntryIterator;
use crate::storage::BlockStore;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Where an inserted pair ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The tree was empty; a new root node was allocated for the pair.
    NewRoot {
        /// Block id of the new root
        block_id: u64,
    },
    /// The pair was placed into the existing root node.
    Inserted {
        /// Block id of the root
        block_id: u64,
    },
}

impl InsertOutcome {
    /// Block id of the node that received the pair
    pub fn block_id(&self) -> u64 {
        match self {
            InsertOutcome::NewRoot { block_id } | InsertOutcome::Inserted { block_id } => *block_id,
        }
    }
}

/// Per-row results of a CSV bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows inserted successfully
    pub inserted: usize,
    /// Keys refused because they were already stored
    pub duplicates: Vec<u64>,
    /// Keys refused because the root node was full
    pub rejected_full: Vec<u64>,
    /// Lines without a delimiter
    pub skipped_lines: usize,
}

impl LoadReport {
    /// Total number of data rows seen (inserted or refused)
    pub fn rows(&self) -> usize {
        self.inserted + self.duplicates.len() + self.rejected_full.len()
    }
}

/// A single-file block index.
///
/// # Example
///
/// ```rust,no_run
/// use blockidx::{BTreeIndex, Options};
///
/// # fn main() -> Result<(), blockidx::Error> {
/// let index = BTreeIndex::create("./data.idx", Options::default())?;
/// index.insert(42, 100)?;
/// assert_eq!(index.search(42)?, Some(100));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    store: BlockStore,
    options: Options,
}

impl BTreeIndex {
    /// Create a new, empty index file.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a file is already present at `path`.
    pub fn create<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        options.validate()?;
        let store = BlockStore::new(path).with_sync(options.sync_writes);

        if store.exists() {
            return Err(Error::already_exists(format!(
                "Index file already exists: {:?}",
                store.path()
            )));
        }
        store.create_new(&Header::default().encode())?;

        log::info!("Created index file {:?}", store.path());
        Ok(Self { store, options })
    }

    /// Open an existing index file, validating its header.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is missing and `InvalidFormat` if the
    /// header magic does not match.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let index = Self::attach(path, options)?;
        if !index.store.exists() {
            return Err(Error::not_found(format!(
                "Index file does not exist: {:?}",
                index.store.path()
            )));
        }
        index.header()?;
        Ok(index)
    }

    /// Bind to a path without touching the file.
    ///
    /// Every later operation validates the header itself.
    pub fn attach<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        options.validate()?;
        let store = BlockStore::new(path).with_sync(options.sync_writes);
        Ok(Self { store, options })
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Options this index was opened with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Read and validate the header block
    pub fn header(&self) -> Result<Header> {
        let block = self.store.read_block(0)?;
        Header::decode(&block)
    }

    /// Read the root node, or `None` if the tree is empty
    pub fn root(&self) -> Result<Option<Node>> {
        let header = self.header()?;
        if header.is_empty() {
            return Ok(None);
        }
        self.read_node(header.root_id).map(Some)
    }

    fn read_node(&self, block_id: u64) -> Result<Node> {
        let block = self.store.read_block(block_id)?;
        Node::decode(&block)
    }

    fn write_node(&self, node: &Node) -> Result<()> {
        self.store.write_block(node.block_id, &node.encode())
    }

    /// Insert a key/value pair.
    ///
    /// The first insert into an empty tree allocates the root. Later inserts
    /// go into the root in key order; a full root refuses the pair, since
    /// node splitting is not implemented.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the key is stored and duplicate checking is on,
    /// `NodeFull` if the root already holds the maximum number of keys. The
    /// file is unchanged in both cases.
    pub fn insert(&self, key: u64, value: u64) -> Result<InsertOutcome> {
        let mut header = self.header()?;

        if header.is_empty() {
            let block_id = header.allocate()?;
            let num_blocks = self.store.num_blocks()?;
            if block_id == 0 || block_id > num_blocks {
                return Err(Error::corruption(format!(
                    "Next block id {} is outside the file ({} blocks)",
                    block_id, num_blocks
                )));
            }
            let root = Node::new_root(block_id, key, value);
            // Node first: a crash in between leaves an unreferenced block,
            // never a header pointing past the end of the file.
            self.write_node(&root)?;
            header.root_id = block_id;
            self.store.write_block(0, &header.encode())?;

            log::debug!("Allocated root block {} for key {}", block_id, key);
            return Ok(InsertOutcome::NewRoot { block_id });
        }

        let mut root = self.read_node(header.root_id)?;
        if let Err(e) = root.insert_sorted(key, value, self.options.check_duplicates) {
            log::debug!("Insert of key {} refused: {}", key, e);
            return Err(e);
        }
        self.write_node(&root)?;

        log::debug!("Inserted key {} into block {} ({} keys)", key, root.block_id, root.num_keys);
        Ok(InsertOutcome::Inserted { block_id: root.block_id })
    }

    /// Look up the value stored for `key`.
    ///
    /// Only the root node is consulted. Returns `None` on a miss or an
    /// empty tree.
    pub fn search(&self, key: u64) -> Result<Option<u64>> {
        let header = self.header()?;
        if header.is_empty() {
            return Ok(None);
        }
        let root = self.read_node(header.root_id)?;
        Ok(root.find(key))
    }

    /// Iterate over every stored pair in on-disk order.
    ///
    /// Every block from 1 to the end of the file is decoded as a node.
    pub fn iter(&self) -> Result<EntryIterator> {
        self.header()?;
        Ok(EntryIterator::new(self.store.scan_from(1)?))
    }

    /// Collect every stored pair in on-disk order
    pub fn entries(&self) -> Result<Vec<(u64, u64)>> {
        self.iter()?.collect()
    }

    /// Write every stored pair to a new CSV file.
    ///
    /// Returns the number of rows written. If the scan or a write fails
    /// part way, the partial output is removed again.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if `output` is already present; it is never
    /// overwritten.
    pub fn extract<P: AsRef<Path>>(&self, output: P) -> Result<usize> {
        let output = output.as_ref();
        if output.exists() {
            return Err(Self::output_exists(output));
        }
        let entries = self.iter()?;

        let file = match OpenOptions::new().write(true).create_new(true).open(output) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Self::output_exists(output));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        match self.write_rows(file, entries) {
            Ok(rows) => {
                log::info!("Extracted {} rows from {:?} to {:?}", rows, self.path(), output);
                Ok(rows)
            }
            Err(e) => {
                log::warn!("Extract to {:?} failed, removing partial output: {}", output, e);
                if let Err(rm) = std::fs::remove_file(output) {
                    log::warn!("Could not remove {:?}: {}", output, rm);
                }
                Err(e)
            }
        }
    }

    fn write_rows(&self, file: File, entries: EntryIterator) -> Result<usize> {
        let mut writer = BufWriter::new(file);

        let mut rows = 0;
        for entry in entries {
            let (key, value) = entry?;
            writer.write_all(csv::format_line(key, value, self.options.csv_delimiter).as_bytes())?;
            rows += 1;
        }
        writer.flush()?;
        if self.options.sync_writes {
            writer.get_ref().sync_all()?;
        }
        Ok(rows)
    }

    fn output_exists(output: &Path) -> Error {
        Error::already_exists(format!("Output file already exists: {:?}", output))
    }

    /// Insert every row of a CSV file.
    ///
    /// Rows refused as duplicates or for lack of space are recorded in the
    /// report and the load carries on. A malformed row or an I/O failure
    /// aborts the load; rows before it stay inserted.
    ///
    /// # Errors
    ///
    /// `NotFound` if `csv_path` does not exist, `Parse` for a malformed row.
    pub fn load_csv<P: AsRef<Path>>(&self, csv_path: P) -> Result<LoadReport> {
        let csv_path = csv_path.as_ref();
        if !csv_path.exists() {
            return Err(Error::not_found(format!("CSV file does not exist: {:?}", csv_path)));
        }
        self.header()?;

        let reader = BufReader::new(File::open(csv_path)?);
        let mut report = LoadReport::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;

            let (key, value) = match csv::parse_line(&line, self.options.csv_delimiter, line_no)? {
                Some(pair) => pair,
                None => {
                    report.skipped_lines += 1;
                    continue;
                }
            };

            match self.insert(key, value) {
                Ok(_) => report.inserted += 1,
                Err(e) if e.is_rejection() => {
                    log::warn!("Line {}: key {} not inserted: {}", line_no, key, e);
                    match e {
                        Error::DuplicateKey(k) => report.duplicates.push(k),
                        _ => report.rejected_full.push(key),
                    }
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Loaded {:?}: {} inserted, {} duplicates, {} rejected",
            csv_path,
            report.inserted,
            report.duplicates.len(),
            report.rejected_full.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{BLOCK_SIZE, MAX_KEYS};
    use tempfile::TempDir;

    fn new_index(dir: &TempDir) -> BTreeIndex {
        BTreeIndex::create(dir.path().join("test.idx"), Options::default()).unwrap()
    }

    #[test]
    fn test_create_writes_header() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);

        let bytes = std::fs::read(index.path()).unwrap();
        assert_eq!(bytes.len(), BLOCK_SIZE);
        assert_eq!(&bytes[..8], b"4348PRJ3");
        assert_eq!(index.header().unwrap(), Header::new(0, 1));
        assert!(index.root().unwrap().is_none());
    }

    #[test]
    fn test_create_existing() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);
        index.insert(1, 1).unwrap();

        let result = BTreeIndex::create(index.path(), Options::default());
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        // Existing data survives
        assert_eq!(index.search(1).unwrap(), Some(1));
    }

    #[test]
    fn test_first_insert_allocates_root() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);

        let outcome = index.insert(42, 100).unwrap();
        assert_eq!(outcome, InsertOutcome::NewRoot { block_id: 1 });
        assert_eq!(index.header().unwrap(), Header::new(1, 2));

        let outcome = index.insert(7, 70).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted { block_id: 1 });
        assert_eq!(index.header().unwrap(), Header::new(1, 2));
    }

    #[test]
    fn test_insert_ordering() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);

        index.insert(5, 50).unwrap();
        index.insert(1, 10).unwrap();
        index.insert(3, 30).unwrap();

        let root = index.root().unwrap().unwrap();
        assert_eq!(root.num_keys, 3);
        assert_eq!(&root.keys[..3], &[1, 3, 5]);
        assert_eq!(&root.values[..3], &[10, 30, 50]);
    }

    #[test]
    fn test_duplicate_key() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);

        index.insert(9, 1).unwrap();
        index.insert(4, 2).unwrap();
        let result = index.insert(9, 3);
        assert!(matches!(result, Err(Error::DuplicateKey(9))));

        let root = index.root().unwrap().unwrap();
        assert_eq!(root.num_keys, 2);
        assert_eq!(index.search(9).unwrap(), Some(1));
    }

    #[test]
    fn test_duplicates_without_check() {
        let dir = TempDir::new().unwrap();
        let index = BTreeIndex::create(
            dir.path().join("test.idx"),
            Options::default().check_duplicates(false),
        )
        .unwrap();

        index.insert(9, 1).unwrap();
        index.insert(9, 2).unwrap();

        let root = index.root().unwrap().unwrap();
        assert_eq!(root.num_keys, 2);
        // The newer pair sits first, so a search finds it
        assert_eq!(index.search(9).unwrap(), Some(2));
    }

    #[test]
    fn test_capacity_ceiling() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);

        for k in 0..MAX_KEYS as u64 {
            index.insert(k * 2, k).unwrap();
        }
        let before = std::fs::read(index.path()).unwrap();

        let result = index.insert(1, 1);
        assert!(matches!(result, Err(Error::NodeFull { capacity: MAX_KEYS })));
        assert_eq!(std::fs::read(index.path()).unwrap(), before);
    }

    #[test]
    fn test_search() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);
        assert_eq!(index.search(42).unwrap(), None);

        index.insert(42, 100).unwrap();
        assert_eq!(index.search(42).unwrap(), Some(100));
        assert_eq!(index.search(99).unwrap(), None);
    }

    #[test]
    fn test_entries() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);
        assert!(index.entries().unwrap().is_empty());

        index.insert(2, 20).unwrap();
        index.insert(1, 10).unwrap();
        assert_eq!(index.entries().unwrap(), vec![(1, 10), (2, 20)]);
    }

    #[test]
    fn test_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.idx");

        assert!(matches!(BTreeIndex::open(&path, Options::default()), Err(Error::NotFound(_))));

        BTreeIndex::create(&path, Options::default()).unwrap();
        assert!(BTreeIndex::open(&path, Options::default()).is_ok());

        let bad = dir.path().join("bad.idx");
        std::fs::write(&bad, vec![0u8; BLOCK_SIZE]).unwrap();
        assert!(matches!(
            BTreeIndex::open(&bad, Options::default()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_options() {
        let dir = TempDir::new().unwrap();
        let result =
            BTreeIndex::create(dir.path().join("t.idx"), Options::default().csv_delimiter(b'1'));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(!dir.path().join("t.idx").exists());
    }

    #[test]
    fn test_load_report() {
        let dir = TempDir::new().unwrap();
        let index = new_index(&dir);
        let csv_path = dir.path().join("in.csv");
        std::fs::write(&csv_path, "1,10\nheader line\n2,20\n1,11\n\n").unwrap();

        let report = index.load_csv(&csv_path).unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, vec![1]);
        assert!(report.rejected_full.is_empty());
        assert_eq!(report.skipped_lines, 2);
        assert_eq!(report.rows(), 3);
    }
}
