//! Basic usage example for blockidx
//!
//! This example demonstrates the fundamental operations:
//! - Creating an index file
//! - Inserting key-value pairs
//! - Searching for keys
//! - Exporting to and importing from CSV

use blockidx::{BTreeIndex, Error, Options};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let dir = std::env::temp_dir().join("blockidx_basic_example");
    std::fs::create_dir_all(&dir)?;
    let index_path = dir.join("example.idx");
    let csv_path = dir.join("example.csv");
    let copy_path = dir.join("copy.idx");
    for path in [&index_path, &csv_path, &copy_path] {
        let _ = std::fs::remove_file(path);
    }

    let index = BTreeIndex::create(&index_path, Options::default())?;
    println!("Index created at {}", index_path.display());

    // Insert some key-value pairs (stored sorted regardless of order)
    println!("Writing data...");
    for (key, value) in [(15, 150), (3, 30), (8, 80)] {
        let outcome = index.insert(key, value)?;
        println!("  {} => {} (block {})", key, value, outcome.block_id());
    }

    // Inserting an existing key is refused
    match index.insert(3, 999) {
        Err(Error::DuplicateKey(k)) => println!("Key {} already exists", k),
        other => println!("Unexpected result: {:?}", other),
    }

    // Read values
    println!("Reading data...");
    if let Some(value) = index.search(8)? {
        println!("8 => {}", value);
    }
    if index.search(4)?.is_none() {
        println!("4 was not found");
    }

    // Dump everything
    for entry in index.iter()? {
        let (key, value) = entry?;
        println!("{}: {}", key, value);
    }

    // Round trip through CSV into a second index
    let rows = index.extract(&csv_path)?;
    println!("Extracted {} rows to {}", rows, csv_path.display());

    let copy = BTreeIndex::create(&copy_path, Options::default())?;
    let report = copy.load_csv(&csv_path)?;
    println!("Loaded {} rows into {}", report.inserted, copy_path.display());

    Ok(())
}
