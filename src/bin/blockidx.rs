//! blockidx command line tool.
//!
//! One subcommand per invocation, each operating on one index file.

use anyhow::{Context, Result};
use blockidx::{BTreeIndex, Error, InsertOutcome, Options};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "blockidx", version, about = "Single-file block-addressed key/value index")]
struct Cli {
    /// Accept keys that are already stored instead of refusing them
    #[arg(long, global = true)]
    no_duplicate_check: bool,

    /// Fsync the index file after every block write
    #[arg(long, global = true)]
    sync: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new, empty index file
    Create { file: PathBuf },
    /// Insert one key/value pair
    Insert { file: PathBuf, key: u64, value: u64 },
    /// Look up the value stored for a key
    Search { file: PathBuf, key: u64 },
    /// Print every stored pair in on-disk order
    Print { file: PathBuf },
    /// Write every stored pair to a new CSV file
    Extract { file: PathBuf, csv: PathBuf },
    /// Insert every row of an existing CSV file
    Load { file: PathBuf, csv: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let options = Options::new().check_duplicates(!cli.no_duplicate_check).sync_writes(cli.sync);

    match run(cli.command, options) {
        Ok(code) => code,
        Err(e) => {
            log::debug!("{:?}", e);
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, options: Options) -> Result<ExitCode> {
    match command {
        Command::Create { file } => match BTreeIndex::create(&file, options) {
            Ok(_) => println!("Created index file {}", file.display()),
            Err(Error::AlreadyExists(_)) => return Ok(fail("Error: file already exists")),
            Err(e) => return Err(e).context("failed to create index file"),
        },

        Command::Insert { file, key, value } => {
            let index = BTreeIndex::attach(&file, options)?;
            report_insert(index.insert(key, value), key, value)?;
        }

        Command::Search { file, key } => {
            let index = BTreeIndex::attach(&file, options)?;
            match index.search(key).context("search failed")? {
                Some(value) => println!("Found: key={}, value={}", key, value),
                None => println!("Error: key {} not found", key),
            }
        }

        Command::Print { file } => {
            let index = BTreeIndex::attach(&file, options)?;
            for entry in index.iter().context("failed to scan index")? {
                let (key, value) = entry?;
                println!("{}: {}", key, value);
            }
        }

        Command::Extract { file, csv } => {
            let index = BTreeIndex::attach(&file, options)?;
            match index.extract(&csv) {
                Ok(_) => println!("Extracted index data to {}", csv.display()),
                Err(Error::AlreadyExists(_)) => {
                    return Ok(fail("Error: output file already exists"));
                }
                Err(e) => return Err(e).context("failed to extract index"),
            }
        }

        Command::Load { file, csv } => {
            let index = match BTreeIndex::open(&file, options) {
                Ok(index) => index,
                Err(Error::NotFound(_) | Error::InvalidFormat(_) | Error::Io(_)) => {
                    return Ok(fail("Error: file is not a valid index file"));
                }
                Err(e) => return Err(e.into()),
            };
            match index.load_csv(&csv) {
                Ok(report) => {
                    for key in &report.duplicates {
                        println!("Key {} already exists", key);
                    }
                    for key in &report.rejected_full {
                        println!("Insertion failed for key {}: Node full.", key);
                    }
                    println!("Loaded data from {}", csv.display());
                }
                Err(Error::NotFound(_)) => return Ok(fail("Error: CSV file does not exist")),
                Err(e) => return Ok(fail(&format!("Error loading CSV: {}", e))),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_insert(result: blockidx::Result<InsertOutcome>, key: u64, value: u64) -> Result<()> {
    match result {
        Ok(InsertOutcome::NewRoot { block_id }) => {
            println!("Inserted root key {}, value {} into block {}", key, value, block_id);
        }
        Ok(InsertOutcome::Inserted { .. }) => {
            println!("Inserted key {}, value {} into root node", key, value);
        }
        Err(Error::DuplicateKey(k)) => println!("Key {} already exists", k),
        Err(Error::NodeFull { .. }) => println!(
            "Insertion failed: Node full. Splitting not implemented in this simplified version."
        ),
        Err(e) => return Err(e).context("insert failed"),
    }
    Ok(())
}

fn fail(message: &str) -> ExitCode {
    println!("{}", message);
    ExitCode::FAILURE
}
