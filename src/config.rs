//! Configuration options for blockidx.

/// Configuration options for opening an index file.
#[derive(Debug, Clone)]
pub struct Options {
    /// Refuse to insert a key that is already stored.
    /// Disabling this reproduces the older, duplicate-blind insert path.
    /// Default: true
    pub check_duplicates: bool,

    /// Fsync the index file after every block write.
    /// Default: false
    pub sync_writes: bool,

    /// Field separator used by CSV import and export.
    /// Default: b','
    pub csv_delimiter: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_duplicates: true,
            sync_writes: false,
            csv_delimiter: b',',
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether duplicate keys are rejected on insert.
    pub fn check_duplicates(mut self, value: bool) -> Self {
        self.check_duplicates = value;
        self
    }

    /// Sets whether every block write is followed by an fsync.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets the CSV field separator.
    pub fn csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        let d = self.csv_delimiter;
        if !d.is_ascii() || d.is_ascii_digit() || d.is_ascii_whitespace() {
            return Err(crate::Error::invalid_argument(
                "csv_delimiter must be an ASCII character that is not a digit or whitespace",
            ));
        }
        if d == b'-' || d == b'+' {
            return Err(crate::Error::invalid_argument(
                "csv_delimiter must not be a sign character",
            ));
        }
        Ok(())
    }
}
