//! CSV import/export line format.
//!
//! Each line holds one pair as `key<delim>value`, both unsigned decimal
//! integers. Lines without the delimiter are not data and are skipped by the
//! loader.

use crate::error::{Error, Result};

/// Format one pair as a CSV line, newline included
pub fn format_line(key: u64, value: u64, delimiter: u8) -> String {
    format!("{}{}{}\n", key, delimiter as char, value)
}

/// Parse one CSV line.
///
/// Returns `Ok(None)` for lines that do not contain the delimiter. `line_no`
/// is 1-based and only used for error messages.
pub fn parse_line(line: &str, delimiter: u8, line_no: usize) -> Result<Option<(u64, u64)>> {
    let delimiter = delimiter as char;
    if !line.contains(delimiter) {
        return Ok(None);
    }

    let mut fields = line.trim().split(delimiter);
    let (key, value) = match (fields.next(), fields.next(), fields.next()) {
        (Some(k), Some(v), None) => (k, v),
        _ => {
            return Err(Error::Parse {
                line: line_no,
                message: format!("expected 2 fields, got {}", line.trim().split(delimiter).count()),
            })
        }
    };

    Ok(Some((parse_field(key, "key", line_no)?, parse_field(value, "value", line_no)?)))
}

fn parse_field(field: &str, name: &str, line_no: usize) -> Result<u64> {
    field.trim().parse::<u64>().map_err(|e| Error::Parse {
        line: line_no,
        message: format!("invalid {} {:?}: {}", name, field.trim(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(1, 2, b','), "1,2\n");
        assert_eq!(format_line(u64::MAX, 0, b';'), format!("{};0\n", u64::MAX));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("10,20\n", b',', 1).unwrap(), Some((10, 20)));
        assert_eq!(parse_line("  7 , 8 \r\n", b',', 1).unwrap(), Some((7, 8)));
        assert_eq!(parse_line("3|4", b'|', 1).unwrap(), Some((3, 4)));
    }

    #[test]
    fn test_parse_line_without_delimiter() {
        assert_eq!(parse_line("\n", b',', 1).unwrap(), None);
        assert_eq!(parse_line("key value", b',', 1).unwrap(), None);
        assert_eq!(parse_line("", b',', 1).unwrap(), None);
    }

    #[test]
    fn test_parse_line_errors() {
        let err = parse_line("1,2,3", b',', 4).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));

        let err = parse_line("abc,2", b',', 2).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        assert!(err.to_string().contains("key"));

        let err = parse_line("1,-2", b',', 9).unwrap_err();
        assert!(err.to_string().contains("value"));

        assert!(parse_line("1,", b',', 1).is_err());
    }
}
