//! Range file parsing.
//!
//! Each useful line holds two whitespace-separated IPv4 addresses forming an
//! inclusive range, or a single CIDR block. Blank lines, `#` comments and
//! anything unparseable are skipped.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use livesweep_core::AddressRange;

use crate::error::{Result, ScanError};

/// Parse ranges from any reader. Invalid UTF-8 is replaced, not rejected.
pub fn parse_ranges<R: Read>(reader: R) -> Result<Vec<AddressRange>> {
    let mut reader = BufReader::new(reader);
    let mut ranges = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&buf);
        match parse_line(&text) {
            LineKind::Range(range) => ranges.push(range),
            LineKind::Ignored => {}
            LineKind::Malformed => {
                tracing::debug!(line = line_no, content = %text.trim(), "Skipping malformed range line");
            }
        }
    }

    Ok(ranges)
}

/// Load ranges from `path`. A missing file or a file with no usable ranges
/// is a configuration error.
pub fn load_ranges(path: &Path) -> Result<Vec<AddressRange>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let ranges = parse_ranges(file)?;
    if ranges.is_empty() {
        return Err(ScanError::NoRanges {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(path = %path.display(), ranges = ranges.len(), "Loaded address ranges");
    Ok(ranges)
}

enum LineKind {
    Range(AddressRange),
    Ignored,
    Malformed,
}

fn parse_line(raw: &str) -> LineKind {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return LineKind::Ignored;
    }

    let mut parts = line.split_whitespace();
    let parsed = match (parts.next(), parts.next()) {
        (Some(start), Some(end)) => match (start.parse(), end.parse()) {
            (Ok(s), Ok(e)) => Some(AddressRange::new(s, e)),
            _ => None,
        },
        (Some(single), None) if single.contains('/') => single.parse().ok(),
        _ => None,
    };

    match parsed {
        Some(range) => LineKind::Range(range),
        None => LineKind::Malformed,
    }
}
