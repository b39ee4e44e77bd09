//! Log file tailing and parsing.
//!
//! Entries start with a header line `<date> <time> <LEVEL> <message>`, where
//! the timestamp may be bracketed or `T`-joined and may carry `,mmm` or
//! `.ffffff` fractions. Anything else continues the previous entry.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use wick::AdapterError;

use super::LogSource;
use crate::types::LogEntry;

/// Levels accepted in headers and filters, in severity order.
pub const LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Map a level name (any case, with common aliases) to its canonical form.
pub fn normalize_level(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_uppercase().as_str() {
        "DEBUG" => Some("DEBUG"),
        "INFO" => Some("INFO"),
        "WARNING" | "WARN" => Some("WARNING"),
        "ERROR" => Some("ERROR"),
        "CRITICAL" | "FATAL" => Some("CRITICAL"),
        _ => None,
    }
}

#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    max_scan_bytes: u64,
}

impl LogFile {
    pub fn new(path: PathBuf, max_scan_bytes: u64) -> Self {
        Self { path, max_scan_bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read at most `max_scan_bytes` from the end, starting on a line boundary.
    fn tail_text(&self) -> Result<String, AdapterError> {
        let mut file = File::open(&self.path).map_err(|e| {
            AdapterError::unavailable(format!("cannot read log file {}: {e}", self.path.display()))
        })?;
        let len = file
            .metadata()
            .map_err(|e| AdapterError::failed(format!("log file metadata: {e}")))?
            .len();

        let offset = len.saturating_sub(self.max_scan_bytes);
        // One byte before the window tells whether it starts on a line boundary.
        let start = offset.saturating_sub(1);
        file.seek(SeekFrom::Start(start))
            .map_err(|e| AdapterError::failed(format!("log file seek: {e}")))?;

        let mut bytes = Vec::with_capacity((len - start) as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| AdapterError::failed(format!("log file read: {e}")))?;

        let window: &[u8] = if offset == 0 {
            &bytes[..]
        } else {
            match bytes.split_first() {
                Some((b'\n', rest)) => rest,
                // Partial first line.
                Some((_, rest)) => match rest.iter().position(|b| *b == b'\n') {
                    Some(idx) => &rest[idx + 1..],
                    None => &[],
                },
                None => &[],
            }
        };

        let text = String::from_utf8_lossy(window).into_owned();
        Ok(text)
    }
}

impl LogSource for LogFile {
    fn entries(&self) -> Result<Vec<LogEntry>, AdapterError> {
        let text = self.tail_text()?;
        let mut entries = parse_entries(&text);
        entries.reverse();
        Ok(entries)
    }
}

/// Parse entries in file order. Lines before the first header are dropped.
pub fn parse_entries(text: &str) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = Vec::new();
    for line in text.lines() {
        if let Some(entry) = parse_header(line) {
            entries.push(entry);
        } else if let Some(last) = entries.last_mut() {
            last.message.push('\n');
            last.message.push_str(line);
        }
    }
    entries
}

fn parse_header(line: &str) -> Option<LogEntry> {
    let (raw_ts, rest) = if let Some(inner) = line.strip_prefix('[') {
        let end = inner.find(']')?;
        (inner[..end].to_string(), inner[end + 1..].trim_start())
    } else {
        let mut parts = line.splitn(2, ' ');
        let first = parts.next()?;
        let remainder = parts.next()?;
        if first.contains('T') {
            (first.to_string(), remainder)
        } else {
            let mut parts = remainder.splitn(2, ' ');
            let time = parts.next()?;
            (format!("{first} {time}"), parts.next()?)
        }
    };

    let timestamp = parse_timestamp(&raw_ts)?;

    let mut parts = rest.splitn(2, ' ');
    let level = normalize_level(parts.next()?.trim_end_matches(':'))?;
    let message = parts.next().unwrap_or("").trim_start().to_string();

    Some(LogEntry {
        timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        level: level.to_string(),
        message,
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = raw.trim().replace(',', ".").replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S%.f").ok()
}
