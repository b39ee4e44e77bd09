//! Dot-notation path resolution over JSON documents.
//!
//! `DATABASES.default.ENGINE` walks mapping keys one segment at a time. A
//! segment that parses as a non-negative integer indexes into a sequence; on
//! a mapping it is still treated as a key.

use serde_json::Value;

/// Resolution stopped at `segment`; everything in `resolved_prefix` existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNotFound {
    pub path: String,
    pub resolved_prefix: String,
    pub segment: String,
}

impl std::fmt::Display for PathNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.resolved_prefix.is_empty() {
            write!(
                f,
                "path '{}' not found: segment '{}' does not resolve at the root",
                self.path, self.segment
            )
        } else {
            write!(
                f,
                "path '{}' not found: resolved '{}' but segment '{}' does not resolve",
                self.path, self.resolved_prefix, self.segment
            )
        }
    }
}

impl std::error::Error for PathNotFound {}

/// Resolve `path` against `root`. Never panics; every dead end is reported.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathNotFound> {
    let mut current = root;
    let mut resolved: Vec<&str> = Vec::new();

    for segment in path.split('.') {
        let next = if segment.is_empty() {
            None
        } else {
            match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
        };

        match next {
            Some(value) => {
                current = value;
                resolved.push(segment);
            }
            None => {
                return Err(PathNotFound {
                    path: path.to_string(),
                    resolved_prefix: resolved.join("."),
                    segment: segment.to_string(),
                })
            }
        }
    }

    Ok(current)
}
