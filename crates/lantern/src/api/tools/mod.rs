//! Tool adapters. Each is a plain function over the host context and the
//! validated arguments, returning the JSON document for a successful call.

pub mod app;
pub mod commands;
pub mod database;
pub mod logs;
pub mod migrations;
pub mod models;
pub mod query;
pub mod urls;

use serde::Serialize;
use serde_json::Value;
use wick::AdapterError;

/// Serialize an adapter's typed output.
pub(crate) fn document<T: Serialize>(value: &T) -> Result<Value, AdapterError> {
    Ok(serde_json::to_value(value)?)
}

/// Resolve a requested limit: below one is rejected, above `max` is clamped.
pub(crate) fn clamp_limit(requested: i64, max: i64) -> Result<i64, AdapterError> {
    if requested < 1 {
        return Err(AdapterError::invalid_argument(format!(
            "limit must be at least 1, got {requested}"
        )));
    }
    Ok(requested.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(5, 100).unwrap(), 5);
        assert_eq!(clamp_limit(5000, 1000).unwrap(), 1000);
        assert!(matches!(clamp_limit(0, 10), Err(AdapterError::InvalidArgument(_))));
        assert!(matches!(clamp_limit(-3, 10), Err(AdapterError::InvalidArgument(_))));
    }
}
