use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::{clamp_limit, document};
use crate::host::logs::{normalize_level, LEVELS};
use crate::host::HostContext;
use crate::types::LogEntry;

#[tracing::instrument(name = "tool.read_recent_logs", skip_all)]
pub fn read_recent_logs(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let level = match args.opt_str("level_filter")? {
        Some(raw) => Some(normalize_level(raw).ok_or_else(|| {
            AdapterError::invalid_argument(format!(
                "unknown level '{raw}', expected one of {}",
                LEVELS.join(", ")
            ))
        })?),
        None => None,
    };
    let limit = clamp_limit(args.i64("limit")?, host.limits.logs_max)?;

    let entries: Vec<LogEntry> = host
        .logs
        .entries()?
        .into_iter()
        .filter(|e| level.map_or(true, |level| e.level == level))
        .take(limit as usize)
        .collect();
    document(&entries)
}
