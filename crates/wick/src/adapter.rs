//! The adapter seam: functions from host context and validated arguments to
//! a structured document.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::arguments::Arguments;
use crate::dotpath::PathNotFound;
use crate::invoker::ErrorKind;

/// A registered tool implementation.
///
/// Adapters receive the host context explicitly and must not mutate it.
pub type Adapter<C> = Arc<dyn Fn(&C, &Arguments) -> Result<Value, AdapterError> + Send + Sync>;

/// Errors an adapter may return. The invoker maps each onto an [`ErrorKind`].
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    PathNotFound(#[from] PathNotFound),

    /// The arguments passed schema validation but make no sense against the
    /// host state (unknown app label, unknown table, ...).
    #[error("{0}")]
    InvalidArgument(String),

    /// A host resource is missing or not configured.
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

impl AdapterError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unavailable(_) | Self::Failed(_) => ErrorKind::AdapterError,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(format!("failed to encode document: {}", err))
    }
}
