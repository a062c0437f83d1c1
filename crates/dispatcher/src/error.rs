//! Dispatcher error types

use ingestion::IngestionError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The connect retry budget ran out; the process cannot recover
    #[error("fatal feed error: {0}")]
    Fatal(#[source] IngestionError),

    /// Producer channels closed while the dispatcher was still running
    #[error("producer channels closed")]
    ChannelClosed,
}

impl DispatcherError {
    /// Unwrap the underlying ingestion error, if any
    pub fn ingestion_error(&self) -> Option<&IngestionError> {
        match self {
            Self::Fatal(err) => Some(err),
            Self::ChannelClosed => None,
        }
    }
}
