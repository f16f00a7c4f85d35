//! Error types for Server-Sent Events operations.

use thiserror::Error;

/// Result type for SSE operations.
pub type SseResult<T> = Result<T, SseError>;

/// Errors that can occur while writing an event stream.
///
/// Once the first event is written the response headers are committed, so
/// none of these reach the client. They are logged and end the stream.
#[derive(Debug, Error)]
pub enum SseError {
    /// The client went away; the response body was dropped.
    #[error("stream closed: {0}")]
    StreamClosed(String),

    /// The event payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Writing to the transport failed.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl SseError {
    /// Create a stream closed error.
    pub fn stream_closed(reason: impl Into<String>) -> Self {
        Self::StreamClosed(reason.into())
    }

    /// Create a write failed error.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed(reason.into())
    }

    /// Returns `true` if the error means the client disconnected.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::StreamClosed(_))
    }
}
