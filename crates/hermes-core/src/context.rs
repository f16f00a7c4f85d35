//! Request context types.
//!
//! The [`RequestContext`] is handed to every dependency and handler invoked
//! while serving one inbound request. It carries the request identity, basic
//! request metadata and the cancellation signal of the inbound call.

use http::Method;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it convenient for log correlation.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request context passed to dependencies and handlers.
///
/// Cloning is cheap and all clones share the same cancellation token, so a
/// handler can hand the context to a spawned producer and still observe the
/// client going away.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use http::Method;
///
/// let ctx = RequestContext::new(Method::GET, "/posts/1");
/// assert!(!ctx.is_cancelled());
///
/// ctx.cancellation().cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    cancellation: CancellationToken,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID and cancellation token.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            cancellation: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a mock context for testing purposes.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Method::GET, "/")
    }

    /// Replaces the cancellation token, e.g. with a child of a server-wide
    /// shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the cancellation token of the inbound call.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the inbound call has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_serializes_as_string() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = RequestContext::new(Method::POST, "/posts");
        let clone = ctx.clone();

        clone.cancellation().cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.request_id(), clone.request_id());
        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/posts");
    }

    #[test]
    fn test_with_cancellation_child() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::mock().with_cancellation(parent.child_token());

        parent.cancel();
        assert!(ctx.is_cancelled());
    }
}
