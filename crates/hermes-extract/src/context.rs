//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is the view of one inbound request that field
//! extractors read from: path variables, query parameters, headers and the
//! raw body. The query string and the JSON body are parsed at most once, on
//! first use, however many fields read from them.

use crate::Params;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use std::sync::OnceLock;

/// Context providing access to all parts of an HTTP request.
///
/// # Example
///
/// ```rust
/// use hermes_extract::{ExtractionContext, Params};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/posts/123?fields=title,body"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_param("id"), Some("123"));
/// assert_eq!(ctx.query("fields"), Some("title,body"));
/// ```
#[derive(Debug)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: OnceLock<Vec<(String, String)>>,
    json: OnceLock<Result<serde_json::Value, String>>,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    ///
    /// `body` is empty when the route does not need the request body.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query: OnceLock::new(),
            json: OnceLock::new(),
        }
    }

    /// Returns a builder, mostly useful in tests.
    #[must_use]
    pub fn builder() -> ExtractionContextBuilder {
        ExtractionContextBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path variables.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Looks up a path variable.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Looks up a query parameter.
    ///
    /// Returns the first value when the parameter is repeated. A malformed
    /// query string reads as empty.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .get_or_init(|| {
                self.uri
                    .query()
                    .and_then(|q| serde_urlencoded::from_str(q).ok())
                    .unwrap_or_default()
            })
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a header value as a string.
    ///
    /// Header names are case-insensitive. Values that are not visible ASCII
    /// read as absent.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body parsed as JSON.
    ///
    /// Returns `None` for an empty body and the parser message for a body
    /// that is not JSON.
    pub fn json(&self) -> Option<Result<&serde_json::Value, &str>> {
        if self.body.is_empty() {
            return None;
        }
        let parsed = self.json.get_or_init(|| {
            serde_json::from_slice(&self.body).map_err(|e| e.to_string())
        });
        Some(parsed.as_ref().map_err(String::as_str))
    }
}

/// Builder for constructing an `ExtractionContext`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method (default `GET`).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI (default `/`).
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path variable.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the extraction context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_params,
        )
    }
}
