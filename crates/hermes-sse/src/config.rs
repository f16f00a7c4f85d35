//! SSE configuration and response headers.

use http::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

/// Configuration for event streams.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SseConfig {
    /// Flushed frames that may queue up before the producer is paused.
    pub buffer_size: usize,
    /// Value of `access-control-allow-origin`, if any.
    pub cors_allow_origin: Option<String>,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            cors_allow_origin: Some("*".to_string()),
        }
    }
}

impl SseConfig {
    /// Create a new SSE configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the allowed CORS origin.
    pub fn with_cors_allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_allow_origin = Some(origin.into());
        self
    }

    /// Do not send CORS headers.
    pub fn without_cors(mut self) -> Self {
        self.cors_allow_origin = None;
        self
    }

    /// Headers sent before the first event.
    ///
    /// An origin that is not a valid header value is skipped.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        if let Some(origin) = self
            .cors_allow_origin
            .as_deref()
            .and_then(|o| HeaderValue::from_str(o).ok())
        {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Cache-Control"),
            );
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let headers = SseConfig::default().headers();

        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Cache-Control");
    }

    #[test]
    fn test_without_cors() {
        let headers = SseConfig::new().without_cors().headers();
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[test]
    fn test_custom_origin() {
        let config = SseConfig::new()
            .with_cors_allow_origin("https://app.example.com")
            .with_buffer_size(4);

        assert_eq!(config.buffer_size, 4);
        assert_eq!(
            config.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
    }

    #[test]
    fn test_invalid_origin_is_skipped() {
        let headers = SseConfig::new().with_cors_allow_origin("bad\norigin").headers();
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
