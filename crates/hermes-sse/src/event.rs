//! SSE event type and wire encoding.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use std::time::Duration;

use crate::error::SseResult;

/// One server-sent event.
///
/// An event carries a typed payload plus the optional `event`, `id` and
/// `retry` fields of the SSE protocol. The payload is written as JSON.
///
/// # Example
///
/// ```
/// use hermes_sse::Event;
/// use std::time::Duration;
///
/// let event = Event::new(42)
///     .event("tick")
///     .id("7")
///     .retry(Duration::from_secs(3));
///
/// assert_eq!(
///     event.encode().unwrap(),
///     "event: tick\nid: 7\nretry: 3000\ndata: 42\n\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T> {
    event: Option<String>,
    id: Option<String>,
    retry: Option<Duration>,
    data: T,
}

impl<T> Event<T> {
    /// Creates an event carrying `data`.
    pub fn new(data: T) -> Self {
        Self {
            event: None,
            id: None,
            retry: None,
            data,
        }
    }

    /// Sets the event name.
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the event ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the reconnection hint.
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Get the event name.
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Get the event ID.
    pub fn id_value(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Get the reconnection hint.
    pub fn retry_interval(&self) -> Option<Duration> {
        self.retry
    }

    /// Get the payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the event and returns the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> Event<T> {
    /// Encodes the event in its wire form.
    ///
    /// ```text
    /// event: <name>
    /// id: <id>
    /// retry: <ms>
    /// data: <line 1>
    /// data: <line 2>
    ///
    /// ```
    ///
    /// Empty `event` and `id` values and a zero `retry` are omitted. The
    /// payload is serialized as JSON and every line of it gets its own
    /// `data:` field.
    pub fn encode(&self) -> SseResult<Bytes> {
        let payload = serde_json::to_string(&self.data)?;
        let mut buf = BytesMut::with_capacity(payload.len() + 32);

        if let Some(event) = self.event.as_deref().filter(|e| !e.is_empty()) {
            put_field(&mut buf, "event", event);
        }
        if let Some(id) = self.id.as_deref().filter(|i| !i.is_empty()) {
            put_field(&mut buf, "id", id);
        }
        if let Some(retry) = self.retry.filter(|r| !r.is_zero()) {
            put_field(&mut buf, "retry", &retry.as_millis().to_string());
        }
        for line in payload.split('\n') {
            put_field(&mut buf, "data", line);
        }
        buf.put_u8(b'\n');

        Ok(buf.freeze())
    }
}

fn put_field(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_u8(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Tick {
        n: u32,
    }

    #[test]
    fn test_data_only() {
        let bytes = Event::new(Tick { n: 1 }).encode().unwrap();
        assert_eq!(bytes, "data: {\"n\":1}\n\n");
    }

    #[test]
    fn test_field_order() {
        let bytes = Event::new("hi")
            .retry(Duration::from_millis(1500))
            .id("9")
            .event("greeting")
            .encode()
            .unwrap();
        assert_eq!(bytes, "event: greeting\nid: 9\nretry: 1500\ndata: \"hi\"\n\n");
    }

    #[test]
    fn test_zero_retry_and_empty_fields_omitted() {
        let bytes = Event::new(true)
            .event("")
            .id("")
            .retry(Duration::ZERO)
            .encode()
            .unwrap();
        assert_eq!(bytes, "data: true\n\n");
    }

    #[test]
    fn test_newlines_in_payload_stay_escaped() {
        let bytes = Event::new("line1\nline2").encode().unwrap();
        assert_eq!(bytes, "data: \"line1\\nline2\"\n\n");
    }

    #[test]
    fn test_accessors() {
        let event = Event::new(5).event("e").id("1");
        assert_eq!(event.event_name(), Some("e"));
        assert_eq!(event.id_value(), Some("1"));
        assert_eq!(event.retry_interval(), None);
        assert_eq!(*event.data(), 5);
        assert_eq!(event.into_data(), 5);
    }
}
