//! Output sink port and the channel-backed response body.
//!
//! The streaming driver writes encoded events into an [`EventSink`] and
//! flushes after every event. [`channel`] pairs a [`ChannelSink`] with an
//! [`SseBody`] that hyper polls as the response body: each flush becomes one
//! body frame.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{SseError, SseResult};

/// A buffered output with explicit flush.
#[async_trait]
pub trait EventSink: Send {
    /// Appends `chunk` to the buffer.
    async fn write(&mut self, chunk: Bytes) -> SseResult<()>;

    /// Sends everything buffered so far to the client.
    async fn flush(&mut self) -> SseResult<()>;
}

/// Sink writing into an in-process channel read by [`SseBody`].
#[derive(Debug)]
pub struct ChannelSink {
    buffer: BytesMut,
    tx: mpsc::Sender<Bytes>,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> SseResult<()> {
        if self.tx.is_closed() {
            return Err(SseError::stream_closed("response body dropped"));
        }
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    async fn flush(&mut self) -> SseResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let frame = self.buffer.split().freeze();
        self.tx
            .send(frame)
            .await
            .map_err(|_| SseError::stream_closed("response body dropped"))
    }
}

/// Streaming response body fed by a [`ChannelSink`].
///
/// Dropping the body, which hyper does when the client disconnects, cancels
/// the token passed to [`channel`].
#[derive(Debug)]
pub struct SseBody {
    rx: mpsc::Receiver<Bytes>,
    _cancel_on_drop: DropGuard,
}

impl Body for SseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|bytes| Ok(Frame::data(bytes))))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}

/// Creates a connected sink/body pair.
///
/// `buffer` bounds the number of flushed frames waiting for the client.
/// `cancel` is cancelled when the body is dropped.
pub fn channel(buffer: usize, cancel: CancellationToken) -> (ChannelSink, SseBody) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let sink = ChannelSink {
        buffer: BytesMut::new(),
        tx,
    };
    let body = SseBody {
        rx,
        _cancel_on_drop: cancel.drop_guard(),
    };
    (sink, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_flush_produces_one_frame() {
        let (mut sink, mut body) = channel(4, CancellationToken::new());

        sink.write(Bytes::from_static(b"data: 1\n")).await.unwrap();
        sink.write(Bytes::from_static(b"\n")).await.unwrap();
        sink.flush().await.unwrap();

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), "data: 1\n\n");
    }

    #[tokio::test]
    async fn test_empty_flush_sends_nothing() {
        let (mut sink, body) = channel(4, CancellationToken::new());
        sink.flush().await.unwrap();
        drop(sink);

        let collected = body.collect().await.unwrap().to_bytes();
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn test_dropping_body_cancels_and_closes() {
        let cancel = CancellationToken::new();
        let (mut sink, body) = channel(4, cancel.clone());

        drop(body);
        assert!(cancel.is_cancelled());

        let err = sink.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_disconnect());
    }
}
