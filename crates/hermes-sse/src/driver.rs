//! The streaming loop.

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::SseError;
use crate::event::Event;
use crate::sink::EventSink;

/// How a stream ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The producer ran out of events.
    Completed {
        /// Events written.
        events: usize,
    },
    /// The client disconnected or the request was cancelled.
    Cancelled {
        /// Events written.
        events: usize,
    },
    /// Encoding or writing an event failed.
    Failed {
        /// Events written before the failure.
        events: usize,
        /// The failure.
        error: SseError,
    },
}

impl StreamOutcome {
    /// Number of events fully written and flushed.
    pub fn events(&self) -> usize {
        match self {
            Self::Completed { events }
            | Self::Cancelled { events }
            | Self::Failed { events, .. } => *events,
        }
    }

    /// Returns `true` if the producer ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Drives `producer` into `sink` until it ends, `cancel` fires, or a write
/// fails.
///
/// Cancellation is checked before every event and wins over producing or
/// writing another one. Every event is flushed before the next is pulled.
pub async fn drive<T, P, K>(producer: P, sink: &mut K, cancel: &CancellationToken) -> StreamOutcome
where
    T: Serialize,
    P: Stream<Item = Event<T>>,
    K: EventSink + ?Sized,
{
    futures_util::pin_mut!(producer);
    let mut events = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(events, "event stream cancelled");
            return StreamOutcome::Cancelled { events };
        }

        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            event = producer.next() => Some(event),
        };
        let event = match next {
            None => continue,
            Some(None) => {
                debug!(events, "event stream completed");
                return StreamOutcome::Completed { events };
            }
            Some(Some(event)) => event,
        };

        if cancel.is_cancelled() {
            continue;
        }
        if let Err(error) = write_event(&event, sink).await {
            if error.is_disconnect() {
                debug!(events, "client disconnected from event stream");
                return StreamOutcome::Cancelled { events };
            }
            error!(events, error = %error, "failed to write event");
            return StreamOutcome::Failed { events, error };
        }
        events += 1;
    }
}

async fn write_event<T, K>(event: &Event<T>, sink: &mut K) -> Result<(), SseError>
where
    T: Serialize,
    K: EventSink + ?Sized,
{
    let bytes = event.encode()?;
    sink.write(bytes).await?;
    sink.flush().await
}
