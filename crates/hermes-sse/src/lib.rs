//! # Hermes SSE
//!
//! Server-Sent Events streaming for Hermes handlers.
//!
//! A streaming handler returns a producer, an async stream of [`Event`]s.
//! [`drive`] pulls events one at a time, encodes each in the SSE wire
//! format, writes it to an [`EventSink`] and flushes it before asking for the
//! next one. The loop stops when the producer ends, when the request is
//! cancelled (checked before every event), or when a write fails.
//!
//! ## Example
//!
//! ```rust
//! use futures_util::stream;
//! use hermes_sse::{channel, drive, Event};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let cancel = CancellationToken::new();
//! let (mut sink, _body) = channel(8, cancel.clone());
//!
//! let producer = stream::iter((1..=3).map(|n| Event::new(n).event("tick")));
//! let outcome = drive(producer, &mut sink, &cancel).await;
//!
//! assert_eq!(outcome.events(), 3);
//! # });
//! ```
//!
//! ## Wire format
//!
//! ```text
//! event: tick
//! id: 1
//! retry: 3000
//! data: {"n":1}
//!
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod driver;
mod error;
mod event;
mod sink;

use futures_util::stream::BoxStream;

pub use config::SseConfig;
pub use driver::{drive, StreamOutcome};
pub use error::{SseError, SseResult};
pub use event::Event;
pub use sink::{channel, ChannelSink, EventSink, SseBody};

/// The producer a streaming handler returns.
pub type EventStream<T> = BoxStream<'static, Event<T>>;
