//! # Hermes
//!
//! **Typed request binding for async HTTP handlers**
//!
//! Handlers are plain async functions taking a request context and a
//! request struct. Hermes fills the struct from the inbound request:
//!
//! - path variables, query parameters, headers and JSON body keys,
//!   coerced to the field's type,
//! - results of named dependencies, resolved at most once per request,
//! - then validates it against the declared rules before the handler runs.
//!
//! Handlers return a value, written as JSON, or a stream of server-sent
//! events.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[derive(Default, Serialize, Bindable)]
//! struct GetPost {
//!     #[bind(path = "id", validate = "min=1")]
//!     id: u64,
//! }
//!
//! async fn get_post(_ctx: RequestContext, req: GetPost) -> HermesResult<u64> {
//!     Ok(req.id)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = App::new();
//!     app.get("/posts/{id}", get_post)?;
//!     Server::new(app.build()).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The `Bindable` derive expands to paths under `hermes_core`, so crates
//! using it depend on `hermes-core` directly as well.
//!
//! ## Request flow
//!
//! ```text
//! Request → Route → Read body (if any field needs it) → Bind → Validate → Handler
//!                                                                           ↓
//! Response ← JSON or event stream ←─────────────────────────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use hermes_core as core;

pub use hermes_extract as extract;

pub use hermes_bind as bind;

pub use hermes_sse as sse;

pub use hermes_server as server;

pub use hermes_macros::Bindable;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// async fn ping(_ctx: RequestContext, _req: Empty) -> HermesResult<&'static str> {
///     Ok("pong")
/// }
///
/// let mut app = App::new();
/// app.get("/ping", ping).unwrap();
/// assert_eq!(app.build().route_count(), 1);
/// ```
pub mod prelude {
    pub use hermes_core::{
        ApiError, Empty, Handler, HermesError, HermesResult, RequestContext, RequestId,
        Validator,
    };

    pub use hermes_bind::Dependency;

    pub use hermes_sse::{Event, EventStream, SseConfig};

    pub use hermes_server::{
        init_logging, App, AppService, ErrorHandler, LogConfig, RouteGroup, Server, ServerConfig,
    };

    pub use hermes_macros::Bindable;

    pub use serde::Serialize;
}
