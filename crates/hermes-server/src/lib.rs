//! # Hermes Server
//!
//! Route registration, handler execution and HTTP serving.
//!
//! - [`App`] - registers handlers, streaming handlers and dependencies
//! - [`AppService`] - the frozen app; routes and executes requests
//! - [`ErrorHandler`] - the single place errors become responses
//! - [`Server`] - hyper HTTP/1 serving with Ctrl-C shutdown
//! - [`ServerConfig`] - builder, TOML and `HERMES__*` environment overrides
//!
//! ## Example
//!
//! ```rust
//! use hermes_core::{Empty, HermesResult, RequestContext};
//! use hermes_server::App;
//! use http::{Request, StatusCode};
//! use http_body_util::Empty as EmptyBody;
//! use bytes::Bytes;
//!
//! async fn ping(_ctx: RequestContext, _req: Empty) -> HermesResult<&'static str> {
//!     Ok("pong")
//! }
//!
//! # tokio_test::block_on(async {
//! let mut app = App::new();
//! app.get("/ping", ping).unwrap();
//! let service = app.build();
//!
//! let request = Request::get("/ping").body(EmptyBody::<Bytes>::new()).unwrap();
//! let response = service.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod error;
mod error_handler;
mod executor;
pub mod logging;
mod response;
mod routes;
mod server;

pub use app::{App, AppService, RouteGroup};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_SIZE, ENV_PREFIX,
};
pub use error::{ConfigError, ServerError};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use logging::{init_logging, LogConfig};
pub use response::{full, json_response, HttpResponse, ResponseBody};
pub use server::Server;
