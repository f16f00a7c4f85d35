//! Handler trait for request processing.
//!
//! A [`Handler`] is the business function behind a route: it receives the
//! [`RequestContext`] and a fully bound and validated request value, and
//! returns a response value or a [`HermesError`](crate::HermesError).
//!
//! Any `async` closure or function with the shape
//! `Fn(RequestContext, Req) -> impl Future<Output = HermesResult<Res>>`
//! is a handler, so malformed handler signatures are rejected by the compiler.

use crate::{HermesResult, RequestContext};
use futures_util::future::BoxFuture;
use std::future::Future;

/// A trait for handling typed requests.
///
/// # Example
///
/// ```
/// use hermes_core::{Handler, HermesResult, RequestContext};
///
/// async fn greet(_ctx: RequestContext, name: String) -> HermesResult<String> {
///     Ok(format!("hello {name}"))
/// }
///
/// # tokio_test::block_on(async {
/// let reply = greet.call(RequestContext::mock(), "ada".to_string()).await.unwrap();
/// assert_eq!(reply, "hello ada");
/// # });
/// ```
pub trait Handler<Req, Res>: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, HermesResult<Res>>;
}

impl<F, Fut, Req, Res> Handler<Req, Res> for F
where
    F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HermesResult<Res>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, HermesResult<Res>> {
        Box::pin(self(ctx, request))
    }
}
