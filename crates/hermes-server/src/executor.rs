//! Handler execution.
//!
//! An [`Endpoint`] couples a route's compiled binding plan with an executor
//! for one of two modes:
//!
//! - single response: bind, validate, invoke, write the result as JSON;
//! - streaming: bind, validate, invoke once to obtain a producer, send the
//!   event-stream headers, then drive the producer on its own task.

use futures_util::future::BoxFuture;
use hermes_bind::{Binder, BindingPlan, ResolvedDependencies};
use hermes_core::{Bindable, Handler, HermesResult, RequestContext};
use hermes_extract::ExtractionContext;
use hermes_sse::{EventStream, SseConfig};
use http::{Response, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, Instrument};

use crate::response::{json_response, HttpResponse};

/// Object-safe executor behind an endpoint.
pub(crate) trait Execute: Send + Sync {
    fn execute<'a>(
        &'a self,
        plan: &'a BindingPlan,
        binder: &'a Binder,
        ctx: RequestContext,
        source: ExtractionContext,
        sse: &'a SseConfig,
    ) -> BoxFuture<'a, HermesResult<HttpResponse>>;
}

/// A registered route target.
pub(crate) struct Endpoint {
    pub(crate) plan: BindingPlan,
    pub(crate) streaming: bool,
    /// Set when the app is built; see `DependencyRegistry::needs_body`.
    pub(crate) reads_body: bool,
    executor: Box<dyn Execute>,
}

impl Endpoint {
    pub(crate) fn single<Req, Res, H>(plan: BindingPlan, handler: H) -> Self
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        Self {
            reads_body: plan.reads_body(),
            plan,
            streaming: false,
            executor: Box::new(SingleResponse {
                handler,
                _types: PhantomData,
            }),
        }
    }

    pub(crate) fn streaming<Req, T, H>(plan: BindingPlan, handler: H) -> Self
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        Self {
            reads_body: plan.reads_body(),
            plan,
            streaming: true,
            executor: Box::new(Streaming {
                handler,
                _types: PhantomData,
            }),
        }
    }

    pub(crate) fn execute<'a>(
        &'a self,
        binder: &'a Binder,
        ctx: RequestContext,
        source: ExtractionContext,
        sse: &'a SseConfig,
    ) -> BoxFuture<'a, HermesResult<HttpResponse>> {
        self.executor.execute(&self.plan, binder, ctx, source, sse)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("plan", &self.plan)
            .field("streaming", &self.streaming)
            .field("reads_body", &self.reads_body)
            .finish_non_exhaustive()
    }
}

struct SingleResponse<H, Req, Res> {
    handler: H,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<H, Req, Res> Execute for SingleResponse<H, Req, Res>
where
    Req: Bindable,
    Res: Serialize + Send + 'static,
    H: Handler<Req, Res>,
{
    fn execute<'a>(
        &'a self,
        plan: &'a BindingPlan,
        binder: &'a Binder,
        ctx: RequestContext,
        source: ExtractionContext,
        _sse: &'a SseConfig,
    ) -> BoxFuture<'a, HermesResult<HttpResponse>> {
        Box::pin(async move {
            // Anything the handler spawned with this context stops with the
            // response, or when the connection drops the future.
            let _cancel_on_drop = ctx.cancellation().clone().drop_guard();

            let mut scope = ResolvedDependencies::new();
            let request: Req = binder.bind(plan, &ctx, &source, &mut scope).await?;
            let response = self.handler.call(ctx.clone(), request).await?;
            json_response(StatusCode::OK, &response)
        })
    }
}

struct Streaming<H, Req, T> {
    handler: H,
    _types: PhantomData<fn(Req) -> T>,
}

impl<H, Req, T> Execute for Streaming<H, Req, T>
where
    Req: Bindable,
    T: Serialize + Send + Sync + 'static,
    H: Handler<Req, EventStream<T>>,
{
    fn execute<'a>(
        &'a self,
        plan: &'a BindingPlan,
        binder: &'a Binder,
        ctx: RequestContext,
        source: ExtractionContext,
        sse: &'a SseConfig,
    ) -> BoxFuture<'a, HermesResult<HttpResponse>> {
        Box::pin(async move {
            let mut scope = ResolvedDependencies::new();
            let request: Req = binder.bind(plan, &ctx, &source, &mut scope).await?;
            let producer = self.handler.call(ctx.clone(), request).await?;

            // Dropping the body cancels the request.
            let cancel = ctx.cancellation().clone();
            let (mut sink, body) = hermes_sse::channel(sse.buffer_size, cancel.clone());

            let span = tracing::debug_span!("event_stream", request_id = %ctx.request_id());
            tokio::spawn(
                async move {
                    let outcome = hermes_sse::drive(producer, &mut sink, &cancel).await;
                    debug!(
                        events = outcome.events(),
                        completed = outcome.is_completed(),
                        "event stream finished"
                    );
                }
                .instrument(span),
            );

            let mut response = Response::new(body.boxed());
            *response.headers_mut() = sse.headers();
            Ok(response)
        })
    }
}
