//! Route and dependency registration.
//!
//! [`App`] collects handlers and dependencies. Every registration compiles
//! the request type immediately, so a malformed request type or a duplicate
//! route fails before any traffic is served. [`App::build`] freezes the
//! result into an [`AppService`] that is shared read-only by all requests.

use bytes::Bytes;
use hermes_bind::{compile, Binder, Dependency, DependencyRegistry, DependencyResolver};
use hermes_core::{
    ApiError, Bindable, ExtractionError, Handler, HermesError, HermesResult, RegistrationError,
    RequestContext, RuleValidator, Validator,
};
use hermes_extract::ExtractionContext;
use hermes_sse::EventStream;
use http::{Method, Request, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error_handler::{DefaultErrorHandler, ErrorHandler};
use crate::executor::Endpoint;
use crate::response::HttpResponse;
use crate::routes::{join_path, RouteLookup, RouteTable};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Registration surface for handlers and dependencies.
///
/// # Example
///
/// ```
/// use hermes_core::{Empty, HermesResult, RequestContext};
/// use hermes_server::App;
///
/// async fn health(_ctx: RequestContext, _req: Empty) -> HermesResult<&'static str> {
///     Ok("ok")
/// }
///
/// let mut app = App::new();
/// app.get("/health", health).unwrap();
/// assert!(app.get("/health", health).is_err());
///
/// let service = app.build();
/// assert_eq!(service.route_count(), 1);
/// ```
pub struct App {
    routes: RouteTable<Endpoint>,
    dependencies: DependencyRegistry,
    validator: Arc<dyn Validator>,
    error_handler: Arc<dyn ErrorHandler>,
    config: ServerConfig,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an app using [`RuleValidator`] and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_validator(RuleValidator::new())
    }

    /// Creates an app with a custom validator.
    #[must_use]
    pub fn with_validator(validator: impl Validator + 'static) -> Self {
        Self {
            routes: RouteTable::default(),
            dependencies: DependencyRegistry::new(),
            validator: Arc::new(validator),
            error_handler: Arc::new(DefaultErrorHandler),
            config: ServerConfig::default(),
        }
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the error handler.
    pub fn set_error_handler(&mut self, handler: impl ErrorHandler) {
        self.error_handler = Arc::new(handler);
    }

    /// Registers a single-response handler.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if `Req` is malformed, the pattern is
    /// invalid, or the route is already taken.
    pub fn register_handler<Req, Res, H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        let plan = compile::<Req, Res>(self.validator.as_ref())?;
        self.routes
            .insert(method, path, Endpoint::single(plan, handler))
    }

    /// Registers a streaming handler returning an [`EventStream`].
    ///
    /// # Errors
    ///
    /// Same as [`register_handler`](Self::register_handler).
    pub fn register_streaming_handler<Req, T, H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        let plan = compile::<Req, T>(self.validator.as_ref())?;
        self.routes
            .insert(method, path, Endpoint::streaming(plan, handler))
    }

    /// Registers a named dependency.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if the name is invalid or taken, or
    /// the dependency's request type is malformed.
    pub fn register_dependency<D: Dependency>(
        &mut self,
        name: &str,
        dependency: D,
    ) -> Result<(), RegistrationError> {
        self.dependencies
            .register(name, dependency, self.validator.as_ref())
    }

    /// Registers a `GET` handler.
    pub fn get<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::GET, path, handler)
    }

    /// Registers a `POST` handler.
    pub fn post<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::POST, path, handler)
    }

    /// Registers a `PUT` handler.
    pub fn put<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::PUT, path, handler)
    }

    /// Registers a `PATCH` handler.
    pub fn patch<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::PATCH, path, handler)
    }

    /// Registers a `DELETE` handler.
    pub fn delete<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::DELETE, path, handler)
    }

    /// Registers a streaming `GET` handler.
    pub fn sse_get<Req, T, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        self.register_streaming_handler(Method::GET, path, handler)
    }

    /// Registers a streaming `POST` handler.
    pub fn sse_post<Req, T, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        self.register_streaming_handler(Method::POST, path, handler)
    }

    /// Returns a group registering every route under `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            app: self,
            prefix: join_path("", prefix),
        }
    }

    /// Freezes the registrations.
    ///
    /// Routes referencing dependencies that were never registered are
    /// logged; requests to them fail with `DEPENDENCY_NOT_FOUND`.
    #[must_use]
    pub fn build(self) -> AppService {
        let Self {
            mut routes,
            dependencies,
            validator,
            error_handler,
            config,
        } = self;

        routes.for_each_endpoint(|method, pattern, endpoint| {
            endpoint.reads_body = dependencies.needs_body(&endpoint.plan);
            let missing = dependencies.missing(&endpoint.plan);
            if !missing.is_empty() {
                warn!(
                    %method,
                    path = pattern,
                    missing = ?missing,
                    "route references unregistered dependencies"
                );
            }
        });

        let resolver = DependencyResolver::new(Arc::new(dependencies), validator);
        AppService {
            inner: Arc::new(Inner {
                routes,
                binder: Binder::new(resolver),
                error_handler,
                config,
                shutdown: CancellationToken::new(),
            }),
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes.len())
            .field("dependencies", &self.dependencies.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Registers routes under a common prefix.
///
/// # Example
///
/// ```
/// use hermes_core::{Empty, HermesResult, RequestContext};
/// use hermes_server::App;
///
/// async fn list(_ctx: RequestContext, _req: Empty) -> HermesResult<Vec<String>> {
///     Ok(Vec::new())
/// }
///
/// let mut app = App::new();
/// let mut v1 = app.group("/api/v1");
/// v1.get("/posts", list).unwrap();
/// v1.group("/admin").get("/posts", list).unwrap();
/// ```
#[derive(Debug)]
pub struct RouteGroup<'a> {
    app: &'a mut App,
    prefix: String,
}

impl RouteGroup<'_> {
    /// The group's path prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Nested group.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            prefix: join_path(&self.prefix, prefix),
            app: self.app,
        }
    }

    /// Registers a single-response handler under the prefix.
    pub fn register_handler<Req, Res, H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        let path = join_path(&self.prefix, path);
        self.app.register_handler(method, &path, handler)
    }

    /// Registers a streaming handler under the prefix.
    pub fn register_streaming_handler<Req, T, H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        let path = join_path(&self.prefix, path);
        self.app.register_streaming_handler(method, &path, handler)
    }

    /// Registers a `GET` handler.
    pub fn get<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::GET, path, handler)
    }

    /// Registers a `POST` handler.
    pub fn post<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::POST, path, handler)
    }

    /// Registers a `PUT` handler.
    pub fn put<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::PUT, path, handler)
    }

    /// Registers a `PATCH` handler.
    pub fn patch<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::PATCH, path, handler)
    }

    /// Registers a `DELETE` handler.
    pub fn delete<Req, Res, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        Res: Serialize + Send + 'static,
        H: Handler<Req, Res>,
    {
        self.register_handler(Method::DELETE, path, handler)
    }

    /// Registers a streaming `GET` handler.
    pub fn sse_get<Req, T, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        self.register_streaming_handler(Method::GET, path, handler)
    }

    /// Registers a streaming `POST` handler.
    pub fn sse_post<Req, T, H>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        Req: Bindable,
        T: Serialize + Send + Sync + 'static,
        H: Handler<Req, EventStream<T>>,
    {
        self.register_streaming_handler(Method::POST, path, handler)
    }
}

struct Inner {
    routes: RouteTable<Endpoint>,
    binder: Binder,
    error_handler: Arc<dyn ErrorHandler>,
    config: ServerConfig,
    shutdown: CancellationToken,
}

/// The frozen application: routes requests to their endpoints.
///
/// Cloning is cheap. The service can be driven directly with any request
/// body, which is how it is tested, or served over TCP by
/// [`Server`](crate::Server).
#[derive(Clone)]
pub struct AppService {
    inner: Arc<Inner>,
}

impl AppService {
    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.routes.len()
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Token cancelled when the server shuts down. Every request context is
    /// a child of it.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Handles one request. Never fails: errors go through the error
    /// handler.
    pub async fn handle<B>(&self, request: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::new(parts.method.clone(), parts.uri.path())
            .with_cancellation(self.inner.shutdown.child_token());

        debug!(
            request_id = %ctx.request_id(),
            method = %parts.method,
            path = parts.uri.path(),
            "dispatching request"
        );

        let inner = &self.inner;
        let (endpoint, params) = match inner.routes.lookup(&parts.method, parts.uri.path()) {
            RouteLookup::Found(endpoint, params) => (endpoint, params),
            RouteLookup::NotFound => {
                let error = ApiError::new(StatusCode::NOT_FOUND, "Not Found").with_code("NOT_FOUND");
                return inner.error_handler.handle(&ctx, error.into());
            }
            RouteLookup::InvalidPath(error) => {
                return inner.error_handler.handle(&ctx, error.into());
            }
            RouteLookup::MethodNotAllowed(allowed) => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                let error = ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
                    .with_code("METHOD_NOT_ALLOWED")
                    .with_detail("allowed", allowed.join(", "));
                return inner.error_handler.handle(&ctx, error.into());
            }
        };

        let result = async {
            let body = if endpoint.reads_body {
                read_body(body, inner.config.max_body_size()).await?
            } else {
                Bytes::new()
            };
            let source = ExtractionContext::new(parts.method, parts.uri, parts.headers, body, params);
            endpoint
                .execute(&inner.binder, ctx.clone(), source, inner.config.sse())
                .await
        }
        .await;

        result.unwrap_or_else(|error| inner.error_handler.handle(&ctx, error))
    }
}

impl std::fmt::Debug for AppService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppService")
            .field("routes", &self.inner.routes.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

async fn read_body<B>(body: B, limit: usize) -> HermesResult<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ExtractionError::payload_too_large(limit).into())
        }
        Err(e) => Err(HermesError::from(
            ApiError::new(StatusCode::BAD_REQUEST, format!("Failed to read request body: {e}"))
                .with_code("BODY_READ_ERROR"),
        )),
    }
}
