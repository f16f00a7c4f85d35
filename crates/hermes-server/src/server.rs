//! HTTP server implementation.
//!
//! A TCP listener accepts connections and serves each one with hyper's
//! HTTP/1 implementation on its own task. Requests are handed to the
//! [`AppService`]. On shutdown the accept loop stops and the service's
//! shutdown token is cancelled, which ends open event streams.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_server::{App, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = App::new().with_config(ServerConfig::builder().http_addr("0.0.0.0:8080").build());
//!     // app.get(...)?;
//!     Server::new(app.build()).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::app::AppService;
use crate::error::ServerError;

/// Serves an [`AppService`] over HTTP/1.
#[derive(Debug)]
pub struct Server {
    service: AppService,
}

impl Server {
    /// Creates a server for `service`.
    #[must_use]
    pub fn new(service: AppService) -> Self {
        Self { service }
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let config = self.service.config();
        let addr = config
            .socket_addr()
            .map_err(|_| ServerError::InvalidAddress(config.http_addr().to_string()))?;
        TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
    }

    /// Serves connections from `listener` until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<(), ServerError> {
        info!(addr = %listener.local_addr()?, "server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let service = self.service.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(service, stream, remote_addr).await {
                                debug!(%remote_addr, error = %e, "connection error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },
                () = &mut shutdown => {
                    info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        self.service.shutdown_token().cancel();
        info!("server stopped");
        Ok(())
    }
}

async fn handle_connection(
    service: AppService,
    stream: TcpStream,
    remote_addr: SocketAddr,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let shutdown = service.shutdown_token().clone();

    let handler = service_fn(move |req: Request<Incoming>| {
        let service = service.clone();
        async move { Ok::<_, Infallible>(service.handle(req).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, handler);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.cancelled() => {
            debug!(%remote_addr, "closing connection for shutdown");
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
