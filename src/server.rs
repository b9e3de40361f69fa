//! HTTP server and graceful shutdown.
//!
//! The server has no routing table. The gateway in front of it already
//! decided this service should get the request; the server hands every
//! request to the one handler chain it was given.
//!
//! # Shutdown
//!
//! On SIGTERM (what Kubernetes and most process managers send) or Ctrl-C:
//! 1. stop accepting connections,
//! 2. let every in-flight connection finish,
//! 3. return from [`Server::serve`].
//!
//! [`Server::serve_with_shutdown`] takes any future as the signal instead.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::handler::{Handler, Service};
use crate::request::Request;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    listener: Option<TcpListener>,
}

impl Server {
    /// Configures the server to bind to `addr` when it starts serving.
    ///
    /// ```rust
    /// use agw::Server;
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()?, listener: None })
    }

    /// Serves on a listener that is already bound, e.g. to port 0 in tests.
    pub fn from_listener(listener: TcpListener) -> Result<Self, Error> {
        Ok(Self { addr: listener.local_addr()?, listener: Some(listener) })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves `handler` until SIGTERM or Ctrl-C, then drains and returns.
    pub async fn serve(self, handler: impl Handler) -> Result<(), Error> {
        self.serve_with_shutdown(handler, shutdown_signal()).await
    }

    /// Serves `handler` until `signal` resolves, then drains and returns.
    pub async fn serve_with_shutdown(
        self,
        handler: impl Handler,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.listener {
            Some(listener) => listener,
            None => TcpListener::bind(self.addr).await?,
        };
        let svc = Service::new(handler);
        let mut conns = JoinSet::new();
        tokio::pin!(signal);

        info!(addr = %self.addr, "agw listening");

        loop {
            tokio::select! {
                // Check the signal first so a pending backlog cannot delay
                // shutdown.
                biased;

                () = &mut signal => {
                    info!(in_flight = conns.len(), "shutting down, draining connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        conns.spawn(serve_connection(svc.clone(), stream, peer));
                    }
                    Err(e) => error!("accept error: {e}"),
                },

                // Reap finished connections as we go.
                Some(_) = conns.join_next(), if !conns.is_empty() => {}
            }
        }

        while conns.join_next().await.is_some() {}

        info!("agw stopped");
        Ok(())
    }
}

/// Runs one connection to completion. HTTP/1.1 or HTTP/2, whichever the
/// client speaks.
async fn serve_connection(svc: Service, stream: TcpStream, peer: SocketAddr) {
    debug!(%peer, "connection accepted");
    let io = TokioIo::new(stream);
    let conn_svc = service_fn(move |req| dispatch(svc.clone(), req));

    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
        .serve_connection(io, conn_svc)
        .await
    {
        error!(%peer, "connection error: {e}");
    }
}

/// Hands one request to the chain and converts the answer for hyper.
///
/// Every failure is already an HTTP response by the time the chain returns,
/// so hyper never sees an error.
async fn dispatch(
    svc: Service,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    Ok(svc.call(Request::from(req)).await.into_inner())
}

/// Resolves on SIGTERM (Unix only) or Ctrl-C.
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored; the other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
