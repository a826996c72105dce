//! WebDAV server setup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use http::Request;
use hyper::body::Incoming;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing;

use graphfs_core::AppError;
use graphfs_core::config::ServerConfig;

use crate::handler::DavHandler;

/// WebDAV server configuration and state
#[derive(Debug)]
pub struct WebDavServer {
    /// DAV handler
    handler: Arc<DavHandler>,
    /// Server configuration
    config: ServerConfig,
}

impl WebDavServer {
    /// Create a new WebDAV server
    pub fn new(config: ServerConfig, handler: DavHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    /// Start the WebDAV server; returns once `cancel` flips to `true`.
    pub async fn start(&self, mut cancel: watch::Receiver<bool>) -> Result<(), AppError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            AppError::configuration(format!("Failed to bind WebDAV server on {addr}: {e}"))
        })?;

        tracing::info!(
            "WebDAV server listening on {} under '{}'",
            addr,
            self.handler.paths().base_path()
        );

        let handler = Arc::clone(&self.handler);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                Self::handle_connection(handler, stream, peer_addr).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!("WebDAV accept error: {}", e);
                        }
                    }
                }
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("WebDAV server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle a single TCP connection using hyper. Request bodies are
    /// streamed straight into the handler.
    async fn handle_connection(
        handler: Arc<DavHandler>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) {
        let io = hyper_util::rt::TokioIo::new(stream);

        let service = hyper::service::service_fn(move |req: Request<Incoming>| {
            let handler = Arc::clone(&handler);
            async move { Ok::<_, hyper::Error>(handler.handle(req).await) }
        });

        let conn = hyper::server::conn::http1::Builder::new().serve_connection(io, service);

        if let Err(e) = conn.await {
            tracing::error!("WebDAV connection error from {}: {}", peer_addr, e);
        }
    }
}
