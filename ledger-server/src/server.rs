//! HTTP/1 server loop

use crate::handlers::handle_request;
use crate::state::AppState;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

pub struct LedgerServer {
    state: Arc<AppState>,
}

impl LedgerServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Ledger server listening on {}", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            error!("Failed to accept connection: {}", err);
                            continue;
                        }
                    };
                    debug!("New connection from {}", remote_addr);

                    let state = self.state.clone();
                    tokio::spawn(async move {
                        Self::handle_connection(stream, remote_addr, state).await;
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_connection(stream: TcpStream, remote_addr: SocketAddr, state: Arc<AppState>) {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, state).await }
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            error!("Connection error from {}: {}", remote_addr, err);
        }
    }
}
