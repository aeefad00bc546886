//! HTTP server lifecycle.
//!
//! bind → spawn the axum server on a background task → return a handle
//! holding the shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a running server.
pub struct ApiServer {
    /// Address actually bound; differs from the requested one for port 0.
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Stop accepting connections; in-flight requests finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to end.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

pub async fn start_api_server(
    ctx: ApiContext,
    bind_addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr,
            source,
        })?;
    let addr = listener.local_addr()?;

    let app = api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::config::AppConfig;
    use crate::db::Store;

    fn test_ctx() -> ApiContext {
        ApiContext::new(Store::open_in_memory().unwrap(), AppConfig::for_tests())
    }

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_health_over_tcp() {
        let mut server = start_api_server(test_ctx(), loopback()).await.unwrap();
        assert!(server.addr.port() > 0);

        let response = get(server.addr, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"status\":\"ok\""));

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let mut server = start_api_server(test_ctx(), loopback()).await.unwrap();
        let response = get(server.addr, "/nope").await;
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");
        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn taken_port_is_a_bind_error() {
        let mut first = start_api_server(test_ctx(), loopback()).await.unwrap();
        let err = start_api_server(test_ctx(), first.addr).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
        first.shutdown();
        first.wait().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_api_server(test_ctx(), loopback()).await.unwrap();
        server.shutdown();
        server.shutdown();
        server.wait().await;
    }
}
