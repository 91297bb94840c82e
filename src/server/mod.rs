pub mod tls;

use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

/// Per-phase deadlines for a connection's lifecycle.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Ceiling on draining live connections once the shutdown signal fires.
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Accept TLS connections and serve HTTP/1.1 with keep-alive over each,
/// one cooperative task per connection, until `shutdown` resolves. Then
/// stop accepting and drain in-flight connections under the global
/// deadline.
pub async fn serve(
    listener: TcpListener,
    tls_config: Arc<rustls::ServerConfig>,
    app: Router,
    shutdown: impl std::future::Future<Output = ()>,
) -> std::io::Result<()> {
    let acceptor = TlsAcceptor::from(tls_config);
    let graceful = GracefulShutdown::new();
    let mut shutdown = pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!("accept failed: {e}");
                        continue;
                    }
                };

                let acceptor = acceptor.clone();
                let app = app.clone();
                let watcher = graceful.watcher();
                tokio::spawn(async move {
                    handle_connection(stream, peer, acceptor, app, watcher).await;
                });
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received, no longer accepting");
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            tracing::info!("all connections drained");
        }
        _ = tokio::time::sleep(GRACEFUL_SHUTDOWN_TIMEOUT) => {
            tracing::warn!(
                "connections still open after {}s, forcing stop",
                GRACEFUL_SHUTDOWN_TIMEOUT.as_secs()
            );
        }
    }

    Ok(())
}

/// One connection: TLS handshake under its own deadline, then hyper's
/// read/dispatch/write keep-alive loop with a header read timeout. The
/// watcher keeps the connection visible to the graceful drain.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    app: Router,
    watcher: hyper_util::server::graceful::Watcher,
) {
    let tls_stream = match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::debug!(%peer, "TLS handshake failed: {e}");
            return;
        }
        Err(_) => {
            tracing::debug!(%peer, "TLS handshake timed out");
            return;
        }
    };

    tracing::debug!(%peer, "connection established");

    let mut builder = ConnectionBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(READ_TIMEOUT)
        .keep_alive(true);

    let service = TowerToHyperService::new(app);
    let connection = builder.serve_connection(TokioIo::new(tls_stream), service);

    if let Err(e) = watcher.watch(connection.into_owned()).await {
        tracing::debug!(%peer, "connection ended with error: {e}");
    }

    tracing::debug!(%peer, "connection closed");
}
