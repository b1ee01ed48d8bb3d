//! HTTP/1 server serving a single `Handler` chain.

use crate::domain::ports::Handler;
use crate::utils::error::{AppError, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Pause after a failed `accept` (e.g. out of file descriptors) so the loop
/// does not spin.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ServerError {
            message: format!("Failed to bind {}: {}", addr, e),
        })
}

/// Accepts connections until `shutdown` resolves. Each connection runs in its
/// own task; requests share `handler` read-only.
pub async fn serve<F>(listener: TcpListener, handler: Arc<dyn Handler>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        tracing::debug!("Accepted connection from {}", peer_addr);
                        handle_connection(stream, peer_addr, Arc::clone(&handler));
                    }
                    Err(e) => back_off_after_accept_error(&e).await,
                }
            }

            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

async fn back_off_after_accept_error(err: &std::io::Error) {
    tracing::error!(
        "Failed to accept connection: {}, retrying in {:?}",
        err,
        ACCEPT_ERROR_BACKOFF
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, handler: Arc<dyn Handler>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let handler = Arc::clone(&handler);
            async move { dispatch(req, handler).await }
        });

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            tracing::warn!("Connection error from {}: {}", peer_addr, err);
        }
    });
}

async fn dispatch(
    req: Request<Incoming>,
    handler: Arc<dyn Handler>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    tracing::info!("{} {}", req.method(), req.uri());

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            let mut response = Response::new(Full::new(Bytes::from("400 Bad Request")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    Ok(handler.handle(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_error_backs_off() {
        let err = std::io::Error::other("too many open files");
        let started = tokio::time::Instant::now();

        back_off_after_accept_error(&err).await;

        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }
}
