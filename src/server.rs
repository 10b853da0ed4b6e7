//! HTTP/1.1 server on hyper.
//!
//! One task per accepted connection. Request bodies are buffered up to a
//! limit before the [`Handler`] sees them. On shutdown the listener stops
//! accepting and in-flight connections get a grace period to finish.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::StatusCode;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::http::{Handler, Request, Response};

/// Default request body limit (10 MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub struct HttpServer {
	handler: Arc<dyn Handler>,
	max_body_size: usize,
}

impl HttpServer {
	pub fn new<H: Handler + 'static>(handler: H) -> Self {
		Self {
			handler: Arc::new(handler),
			max_body_size: DEFAULT_MAX_BODY_SIZE,
		}
	}

	/// Reject request bodies larger than `max_body_size` bytes with 413
	pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
		self.max_body_size = max_body_size;
		self
	}

	/// Bind `addr` and serve until Ctrl-C
	pub async fn listen(self, addr: SocketAddr) -> Result<()> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(%addr, "listening on http://{}", addr);
		self.serve(listener, shutdown_signal()).await
	}

	/// Serve connections from `listener` until `shutdown` completes
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
	where
		F: Future<Output = ()>,
	{
		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, remote_addr) = match accepted {
						Ok(accepted) => accepted,
						Err(e) => {
							tracing::warn!(error = %e, "failed to accept connection");
							continue;
						}
					};

					let handler = self.handler.clone();
					let max_body_size = self.max_body_size;
					let service = service_fn(move |req| {
						handle_request(handler.clone(), req, remote_addr, max_body_size)
					});

					let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
					let conn = graceful.watch(conn);
					tokio::spawn(async move {
						if let Err(e) = conn.await {
							tracing::debug!(%remote_addr, error = %e, "connection closed with error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, no longer accepting connections");
					break;
				}
			}
		}

		tokio::select! {
			_ = graceful.shutdown() => {
				tracing::info!("all connections closed");
			}
			_ = tokio::time::sleep(SHUTDOWN_GRACE) => {
				tracing::warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "connections still open after grace period");
			}
		}
		Ok(())
	}
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
}

/// Plain-text response for errors raised before the handler runs, or
/// returned by a handler without its own error page
fn error_response(error: &Error) -> Response {
	let status =
		StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
	let body = if status.is_server_error() {
		status.canonical_reason().unwrap_or("Error").to_string()
	} else {
		error.to_string()
	};
	Response::new(status)
		.with_header("content-type", "text/plain; charset=utf-8")
		.with_body(body)
}

fn into_hyper(response: Response) -> hyper::Response<Full<Bytes>> {
	let mut hyper_response = hyper::Response::new(Full::new(response.body));
	*hyper_response.status_mut() = response.status;
	*hyper_response.headers_mut() = response.headers;
	hyper_response
}

async fn handle_request(
	handler: Arc<dyn Handler>,
	req: hyper::Request<Incoming>,
	remote_addr: SocketAddr,
	max_body_size: usize,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
	let response = match read_request(req, remote_addr, max_body_size).await {
		Ok(request) => handler.handle(request).await.unwrap_or_else(|e| {
			if e.status_code() >= 500 {
				tracing::error!(error = %e, "unhandled error");
			}
			error_response(&e)
		}),
		Err(e) => {
			tracing::debug!(%remote_addr, error = %e, "rejected request");
			error_response(&e)
		}
	};
	Ok(into_hyper(response))
}

/// Buffer the body within the size limit and build a [`Request`]
async fn read_request(
	req: hyper::Request<Incoming>,
	remote_addr: SocketAddr,
	max_body_size: usize,
) -> Result<Request> {
	if let Some(length) = req.headers().get(hyper::header::CONTENT_LENGTH)
		&& let Ok(length) = length.to_str()
		&& let Ok(length) = length.parse::<usize>()
		&& length > max_body_size
	{
		return Err(Error::PayloadTooLarge(max_body_size));
	}

	let (parts, body) = req.into_parts();
	let body = match Limited::new(body, max_body_size).collect().await {
		Ok(collected) => collected.to_bytes(),
		Err(e) => {
			tracing::debug!(%remote_addr, error = %e, "failed to read request body");
			return Err(Error::PayloadTooLarge(max_body_size));
		}
	};

	Request::builder()
		.method(parts.method)
		.uri(parts.uri.to_string())
		.version(parts.version)
		.headers(parts.headers)
		.body(body)
		.remote_addr(remote_addr)
		.build()
		.map_err(|e| Error::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpStream;
	use tokio::sync::oneshot;

	struct Echo;

	#[async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> Result<Response> {
			Ok(Response::ok().with_body(format!("{} {}", request.path(), request.body.len())))
		}
	}

	async fn roundtrip(server: HttpServer, raw: &str) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let (tx, rx) = oneshot::channel::<()>();
		let task = tokio::spawn(server.serve(listener, async {
			let _ = rx.await;
		}));

		let mut stream = TcpStream::connect(addr).await.unwrap();
		stream.write_all(raw.as_bytes()).await.unwrap();
		let mut response = String::new();
		stream.read_to_string(&mut response).await.unwrap();

		tx.send(()).unwrap();
		task.await.unwrap().unwrap();
		response
	}

	#[tokio::test]
	async fn test_serves_request() {
		let response = roundtrip(
			HttpServer::new(Echo),
			"POST /hello/ HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
		)
		.await;
		assert!(response.starts_with("HTTP/1.1 200 OK"));
		assert!(response.ends_with("/hello/ 3"));
	}

	#[tokio::test]
	async fn test_rejects_oversized_body() {
		let response = roundtrip(
			HttpServer::new(Echo).with_max_body_size(2),
			"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
		)
		.await;
		assert!(response.starts_with("HTTP/1.1 413"));
		assert!(response.ends_with("Request body too large (max: 2 bytes)"));
	}

	struct Failing;

	#[async_trait]
	impl Handler for Failing {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::Database("disk I/O error".into()))
		}
	}

	#[tokio::test]
	async fn test_handler_fault_hides_detail() {
		let response = roundtrip(
			HttpServer::new(Failing),
			"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
		)
		.await;
		assert!(response.starts_with("HTTP/1.1 500"));
		assert!(!response.contains("disk I/O error"));
	}
}
