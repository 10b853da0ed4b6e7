//! Middleware and handler traits for HTTP request processing.
//!
//! ```rust
//! use recipe_box::http::{Handler, Middleware, Request, Response};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _request: Request) -> recipe_box::Result<Response> {
//!         Ok(Response::ok().with_body("Hello!"))
//!     }
//! }
//!
//! struct Noop;
//!
//! #[async_trait]
//! impl Middleware for Noop {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> recipe_box::Result<Response> {
//!         next.handle(request).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::http::{Request, Response};

/// Handler trait for processing requests.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware trait for request/response processing.
///
/// Middleware can modify requests before passing them on, or modify
/// responses after the wrapped handler produced them.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// Composes middleware around a handler.
///
/// Middleware runs in the order it was added: the first one added sees the
/// request first and the response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}
}

/// One link of the chain: a middleware and everything after it.
struct Link {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Link {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut next = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			next = Arc::new(Link {
				middleware: middleware.clone(),
				next,
			});
		}
		next.handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	struct Recorder {
		log: Arc<Mutex<Vec<String>>>,
	}

	#[async_trait]
	impl Handler for Recorder {
		async fn handle(&self, _request: Request) -> Result<Response> {
			self.log.lock().unwrap().push("handler".to_string());
			Ok(Response::ok())
		}
	}

	struct Tag {
		name: &'static str,
		log: Arc<Mutex<Vec<String>>>,
	}

	#[async_trait]
	impl Middleware for Tag {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			self.log.lock().unwrap().push(format!("{}:before", self.name));
			let response = next.handle(request).await;
			self.log.lock().unwrap().push(format!("{}:after", self.name));
			response
		}
	}

	#[tokio::test]
	async fn test_chain_runs_in_insertion_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = MiddlewareChain::new(Arc::new(Recorder { log: log.clone() }))
			.with_middleware(Arc::new(Tag {
				name: "outer",
				log: log.clone(),
			}))
			.with_middleware(Arc::new(Tag {
				name: "inner",
				log: log.clone(),
			}));

		let request = Request::builder().build().unwrap();
		chain.handle(request).await.unwrap();

		assert_eq!(
			*log.lock().unwrap(),
			vec![
				"outer:before",
				"inner:before",
				"handler",
				"inner:after",
				"outer:after"
			]
		);
	}
}
