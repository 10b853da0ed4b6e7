//! Cookie-backed server-side sessions.
//!
//! The middleware loads the [`Session`] named by the session cookie into the
//! request extensions before calling the next handler. Once the response is
//! ready it takes the session back out and persists, rotates or discards it.

use async_trait::async_trait;
use hyper::header::SET_COOKIE;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Session, SessionStore};
use crate::conf::Settings;
use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};

/// Session cookie configuration
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SessionConfig {
	pub cookie_name: String,
	pub ttl: Duration,
	/// Add the `Secure` attribute
	pub secure: bool,
	pub http_only: bool,
	pub same_site: Option<String>,
	pub path: String,
}

impl SessionConfig {
	/// # Examples
	///
	/// ```
	/// use std::time::Duration;
	/// use recipe_box::middleware::SessionConfig;
	///
	/// let config = SessionConfig::new("sessionid", Duration::from_secs(3600));
	/// assert_eq!(config.cookie_name, "sessionid");
	/// assert!(config.http_only);
	/// assert!(!config.secure);
	/// ```
	pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
		Self {
			cookie_name: cookie_name.into(),
			ttl,
			secure: false,
			http_only: true,
			same_site: Some("Lax".to_string()),
			path: "/".to_string(),
		}
	}

	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	pub fn from_settings(settings: &Settings) -> Self {
		Self::new(
			settings.session_cookie_name.clone(),
			Duration::from_secs(settings.session_ttl_secs),
		)
		.with_secure(settings.session_cookie_secure)
	}
}

pub struct SessionMiddleware {
	config: SessionConfig,
	store: Arc<dyn SessionStore>,
}

impl SessionMiddleware {
	pub fn new(config: SessionConfig, store: Arc<dyn SessionStore>) -> Self {
		Self { config, store }
	}

	fn cookie_attributes(&self, parts: &mut Vec<String>) {
		parts.push(format!("Path={}", self.config.path));
		if self.config.http_only {
			parts.push("HttpOnly".to_string());
		}
		if self.config.secure {
			parts.push("Secure".to_string());
		}
		if let Some(same_site) = &self.config.same_site {
			parts.push(format!("SameSite={}", same_site));
		}
	}

	/// `Set-Cookie` value carrying `session_id`
	fn build_cookie_header(&self, session_id: &str) -> String {
		let mut parts = vec![format!("{}={}", self.config.cookie_name, session_id)];
		self.cookie_attributes(&mut parts);
		parts.push(format!("Max-Age={}", self.config.ttl.as_secs()));
		parts.join("; ")
	}

	/// `Set-Cookie` value that makes the browser drop the cookie
	fn build_expired_cookie_header(&self) -> String {
		let mut parts = vec![format!("{}=", self.config.cookie_name)];
		self.cookie_attributes(&mut parts);
		parts.push("Max-Age=0".to_string());
		parts.join("; ")
	}

	async fn load(&self, request: &Request) -> Session {
		match request.cookie(&self.config.cookie_name) {
			Some(id) if !id.is_empty() => self.store.load(&id).await.unwrap_or_default(),
			_ => Session::new(),
		}
	}

	/// Persist what the view did to the session and set the matching cookie.
	async fn commit(&self, mut session: Session, had_cookie: bool, response: &mut Response) {
		if let Some(stale) = session.take_stale_id() {
			self.store.delete(&stale).await;
		}

		if session.is_flushed() && !session.is_modified() {
			if had_cookie {
				response.append_header(SET_COOKIE, &self.build_expired_cookie_header());
			}
			return;
		}

		if !session.is_modified() || session.is_empty() {
			return;
		}

		let id = match session.id() {
			Some(id) => id.to_string(),
			None => {
				let id = self.store.create_session_id();
				session.assign_id(id.clone());
				id
			}
		};
		self.store.save(&id, &session).await;
		response.append_header(SET_COOKIE, &self.build_cookie_header(&id));
	}
}

#[async_trait]
impl Middleware for SessionMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let had_cookie = request.cookie(&self.config.cookie_name).is_some();
		let session = self.load(&request).await;
		let extensions = request.extensions.clone();
		extensions.insert(session);

		let mut response = next.handle(request).await?;

		if let Some(session) = extensions.remove::<Session>() {
			self.commit(session, had_cookie, &mut response).await;
		}
		Ok(response)
	}
}
