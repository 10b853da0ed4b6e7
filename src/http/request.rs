use crate::error::{Error, Result};
use crate::http::Extensions;
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, COOKIE, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

/// HTTP request as seen by views and middleware.
///
/// The body is fully buffered by the server before the request is built.
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	/// Shared, type-keyed storage. Clones share the same underlying map.
	pub extensions: Extensions,
	query_params: HashMap<String, String>,
}

impl Request {
	/// Start building a request.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/?q=pie")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/");
	/// assert_eq!(request.query("q"), Some("pie"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Parse and percent-decode the query string (`+` decodes to a space).
	fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
			.map(|pairs| pairs.into_iter().collect())
			.unwrap_or_default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Decoded value of a query parameter. The last occurrence wins.
	pub fn query(&self, name: &str) -> Option<&str> {
		self.query_params.get(name).map(String::as_str)
	}

	/// The media type of the body, without parameters, lowercased.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/login/")
	///     .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.media_type().as_deref(), Some("application/x-www-form-urlencoded"));
	/// ```
	pub fn media_type(&self) -> Option<String> {
		self.content_type()
			.and_then(|ct| ct.split(';').next())
			.map(|mt| mt.trim().to_ascii_lowercase())
	}

	/// The raw `Content-Type` header value.
	pub fn content_type(&self) -> Option<&str> {
		self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
	}

	/// Look up a cookie by name across all `Cookie` headers.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/")
	///     .header("cookie", "theme=dark; sessionid=abc123")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.cookie("sessionid").as_deref(), Some("abc123"));
	/// assert_eq!(request.cookie("missing"), None);
	/// ```
	pub fn cookie(&self, name: &str) -> Option<String> {
		self.headers
			.get_all(COOKIE)
			.iter()
			.filter_map(|v| v.to_str().ok())
			.flat_map(|cookies| cookies.split(';'))
			.find_map(|cookie| {
				let (key, value) = cookie.trim().split_once('=')?;
				(key == name).then(|| value.to_string())
			})
	}
}

/// Builder for [`Request`], mostly used by the server and by tests.
#[derive(Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	error: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a header. Invalid names or values are reported by [`build`](Self::build).
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => {
				self.error = Some(format!("invalid header {}: {}", name, value));
			}
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		if let Some(error) = self.error {
			return Err(Error::Http(error));
		}
		let uri: Uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse()
			.map_err(|e: hyper::http::uri::InvalidUri| Error::Http(e.to_string()))?;
		let query_params = Request::parse_query_params(&uri);

		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			version: self.version.unwrap_or(Version::HTTP_11),
			headers: self.headers,
			body: self.body,
			remote_addr: self.remote_addr,
			extensions: Extensions::new(),
			query_params,
		})
	}
}
