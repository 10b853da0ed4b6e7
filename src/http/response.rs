use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};

/// HTTP Response representation
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a Response with HTTP 405 Method Not Allowed and an `Allow` header
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Response;
	/// use hyper::{Method, StatusCode};
	///
	/// let response = Response::method_not_allowed(&[Method::GET, Method::POST]);
	/// assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	/// assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
	/// ```
	pub fn method_not_allowed(allowed: &[hyper::Method]) -> Self {
		let allow = allowed
			.iter()
			.map(hyper::Method::as_str)
			.collect::<Vec<_>>()
			.join(", ");
		Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header("allow", &allow)
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::temporary_redirect("/login/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.location(), Some("/login/"));
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Append a header without replacing existing values (used for `Set-Cookie`)
	pub fn append_header(&mut self, name: HeaderName, value: &str) {
		if let Ok(header_value) = HeaderValue::from_str(value) {
			self.headers.append(name, header_value);
		}
	}

	/// Add a Location header to the response
	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(hyper::header::LOCATION, value);
		}
		self
	}

	pub fn with_typed_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Value of the `Location` header, if any
	pub fn location(&self) -> Option<&str> {
		self.headers
			.get(hyper::header::LOCATION)
			.and_then(|v| v.to_str().ok())
	}

	pub fn is_redirect(&self) -> bool {
		self.status.is_redirection()
	}

	/// Body decoded as UTF-8, replacing invalid sequences
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
