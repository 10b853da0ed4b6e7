//! Submitted form bodies
//!
//! Views read both `application/x-www-form-urlencoded` and
//! `multipart/form-data` posts through [`FormData`].

use futures::future::ready;
use futures::stream::once;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::http::{Request, UploadedFile};

/// Text fields and uploaded files of a POST body.
#[derive(Debug, Clone, Default)]
pub struct FormData {
	fields: HashMap<String, String>,
	files: HashMap<String, UploadedFile>,
}

impl FormData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse the body of `request` according to its content type.
	///
	/// An empty body yields empty form data whatever the content type. Any
	/// other non-form content type is a bad request.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::{FormData, Request};
	/// use hyper::Method;
	///
	/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/login/")
	///     .header("content-type", "application/x-www-form-urlencoded")
	///     .body("username=alice&password=s%20cret")
	///     .build()
	///     .unwrap();
	///
	/// let form = FormData::parse(&request).await.unwrap();
	/// assert_eq!(form.get("username"), Some("alice"));
	/// assert_eq!(form.get("password"), Some("s cret"));
	/// # });
	/// ```
	pub async fn parse(request: &Request) -> Result<Self> {
		if request.body.is_empty() {
			return Ok(Self::default());
		}

		match request.media_type().as_deref() {
			Some("application/x-www-form-urlencoded") => Self::from_urlencoded(&request.body),
			Some("multipart/form-data") => {
				let content_type = request.content_type().unwrap_or_default();
				Self::from_multipart(content_type, request.body.clone()).await
			}
			other => Err(Error::BadRequest(format!(
				"Unsupported form content type: {}",
				other.unwrap_or("none")
			))),
		}
	}

	fn from_urlencoded(body: &[u8]) -> Result<Self> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
			.map_err(|e| Error::BadRequest(format!("Malformed form body: {}", e)))?;
		Ok(Self {
			fields: pairs.into_iter().collect(),
			files: HashMap::new(),
		})
	}

	async fn from_multipart(content_type: &str, body: bytes::Bytes) -> Result<Self> {
		let boundary = multer::parse_boundary(content_type)?;
		let stream = once(ready(Ok::<_, std::io::Error>(body)));
		let mut multipart = multer::Multipart::new(stream, boundary);

		let mut data = Self::default();
		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_string) else {
				continue;
			};

			match field.file_name().map(str::to_string) {
				Some(file_name) => {
					let content_type = field.content_type().map(|m| m.to_string());
					let content = field.bytes().await?;
					// Browsers send an empty part when no file was chosen.
					if file_name.is_empty() && content.is_empty() {
						continue;
					}
					let mut file = UploadedFile::new(file_name, content);
					file.content_type = content_type;
					data.files.insert(name, file);
				}
				None => {
					let text = field.text().await?;
					data.fields.insert(name, text);
				}
			}
		}
		Ok(data)
	}

	/// Value of a text field
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	/// Value of a text field, or the empty string when absent
	pub fn value(&self, name: &str) -> &str {
		self.get(name).unwrap_or_default()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn file(&self, name: &str) -> Option<&UploadedFile> {
		self.files.get(name)
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.fields.insert(name.into(), value.into());
	}

	pub fn insert_file(&mut self, name: impl Into<String>, file: UploadedFile) {
		self.files.insert(name.into(), file);
	}
}
