//! Uploaded file handling
//!
//! Multipart parts that carry a file name become [`UploadedFile`]s. Names are
//! checked with [`validate_safe_filename`] before anything touches the disk.

use bytes::Bytes;
use percent_encoding::percent_decode_str;

/// Errors that can occur while accepting an upload
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FileUploadError {
	#[error("File too large: {0} bytes (max: {1} bytes)")]
	FileTooLarge(usize, usize),
	#[error("The submitted file is empty.")]
	EmptyFile,
	#[error("Upload error: {0}")]
	Upload(String),
	#[error("Path traversal detected in filename")]
	PathTraversal,
}

/// Reject names that could escape the upload directory.
///
/// Both the raw name and its percent-decoded form are checked, so `%2e%2e%2f`
/// is caught as well as `../`.
///
/// # Examples
///
/// ```
/// use recipe_box::http::upload::validate_safe_filename;
///
/// assert!(validate_safe_filename("pie.jpg").is_ok());
/// assert!(validate_safe_filename("../etc/passwd").is_err());
/// assert!(validate_safe_filename("%2e%2e%2fsecret").is_err());
/// ```
pub fn validate_safe_filename(filename: &str) -> Result<(), FileUploadError> {
	if filename.is_empty() {
		return Err(FileUploadError::Upload("Empty filename".to_string()));
	}

	let decoded = percent_decode_str(filename).decode_utf8_lossy();
	for candidate in [filename, decoded.as_ref()] {
		if candidate.contains('\0') || candidate.contains("..") {
			return Err(FileUploadError::PathTraversal);
		}
		if candidate.contains('/') || candidate.contains('\\') {
			return Err(FileUploadError::PathTraversal);
		}
		// Windows drive prefix
		let bytes = candidate.as_bytes();
		if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
			return Err(FileUploadError::PathTraversal);
		}
	}
	Ok(())
}

/// A file received in a multipart body, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	pub file_name: String,
	pub content_type: Option<String>,
	pub content: Bytes,
}

impl UploadedFile {
	pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
		Self {
			file_name: file_name.into(),
			content_type: None,
			content: content.into(),
		}
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	pub fn size(&self) -> usize {
		self.content.len()
	}

	/// Check the name, emptiness and size of the upload.
	pub fn validate(&self, max_size: usize) -> Result<(), FileUploadError> {
		validate_safe_filename(&self.file_name)?;
		if self.content.is_empty() {
			return Err(FileUploadError::EmptyFile);
		}
		if self.size() > max_size {
			return Err(FileUploadError::FileTooLarge(self.size(), max_size));
		}
		Ok(())
	}
}
