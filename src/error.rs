//! Crate-wide error type.

use crate::http::upload::FileUploadError;

/// Errors raised while serving a request or booting the application.
///
/// Validation problems are *not* errors: forms report them through
/// [`crate::forms::FormOutcome`] and the view re-renders the page.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A lookup by primary key found nothing.
	///
	/// The recipe views let this escape to the server boundary, where it is
	/// rendered as an internal server error.
	#[error("{0} matching query does not exist")]
	NotFound(&'static str),

	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Request body too large (max: {0} bytes)")]
	PayloadTooLarge(usize),

	#[error("Authentication error: {0}")]
	Authentication(String),

	#[error("Integrity error: {0}")]
	Integrity(String),

	#[error("Database error: {0}")]
	Database(String),

	#[error("Template error: {0}")]
	Template(#[from] tera::Error),

	#[error("Upload error: {0}")]
	Upload(#[from] FileUploadError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("HTTP error: {0}")]
	Http(String),

	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl Error {
	/// HTTP status code used when this error reaches the server boundary.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::Error;
	///
	/// assert_eq!(Error::BadRequest("bad".into()).status_code(), 400);
	/// assert_eq!(Error::NotFound("Recipe").status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::BadRequest(_) | Error::Upload(_) => 400,
			Error::PayloadTooLarge(_) => 413,
			_ => 500,
		}
	}
}

impl From<sqlx::Error> for Error {
	fn from(error: sqlx::Error) -> Self {
		Error::Database(error.to_string())
	}
}

impl From<multer::Error> for Error {
	fn from(error: multer::Error) -> Self {
		Error::BadRequest(error.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

impl From<crate::conf::SettingsError> for Error {
	fn from(error: crate::conf::SettingsError) -> Self {
		Error::Configuration(error.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
