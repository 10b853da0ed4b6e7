//! Media storage for recipe attachments.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::Result;
use crate::http::UploadedFile;
use crate::http::upload::{FileUploadError, validate_safe_filename};
use crate::models::Attachment;

/// A stored file read back for serving
#[derive(Debug, Clone)]
pub struct StoredFile {
	pub content: Bytes,
	pub content_type: String,
}

/// Stores uploads as flat files under a media root
///
/// Every upload gets a unique stored name so two files with the same
/// original name never collide.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
	root: PathBuf,
}

impl FileSystemStorage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path(&self, name: &str) -> Result<PathBuf> {
		validate_safe_filename(name)?;
		Ok(self.root.join(name))
	}

	/// Write an upload to disk and describe it as an [`Attachment`].
	pub async fn save(&self, file: &UploadedFile) -> Result<Attachment> {
		validate_safe_filename(&file.file_name)?;
		let stored_name = format!("{}_{}", Uuid::new_v4().simple(), file.file_name);
		let path = self.path(&stored_name)?;

		fs::create_dir_all(&self.root).await?;
		fs::write(&path, &file.content).await?;
		tracing::debug!(stored_name = %stored_name, size = file.size(), "saved attachment");

		let content_type = file
			.content_type
			.clone()
			.unwrap_or_else(|| guess_content_type(&file.file_name));

		Ok(Attachment {
			original_name: file.file_name.clone(),
			stored_name,
			content_type,
			size: file.size() as u64,
		})
	}

	/// Read a stored file. `None` when no such file exists or the name is unsafe.
	pub async fn open(&self, name: &str) -> Result<Option<StoredFile>> {
		let path = match self.path(name) {
			Ok(path) => path,
			Err(crate::Error::Upload(FileUploadError::PathTraversal)) => return Ok(None),
			Err(e) => return Err(e),
		};
		match fs::read(&path).await {
			Ok(content) => Ok(Some(StoredFile {
				content: Bytes::from(content),
				content_type: guess_content_type(name),
			})),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Remove a stored file. Missing files are not an error.
	pub async fn delete(&self, name: &str) -> Result<()> {
		let path = self.path(name)?;
		match fs::remove_file(&path).await {
			Ok(()) => {
				tracing::debug!(stored_name = %name, "deleted attachment");
				Ok(())
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

pub fn guess_content_type(name: &str) -> String {
	mime_guess::from_path(name)
		.first_or_octet_stream()
		.essence_str()
		.to_string()
}
