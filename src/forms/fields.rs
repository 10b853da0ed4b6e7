//! Field-level cleaning for submitted form values.

use crate::http::UploadedFile;
use crate::http::upload::FileUploadError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	#[error("This field is required.")]
	Required,
	#[error("Ensure this value has at most {max} characters (it has {actual}).")]
	MaxLength { max: usize, actual: usize },
	#[error("Ensure this value has at least {min} characters (it has {actual}).")]
	MinLength { min: usize, actual: usize },
	#[error("{0}")]
	Invalid(String),
}

pub type FieldResult<T> = Result<T, FieldError>;

/// A text input
///
/// # Examples
///
/// ```
/// use recipe_box::forms::fields::{CharField, FieldError};
///
/// let title = CharField::new("title").required().with_max_length(5);
/// assert_eq!(title.clean(Some("  Pie ")), Ok("Pie".to_string()));
/// assert_eq!(title.clean(Some("   ")), Err(FieldError::Required));
/// assert_eq!(
///     title.clean(Some("Apple Pie")),
///     Err(FieldError::MaxLength { max: 5, actual: 9 })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CharField {
	pub name: &'static str,
	pub required: bool,
	pub max_length: Option<usize>,
	pub min_length: Option<usize>,
	pub strip: bool,
}

impl CharField {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			required: false,
			max_length: None,
			min_length: None,
			strip: true,
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_min_length(mut self, min_length: usize) -> Self {
		self.min_length = Some(min_length);
		self
	}

	/// Keep surrounding whitespace (used for passwords)
	pub fn no_strip(mut self) -> Self {
		self.strip = false;
		self
	}

	/// Clean a raw value. Optional fields yield `""` when left blank.
	pub fn clean(&self, value: Option<&str>) -> FieldResult<String> {
		let value = value.unwrap_or_default();
		let value = if self.strip { value.trim() } else { value };

		if value.is_empty() {
			return if self.required {
				Err(FieldError::Required)
			} else {
				Ok(String::new())
			};
		}

		// Lengths count characters, not bytes
		let actual = value.chars().count();
		if let Some(max) = self.max_length
			&& actual > max
		{
			return Err(FieldError::MaxLength { max, actual });
		}
		if let Some(min) = self.min_length
			&& actual < min
		{
			return Err(FieldError::MinLength { min, actual });
		}

		Ok(value.to_string())
	}
}

/// An optional file input
#[derive(Debug, Clone)]
pub struct FileField {
	pub name: &'static str,
	pub max_size: usize,
}

impl FileField {
	pub fn new(name: &'static str, max_size: usize) -> Self {
		Self { name, max_size }
	}

	/// `Ok(None)` when no file was submitted.
	pub fn clean(&self, file: Option<&UploadedFile>) -> FieldResult<Option<UploadedFile>> {
		let Some(file) = file else {
			return Ok(None);
		};
		file.validate(self.max_size).map_err(|e| match e {
			FileUploadError::EmptyFile => {
				FieldError::Invalid("The submitted file is empty.".to_string())
			}
			FileUploadError::FileTooLarge(_, max) => FieldError::Invalid(format!(
				"Ensure this file is at most {} bytes.",
				max
			)),
			_ => FieldError::Invalid("Invalid file name.".to_string()),
		})?;
		Ok(Some(file.clone()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(None, Ok(String::new()))]
	#[case(Some(""), Ok(String::new()))]
	#[case(Some(" hi "), Ok("hi".to_string()))]
	fn test_optional_char_field(#[case] input: Option<&str>, #[case] expected: FieldResult<String>) {
		assert_eq!(CharField::new("bio").clean(input), expected);
	}

	#[test]
	fn test_length_counts_characters() {
		let field = CharField::new("name").with_max_length(3);
		assert_eq!(field.clean(Some("été")), Ok("été".to_string()));
	}

	#[test]
	fn test_no_strip_keeps_spaces() {
		let field = CharField::new("password").required().no_strip();
		assert_eq!(field.clean(Some(" pw ")), Ok(" pw ".to_string()));
	}

	#[test]
	fn test_min_length() {
		let field = CharField::new("password").with_min_length(8);
		assert_eq!(
			field.clean(Some("short")),
			Err(FieldError::MinLength { min: 8, actual: 5 })
		);
	}

	#[test]
	fn test_file_field() {
		let field = FileField::new("attachment", 4);
		assert_eq!(field.clean(None), Ok(None));
		assert!(field.clean(Some(&UploadedFile::new("a.txt", "abcd"))).unwrap().is_some());
		assert!(matches!(
			field.clean(Some(&UploadedFile::new("a.txt", "abcde"))),
			Err(FieldError::Invalid(_))
		));
		assert!(matches!(
			field.clean(Some(&UploadedFile::new("../a.txt", "ab"))),
			Err(FieldError::Invalid(_))
		));
		assert_eq!(
			field.clean(Some(&UploadedFile::new("a.txt", ""))),
			Err(FieldError::Invalid("The submitted file is empty.".to_string()))
		);
	}
}
