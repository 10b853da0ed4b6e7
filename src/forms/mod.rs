//! Typed forms.
//!
//! Each form is built from [`FormData`](crate::http::FormData) and validated
//! into a [`FormOutcome`]: either the cleaned value or the errors to show
//! when the page is re-rendered.

pub mod auth;
pub mod fields;
pub mod profile;
pub mod recipe;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::http::FormData;
use fields::{CharField, FieldResult};

pub use auth::{LoginForm, RegistrationForm};
pub use profile::UserProfileForm;
pub use recipe::{CommentForm, RecipeForm};

/// Error key for errors that do not belong to a single field
pub const ALL_FIELDS_KEY: &str = "_all";

/// Error messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0
			.entry(field.to_string())
			.or_default()
			.push(message.into());
	}

	pub fn add_non_field(&mut self, message: impl Into<String>) {
		self.add(ALL_FIELDS_KEY, message);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, field: &str) -> &[String] {
		self.0.get(field).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn non_field_errors(&self) -> &[String] {
		self.get(ALL_FIELDS_KEY)
	}

	pub fn has_error(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}

	/// Run a cleaner, recording its error under the field's name.
	///
	/// Returns the cleaned value, or the default when cleaning failed.
	pub fn clean<T: Default>(&mut self, field: &str, result: FieldResult<T>) -> T {
		result.unwrap_or_else(|e| {
			self.add(field, e.to_string());
			T::default()
		})
	}

	/// Shorthand for cleaning a text field from submitted data
	pub fn clean_char(&mut self, field: &CharField, data: &FormData) -> String {
		self.clean(field.name, field.clean(data.get(field.name)))
	}

	/// `Valid(value)` when no error was recorded
	pub fn finish<T>(self, value: T) -> FormOutcome<T> {
		if self.is_empty() {
			FormOutcome::Valid(value)
		} else {
			FormOutcome::Invalid(self)
		}
	}
}

/// Result of validating a form
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<T> {
	Valid(T),
	Invalid(FormErrors),
}

impl<T> FormOutcome<T> {
	pub fn is_valid(&self) -> bool {
		matches!(self, FormOutcome::Valid(_))
	}

	pub fn errors(&self) -> Option<&FormErrors> {
		match self {
			FormOutcome::Valid(_) => None,
			FormOutcome::Invalid(errors) => Some(errors),
		}
	}
}

/// What templates see for a form: submitted (or initial) values and errors
///
/// # Examples
///
/// ```
/// use recipe_box::forms::{BoundForm, FormErrors};
///
/// let mut errors = FormErrors::new();
/// errors.add("title", "This field is required.");
///
/// let form = BoundForm::new().with_value("description", "tasty").with_errors(errors);
/// let value = serde_json::to_value(&form).unwrap();
/// assert_eq!(value["data"]["description"], "tasty");
/// assert_eq!(value["errors"]["title"][0], "This field is required.");
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoundForm {
	data: HashMap<String, String>,
	errors: FormErrors,
}

impl BoundForm {
	pub fn new() -> Self {
		Self::default()
	}

	/// Echo submitted values back, leaving out the named secret fields
	pub fn from_data(data: &FormData, fields: &[&str], secret: &[&str]) -> Self {
		let data = fields
			.iter()
			.filter(|name| !secret.contains(*name))
			.map(|name| (name.to_string(), data.value(name).to_string()))
			.collect();
		Self {
			data,
			errors: FormErrors::new(),
		}
	}

	pub fn with_value(mut self, field: &str, value: impl Into<String>) -> Self {
		self.data.insert(field.to_string(), value.into());
		self
	}

	pub fn with_errors(mut self, errors: FormErrors) -> Self {
		self.errors = errors;
		self
	}

	pub fn errors(&self) -> &FormErrors {
		&self.errors
	}
}
