//! Login and registration forms.
//!
//! Both need the user store during validation: login to check credentials,
//! registration to check that the username is free.

use crate::auth::PasswordHasher;
use crate::db::UserStore;
use crate::error::Result;
use crate::forms::fields::CharField;
use crate::forms::{BoundForm, FormErrors, FormOutcome};
use crate::http::FormData;
use crate::models::User;

pub const INVALID_LOGIN: &str = "Please enter a correct username and password. \
	Note that both fields may be case-sensitive.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only \
	letters, numbers, and @/./+/-/_ characters.";

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn username_field() -> CharField {
	CharField::new("username").required().with_max_length(150)
}

fn password_field(name: &'static str) -> CharField {
	CharField::new(name).required().no_strip()
}

/// Username/password sign-in
pub struct LoginForm;

impl LoginForm {
	pub const FIELDS: &'static [&'static str] = &["username", "password"];

	/// Validate the fields and check the credentials.
	///
	/// Wrong credentials are a non-field error, never an `Err`.
	pub async fn validate<U: UserStore + ?Sized>(
		data: &FormData,
		users: &U,
		hasher: &dyn PasswordHasher,
	) -> Result<FormOutcome<User>> {
		let mut errors = FormErrors::new();
		let username = errors.clean_char(&username_field(), data);
		let password = errors.clean_char(&password_field("password"), data);
		if !errors.is_empty() {
			return Ok(FormOutcome::Invalid(errors));
		}

		if let Some(user) = users.find_by_username(&username).await?
			&& hasher.verify(&password, &user.password_hash).unwrap_or(false)
		{
			return Ok(FormOutcome::Valid(user));
		}

		tracing::info!(username = %username, "failed login attempt");
		errors.add_non_field(INVALID_LOGIN);
		Ok(FormOutcome::Invalid(errors))
	}

	/// Echo the username back; the password is never re-rendered
	pub fn bound(data: &FormData, errors: FormErrors) -> BoundForm {
		BoundForm::from_data(data, Self::FIELDS, &["password"]).with_errors(errors)
	}
}

/// Cleaned registration data. The password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
	pub username: String,
	pub password: String,
}

impl RegistrationForm {
	pub const FIELDS: &'static [&'static str] = &["username", "password1", "password2"];

	pub async fn validate<U: UserStore + ?Sized>(
		data: &FormData,
		users: &U,
	) -> Result<FormOutcome<Self>> {
		let mut errors = FormErrors::new();

		let username = errors.clean_char(&username_field(), data);
		if !username.is_empty() {
			if !is_valid_username(&username) {
				errors.add("username", INVALID_USERNAME);
			} else if users.find_by_username(&username).await?.is_some() {
				errors.add("username", USERNAME_TAKEN);
			}
		}

		let password1 = errors.clean_char(&password_field("password1"), data);
		let password2 = errors.clean_char(&password_field("password2"), data);
		if !password1.is_empty() && !password2.is_empty() {
			if password1 != password2 {
				errors.add("password2", PASSWORD_MISMATCH);
			} else {
				for problem in password_problems(&password2) {
					errors.add("password2", problem);
				}
			}
		}

		Ok(errors.finish(Self {
			username,
			password: password1,
		}))
	}

	pub fn bound(data: &FormData, errors: FormErrors) -> BoundForm {
		BoundForm::from_data(data, Self::FIELDS, &["password1", "password2"]).with_errors(errors)
	}
}

/// Letters, digits and `@.+-_`
pub fn is_valid_username(username: &str) -> bool {
	!username.is_empty()
		&& username
			.chars()
			.all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Password strength messages; empty when the password is acceptable
///
/// # Examples
///
/// ```
/// use recipe_box::forms::auth::password_problems;
///
/// assert!(password_problems("correct horse").is_empty());
/// assert_eq!(password_problems("12345678"), ["This password is entirely numeric."]);
/// assert_eq!(password_problems("1234").len(), 2);
/// ```
pub fn password_problems(password: &str) -> Vec<String> {
	let mut problems = Vec::new();
	let length = password.chars().count();
	if length < MIN_PASSWORD_LENGTH {
		problems.push(format!(
			"This password is too short. It must contain at least {} characters.",
			MIN_PASSWORD_LENGTH
		));
	}
	if password.chars().all(|c| c.is_ascii_digit()) {
		problems.push("This password is entirely numeric.".to_string());
	}
	problems
}
