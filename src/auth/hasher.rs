use argon2::Argon2;
use argon2::password_hash::{
	PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Password hasher trait
///
/// # Examples
///
/// ```
/// use recipe_box::auth::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new();
/// let hash = hasher.hash("correct horse").unwrap();
///
/// assert!(hasher.verify("correct horse", &hash).unwrap());
/// assert!(!hasher.verify("wrong horse", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
	fn hash(&self, password: &str) -> Result<String>;

	/// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		// v4 UUIDs come from the OS RNG
		let salt_bytes = Uuid::new_v4();
		let salt = SaltString::encode_b64(salt_bytes.as_bytes())
			.map_err(|e| Error::Authentication(e.to_string()))?;

		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::Authentication(e.to_string()))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		let parsed_hash =
			PasswordHash::new(hash).map_err(|e| Error::Authentication(e.to_string()))?;

		Ok(Argon2::default()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}
