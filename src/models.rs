//! Domain records persisted by the stores in [`crate::db`].
//!
//! Ids are assigned by the store; the `New*` and `*Data` structs carry what a
//! caller supplies when creating or updating a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file uploaded alongside a recipe and kept in media storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
	/// Name the client uploaded the file under
	pub original_name: String,
	/// Unique name inside the media root
	pub stored_name: String,
	pub content_type: String,
	pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub ingredients: String,
	pub instructions: String,
	pub attachment: Option<Attachment>,
	pub time_created: DateTime<Utc>,
	pub time_edited: Option<DateTime<Utc>>,
}

impl Recipe {
	/// See [`title_contains`].
	pub fn title_contains(&self, query: &str) -> bool {
		title_contains(&self.title, query)
	}
}

/// Case-insensitive substring match on the title.
///
/// An empty query matches every recipe.
///
/// # Examples
///
/// ```
/// use recipe_box::models::title_contains;
///
/// assert!(title_contains("Apple Pie", "pie"));
/// assert!(title_contains("Apple Pie", ""));
/// assert!(!title_contains("Pasta Bake", "pie"));
/// ```
pub fn title_contains(title: &str, query: &str) -> bool {
	query.is_empty() || title.to_lowercase().contains(&query.to_lowercase())
}

/// Fields written when a recipe is created or edited
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeData {
	pub title: String,
	pub description: String,
	pub ingredients: String,
	pub instructions: String,
	pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
	pub id: i64,
	pub recipe_id: i64,
	pub author: String,
	pub body: String,
	pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
	pub recipe_id: i64,
	pub author: String,
	pub body: String,
}

/// One-to-one extension of [`User`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: i64,
	pub user_id: i64,
	pub display_name: String,
	pub bio: String,
	pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileData {
	pub display_name: String,
	pub bio: String,
	pub location: String,
}

impl From<&UserProfile> for ProfileData {
	fn from(profile: &UserProfile) -> Self {
		Self {
			display_name: profile.display_name.clone(),
			bio: profile.bio.clone(),
			location: profile.location.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: i64,
	pub username: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub date_joined: DateTime<Utc>,
	pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
	pub username: String,
	pub password_hash: String,
}
