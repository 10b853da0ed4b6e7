//! Persistence for recipes, comments, profiles and users.
//!
//! Views talk to the [`Database`] trait object only. Two backends exist:
//! [`InMemoryDatabase`] for tests and throwaway runs, and [`SqliteDatabase`]
//! for anything that should survive a restart.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{
	Comment, NewComment, NewUser, ProfileData, Recipe, RecipeData, User, UserProfile,
};

pub use memory::InMemoryDatabase;
pub use sqlite::SqliteDatabase;

#[async_trait]
pub trait RecipeStore: Send + Sync {
	/// All recipes in id order, optionally filtered by a case-insensitive
	/// title substring. `None` and `Some("")` both return everything.
	async fn list_recipes(&self, title_query: Option<&str>) -> Result<Vec<Recipe>>;

	async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>>;

	async fn create_recipe(&self, data: RecipeData) -> Result<Recipe>;

	/// Replace the editable fields and stamp `time_edited`.
	///
	/// Fails with [`Error::NotFound`] when the recipe is gone.
	async fn update_recipe(&self, id: i64, data: RecipeData) -> Result<Recipe>;

	/// Delete a recipe and its comments. Returns `false` if nothing was deleted.
	async fn delete_recipe(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
	/// Fails with [`Error::Integrity`] when the recipe does not exist.
	async fn add_comment(&self, comment: NewComment) -> Result<Comment>;

	/// Comments on a recipe, oldest first
	async fn comments_for(&self, recipe_id: i64) -> Result<Vec<Comment>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
	async fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>>;

	/// Insert the user's profile, or update it in place if one exists.
	async fn save_profile(&self, user_id: i64, data: ProfileData) -> Result<UserProfile>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
	/// Fails with [`Error::Integrity`] when the username is taken.
	async fn create_user(&self, user: NewUser) -> Result<User>;

	async fn get_user(&self, id: i64) -> Result<Option<User>>;

	/// Exact, case-sensitive lookup
	async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

	async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()>;
}

/// Every store the application needs, behind one trait object
pub trait Database: RecipeStore + CommentStore + ProfileStore + UserStore {}

impl<T> Database for T where T: RecipeStore + CommentStore + ProfileStore + UserStore {}

/// Open the backend named by `database_url`.
///
/// `memory` selects the in-memory backend; `sqlite:` urls open (and create if
/// needed) a SQLite database.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let db = recipe_box::db::connect("memory").await.unwrap();
/// assert!(db.list_recipes(None).await.unwrap().is_empty());
/// # });
/// ```
pub async fn connect(database_url: &str) -> Result<Arc<dyn Database>> {
	if database_url == "memory" {
		tracing::info!("using in-memory database");
		return Ok(Arc::new(InMemoryDatabase::new()));
	}
	if database_url.starts_with("sqlite:") {
		let db = SqliteDatabase::connect(database_url).await?;
		tracing::info!(url = %database_url, "connected to SQLite database");
		return Ok(Arc::new(db));
	}
	Err(Error::Database(format!(
		"Unsupported database url: {}",
		database_url
	)))
}
