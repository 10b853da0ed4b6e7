//! SQLite backend on an sqlx pool.
//!
//! The schema is created on connect. Title search folds case with SQLite's
//! `lower()`, which only folds ASCII letters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::str::FromStr;

use crate::db::{CommentStore, ProfileStore, RecipeStore, UserStore};
use crate::error::{Error, Result};
use crate::models::{
	Attachment, Comment, NewComment, NewUser, ProfileData, Recipe, RecipeData, User, UserProfile,
};

const SCHEMA: &[&str] = &[
	"CREATE TABLE IF NOT EXISTS users (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		username TEXT NOT NULL UNIQUE,
		password_hash TEXT NOT NULL,
		date_joined TEXT NOT NULL,
		last_login TEXT NULL
	)",
	"CREATE TABLE IF NOT EXISTS recipes (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		title TEXT NOT NULL,
		description TEXT NOT NULL DEFAULT '',
		ingredients TEXT NOT NULL,
		instructions TEXT NOT NULL,
		attachment_original_name TEXT NULL,
		attachment_stored_name TEXT NULL,
		attachment_content_type TEXT NULL,
		attachment_size INTEGER NULL,
		time_created TEXT NOT NULL,
		time_edited TEXT NULL
	)",
	"CREATE TABLE IF NOT EXISTS comments (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
		author TEXT NOT NULL,
		body TEXT NOT NULL,
		time_created TEXT NOT NULL
	)",
	"CREATE INDEX IF NOT EXISTS idx_comments_recipe_id ON comments(recipe_id)",
	"CREATE TABLE IF NOT EXISTS profiles (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
		display_name TEXT NOT NULL,
		bio TEXT NOT NULL DEFAULT '',
		location TEXT NOT NULL DEFAULT ''
	)",
];

const RECIPE_COLUMNS: &str = "id, title, description, ingredients, instructions, \
	attachment_original_name, attachment_stored_name, attachment_content_type, \
	attachment_size, time_created, time_edited";

pub struct SqliteDatabase {
	pool: SqlitePool,
}

impl SqliteDatabase {
	/// Open `database_url`, creating the file and schema if missing.
	pub async fn connect(database_url: &str) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(database_url)?
			.create_if_missing(true)
			.foreign_keys(true);

		// Every connection to `:memory:` is its own database, so keep exactly one alive.
		let pool = if database_url.contains(":memory:") {
			SqlitePoolOptions::new()
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.connect_with(options)
				.await?
		} else {
			SqlitePoolOptions::new()
				.max_connections(5)
				.connect_with(options)
				.await?
		};

		let db = Self { pool };
		db.create_schema().await?;
		Ok(db)
	}

	async fn create_schema(&self) -> Result<()> {
		for statement in SCHEMA {
			sqlx::query(statement).execute(&self.pool).await?;
		}
		Ok(())
	}
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe> {
	let stored_name: Option<String> = row.try_get("attachment_stored_name")?;
	let attachment = match stored_name {
		Some(stored_name) => Some(Attachment {
			original_name: row
				.try_get::<Option<String>, _>("attachment_original_name")?
				.unwrap_or_default(),
			stored_name,
			content_type: row
				.try_get::<Option<String>, _>("attachment_content_type")?
				.unwrap_or_default(),
			size: row
				.try_get::<Option<i64>, _>("attachment_size")?
				.unwrap_or_default()
				.max(0) as u64,
		}),
		None => None,
	};

	Ok(Recipe {
		id: row.try_get("id")?,
		title: row.try_get("title")?,
		description: row.try_get("description")?,
		ingredients: row.try_get("ingredients")?,
		instructions: row.try_get("instructions")?,
		attachment,
		time_created: row.try_get("time_created")?,
		time_edited: row.try_get("time_edited")?,
	})
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
	Ok(Comment {
		id: row.try_get("id")?,
		recipe_id: row.try_get("recipe_id")?,
		author: row.try_get("author")?,
		body: row.try_get("body")?,
		time_created: row.try_get("time_created")?,
	})
}

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
	Ok(UserProfile {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		display_name: row.try_get("display_name")?,
		bio: row.try_get("bio")?,
		location: row.try_get("location")?,
	})
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
	Ok(User {
		id: row.try_get("id")?,
		username: row.try_get("username")?,
		password_hash: row.try_get("password_hash")?,
		date_joined: row.try_get("date_joined")?,
		last_login: row.try_get("last_login")?,
	})
}

/// Map constraint violations to [`Error::Integrity`], everything else to [`Error::Database`].
fn constraint_error(error: sqlx::Error, message: impl FnOnce() -> String) -> Error {
	if let sqlx::Error::Database(db_error) = &error
		&& (db_error.is_unique_violation() || db_error.is_foreign_key_violation())
	{
		return Error::Integrity(message());
	}
	error.into()
}

#[async_trait]
impl RecipeStore for SqliteDatabase {
	async fn list_recipes(&self, title_query: Option<&str>) -> Result<Vec<Recipe>> {
		let query = title_query.unwrap_or_default();
		let sql = format!(
			"SELECT {} FROM recipes WHERE ? = '' OR instr(lower(title), lower(?)) > 0 ORDER BY id",
			RECIPE_COLUMNS
		);
		let rows = sqlx::query(&sql)
			.bind(query)
			.bind(query)
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(recipe_from_row).collect()
	}

	async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
		let sql = format!("SELECT {} FROM recipes WHERE id = ?", RECIPE_COLUMNS);
		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;
		row.as_ref().map(recipe_from_row).transpose()
	}

	async fn create_recipe(&self, data: RecipeData) -> Result<Recipe> {
		let attachment = data.attachment.as_ref();
		let result = sqlx::query(
			"INSERT INTO recipes (title, description, ingredients, instructions, \
			attachment_original_name, attachment_stored_name, attachment_content_type, \
			attachment_size, time_created) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(&data.title)
		.bind(&data.description)
		.bind(&data.ingredients)
		.bind(&data.instructions)
		.bind(attachment.map(|a| a.original_name.as_str()))
		.bind(attachment.map(|a| a.stored_name.as_str()))
		.bind(attachment.map(|a| a.content_type.as_str()))
		.bind(attachment.map(|a| a.size as i64))
		.bind(Utc::now())
		.execute(&self.pool)
		.await?;

		self.get_recipe(result.last_insert_rowid())
			.await?
			.ok_or(Error::NotFound("Recipe"))
	}

	async fn update_recipe(&self, id: i64, data: RecipeData) -> Result<Recipe> {
		let attachment = data.attachment.as_ref();
		let result = sqlx::query(
			"UPDATE recipes SET title = ?, description = ?, ingredients = ?, instructions = ?, \
			attachment_original_name = ?, attachment_stored_name = ?, \
			attachment_content_type = ?, attachment_size = ?, time_edited = ? WHERE id = ?",
		)
		.bind(&data.title)
		.bind(&data.description)
		.bind(&data.ingredients)
		.bind(&data.instructions)
		.bind(attachment.map(|a| a.original_name.as_str()))
		.bind(attachment.map(|a| a.stored_name.as_str()))
		.bind(attachment.map(|a| a.content_type.as_str()))
		.bind(attachment.map(|a| a.size as i64))
		.bind(Utc::now())
		.bind(id)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(Error::NotFound("Recipe"));
		}
		self.get_recipe(id).await?.ok_or(Error::NotFound("Recipe"))
	}

	async fn delete_recipe(&self, id: i64) -> Result<bool> {
		let mut tx = self.pool.begin().await?;
		sqlx::query("DELETE FROM comments WHERE recipe_id = ?")
			.bind(id)
			.execute(&mut *tx)
			.await?;
		let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
			.bind(id)
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;
		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl CommentStore for SqliteDatabase {
	async fn add_comment(&self, comment: NewComment) -> Result<Comment> {
		let result = sqlx::query(
			"INSERT INTO comments (recipe_id, author, body, time_created) VALUES (?, ?, ?, ?)",
		)
		.bind(comment.recipe_id)
		.bind(&comment.author)
		.bind(&comment.body)
		.bind(Utc::now())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			constraint_error(e, || format!("recipe {} does not exist", comment.recipe_id))
		})?;

		let row = sqlx::query(
			"SELECT id, recipe_id, author, body, time_created FROM comments WHERE id = ?",
		)
		.bind(result.last_insert_rowid())
		.fetch_one(&self.pool)
		.await?;
		comment_from_row(&row)
	}

	async fn comments_for(&self, recipe_id: i64) -> Result<Vec<Comment>> {
		let rows = sqlx::query(
			"SELECT id, recipe_id, author, body, time_created FROM comments \
			WHERE recipe_id = ? ORDER BY id",
		)
		.bind(recipe_id)
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(comment_from_row).collect()
	}
}

#[async_trait]
impl ProfileStore for SqliteDatabase {
	async fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
		let row = sqlx::query(
			"SELECT id, user_id, display_name, bio, location FROM profiles WHERE user_id = ?",
		)
		.bind(user_id)
		.fetch_optional(&self.pool)
		.await?;
		row.as_ref().map(profile_from_row).transpose()
	}

	async fn save_profile(&self, user_id: i64, data: ProfileData) -> Result<UserProfile> {
		sqlx::query(
			"INSERT INTO profiles (user_id, display_name, bio, location) VALUES (?, ?, ?, ?) \
			ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name, \
			bio = excluded.bio, location = excluded.location",
		)
		.bind(user_id)
		.bind(&data.display_name)
		.bind(&data.bio)
		.bind(&data.location)
		.execute(&self.pool)
		.await
		.map_err(|e| constraint_error(e, || format!("user {} does not exist", user_id)))?;

		self.profile_for_user(user_id)
			.await?
			.ok_or(Error::NotFound("UserProfile"))
	}
}

#[async_trait]
impl UserStore for SqliteDatabase {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		let result = sqlx::query(
			"INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
		)
		.bind(&user.username)
		.bind(&user.password_hash)
		.bind(Utc::now())
		.execute(&self.pool)
		.await
		.map_err(|e| constraint_error(e, || format!("username {} is already taken", user.username)))?;

		self.get_user(result.last_insert_rowid())
			.await?
			.ok_or(Error::NotFound("User"))
	}

	async fn get_user(&self, id: i64) -> Result<Option<User>> {
		let row = sqlx::query(
			"SELECT id, username, password_hash, date_joined, last_login FROM users WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;
		row.as_ref().map(user_from_row).transpose()
	}

	async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
		let row = sqlx::query(
			"SELECT id, username, password_hash, date_joined, last_login FROM users \
			WHERE username = ?",
		)
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;
		row.as_ref().map(user_from_row).transpose()
	}

	async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
		let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
			.bind(at)
			.bind(user_id)
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound("User"));
		}
		Ok(())
	}
}
