//! In-memory backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::db::{CommentStore, ProfileStore, RecipeStore, UserStore};
use crate::error::{Error, Result};
use crate::models::{
	Comment, NewComment, NewUser, ProfileData, Recipe, RecipeData, User, UserProfile,
	title_contains,
};

#[derive(Default)]
struct Tables {
	recipes: BTreeMap<i64, Recipe>,
	comments: BTreeMap<i64, Comment>,
	profiles: BTreeMap<i64, UserProfile>,
	users: BTreeMap<i64, User>,
	next_recipe_id: i64,
	next_comment_id: i64,
	next_profile_id: i64,
	next_user_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
	*counter += 1;
	*counter
}

/// All tables behind a single `RwLock`
///
/// Ids start at 1 and are never reused, matching an autoincrement column.
#[derive(Default)]
pub struct InMemoryDatabase {
	tables: RwLock<Tables>,
}

impl InMemoryDatabase {
	pub fn new() -> Self {
		Self::default()
	}

	fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
		let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
		f(&tables)
	}

	fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
		let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
		f(&mut tables)
	}
}

#[async_trait]
impl RecipeStore for InMemoryDatabase {
	async fn list_recipes(&self, title_query: Option<&str>) -> Result<Vec<Recipe>> {
		let query = title_query.unwrap_or_default();
		Ok(self.read(|t| {
			t.recipes
				.values()
				.filter(|recipe| title_contains(&recipe.title, query))
				.cloned()
				.collect()
		}))
	}

	async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
		Ok(self.read(|t| t.recipes.get(&id).cloned()))
	}

	async fn create_recipe(&self, data: RecipeData) -> Result<Recipe> {
		Ok(self.write(|t| {
			let recipe = Recipe {
				id: next_id(&mut t.next_recipe_id),
				title: data.title,
				description: data.description,
				ingredients: data.ingredients,
				instructions: data.instructions,
				attachment: data.attachment,
				time_created: Utc::now(),
				time_edited: None,
			};
			t.recipes.insert(recipe.id, recipe.clone());
			recipe
		}))
	}

	async fn update_recipe(&self, id: i64, data: RecipeData) -> Result<Recipe> {
		self.write(|t| {
			let recipe = t.recipes.get_mut(&id).ok_or(Error::NotFound("Recipe"))?;
			recipe.title = data.title;
			recipe.description = data.description;
			recipe.ingredients = data.ingredients;
			recipe.instructions = data.instructions;
			recipe.attachment = data.attachment;
			recipe.time_edited = Some(Utc::now());
			Ok(recipe.clone())
		})
	}

	async fn delete_recipe(&self, id: i64) -> Result<bool> {
		Ok(self.write(|t| {
			let removed = t.recipes.remove(&id).is_some();
			if removed {
				t.comments.retain(|_, comment| comment.recipe_id != id);
			}
			removed
		}))
	}
}

#[async_trait]
impl CommentStore for InMemoryDatabase {
	async fn add_comment(&self, comment: NewComment) -> Result<Comment> {
		self.write(|t| {
			if !t.recipes.contains_key(&comment.recipe_id) {
				return Err(Error::Integrity(format!(
					"recipe {} does not exist",
					comment.recipe_id
				)));
			}
			let comment = Comment {
				id: next_id(&mut t.next_comment_id),
				recipe_id: comment.recipe_id,
				author: comment.author,
				body: comment.body,
				time_created: Utc::now(),
			};
			t.comments.insert(comment.id, comment.clone());
			Ok(comment)
		})
	}

	async fn comments_for(&self, recipe_id: i64) -> Result<Vec<Comment>> {
		Ok(self.read(|t| {
			t.comments
				.values()
				.filter(|comment| comment.recipe_id == recipe_id)
				.cloned()
				.collect()
		}))
	}
}

#[async_trait]
impl ProfileStore for InMemoryDatabase {
	async fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
		Ok(self.read(|t| {
			t.profiles
				.values()
				.find(|profile| profile.user_id == user_id)
				.cloned()
		}))
	}

	async fn save_profile(&self, user_id: i64, data: ProfileData) -> Result<UserProfile> {
		Ok(self.write(|t| {
			if let Some(profile) = t
				.profiles
				.values_mut()
				.find(|profile| profile.user_id == user_id)
			{
				profile.display_name = data.display_name;
				profile.bio = data.bio;
				profile.location = data.location;
				return profile.clone();
			}

			let profile = UserProfile {
				id: next_id(&mut t.next_profile_id),
				user_id,
				display_name: data.display_name,
				bio: data.bio,
				location: data.location,
			};
			t.profiles.insert(profile.id, profile.clone());
			profile
		}))
	}
}

#[async_trait]
impl UserStore for InMemoryDatabase {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		self.write(|t| {
			if t.users.values().any(|u| u.username == user.username) {
				return Err(Error::Integrity(format!(
					"username {} is already taken",
					user.username
				)));
			}
			let user = User {
				id: next_id(&mut t.next_user_id),
				username: user.username,
				password_hash: user.password_hash,
				date_joined: Utc::now(),
				last_login: None,
			};
			t.users.insert(user.id, user.clone());
			Ok(user)
		})
	}

	async fn get_user(&self, id: i64) -> Result<Option<User>> {
		Ok(self.read(|t| t.users.get(&id).cloned()))
	}

	async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
		Ok(self.read(|t| t.users.values().find(|u| u.username == username).cloned()))
	}

	async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
		self.write(|t| {
			let user = t.users.get_mut(&user_id).ok_or(Error::NotFound("User"))?;
			user.last_login = Some(at);
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	fn db() -> InMemoryDatabase {
		InMemoryDatabase::new()
	}

	fn recipe(title: &str) -> RecipeData {
		RecipeData {
			title: title.to_string(),
			ingredients: "flour".to_string(),
			instructions: "bake".to_string(),
			..RecipeData::default()
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_title_filter(db: InMemoryDatabase) {
		db.create_recipe(recipe("Pasta Bake")).await.unwrap();
		db.create_recipe(recipe("Apple Pie")).await.unwrap();

		let pie = db.list_recipes(Some("pie")).await.unwrap();
		assert_eq!(pie.len(), 1);
		assert_eq!(pie[0].title, "Apple Pie");

		assert_eq!(db.list_recipes(Some("")).await.unwrap().len(), 2);
		assert_eq!(db.list_recipes(None).await.unwrap().len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_cascades_to_comments(db: InMemoryDatabase) {
		let kept = db.create_recipe(recipe("Kept")).await.unwrap();
		let doomed = db.create_recipe(recipe("Doomed")).await.unwrap();
		for recipe_id in [kept.id, doomed.id] {
			db.add_comment(NewComment {
				recipe_id,
				author: "bob".to_string(),
				body: "nice".to_string(),
			})
			.await
			.unwrap();
		}

		assert!(db.delete_recipe(doomed.id).await.unwrap());
		assert!(!db.delete_recipe(doomed.id).await.unwrap());
		assert!(db.comments_for(doomed.id).await.unwrap().is_empty());
		assert_eq!(db.comments_for(kept.id).await.unwrap().len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_ids_are_not_reused(db: InMemoryDatabase) {
		let first = db.create_recipe(recipe("One")).await.unwrap();
		db.delete_recipe(first.id).await.unwrap();
		let second = db.create_recipe(recipe("Two")).await.unwrap();
		assert!(second.id > first.id);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_missing_recipe(db: InMemoryDatabase) {
		let result = db.update_recipe(99, recipe("Ghost")).await;
		assert!(matches!(result, Err(Error::NotFound("Recipe"))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_comment_on_missing_recipe(db: InMemoryDatabase) {
		let result = db
			.add_comment(NewComment {
				recipe_id: 5,
				author: "a".to_string(),
				body: "b".to_string(),
			})
			.await;
		assert!(matches!(result, Err(Error::Integrity(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_profile_upserts(db: InMemoryDatabase) {
		let created = db
			.save_profile(
				3,
				ProfileData {
					display_name: "Al".to_string(),
					..ProfileData::default()
				},
			)
			.await
			.unwrap();
		let updated = db
			.save_profile(
				3,
				ProfileData {
					display_name: "Alice".to_string(),
					bio: "cook".to_string(),
					..ProfileData::default()
				},
			)
			.await
			.unwrap();

		assert_eq!(created.id, updated.id);
		let stored = db.profile_for_user(3).await.unwrap().unwrap();
		assert_eq!(stored.display_name, "Alice");
		assert_eq!(stored.bio, "cook");
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicate_username(db: InMemoryDatabase) {
		let new_user = || NewUser {
			username: "alice".to_string(),
			password_hash: "x".to_string(),
		};
		db.create_user(new_user()).await.unwrap();
		assert!(matches!(
			db.create_user(new_user()).await,
			Err(Error::Integrity(_))
		));
	}
}
