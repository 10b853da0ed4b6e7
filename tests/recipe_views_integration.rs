//! Listing, creating, commenting on and editing recipes.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{FilePart, TestClient, client};
use hyper::StatusCode;
use hyper::header::CONTENT_TYPE;
use recipe_box::conf::Settings;
use recipe_box::db::{
	CommentStore, Database, InMemoryDatabase, ProfileStore, RecipeStore, UserStore,
};
use recipe_box::models::{
	Comment, NewComment, NewUser, ProfileData, Recipe, RecipeData, User, UserProfile,
};
use recipe_box::{Error, Result};
use rstest::rstest;
use std::sync::Arc;

fn recipe_fields(title: &str) -> Vec<(&str, &str)> {
	vec![
		("title", title),
		("description", "Weeknight dinner"),
		("ingredients", "pasta\ncheese"),
		("instructions", "Bake until golden."),
	]
}

/// Test intent: with "Pasta Bake" and "Apple Pie" stored, `q` filters by a
/// case-insensitive title substring and an empty or missing `q` shows both.
#[rstest]
#[case("/?q=pie", &["Apple Pie"])]
#[case("/?q=PIE", &["Apple Pie"])]
#[case("/?q=a", &["Pasta Bake", "Apple Pie"])]
#[case("/?q=", &["Pasta Bake", "Apple Pie"])]
#[case("/", &["Pasta Bake", "Apple Pie"])]
#[case("/?q=soup", &[])]
#[tokio::test]
async fn test_listing_search(client: TestClient, #[case] uri: &str, #[case] expected: &[&str]) {
	client.seed_recipe("Pasta Bake").await;
	client.seed_recipe("Apple Pie").await;

	let response = client.get(uri).await;
	assert_eq!(response.status, StatusCode::OK);

	let body = response.text();
	for title in ["Pasta Bake", "Apple Pie"] {
		assert_eq!(
			body.contains(&format!(">{}</a>", title)),
			expected.contains(&title),
			"{} for {}",
			title,
			uri
		);
	}
	if expected.is_empty() {
		assert!(body.contains("No recipes found."));
	}
}

#[rstest]
#[tokio::test]
async fn test_listing_links_to_detail(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;
	let body = client.get("/?q=apple+pie").await.text();
	assert!(body.contains(&format!("href=\"/recipes/{}/\"", id)));
	assert!(body.contains("value=\"apple pie\""));
}

#[rstest]
#[tokio::test]
async fn test_create_recipe_valid(client: TestClient) {
	let response = client
		.post_form("/recipes/new/", &recipe_fields("Pasta Bake"))
		.await;

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some("/"));

	let recipes = client.state.db.list_recipes(None).await.unwrap();
	assert_eq!(recipes.len(), 1);
	assert_eq!(recipes[0].title, "Pasta Bake");
	assert_eq!(recipes[0].ingredients, "pasta\ncheese");
	assert!(recipes[0].attachment.is_none());
	assert!(recipes[0].time_edited.is_none());
}

#[rstest]
#[case(&[("title", ""), ("ingredients", "x"), ("instructions", "y")], "title")]
#[case(&[("title", "Soup"), ("ingredients", ""), ("instructions", "y")], "ingredients")]
#[case(&[("title", "Soup"), ("ingredients", "x")], "instructions")]
#[tokio::test]
async fn test_create_recipe_invalid(
	client: TestClient,
	#[case] fields: &[(&str, &str)],
	#[case] missing: &str,
) {
	let response = client.post_form("/recipes/new/", fields).await;

	assert_eq!(response.status, StatusCode::OK);
	let body = response.text();
	assert!(body.contains("This field is required."), "{} should be required", missing);
	assert!(client.state.db.list_recipes(None).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_create_recipe_title_too_long(client: TestClient) {
	let title = "x".repeat(201);
	let response = client.post_form("/recipes/new/", &recipe_fields(&title)).await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(
		response
			.text()
			.contains("Ensure this value has at most 200 characters (it has 201).")
	);
	assert!(client.state.db.list_recipes(None).await.unwrap().is_empty());
}

/// Test intent: a multipart upload is stored under the media root and served
/// back byte for byte from the url on the detail page.
#[rstest]
#[tokio::test]
async fn test_create_recipe_with_attachment(client: TestClient) {
	let response = client
		.post_multipart(
			"/recipes/new/",
			&recipe_fields("Apple Pie"),
			&[FilePart {
				field: "attachment",
				file_name: "pie.txt",
				content_type: "text/plain",
				content: b"two apples",
			}],
		)
		.await;
	assert_eq!(response.location(), Some("/"), "{}", response.text());

	let recipe = client.state.db.list_recipes(None).await.unwrap().remove(0);
	let attachment = recipe.attachment.clone().unwrap();
	assert_eq!(attachment.original_name, "pie.txt");
	assert_eq!(attachment.size, 10);
	assert!(client.state.storage.root().join(&attachment.stored_name).exists());

	let detail = client.get(&format!("/recipes/{}/", recipe.id)).await.text();
	let media_url = format!("/media/{}", attachment.stored_name);
	assert!(detail.contains(&media_url));

	let media = client.get(&media_url).await;
	assert_eq!(media.status, StatusCode::OK);
	assert_eq!(media.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
	assert_eq!(&media.body[..], b"two apples");
}

#[rstest]
#[case("../escape.txt")]
#[case("empty.txt")]
#[tokio::test]
async fn test_create_recipe_bad_attachment(client: TestClient, #[case] file_name: &str) {
	let content: &[u8] = if file_name == "empty.txt" { b"" } else { b"data" };
	let response = client
		.post_multipart(
			"/recipes/new/",
			&recipe_fields("Apple Pie"),
			&[FilePart {
				field: "attachment",
				file_name,
				content_type: "text/plain",
				content,
			}],
		)
		.await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.text().contains("errorlist"));
	assert!(client.state.db.list_recipes(None).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_create_recipe_attachment_too_large() {
	let mut settings = recipe_box::conf::Settings::default();
	settings.max_upload_size = 4;
	let client = TestClient::with_settings(settings);

	let response = client
		.post_multipart(
			"/recipes/new/",
			&recipe_fields("Apple Pie"),
			&[FilePart {
				field: "attachment",
				file_name: "big.txt",
				content_type: "text/plain",
				content: b"12345",
			}],
		)
		.await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.text().contains("Ensure this file is at most 4 bytes."));
	assert!(client.state.db.list_recipes(None).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_detail_lists_comments_oldest_first(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;
	for (author, body) in [("ann", "First!"), ("ben", "Second.")] {
		client
			.state
			.db
			.add_comment(NewComment {
				recipe_id: id,
				author: author.to_string(),
				body: body.to_string(),
			})
			.await
			.unwrap();
	}

	let body = client.get(&format!("/recipes/{}/", id)).await.text();
	let first = body.find("First!").unwrap();
	let second = body.find("Second.").unwrap();
	assert!(first < second);
	assert!(body.contains("<h1>Apple Pie</h1>"));
}

/// Test intent: a valid comment attaches exactly one comment to that recipe
/// and redirects back to the same detail page.
#[rstest]
#[tokio::test]
async fn test_add_comment(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;
	let other = client.seed_recipe("Pasta Bake").await;

	let detail = format!("/recipes/{}/", id);
	let response = client
		.post_form(&detail, &[("author", "ann"), ("body", "Lovely crust")])
		.await;

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some(detail.as_str()));

	let comments = client.state.db.comments_for(id).await.unwrap();
	assert_eq!(comments.len(), 1);
	assert_eq!(comments[0].author, "ann");
	assert_eq!(comments[0].recipe_id, id);
	assert!(client.state.db.comments_for(other).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_add_comment_invalid(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;

	let response = client
		.post_form(&format!("/recipes/{}/", id), &[("author", "ann"), ("body", "")])
		.await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.text().contains("This field is required."));
	assert!(response.text().contains("value=\"ann\""));
	assert!(client.state.db.comments_for(id).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_edit_form_is_prepopulated(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;

	let response = client.get(&format!("/recipes/{}/edit/", id)).await;

	assert_eq!(response.status, StatusCode::OK);
	let body = response.text();
	assert!(body.contains("value=\"Apple Pie\""));
	assert!(body.contains(">things</textarea>"));
}

#[rstest]
#[tokio::test]
async fn test_edit_recipe_updates_and_redirects_to_profile(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;

	let response = client
		.post_form(&format!("/recipes/{}/edit/", id), &recipe_fields("Apple Crumble"))
		.await;

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some("/profile/"));

	let recipe = client.state.db.get_recipe(id).await.unwrap().unwrap();
	assert_eq!(recipe.title, "Apple Crumble");
	assert!(recipe.time_edited.is_some());
}

#[rstest]
#[tokio::test]
async fn test_edit_recipe_invalid_keeps_stored_values(client: TestClient) {
	let id = client.seed_recipe("Apple Pie").await;

	let response = client
		.post_form(&format!("/recipes/{}/edit/", id), &recipe_fields(""))
		.await;

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.text().contains("This field is required."));
	let recipe = client.state.db.get_recipe(id).await.unwrap().unwrap();
	assert_eq!(recipe.title, "Apple Pie");
	assert!(recipe.time_edited.is_none());
}

/// Test intent: the delete marker removes exactly that recipe (and its
/// comments) regardless of the other submitted fields.
#[rstest]
#[case(&[("delete", "1")])]
#[case(&[("delete", ""), ("title", "")])]
#[case(&[("title", "Renamed"), ("ingredients", "x"), ("instructions", "y"), ("delete", "yes")])]
#[tokio::test]
async fn test_edit_recipe_delete(client: TestClient, #[case] fields: &[(&str, &str)]) {
	let id = client.seed_recipe("Apple Pie").await;
	let keep = client.seed_recipe("Pasta Bake").await;
	client
		.state
		.db
		.add_comment(NewComment {
			recipe_id: id,
			author: "ann".to_string(),
			body: "Gone soon".to_string(),
		})
		.await
		.unwrap();

	let response = client.post_form(&format!("/recipes/{}/edit/", id), fields).await;

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some("/"));
	assert!(client.state.db.get_recipe(id).await.unwrap().is_none());
	assert!(client.state.db.comments_for(id).await.unwrap().is_empty());
	assert!(client.state.db.get_recipe(keep).await.unwrap().is_some());
}

#[rstest]
#[tokio::test]
async fn test_edit_recipe_replaces_attachment(client: TestClient) {
	let upload = |name: &'static str, content: &'static [u8]| FilePart {
		field: "attachment",
		file_name: name,
		content_type: "text/plain",
		content,
	};
	client
		.post_multipart("/recipes/new/", &recipe_fields("Apple Pie"), &[upload("old.txt", b"old")])
		.await;
	let recipe = client.state.db.list_recipes(None).await.unwrap().remove(0);
	let old = recipe.attachment.unwrap();

	// Without a new upload the attachment is kept
	client
		.post_multipart(&format!("/recipes/{}/edit/", recipe.id), &recipe_fields("Apple Pie"), &[])
		.await;
	let kept = client.state.db.get_recipe(recipe.id).await.unwrap().unwrap();
	assert_eq!(kept.attachment.as_ref(), Some(&old));

	client
		.post_multipart(
			&format!("/recipes/{}/edit/", recipe.id),
			&recipe_fields("Apple Pie"),
			&[upload("new.txt", b"new")],
		)
		.await;
	let updated = client.state.db.get_recipe(recipe.id).await.unwrap().unwrap();
	let new = updated.attachment.unwrap();
	assert_eq!(new.original_name, "new.txt");

	let root = client.state.storage.root();
	assert!(root.join(&new.stored_name).exists());
	assert!(!root.join(&old.stored_name).exists());
}

#[rstest]
#[case("/recipes/999/")]
#[case("/recipes/999/edit/")]
#[tokio::test]
async fn test_unknown_recipe_is_server_error(client: TestClient, #[case] uri: &str) {
	let response = client.get(uri).await;
	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

/// In-memory store whose recipe updates always fail, as if the recipe was
/// deleted between the lookup and the write
#[derive(Default)]
struct UpdateFails {
	inner: InMemoryDatabase,
}

#[async_trait]
impl RecipeStore for UpdateFails {
	async fn list_recipes(&self, title_query: Option<&str>) -> Result<Vec<Recipe>> {
		self.inner.list_recipes(title_query).await
	}

	async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
		self.inner.get_recipe(id).await
	}

	async fn create_recipe(&self, data: RecipeData) -> Result<Recipe> {
		self.inner.create_recipe(data).await
	}

	async fn update_recipe(&self, _id: i64, _data: RecipeData) -> Result<Recipe> {
		Err(Error::NotFound("Recipe"))
	}

	async fn delete_recipe(&self, id: i64) -> Result<bool> {
		self.inner.delete_recipe(id).await
	}
}

#[async_trait]
impl CommentStore for UpdateFails {
	async fn add_comment(&self, comment: NewComment) -> Result<Comment> {
		self.inner.add_comment(comment).await
	}

	async fn comments_for(&self, recipe_id: i64) -> Result<Vec<Comment>> {
		self.inner.comments_for(recipe_id).await
	}
}

#[async_trait]
impl ProfileStore for UpdateFails {
	async fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
		self.inner.profile_for_user(user_id).await
	}

	async fn save_profile(&self, user_id: i64, data: ProfileData) -> Result<UserProfile> {
		self.inner.save_profile(user_id, data).await
	}
}

#[async_trait]
impl UserStore for UpdateFails {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		self.inner.create_user(user).await
	}

	async fn get_user(&self, id: i64) -> Result<Option<User>> {
		self.inner.get_user(id).await
	}

	async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
		self.inner.find_by_username(username).await
	}

	async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
		self.inner.record_login(user_id, at).await
	}
}

/// Test intent: when the update fails after the new upload was stored, the
/// upload is removed again and the old attachment stays in place.
#[tokio::test]
async fn test_failed_edit_discards_new_upload() {
	let db: Arc<dyn Database> = Arc::new(UpdateFails::default());
	let client = TestClient::with_database(Settings::default(), db);
	client
		.post_multipart(
			"/recipes/new/",
			&recipe_fields("Apple Pie"),
			&[FilePart {
				field: "attachment",
				file_name: "old.txt",
				content_type: "text/plain",
				content: b"old",
			}],
		)
		.await;
	let recipe = client.state.db.list_recipes(None).await.unwrap().remove(0);
	let old = recipe.attachment.unwrap();

	let response = client
		.post_multipart(
			&format!("/recipes/{}/edit/", recipe.id),
			&recipe_fields("Apple Pie"),
			&[FilePart {
				field: "attachment",
				file_name: "new.txt",
				content_type: "text/plain",
				content: b"new",
			}],
		)
		.await;

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	let stored: Vec<String> = std::fs::read_dir(client.state.storage.root())
		.unwrap()
		.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
		.collect();
	assert_eq!(stored, vec![old.stored_name]);
}
