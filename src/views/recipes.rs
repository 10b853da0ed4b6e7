//! Recipe listing, creation, detail (with comments) and editing.

use hyper::Method;
use serde::Serialize;
use tera::Context;

use crate::app::AppState;
use crate::auth::RequestContext;
use crate::error::Result;
use crate::forms::{BoundForm, CommentForm, FormOutcome, RecipeForm};
use crate::http::{FormData, Request, Response, UploadedFile};
use crate::models::{Attachment, NewComment, Recipe, RecipeData};
use crate::shortcuts::{get_or_not_found, redirect, render};
use crate::urls::Route;

/// A listing entry: the recipe and the url of its detail page
#[derive(Serialize)]
struct RecipeLink<'a> {
	recipe: &'a Recipe,
	url: String,
}

/// Context shared by the detail and edit pages
fn recipe_context(recipe: &Recipe) -> Context {
	let mut context = Context::new();
	context.insert("recipe", recipe);
	context.insert("detail_url", &Route::RecipeDetail(recipe.id).path());
	context.insert("edit_url", &Route::EditRecipe(recipe.id).path());
	let attachment_url = recipe
		.attachment
		.as_ref()
		.map(|attachment| Route::Media(attachment.stored_name.clone()).path());
	context.insert("attachment_url", &attachment_url);
	context
}

async fn store_attachment(
	state: &AppState,
	upload: Option<&UploadedFile>,
) -> Result<Option<Attachment>> {
	match upload {
		Some(file) => Ok(Some(state.storage.save(file).await?)),
		None => Ok(None),
	}
}

/// Remove an attachment file that no recipe points at any more.
///
/// Failures are logged; the database change already happened.
async fn discard_attachment(state: &AppState, attachment: &Attachment) {
	if let Err(e) = state.storage.delete(&attachment.stored_name).await {
		tracing::warn!(stored_name = %attachment.stored_name, error = %e, "failed to delete attachment");
	}
}

pub async fn all_recipes(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	let query = request.query("q").unwrap_or_default();
	let recipes = state.db.list_recipes(Some(query)).await?;
	tracing::debug!(query = %query, count = recipes.len(), "listing recipes");

	let links: Vec<RecipeLink<'_>> = recipes
		.iter()
		.map(|recipe| RecipeLink {
			recipe,
			url: Route::RecipeDetail(recipe.id).path(),
		})
		.collect();

	let mut context = Context::new();
	context.insert("query", query);
	context.insert("recipes", &links);
	render(&state.templates, ctx, "all_recipes.html", context)
}

pub async fn create_recipe(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	let form = if request.method == Method::POST {
		let data = FormData::parse(request).await?;
		match RecipeForm::validate(&data, state.settings.max_upload_size) {
			FormOutcome::Valid(form) => {
				let attachment = store_attachment(state, form.attachment.as_ref()).await?;
				let created = state
					.db
					.create_recipe(RecipeData {
						title: form.title,
						description: form.description,
						ingredients: form.ingredients,
						instructions: form.instructions,
						attachment: attachment.clone(),
					})
					.await;
				let recipe = match created {
					Ok(recipe) => recipe,
					Err(e) => {
						if let Some(attachment) = &attachment {
							discard_attachment(state, attachment).await;
						}
						return Err(e);
					}
				};
				tracing::info!(recipe_id = recipe.id, title = %recipe.title, "recipe created");
				return Ok(redirect(Route::AllRecipes));
			}
			FormOutcome::Invalid(errors) => RecipeForm::bound(&data, errors),
		}
	} else {
		BoundForm::new()
	};

	let mut context = Context::new();
	context.insert("form", &form);
	render(&state.templates, ctx, "create_recipe.html", context)
}

/// Show a recipe with its comments; POST adds a comment.
pub async fn recipe_detail(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
	recipe_id: i64,
) -> Result<Response> {
	let recipe = get_or_not_found(state.db.get_recipe(recipe_id).await?, "Recipe")?;

	let form = if request.method == Method::POST {
		let data = FormData::parse(request).await?;
		match CommentForm::validate(&data) {
			FormOutcome::Valid(comment) => {
				let comment = state
					.db
					.add_comment(NewComment {
						recipe_id,
						author: comment.author,
						body: comment.body,
					})
					.await?;
				tracing::info!(recipe_id, comment_id = comment.id, "comment added");
				return Ok(redirect(Route::RecipeDetail(recipe_id)));
			}
			FormOutcome::Invalid(errors) => CommentForm::bound(&data, errors),
		}
	} else {
		BoundForm::new()
	};

	let comments = state.db.comments_for(recipe_id).await?;
	let mut context = recipe_context(&recipe);
	context.insert("comments", &comments);
	context.insert("form", &form);
	render(&state.templates, ctx, "recipe_detail.html", context)
}

/// Edit a recipe, or delete it when the submitted form carries `delete`.
pub async fn edit_recipe(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
	recipe_id: i64,
) -> Result<Response> {
	let recipe = get_or_not_found(state.db.get_recipe(recipe_id).await?, "Recipe")?;

	let form = if request.method == Method::POST {
		let data = FormData::parse(request).await?;

		if data.contains("delete") {
			state.db.delete_recipe(recipe_id).await?;
			if let Some(attachment) = &recipe.attachment {
				discard_attachment(state, attachment).await;
			}
			tracing::info!(recipe_id, "recipe deleted");
			return Ok(redirect(Route::AllRecipes));
		}

		match RecipeForm::validate(&data, state.settings.max_upload_size) {
			FormOutcome::Valid(form) => {
				let uploaded = store_attachment(state, form.attachment.as_ref()).await?;
				let attachment = uploaded.clone().or_else(|| recipe.attachment.clone());

				let updated = state
					.db
					.update_recipe(
						recipe_id,
						RecipeData {
							title: form.title,
							description: form.description,
							ingredients: form.ingredients,
							instructions: form.instructions,
							attachment,
						},
					)
					.await;
				if let Err(e) = updated {
					if let Some(new) = &uploaded {
						discard_attachment(state, new).await;
					}
					return Err(e);
				}

				if uploaded.is_some()
					&& let Some(old) = &recipe.attachment
				{
					discard_attachment(state, old).await;
				}
				tracing::info!(recipe_id, "recipe updated");
				return Ok(redirect(Route::ProfileDetail));
			}
			FormOutcome::Invalid(errors) => RecipeForm::bound(&data, errors),
		}
	} else {
		RecipeForm::initial(&recipe)
	};

	let mut context = recipe_context(&recipe);
	context.insert("form", &form);
	render(&state.templates, ctx, "edit_recipe.html", context)
}
