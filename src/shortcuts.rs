//! Shortcut functions shared by the views.
//!
//! - [`render`]: render a page with the common layout context
//! - [`redirect`]: 302 to a named route
//! - [`get_or_not_found`]: unwrap a lookup by id
//! - [`render_error_page`]: the page shown for 404, 405 and 500

use hyper::StatusCode;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use tera::Context;

use crate::auth::RequestContext;
use crate::error::{Error, Result};
use crate::http::Response;
use crate::templates::Templates;
use crate::urls::Route;

const HTML: &str = "text/html; charset=utf-8";

/// Paths of the routes every page links to
fn navigation() -> serde_json::Value {
	let routes = [
		Route::AllRecipes,
		Route::CreateRecipe,
		Route::UserLogin,
		Route::Register,
		Route::UserLogout,
		Route::ProfileDetail,
		Route::EditProfile,
	];
	routes
		.iter()
		.map(|route| (route.name().to_string(), route.path().into()))
		.collect::<serde_json::Map<_, _>>()
		.into()
}

/// Layout context: the current user and the navigation urls
pub fn base_context(ctx: &RequestContext) -> Context {
	let mut context = Context::new();
	context.insert("user", &ctx.user);
	context.insert("urls", &navigation());
	context
}

/// Render `name` with `context` on top of [`base_context`] and return a 200
pub fn render(
	templates: &Templates,
	ctx: &RequestContext,
	name: &str,
	context: Context,
) -> Result<Response> {
	let mut full = base_context(ctx);
	full.extend(context);
	let html = templates.render(name, &full)?;
	Ok(Response::ok()
		.with_body(html)
		.with_typed_header(CONTENT_TYPE, HeaderValue::from_static(HTML)))
}

/// Redirect (302 Found) to a named route
///
/// # Examples
///
/// ```
/// use recipe_box::shortcuts::redirect;
/// use recipe_box::urls::Route;
///
/// let response = redirect(Route::RecipeDetail(4));
/// assert_eq!(response.status.as_u16(), 302);
/// assert_eq!(response.location(), Some("/recipes/4/"));
/// ```
pub fn redirect(route: Route) -> Response {
	Response::temporary_redirect(route.path())
}

/// Unwrap a lookup by id, failing with [`Error::NotFound`] naming `model`
///
/// # Examples
///
/// ```
/// use recipe_box::Error;
/// use recipe_box::shortcuts::get_or_not_found;
///
/// assert_eq!(get_or_not_found(Some(3), "Recipe").unwrap(), 3);
/// assert!(matches!(
///     get_or_not_found(None::<i32>, "Recipe"),
///     Err(Error::NotFound("Recipe"))
/// ));
/// ```
pub fn get_or_not_found<T>(value: Option<T>, model: &'static str) -> Result<T> {
	value.ok_or(Error::NotFound(model))
}

/// Render the error page for `status`
///
/// `detail` is only shown when the caller passes it (debug mode). Falls back
/// to a plain body if the template itself fails.
pub fn render_error_page(
	templates: &Templates,
	ctx: &RequestContext,
	status: StatusCode,
	detail: Option<&str>,
) -> Response {
	let mut context = base_context(ctx);
	context.insert("status", &status.as_u16());
	context.insert("reason", status.canonical_reason().unwrap_or(""));
	context.insert("detail", &detail);

	let body = match templates.render("error.html", &context) {
		Ok(html) => html,
		Err(e) => {
			tracing::error!(error = %e, "failed to render error page");
			format!(
				"{} {}",
				status.as_u16(),
				status.canonical_reason().unwrap_or("")
			)
		}
	};

	let mut response = Response::new(status).with_body(body);
	response
		.headers
		.insert(CONTENT_TYPE, HeaderValue::from_static(HTML));
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::User;
	use chrono::Utc;

	fn alice() -> RequestContext {
		RequestContext::new(
			Default::default(),
			Some(User {
				id: 1,
				username: "alice".to_string(),
				password_hash: String::new(),
				date_joined: Utc::now(),
				last_login: None,
			}),
		)
	}

	#[test]
	fn test_render_sets_html_content_type() {
		let templates = Templates::new().unwrap();
		let mut context = Context::new();
		context.insert("query", "");
		context.insert("recipes", &Vec::<serde_json::Value>::new());

		let response = render(&templates, &alice(), "all_recipes.html", context).unwrap();
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), HTML);
		assert!(response.text().contains("alice"));
		assert!(response.text().contains("action=\"/logout/\""));
	}

	#[test]
	fn test_render_missing_template_is_error() {
		let templates = Templates::new().unwrap();
		let result = render(&templates, &alice(), "nope.html", Context::new());
		assert!(matches!(result, Err(Error::Template(_))));
	}

	#[test]
	fn test_error_page() {
		let templates = Templates::new().unwrap();
		let response = render_error_page(
			&templates,
			&RequestContext::anonymous(),
			StatusCode::NOT_FOUND,
			None,
		);
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(response.text().contains("404 Not Found"));
	}
}
