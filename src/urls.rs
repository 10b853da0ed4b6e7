//! Named routes.
//!
//! Every URL the application produces or accepts goes through [`Route`]:
//! views redirect to a `Route`, templates receive reversed paths, and the
//! dispatcher resolves incoming paths back into a `Route`.

use hyper::Method;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;

/// Characters escaped when a value is substituted into a path segment
const SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'`')
	.add(b'{')
	.add(b'}');

const GET: &[Method] = &[Method::GET];
const GET_POST: &[Method] = &[Method::GET, Method::POST];

/// `(name, pattern, methods)` for every route, in match order
const URL_PATTERNS: &[(&str, &str, &[Method])] = &[
	("all_recipes", "/", GET),
	("user_login", "/login/", GET_POST),
	("register", "/register/", GET_POST),
	("user_logout", "/logout/", GET_POST),
	("create_recipe", "/recipes/new/", GET_POST),
	("recipe_detail", "/recipes/{recipe_id}/", GET_POST),
	("edit_recipe", "/recipes/{recipe_id}/edit/", GET_POST),
	("edit_profile", "/profile/edit/", GET_POST),
	("profile_detail", "/profile/", GET),
	("media", "/media/{name}", GET),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	UserLogin,
	Register,
	UserLogout,
	AllRecipes,
	CreateRecipe,
	RecipeDetail(i64),
	EditRecipe(i64),
	EditProfile,
	ProfileDetail,
	Media(String),
}

impl Route {
	pub fn name(&self) -> &'static str {
		match self {
			Route::UserLogin => "user_login",
			Route::Register => "register",
			Route::UserLogout => "user_logout",
			Route::AllRecipes => "all_recipes",
			Route::CreateRecipe => "create_recipe",
			Route::RecipeDetail(_) => "recipe_detail",
			Route::EditRecipe(_) => "edit_recipe",
			Route::EditProfile => "edit_profile",
			Route::ProfileDetail => "profile_detail",
			Route::Media(_) => "media",
		}
	}

	fn entry(&self) -> (&'static str, &'static [Method]) {
		let name = self.name();
		URL_PATTERNS
			.iter()
			.find(|(n, _, _)| *n == name)
			.map(|(_, pattern, methods)| (*pattern, *methods))
			.unwrap_or(("/", GET))
	}

	/// Methods this route answers to
	pub fn allowed_methods(&self) -> &'static [Method] {
		self.entry().1
	}

	/// The URL path for this route
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::urls::Route;
	///
	/// assert_eq!(Route::AllRecipes.path(), "/");
	/// assert_eq!(Route::EditRecipe(7).path(), "/recipes/7/edit/");
	/// assert_eq!(Route::Media("a b.txt".into()).path(), "/media/a%20b.txt");
	/// ```
	pub fn path(&self) -> String {
		let mut params = HashMap::new();
		match self {
			Route::RecipeDetail(id) | Route::EditRecipe(id) => {
				params.insert("recipe_id", id.to_string());
			}
			Route::Media(name) => {
				params.insert("name", name.clone());
			}
			_ => {}
		}
		reverse(self.entry().0, &params)
	}

	/// Resolve a request path into a route
	///
	/// Returns `None` for unknown paths and for a non-numeric `recipe_id`.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::urls::Route;
	///
	/// assert_eq!(Route::resolve("/recipes/3/"), Some(Route::RecipeDetail(3)));
	/// assert_eq!(Route::resolve("/recipes/abc/"), None);
	/// assert_eq!(Route::resolve("/nowhere/"), None);
	/// ```
	pub fn resolve(path: &str) -> Option<Route> {
		URL_PATTERNS.iter().find_map(|(name, pattern, _)| {
			let params = match_pattern(pattern, path)?;
			Self::from_match(name, &params)
		})
	}

	fn from_match(name: &str, params: &HashMap<String, String>) -> Option<Route> {
		let recipe_id = || {
			params
				.get("recipe_id")?
				.parse::<i64>()
				.ok()
				.filter(|id| *id > 0)
		};
		Some(match name {
			"user_login" => Route::UserLogin,
			"register" => Route::Register,
			"user_logout" => Route::UserLogout,
			"all_recipes" => Route::AllRecipes,
			"create_recipe" => Route::CreateRecipe,
			"recipe_detail" => Route::RecipeDetail(recipe_id()?),
			"edit_recipe" => Route::EditRecipe(recipe_id()?),
			"edit_profile" => Route::EditProfile,
			"profile_detail" => Route::ProfileDetail,
			"media" => Route::Media(params.get("name")?.clone()),
			_ => return None,
		})
	}
}

/// Substitute `{param}` placeholders. Values are percent-encoded; missing
/// parameters leave the placeholder in place.
pub fn reverse(pattern: &str, params: &HashMap<&str, String>) -> String {
	pattern
		.split('/')
		.map(|segment| {
			match segment
				.strip_prefix('{')
				.and_then(|s| s.strip_suffix('}'))
				.and_then(|name| params.get(name))
			{
				Some(value) => utf8_percent_encode(value, SEGMENT).to_string(),
				None => segment.to_string(),
			}
		})
		.collect::<Vec<_>>()
		.join("/")
}

/// Match `path` against `pattern` segment by segment.
///
/// Placeholders match exactly one non-empty segment and are percent-decoded.
fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
	let pattern_segments: Vec<&str> = pattern.split('/').collect();
	let path_segments: Vec<&str> = path.split('/').collect();
	if pattern_segments.len() != path_segments.len() {
		return None;
	}

	let mut params = HashMap::new();
	for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
		match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
			Some(name) => {
				if actual.is_empty() {
					return None;
				}
				let decoded = percent_decode_str(actual).decode_utf8().ok()?;
				params.insert(name.to_string(), decoded.into_owned());
			}
			None if expected == actual => {}
			None => return None,
		}
	}
	Some(params)
}
