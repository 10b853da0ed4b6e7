//! HTML templates.
//!
//! Every page is a Tera template compiled into the binary with
//! `include_str!`, so a deployed server needs nothing but its settings file.
//! Names ending in `.html` are auto-escaped.

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
	("base.html", include_str!("../templates/base.html")),
	("macros.html", include_str!("../templates/macros.html")),
	("login.html", include_str!("../templates/login.html")),
	("register.html", include_str!("../templates/register.html")),
	("all_recipes.html", include_str!("../templates/all_recipes.html")),
	(
		"create_recipe.html",
		include_str!("../templates/create_recipe.html"),
	),
	(
		"recipe_detail.html",
		include_str!("../templates/recipe_detail.html"),
	),
	("edit_recipe.html", include_str!("../templates/edit_recipe.html")),
	(
		"edit_profile.html",
		include_str!("../templates/edit_profile.html"),
	),
	(
		"profile_detail.html",
		include_str!("../templates/profile_detail.html"),
	),
	("error.html", include_str!("../templates/error.html")),
];

/// The compiled template set
///
/// # Examples
///
/// ```
/// use recipe_box::templates::Templates;
///
/// let templates = Templates::new().unwrap();
/// assert!(templates.has_template("login.html"));
/// assert!(!templates.has_template("missing.html"));
/// ```
#[derive(Debug, Clone)]
pub struct Templates {
	tera: Tera,
}

impl Templates {
	/// Compile every bundled template.
	///
	/// Fails if any template has a syntax error or extends a missing parent.
	pub fn new() -> Result<Self> {
		let mut tera = Tera::default();
		tera.add_raw_templates(TEMPLATES.iter().copied())?;
		Ok(Self { tera })
	}

	pub fn has_template(&self, name: &str) -> bool {
		self.tera.get_template_names().any(|n| n == name)
	}

	pub fn render(&self, name: &str, context: &Context) -> Result<String> {
		Ok(self.tera.render(name, context)?)
	}

	/// Render with a context built from any serializable value
	pub fn render_serialize<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
		let context = Context::from_serialize(context)?;
		self.render(name, &context)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn urls() -> serde_json::Value {
		json!({
			"all_recipes": "/",
			"create_recipe": "/recipes/new/",
			"user_login": "/login/",
			"register": "/register/",
			"user_logout": "/logout/",
			"profile_detail": "/profile/",
			"edit_profile": "/profile/edit/",
		})
	}

	#[test]
	fn test_all_templates_compile() {
		let templates = Templates::new().unwrap();
		for (name, _) in TEMPLATES {
			assert!(templates.has_template(name), "{} missing", name);
		}
	}

	#[test]
	fn test_values_are_escaped() {
		let templates = Templates::new().unwrap();
		let html = templates
			.render_serialize(
				"all_recipes.html",
				&json!({
					"urls": urls(),
					"user": null,
					"query": "<script>",
					"recipes": [],
				}),
			)
			.unwrap();

		assert!(html.contains("&lt;script&gt;"));
		assert!(!html.contains("<script>"));
		assert!(html.contains("No recipes found."));
	}

	#[test]
	fn test_field_errors_rendered() {
		let templates = Templates::new().unwrap();
		let html = templates
			.render_serialize(
				"login.html",
				&json!({
					"urls": urls(),
					"user": null,
					"form": {
						"data": {"username": "alice"},
						"errors": {"_all": ["Please log in again."]},
					},
				}),
			)
			.unwrap();

		assert!(html.contains("Please log in again."));
		assert!(html.contains("value=\"alice\""));
	}
}
