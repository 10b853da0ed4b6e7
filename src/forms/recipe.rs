use crate::forms::fields::{CharField, FileField};
use crate::forms::{BoundForm, FormErrors, FormOutcome};
use crate::http::{FormData, UploadedFile};
use crate::models::Recipe;

/// Create/edit form for a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeForm {
	pub title: String,
	pub description: String,
	pub ingredients: String,
	pub instructions: String,
	pub attachment: Option<UploadedFile>,
}

impl RecipeForm {
	pub const FIELDS: &'static [&'static str] =
		&["title", "description", "ingredients", "instructions"];

	fn title() -> CharField {
		CharField::new("title").required().with_max_length(200)
	}

	fn description() -> CharField {
		CharField::new("description").with_max_length(2000)
	}

	fn ingredients() -> CharField {
		CharField::new("ingredients").required()
	}

	fn instructions() -> CharField {
		CharField::new("instructions").required()
	}

	pub fn validate(data: &FormData, max_upload_size: usize) -> FormOutcome<Self> {
		let mut errors = FormErrors::new();
		let title = errors.clean_char(&Self::title(), data);
		let description = errors.clean_char(&Self::description(), data);
		let ingredients = errors.clean_char(&Self::ingredients(), data);
		let instructions = errors.clean_char(&Self::instructions(), data);
		let attachment_field = FileField::new("attachment", max_upload_size);
		let attachment = errors.clean(
			attachment_field.name,
			attachment_field.clean(data.file(attachment_field.name)),
		);

		errors.finish(Self {
			title,
			description,
			ingredients,
			instructions,
			attachment,
		})
	}

	/// The form pre-populated from a stored recipe
	pub fn initial(recipe: &Recipe) -> BoundForm {
		BoundForm::new()
			.with_value("title", &recipe.title)
			.with_value("description", &recipe.description)
			.with_value("ingredients", &recipe.ingredients)
			.with_value("instructions", &recipe.instructions)
	}

	pub fn bound(data: &FormData, errors: FormErrors) -> BoundForm {
		BoundForm::from_data(data, Self::FIELDS, &[]).with_errors(errors)
	}
}

/// A new comment on a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
	pub author: String,
	pub body: String,
}

impl CommentForm {
	pub const FIELDS: &'static [&'static str] = &["author", "body"];

	pub fn validate(data: &FormData) -> FormOutcome<Self> {
		let mut errors = FormErrors::new();
		let author = errors.clean_char(
			&CharField::new("author").required().with_max_length(100),
			data,
		);
		let body = errors.clean_char(&CharField::new("body").required().with_max_length(1000), data);
		errors.finish(Self { author, body })
	}

	pub fn bound(data: &FormData, errors: FormErrors) -> BoundForm {
		BoundForm::from_data(data, Self::FIELDS, &[]).with_errors(errors)
	}
}
