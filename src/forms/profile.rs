use crate::forms::fields::CharField;
use crate::forms::{BoundForm, FormErrors, FormOutcome};
use crate::http::FormData;
use crate::models::{ProfileData, UserProfile};

/// Edit form for the current user's profile
pub struct UserProfileForm;

impl UserProfileForm {
	pub const FIELDS: &'static [&'static str] = &["display_name", "bio", "location"];

	pub fn validate(data: &FormData) -> FormOutcome<ProfileData> {
		let mut errors = FormErrors::new();
		let display_name = errors.clean_char(
			&CharField::new("display_name")
				.required()
				.with_max_length(100),
			data,
		);
		let bio = errors.clean_char(&CharField::new("bio").with_max_length(1000), data);
		let location = errors.clean_char(&CharField::new("location").with_max_length(100), data);

		errors.finish(ProfileData {
			display_name,
			bio,
			location,
		})
	}

	/// Pre-populated from the stored profile, or blank when there is none
	pub fn initial(profile: Option<&UserProfile>) -> BoundForm {
		match profile {
			Some(profile) => BoundForm::new()
				.with_value("display_name", &profile.display_name)
				.with_value("bio", &profile.bio)
				.with_value("location", &profile.location),
			None => BoundForm::new(),
		}
	}

	pub fn bound(data: &FormData, errors: FormErrors) -> BoundForm {
		BoundForm::from_data(data, Self::FIELDS, &[]).with_errors(errors)
	}
}
