//! The signed-in user's profile.
//!
//! Both views need a user; anonymous requests go to the login page.

use hyper::Method;
use tera::Context;

use crate::app::AppState;
use crate::auth::RequestContext;
use crate::error::Result;
use crate::forms::{FormOutcome, UserProfileForm};
use crate::http::{FormData, Request, Response};
use crate::shortcuts::{redirect, render};
use crate::urls::Route;

pub async fn edit_profile(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	let Some(user_id) = ctx.user_id() else {
		return Ok(redirect(Route::UserLogin));
	};

	let form = if request.method == Method::POST {
		let data = FormData::parse(request).await?;
		match UserProfileForm::validate(&data) {
			FormOutcome::Valid(profile) => {
				let profile = state.db.save_profile(user_id, profile).await?;
				tracing::info!(user_id, profile_id = profile.id, "profile saved");
				return Ok(redirect(Route::ProfileDetail));
			}
			FormOutcome::Invalid(errors) => UserProfileForm::bound(&data, errors),
		}
	} else {
		let profile = state.db.profile_for_user(user_id).await?;
		UserProfileForm::initial(profile.as_ref())
	};

	let mut context = Context::new();
	context.insert("form", &form);
	render(&state.templates, ctx, "edit_profile.html", context)
}

/// Show the profile, or send the user to create one
pub async fn profile_detail(
	state: &AppState,
	_request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	let Some(user_id) = ctx.user_id() else {
		return Ok(redirect(Route::UserLogin));
	};

	match state.db.profile_for_user(user_id).await? {
		Some(profile) => {
			let mut context = Context::new();
			context.insert("profile", &profile);
			render(&state.templates, ctx, "profile_detail.html", context)
		}
		None => Ok(redirect(Route::EditProfile)),
	}
}
