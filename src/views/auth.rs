//! Login, registration and logout.

use chrono::Utc;
use hyper::Method;
use tera::Context;

use crate::app::AppState;
use crate::auth::RequestContext;
use crate::error::{Error, Result};
use crate::forms::auth::USERNAME_TAKEN;
use crate::forms::{BoundForm, FormErrors, FormOutcome, LoginForm, RegistrationForm};
use crate::http::{FormData, Request, Response};
use crate::models::{NewUser, User};
use crate::shortcuts::{redirect, render};
use crate::urls::Route;

fn form_page(
	state: &AppState,
	ctx: &RequestContext,
	template: &str,
	form: BoundForm,
) -> Result<Response> {
	let mut context = Context::new();
	context.insert("form", &form);
	render(&state.templates, ctx, template, context)
}

pub async fn user_login(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	if request.method != Method::POST {
		return form_page(state, ctx, "login.html", BoundForm::new());
	}

	let data = FormData::parse(request).await?;
	match LoginForm::validate(&data, state.db.as_ref(), state.hasher.as_ref()).await? {
		FormOutcome::Valid(user) => {
			let now = Utc::now();
			state.db.record_login(user.id, now).await?;
			tracing::info!(user_id = user.id, username = %user.username, "user logged in");
			ctx.login(User {
				last_login: Some(now),
				..user
			});
			Ok(redirect(Route::AllRecipes))
		}
		FormOutcome::Invalid(errors) => {
			form_page(state, ctx, "login.html", LoginForm::bound(&data, errors))
		}
	}
}

/// Create an account and sign the new user in.
///
/// Success lands on the login page rather than the listing.
pub async fn register(
	state: &AppState,
	request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	if request.method != Method::POST {
		return form_page(state, ctx, "register.html", BoundForm::new());
	}

	let data = FormData::parse(request).await?;
	match RegistrationForm::validate(&data, state.db.as_ref()).await? {
		FormOutcome::Valid(form) => {
			let password_hash = state.hasher.hash(&form.password)?;
			let created = state
				.db
				.create_user(NewUser {
					username: form.username,
					password_hash,
				})
				.await;
			// Lost a race with another registration for the same name
			let user = match created {
				Err(Error::Integrity(_)) => {
					let mut errors = FormErrors::new();
					errors.add("username", USERNAME_TAKEN);
					return form_page(
						state,
						ctx,
						"register.html",
						RegistrationForm::bound(&data, errors),
					);
				}
				other => other?,
			};
			tracing::info!(user_id = user.id, username = %user.username, "user registered");
			ctx.login(user);
			Ok(redirect(Route::UserLogin))
		}
		FormOutcome::Invalid(errors) => form_page(
			state,
			ctx,
			"register.html",
			RegistrationForm::bound(&data, errors),
		),
	}
}

pub async fn user_logout(
	_state: &AppState,
	_request: &Request,
	ctx: &mut RequestContext,
) -> Result<Response> {
	if let Some(user_id) = ctx.user_id() {
		tracing::info!(user_id, "user logged out");
	}
	ctx.logout();
	Ok(redirect(Route::UserLogin))
}
