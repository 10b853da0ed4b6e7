//! Application wiring: shared state, the route dispatcher and the middleware
//! stack in front of it.

use async_trait::async_trait;
use hyper::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
	Argon2Hasher, InMemorySessionStore, PasswordHasher, RequestContext, Session,
};
use crate::conf::Settings;
use crate::db::{self, Database};
use crate::error::Result;
use crate::http::{Handler, MiddlewareChain, Request, Response};
use crate::middleware::{LoggingMiddleware, SessionConfig, SessionMiddleware};
use crate::shortcuts::render_error_page;
use crate::storage::FileSystemStorage;
use crate::templates::Templates;
use crate::urls::Route;
use crate::views;

/// Upper bound on how often expired sessions are swept
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Collaborators shared by every request
pub struct AppState {
	pub settings: Settings,
	pub db: Arc<dyn Database>,
	pub sessions: Arc<InMemorySessionStore>,
	pub hasher: Arc<dyn PasswordHasher>,
	pub storage: FileSystemStorage,
	pub templates: Templates,
}

impl AppState {
	/// Build the state. When called inside a tokio runtime this also starts
	/// the periodic sweep of expired sessions.
	pub fn new(settings: Settings, db: Arc<dyn Database>) -> Result<Self> {
		let ttl = Duration::from_secs(settings.session_ttl_secs);
		let sessions = Arc::new(InMemorySessionStore::new(ttl));
		if tokio::runtime::Handle::try_current().is_ok() {
			sessions.spawn_cleanup(ttl.min(SESSION_CLEANUP_INTERVAL));
		}
		let storage = FileSystemStorage::new(settings.media_root.clone());
		Ok(Self {
			sessions,
			hasher: Arc::new(Argon2Hasher::new()),
			storage,
			templates: Templates::new()?,
			db,
			settings,
		})
	}

	/// Connect to the configured database and build the state around it
	pub async fn from_settings(settings: Settings) -> Result<Self> {
		let db = db::connect(&settings.database_url).await?;
		Self::new(settings, db)
	}
}

/// Resolves routes, builds the [`RequestContext`] and runs the view.
///
/// Expects [`SessionMiddleware`] in front of it; without it every request is
/// anonymous and session changes are dropped.
pub struct RecipeApp {
	state: Arc<AppState>,
}

impl RecipeApp {
	pub fn new(state: Arc<AppState>) -> Self {
		Self { state }
	}

	pub fn state(&self) -> &Arc<AppState> {
		&self.state
	}

	async fn context_for(&self, session: Session) -> Result<RequestContext> {
		let user = match session.user_id() {
			Some(id) => self.state.db.get_user(id).await?,
			None => None,
		};
		Ok(RequestContext::new(session, user))
	}

	async fn dispatch(
		&self,
		route: Route,
		request: &Request,
		ctx: &mut RequestContext,
	) -> Result<Response> {
		let state = self.state.as_ref();
		match route {
			Route::UserLogin => views::auth::user_login(state, request, ctx).await,
			Route::Register => views::auth::register(state, request, ctx).await,
			Route::UserLogout => views::auth::user_logout(state, request, ctx).await,
			Route::AllRecipes => views::recipes::all_recipes(state, request, ctx).await,
			Route::CreateRecipe => views::recipes::create_recipe(state, request, ctx).await,
			Route::RecipeDetail(id) => {
				views::recipes::recipe_detail(state, request, ctx, id).await
			}
			Route::EditRecipe(id) => views::recipes::edit_recipe(state, request, ctx, id).await,
			Route::EditProfile => views::profile::edit_profile(state, request, ctx).await,
			Route::ProfileDetail => views::profile::profile_detail(state, request, ctx).await,
			Route::Media(name) => views::media::serve_media(state, request, ctx, &name).await,
		}
	}

	fn error_page(&self, ctx: &RequestContext, status: StatusCode) -> Response {
		render_error_page(&self.state.templates, ctx, status, None)
	}
}

#[async_trait]
impl Handler for RecipeApp {
	async fn handle(&self, request: Request) -> Result<Response> {
		let session = request.extensions.get::<Session>().unwrap_or_default();
		let mut ctx = self.context_for(session).await?;

		let Some(route) = Route::resolve(request.path()) else {
			return Ok(self.error_page(&ctx, StatusCode::NOT_FOUND));
		};

		let allowed = route.allowed_methods();
		if !allowed.contains(&request.method) {
			let page = self.error_page(&ctx, StatusCode::METHOD_NOT_ALLOWED);
			let mut response = Response::method_not_allowed(allowed).with_body(page.body);
			response.headers.extend(page.headers);
			return Ok(response);
		}

		let route_name = route.name();
		let result = self.dispatch(route, &request, &mut ctx).await;

		let response = match result {
			Ok(response) => response,
			Err(err) => {
				let status = StatusCode::from_u16(err.status_code())
					.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
				if status.is_server_error() {
					tracing::error!(route = route_name, path = %request.path(), error = %err, "view failed");
				} else {
					tracing::warn!(route = route_name, path = %request.path(), error = %err, "bad request");
				}
				let detail = err.to_string();
				let detail = self.state.settings.debug.then_some(detail.as_str());
				render_error_page(&self.state.templates, &ctx, status, detail)
			}
		};

		request.extensions.insert(ctx.into_session());
		Ok(response)
	}
}

/// The full request pipeline: logging, then sessions, then the app
pub fn build_handler(state: Arc<AppState>) -> MiddlewareChain {
	let session = SessionMiddleware::new(
		SessionConfig::from_settings(&state.settings),
		state.sessions.clone(),
	);
	MiddlewareChain::new(Arc::new(RecipeApp::new(state)))
		.with_middleware(Arc::new(LoggingMiddleware::new()))
		.with_middleware(Arc::new(session))
}
