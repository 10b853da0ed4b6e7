use hyper::StatusCode;
use hyper::header::{CONTENT_TYPE, HeaderValue};

use crate::app::AppState;
use crate::auth::RequestContext;
use crate::error::Result;
use crate::http::{Request, Response};
use crate::shortcuts::render_error_page;

/// Send back a stored attachment by its stored name
pub async fn serve_media(
	state: &AppState,
	_request: &Request,
	ctx: &mut RequestContext,
	name: &str,
) -> Result<Response> {
	let Some(file) = state.storage.open(name).await? else {
		tracing::debug!(name = %name, "media file not found");
		return Ok(render_error_page(
			&state.templates,
			ctx,
			StatusCode::NOT_FOUND,
			None,
		));
	};

	let content_type = HeaderValue::from_str(&file.content_type)
		.unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
	Ok(Response::ok()
		.with_body(file.content)
		.with_typed_header(CONTENT_TYPE, content_type)
		.with_header("x-content-type-options", "nosniff"))
}
