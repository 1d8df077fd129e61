//! Axum wiring for the provider return hop and the callback route (`axum` feature).

// crates.io
use axum::{
	Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
	routing::get,
};
// self
use crate::{
	_prelude::*,
	oauth::{CallbackRequest, ChannelConfig, ProviderReturn},
};

/// Query string accepted by the callback route.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Session correlation token.
	pub session: Option<String>,
}

/// Builds a router serving `GET {callback_path}` (the provider's return) and
/// `GET {callback_path}/{status}`.
pub fn callback_router(config: ChannelConfig) -> Router {
	let status_path = format!("{}/{{status}}", config.callback_path);

	Router::new()
		.route(&config.callback_path, get(provider_return))
		.route(&status_path, get(callback_page))
		.with_state(Arc::new(config))
}

/// Redirects the provider's return (`?code=..&state=..` or `?error=..`) to the callback page
/// with `303 See Other`; a malformed `state` yields `400 Bad Request`.
pub async fn provider_return(
	State(config): State<Arc<ChannelConfig>>,
	Query(query): Query<ProviderReturn>,
) -> Response {
	match query.redirect_target(&config) {
		Ok(target) => Redirect::to(target.as_str()).into_response(),
		Err(_) => StatusCode::BAD_REQUEST.into_response(),
	}
}

/// Serves the callback page; malformed session tokens yield `400 Bad Request`.
pub async fn callback_page(
	State(config): State<Arc<ChannelConfig>>,
	Path(status): Path<String>,
	Query(query): Query<CallbackQuery>,
) -> Response {
	match CallbackRequest::from_parts(&status, query.session.as_deref()) {
		Ok(request) => Html(request.render_page(&config)).into_response(),
		Err(_) => StatusCode::BAD_REQUEST.into_response(),
	}
}
