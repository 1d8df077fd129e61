//! Popup side of the protocol: the provider's return hop, the callback route and the page it
//! serves.
//!
//! The provider sends the popup back to `redirect_uri` with `code`/`error` and the `state` it was
//! given. [`ProviderReturn`] maps that onto `GET {callback_path}/{status}?session={id}`.
//!
//! The page has exactly two side effects: post a [`CompletionMessage`] to `window.opener` (when
//! one exists) targeting the platform origin, then close the current window.

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	oauth::{CallbackStatus, ChannelConfig, CompletionMessage},
};

/// Parsed `GET {callback_path}/{status}?session={id}` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackRequest {
	/// Status resolved from the path segment.
	pub status: CallbackStatus,
	/// Correlation token, when the URL carries one.
	pub session: Option<SessionId>,
}
impl CallbackRequest {
	/// Builds a request from an already-extracted status segment and optional session token.
	///
	/// A malformed session token is rejected rather than dropped, so it can never degrade into
	/// an unscoped completion.
	pub fn from_parts(status_segment: &str, session: Option<&str>) -> Result<Self> {
		let session = session
			.map(|token| {
				SessionId::new(token)
					.map_err(|_| Error::NotFound { what: "session", key: token.to_owned() })
			})
			.transpose()?;

		Ok(Self { status: CallbackStatus::from_segment(status_segment), session })
	}

	/// Parses a request path (with optional query) against the configured callback prefix.
	pub fn parse(config: &ChannelConfig, path_and_query: &str) -> Result<Self> {
		let not_found = || Error::NotFound { what: "callback route", key: path_and_query.into() };
		let url = config.platform_origin.join(path_and_query).map_err(|_| not_found())?;
		let status = url
			.path()
			.strip_prefix(config.callback_path.as_str())
			.and_then(|rest| rest.strip_prefix('/'))
			.filter(|segment| !segment.contains('/'))
			.ok_or_else(not_found)?;
		let session = url.query_pairs().find(|(key, _)| key == "session").map(|(_, value)| value);

		Self::from_parts(status, session.as_deref())
	}

	/// Message the page posts to its opener.
	pub fn message(&self, config: &ChannelConfig) -> CompletionMessage {
		CompletionMessage {
			message_type: config.message_type.clone(),
			session: self.session.clone(),
			status: self.status,
		}
	}

	/// Renders the minimal callback page.
	pub fn render_page(&self, config: &ChannelConfig) -> String {
		let mut message = serde_json::json!({
			"type": config.message_type,
			"status": self.status.as_str(),
		});

		if let Some(session) = &self.session {
			message["session"] = serde_json::Value::from(session.as_ref());
		}

		let message = script_safe(&message.to_string());
		let origin = script_safe(&serde_json::Value::from(config.origin()).to_string());

		format!(
			"<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Authorization complete</title></head>\n<body>\n<script>\n(function () {{\n\tif (window.opener) {{\n\t\twindow.opener.postMessage({message}, {origin});\n\t}}\n\twindow.close();\n}})();\n</script>\n</body>\n</html>\n"
		)
	}
}

/// Query the identity provider appends when it sends the popup back to `redirect_uri`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderReturn {
	/// Correlation token handed out as `state` by
	/// [`CompletionChannel::authorize`](crate::oauth::CompletionChannel::authorize).
	pub state: Option<String>,
	/// Authorization code issued on consent.
	pub code: Option<String>,
	/// OAuth error code (`access_denied`, ...).
	pub error: Option<String>,
}
impl ProviderReturn {
	/// Parses the provider's return request, which must hit `callback_path` exactly.
	pub fn parse(config: &ChannelConfig, path_and_query: &str) -> Result<Self> {
		let not_found = || Error::NotFound { what: "callback route", key: path_and_query.into() };
		let url = config.platform_origin.join(path_and_query).map_err(|_| not_found())?;

		if url.path() != config.callback_path {
			return Err(not_found());
		}

		let mut provider_return = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"state" => &mut provider_return.state,
				"code" => &mut provider_return.code,
				"error" => &mut provider_return.error,
				_ => continue,
			};

			slot.get_or_insert_with(|| value.into_owned());
		}

		Ok(provider_return)
	}

	/// Success only when a non-empty `code` came back without an `error`.
	pub fn status(&self) -> CallbackStatus {
		match (&self.error, self.code.as_deref()) {
			(None, Some(code)) if !code.is_empty() => CallbackStatus::Success,
			_ => CallbackStatus::Failure,
		}
	}

	/// Session named by `state`; a malformed token is rejected.
	pub fn session(&self) -> Result<Option<SessionId>> {
		self.state
			.as_deref()
			.map(|token| {
				SessionId::new(token)
					.map_err(|_| Error::NotFound { what: "session", key: token.to_owned() })
			})
			.transpose()
	}

	/// Callback URL the popup is redirected to (`303 See Other` on the axum route).
	pub fn redirect_target(&self, config: &ChannelConfig) -> Result<Url> {
		let session = self.session()?;

		Ok(config.callback_url(self.status(), session.as_ref())?)
	}
}

// Prevents `</script>` and friends from terminating the inline script early.
fn script_safe(json: &str) -> String {
	json.replace('<', "\\u003c").replace('>', "\\u003e").replace('&', "\\u0026")
}
