//! OAuth authorization-completion protocol between a login popup and its opener.
//!
//! The opener calls [`CompletionChannel::authorize`], which records a pending
//! [`AuthorizationSession`] and opens a popup against the identity provider. Once the provider
//! is done, it returns the popup to `redirect_uri` with `state`, and [`ProviderReturn`]
//! redirects it to the callback route (`GET /oauth/{status}?session={id}`). That page posts a
//! [`CompletionMessage`] back to the opener and closes itself. The opener hands the message to
//! [`CompletionChannel::deliver`], which checks the origin, resolves exactly that session, and
//! wakes its single [`SessionWaiter`]. Popups closed early are picked up by
//! [`CompletionChannel::sweep`].

pub mod callback;
pub mod channel;
/// Channel configuration.
pub mod config;
#[cfg(feature = "axum")] pub mod route;
/// Authorization session state machine.
pub mod session;
pub mod window;

pub use callback::*;
pub use channel::*;
pub use config::*;
#[cfg(feature = "axum")] pub use route::*;
pub use session::*;
pub use window::*;

// self
use crate::{_prelude::*, auth::SessionId};

/// Literal carried by every completion message.
pub const COMPLETION_MESSAGE_TYPE: &str = "authorizationCompleted";

/// Status resolved by the callback route's path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
	/// Provider reported a successful login.
	Success,
	/// Anything else, including malformed or empty segments.
	Failure,
}
impl CallbackStatus {
	/// Interprets a path segment; only the exact literal `success` succeeds.
	pub fn from_segment(segment: &str) -> Self {
		if segment == "success" { CallbackStatus::Success } else { CallbackStatus::Failure }
	}

	/// Returns the canonical path segment.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallbackStatus::Success => "success",
			CallbackStatus::Failure => "failure",
		}
	}
}
impl Display for CallbackStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Payload posted by the callback page to its opener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
	/// Fixed literal, [`COMPLETION_MESSAGE_TYPE`] unless reconfigured.
	#[serde(rename = "type")]
	pub message_type: String,
	/// Correlation token of the session this popup belongs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session: Option<SessionId>,
	/// Status read by the popup from its own URL.
	pub status: CallbackStatus,
}
impl CompletionMessage {
	/// Builds a message scoped to `session`.
	pub fn new(session: SessionId, status: CallbackStatus) -> Self {
		Self { message_type: COMPLETION_MESSAGE_TYPE.into(), session: Some(session), status }
	}

	/// Builds an unscoped message, as sent by pages that predate correlation tokens.
	pub fn unscoped(status: CallbackStatus) -> Self {
		Self { message_type: COMPLETION_MESSAGE_TYPE.into(), session: None, status }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_exact_success_succeeds() {
		assert_eq!(CallbackStatus::from_segment("success"), CallbackStatus::Success);

		for segment in ["failure", "denied", "", "SUCCESS", "success ", "%20"] {
			assert_eq!(CallbackStatus::from_segment(segment), CallbackStatus::Failure);
		}
	}

	#[test]
	fn message_wire_shape() {
		let session = SessionId::new("abc123").expect("Session fixture should be valid.");
		let payload = serde_json::to_value(CompletionMessage::new(session, CallbackStatus::Success))
			.expect("Message should serialize.");

		assert_eq!(
			payload,
			serde_json::json!({ "type": "authorizationCompleted", "session": "abc123", "status": "success" })
		);

		let decoded: CompletionMessage =
			serde_json::from_str(r#"{"type":"authorizationCompleted","status":"failure"}"#)
				.expect("Unscoped message should deserialize.");

		assert_eq!(decoded, CompletionMessage::unscoped(CallbackStatus::Failure));
	}
}
