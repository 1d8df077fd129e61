// self
use crate::{_prelude::*, auth::SessionId};

/// Lifecycle states of an authorization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	/// Popup is open; no completion observed yet.
	Pending,
	/// Callback reported `success`.
	Succeeded,
	/// Callback reported anything other than `success`.
	Failed,
	/// Popup went away without a completion message.
	Abandoned,
}
impl SessionState {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionState::Pending => "pending",
			SessionState::Succeeded => "succeeded",
			SessionState::Failed => "failed",
			SessionState::Abandoned => "abandoned",
		}
	}

	/// Returns true for states that admit no further transition.
	pub const fn is_terminal(self) -> bool {
		!matches!(self, SessionState::Pending)
	}
}
impl Display for SessionState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why a session ended up abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
	/// The user closed the popup before the callback ran.
	WindowClosed,
	/// The session outlived the configured maximum pending duration.
	TimedOut,
	/// The opener cancelled the attempt.
	Cancelled,
}
impl AbandonReason {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			AbandonReason::WindowClosed => "window closed",
			AbandonReason::TimedOut => "timed out",
			AbandonReason::Cancelled => "cancelled",
		}
	}
}
impl Display for AbandonReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal result handed to the session's waiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
	/// Login completed.
	Succeeded,
	/// Provider reported a failure.
	Failed,
	/// No completion was ever received.
	Abandoned(AbandonReason),
}
impl SessionOutcome {
	/// State reached by this outcome.
	pub const fn state(self) -> SessionState {
		match self {
			SessionOutcome::Succeeded => SessionState::Succeeded,
			SessionOutcome::Failed => SessionState::Failed,
			SessionOutcome::Abandoned(_) => SessionState::Abandoned,
		}
	}

	/// Converts the outcome into a result; cancellation and provider failure stay distinct.
	pub fn into_result(self) -> Result<()> {
		match self {
			SessionOutcome::Succeeded => Ok(()),
			SessionOutcome::Failed => Err(Error::AuthorizationFailed),
			SessionOutcome::Abandoned(reason) => Err(Error::AuthorizationAbandoned { reason }),
		}
	}
}

/// Runtime record of one OAuth login attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthorizationSession {
	/// Session identifier; also the correlation token embedded in the callback URL.
	pub id: SessionId,
	/// Credential descriptor that triggered the attempt.
	pub credential_name: String,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Provider URL the popup was opened against.
	pub authorize_url: Url,
	resolved_at: Option<OffsetDateTime>,
	outcome: Option<SessionOutcome>,
}
impl AuthorizationSession {
	pub(crate) fn new(
		id: SessionId,
		credential_name: impl Into<String>,
		authorize_url: Url,
		created_at: OffsetDateTime,
	) -> Self {
		Self {
			id,
			credential_name: credential_name.into(),
			created_at,
			authorize_url,
			resolved_at: None,
			outcome: None,
		}
	}

	/// Current state.
	pub fn state(&self) -> SessionState {
		self.outcome.map_or(SessionState::Pending, SessionOutcome::state)
	}

	/// Terminal outcome, once resolved.
	pub fn outcome(&self) -> Option<SessionOutcome> {
		self.outcome
	}

	/// Resolution instant, once resolved.
	pub fn resolved_at(&self) -> Option<OffsetDateTime> {
		self.resolved_at
	}

	/// Returns true while no terminal state has been reached.
	pub fn is_pending(&self) -> bool {
		self.outcome.is_none()
	}

	/// Returns true when the session has been pending for at least `max_pending` at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime, max_pending: Duration) -> bool {
		self.is_pending() && now - self.created_at >= max_pending
	}

	/// Moves the session into a terminal state; a second transition fails.
	pub(crate) fn resolve(&mut self, outcome: SessionOutcome, at: OffsetDateTime) -> Result<()> {
		if self.outcome.is_some() {
			return Err(Error::AlreadyResolved { session: self.id.to_string() });
		}

		self.outcome = Some(outcome);
		self.resolved_at = Some(at);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn session() -> AuthorizationSession {
		AuthorizationSession::new(
			SessionId::new("session-1").expect("Session fixture should be valid."),
			"googleApi",
			Url::parse("https://accounts.example.com/auth").expect("URL fixture should parse."),
			macros::datetime!(2025-11-10 12:00 UTC),
		)
	}

	#[test]
	fn terminal_states_admit_no_transition() {
		let mut session = session();
		let at = macros::datetime!(2025-11-10 12:01 UTC);

		assert_eq!(session.state(), SessionState::Pending);

		session.resolve(SessionOutcome::Succeeded, at).expect("First resolution should succeed.");

		assert_eq!(session.state(), SessionState::Succeeded);
		assert_eq!(session.resolved_at(), Some(at));

		let err = session
			.resolve(SessionOutcome::Abandoned(AbandonReason::WindowClosed), at)
			.expect_err("Second resolution must fail.");

		assert!(matches!(err, Error::AlreadyResolved { .. }));
		assert_eq!(session.outcome(), Some(SessionOutcome::Succeeded));
	}

	#[test]
	fn expiry_only_applies_to_pending_sessions() {
		let mut session = session();
		let later = macros::datetime!(2025-11-10 12:10 UTC);

		assert!(session.is_expired_at(later, Duration::minutes(10)));
		assert!(!session.is_expired_at(later, Duration::minutes(11)));

		session.resolve(SessionOutcome::Failed, later).expect("Resolution should succeed.");

		assert!(!session.is_expired_at(later, Duration::minutes(10)));
	}

	#[test]
	fn outcomes_map_to_distinct_errors() {
		assert!(SessionOutcome::Succeeded.into_result().is_ok());
		assert!(matches!(SessionOutcome::Failed.into_result(), Err(Error::AuthorizationFailed)));
		assert!(matches!(
			SessionOutcome::Abandoned(AbandonReason::TimedOut).into_result(),
			Err(Error::AuthorizationAbandoned { reason: AbandonReason::TimedOut })
		));
		assert!(SessionState::Abandoned.is_terminal());
		assert!(!SessionState::Pending.is_terminal());
	}
}
