//! Opener side of the protocol: pending-session bookkeeping, message delivery, and the
//! closed-window watchdog.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	descriptor::CredentialDescriptor,
	obs::{self, OpKind, OpOutcome, OpSpan},
	oauth::{
		AbandonReason, AuthorizationSession, CallbackStatus, ChannelConfig, CompletionMessage,
		PopupWindow, SessionOutcome, WindowOpener,
	},
	schema::InputType,
};

type ResolutionCell = Arc<OnceCell<Resolution>>;

/// Terminal snapshot delivered to a session's waiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
	/// Session as it looked when it left `Pending`.
	pub session: AuthorizationSession,
	/// Terminal outcome.
	pub outcome: SessionOutcome,
}

/// Single waiter for one session's terminal outcome.
///
/// Not `Clone`: each session has at most one waiter.
pub struct SessionWaiter {
	session: SessionId,
	cell: ResolutionCell,
}
impl SessionWaiter {
	/// Session this waiter belongs to.
	pub fn session_id(&self) -> &SessionId {
		&self.session
	}

	/// Non-blocking peek at the outcome.
	pub fn try_outcome(&self) -> Option<SessionOutcome> {
		self.cell.get().map(|resolution| resolution.outcome)
	}

	/// Suspends until the session resolves and returns its outcome.
	pub async fn wait(self) -> SessionOutcome {
		self.wait_resolution().await.outcome
	}

	/// Suspends until the session resolves and returns the terminal snapshot.
	pub async fn wait_resolution(self) -> Resolution {
		let span = OpSpan::new(OpKind::Authorize, "wait").with_session(&self.session);

		span.instrument(async move { self.cell.wait().await.clone() }).await
	}
}
impl Debug for SessionWaiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionWaiter")
			.field("session", &self.session)
			.field("resolved", &self.cell.is_initialized())
			.finish()
	}
}

/// Handle returned by [`CompletionChannel::authorize`].
#[derive(Debug)]
pub struct PendingAuthorization {
	/// Snapshot of the freshly created session.
	pub session: AuthorizationSession,
	/// The session's only waiter.
	pub waiter: SessionWaiter,
}

/// Cross-window completion channel owning every pending authorization session.
///
/// Sessions are keyed by their correlation token, so concurrent attempts never consume each
/// other's completion messages.
pub struct CompletionChannel {
	config: ChannelConfig,
	sessions: Mutex<HashMap<SessionId, Slot>>,
}
impl CompletionChannel {
	/// Creates a channel after validating `config`.
	pub fn new(config: ChannelConfig) -> Result<Self> {
		config.validate()?;

		Ok(Self { config, sessions: Default::default() })
	}

	/// Channel configuration.
	pub fn config(&self) -> &ChannelConfig {
		&self.config
	}

	/// Starts an authorization attempt for `credential` and opens its popup.
	///
	/// The popup is pointed at `authorization_endpoint` with `redirect_uri` and `state` (the
	/// session id) appended. Nothing stays registered when the host refuses to open the popup.
	pub fn authorize(
		&self,
		credential: &CredentialDescriptor,
		authorization_endpoint: &Url,
		opener: &dyn WindowOpener,
	) -> Result<PendingAuthorization> {
		self.authorize_at(credential, authorization_endpoint, opener, OffsetDateTime::now_utc())
	}

	/// Same as [`authorize`](Self::authorize) with an explicit creation instant.
	pub fn authorize_at(
		&self,
		credential: &CredentialDescriptor,
		authorization_endpoint: &Url,
		opener: &dyn WindowOpener,
		now: OffsetDateTime,
	) -> Result<PendingAuthorization> {
		const KIND: OpKind = OpKind::Authorize;

		let _span = OpSpan::new(KIND, "authorize").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = self.open_session(credential, authorization_endpoint, opener, now);

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Delivers a completion message received by the opener window.
	///
	/// `origin` is the origin reported by the message event. Messages from anywhere but the
	/// platform origin are rejected and logged. A message without a correlation token resolves
	/// the only pending session, or fails with [`Error::AmbiguousCompletion`] when several are
	/// pending.
	pub fn deliver(&self, origin: &str, message: &CompletionMessage) -> Result<Resolution> {
		self.deliver_at(origin, message, OffsetDateTime::now_utc())
	}

	/// Same as [`deliver`](Self::deliver) with an explicit resolution instant.
	pub fn deliver_at(
		&self,
		origin: &str,
		message: &CompletionMessage,
		now: OffsetDateTime,
	) -> Result<Resolution> {
		const KIND: OpKind = OpKind::Deliver;

		let span = OpSpan::new(KIND, "deliver");
		let _span = match &message.session {
			Some(session) => span.with_session(session),
			None => span,
		}
		.entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = self.accept_message(origin, message, now);

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Watchdog pass: abandons pending sessions whose popup closed or that outlived
	/// [`ChannelConfig::max_pending`]. Returns the resolved sessions.
	///
	/// Hosts call this on their closed-window detection interval.
	pub fn sweep(&self, now: OffsetDateTime) -> Vec<Resolution> {
		const KIND: OpKind = OpKind::Sweep;

		let _span = OpSpan::new(KIND, "sweep").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let max_pending = self.config.max_pending();
		// Popup callbacks and resolution run without the lock; hosts may re-enter the channel.
		let candidates = self
			.sessions
			.lock()
			.iter()
			.map(|(id, slot)| {
				(id.clone(), slot.popup.clone(), slot.session.is_expired_at(now, max_pending))
			})
			.collect::<Vec<_>>();
		let stale = candidates
			.into_iter()
			.filter_map(|(id, popup, expired)| {
				if popup.is_closed() {
					Some((id, AbandonReason::WindowClosed))
				} else if expired {
					Some((id, AbandonReason::TimedOut))
				} else {
					None
				}
			})
			.collect::<Vec<_>>();
		let removed = {
			let mut sessions = self.sessions.lock();

			// A slot resolved by `deliver` in between is simply gone.
			stale
				.into_iter()
				.filter_map(|(id, reason)| sessions.remove(&id).map(|slot| (slot, reason)))
				.collect::<Vec<_>>()
		};
		let resolved = removed
			.into_iter()
			.filter_map(|(slot, reason)| {
				if reason == AbandonReason::TimedOut {
					slot.popup.close();
				}

				slot.resolve(SessionOutcome::Abandoned(reason), now).ok()
			})
			.collect::<Vec<_>>();

		obs::record_op_outcome(KIND, OpOutcome::Success);

		resolved
	}

	/// Abandons a pending session on the opener's behalf and closes its popup.
	pub fn cancel(&self, session: &SessionId) -> Result<Resolution> {
		let slot = self
			.sessions
			.lock()
			.remove(session)
			.ok_or_else(|| Error::NotFound { what: "session", key: session.to_string() })?;

		slot.popup.close();
		slot.resolve(SessionOutcome::Abandoned(AbandonReason::Cancelled), OffsetDateTime::now_utc())
	}

	/// Snapshot of a pending session.
	pub fn session(&self, session: &SessionId) -> Option<AuthorizationSession> {
		self.sessions.lock().get(session).map(|slot| slot.session.clone())
	}

	/// Number of sessions still pending.
	pub fn pending_count(&self) -> usize {
		self.sessions.lock().len()
	}

	fn open_session(
		&self,
		credential: &CredentialDescriptor,
		authorization_endpoint: &Url,
		opener: &dyn WindowOpener,
		now: OffsetDateTime,
	) -> Result<PendingAuthorization> {
		if !credential.requires_oauth() {
			return Err(Error::NotFound {
				what: InputType::OAuth2Secret.as_str(),
				key: credential.name.clone(),
			});
		}

		let id = SessionId::generate();
		let redirect_uri = self.config.redirect_uri()?;
		let mut authorize_url = authorization_endpoint.clone();

		authorize_url
			.query_pairs_mut()
			.append_pair("redirect_uri", redirect_uri.as_str())
			.append_pair("state", &id);

		let popup = opener.open(&authorize_url).ok_or(Error::PopupBlocked)?;
		let session = AuthorizationSession::new(id.clone(), &credential.name, authorize_url, now);
		let cell = Arc::new(OnceCell::new());

		self.sessions.lock().insert(
			id.clone(),
			Slot { session: session.clone(), popup, cell: cell.clone() },
		);

		Ok(PendingAuthorization { session, waiter: SessionWaiter { session: id, cell } })
	}

	fn accept_message(
		&self,
		origin: &str,
		message: &CompletionMessage,
		now: OffsetDateTime,
	) -> Result<Resolution> {
		if !self.config.is_trusted_origin(origin) {
			obs::warn_rejected_message(origin, "untrusted_origin");

			return Err(Error::UntrustedOrigin { origin: origin.to_owned() });
		}
		if message.message_type != self.config.message_type {
			obs::warn_rejected_message(origin, "unexpected_message");

			return Err(Error::UnexpectedMessage { message_type: message.message_type.clone() });
		}

		let mut sessions = self.sessions.lock();
		let id = match &message.session {
			Some(id) => id.clone(),
			None => {
				let mut pending = sessions.keys();

				match (pending.next(), pending.next()) {
					(Some(only), None) => only.clone(),
					(None, _) =>
						return Err(Error::NotFound { what: "session", key: "<unscoped>".into() }),
					_ => {
						obs::warn_rejected_message(origin, "ambiguous_completion");

						return Err(Error::AmbiguousCompletion { pending: sessions.len() });
					},
				}
			},
		};
		let slot = sessions
			.remove(&id)
			.ok_or_else(|| Error::NotFound { what: "session", key: id.to_string() })?;

		drop(sessions);

		let outcome = match message.status {
			CallbackStatus::Success => SessionOutcome::Succeeded,
			CallbackStatus::Failure => SessionOutcome::Failed,
		};

		slot.resolve(outcome, now)
	}
}
impl Debug for CompletionChannel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CompletionChannel")
			.field("config", &self.config)
			.field("pending", &self.pending_count())
			.finish()
	}
}

struct Slot {
	session: AuthorizationSession,
	popup: Arc<dyn PopupWindow>,
	cell: ResolutionCell,
}
impl Slot {
	// Callers remove the slot from the map first, so each slot resolves at most once.
	fn resolve(mut self, outcome: SessionOutcome, at: OffsetDateTime) -> Result<Resolution> {
		self.session.resolve(outcome, at)?;

		let resolution = Resolution { session: self.session, outcome };
		let state = outcome.state();
		let detail = match outcome {
			SessionOutcome::Abandoned(reason) => reason.as_str(),
			_ => "",
		};

		obs::record_session_resolution(state);
		obs::log_session_resolved(
			&resolution.session.id,
			&resolution.session.credential_name,
			state.as_str(),
			detail,
		);

		// The waiter may have been dropped; the outcome is still recorded above.
		let _ = self.cell.set_blocking(resolution.clone());

		Ok(resolution)
	}
}
