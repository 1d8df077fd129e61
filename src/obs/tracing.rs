// self
use crate::{_prelude::*, obs::OpKind};

/// Credential-service future wrapped in its `plugin_registry.op` span (`tracing` feature).
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Credential-service future, untouched without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// `plugin_registry.op` span around one registry, popup-handshake or credential operation.
///
/// `op` names the [`OpKind`], `stage` the entry point (`register`, `authorize`, `deliver`,
/// `sweep`, `create`, ...). Handshake spans also carry the `session` correlation token once
/// it is known.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens the span for `stage` of `kind`.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"plugin_registry.op",
				op = kind.as_str(),
				stage,
				session = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the authorization session it concerns.
	pub fn with_session(self, session: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			self.span.record("session", session);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = session;
		}

		self
	}

	/// Enters the span around a synchronous registry or channel call.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Attaches the span to a credential-store or waiter future, entering it on every poll.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Keeps an [`OpSpan`] entered until the registry or channel call returns.
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Warns about a completion message `deliver` refused (`untrusted_origin`,
/// `unexpected_message`, `ambiguous_completion`).
pub fn warn_rejected_message(origin: &str, reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(origin, reason, "completion message rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (origin, reason);
	}
}

/// Logs an authorization session leaving `Pending`.
///
/// Abandoned sessions (closed popup, timeout, cancel) log at warn, everything else at info.
pub fn log_session_resolved(session: &str, credential: &str, state: &'static str, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		if state == "abandoned" {
			tracing::warn!(session, credential, state, detail, "authorization session resolved");
		} else {
			tracing::info!(session, credential, state, detail, "authorization session resolved");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (session, credential, state, detail);
	}
}
