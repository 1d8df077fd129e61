//! Optional observability helpers for registry and OAuth channel operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `plugin_registry.op` with
//!   the `op` and `stage` fields, plus warn-level events for rejected completion messages and
//!   abandoned sessions.
//! - Enable `metrics` to increment the `plugin_registry_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `plugin_registry_session_total` counter labeled by terminal `state`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Single descriptor registration.
	Register,
	/// Bulk manifest registration.
	LoadManifest,
	/// Opening an authorization popup.
	Authorize,
	/// Delivering a completion message.
	Deliver,
	/// Watchdog pass over pending sessions.
	Sweep,
	/// Writing a configured credential.
	Credential,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Register => "register",
			OpKind::LoadManifest => "load_manifest",
			OpKind::Authorize => "authorize",
			OpKind::Deliver => "deliver",
			OpKind::Sweep => "sweep",
			OpKind::Credential => "credential",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto the success/failure label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
