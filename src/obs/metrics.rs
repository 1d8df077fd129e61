// self
use crate::{
	obs::{OpKind, OpOutcome},
	oauth::SessionState,
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"plugin_registry_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the terminal state reached by an authorization session (when enabled).
pub fn record_session_resolution(state: SessionState) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("plugin_registry_session_total", "state" => state.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = state;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_op_outcome(OpKind::Register, OpOutcome::Failure);
		record_session_resolution(SessionState::Abandoned);
	}
}
