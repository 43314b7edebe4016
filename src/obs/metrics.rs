// self
use crate::obs::{CallKind, CallOutcome};

/// Counter incremented once per recorded call outcome.
pub const CALL_COUNTER: &str = "sendpulse_client_call_total";

/// Bumps [`CALL_COUNTER`] for `kind`/`outcome`; a no-op unless the `metrics` feature is on.
///
/// One business call records `attempt`, at most one `retry`, then `success` or `failure`. A
/// token fetch triggered along the way records its own `token` series.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(CALL_COUNTER, "kind" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_every_outcome_is_safe_without_a_recorder() {
		for outcome in
			[CallOutcome::Attempt, CallOutcome::Retry, CallOutcome::Success, CallOutcome::Failure]
		{
			record_call_outcome(CallKind::Api, outcome);
		}

		record_call_outcome(CallKind::Token, CallOutcome::Failure);
	}
}
