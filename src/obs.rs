//! Call-level telemetry for the dispatcher, compiled out unless a feature asks for it.
//!
//! Two series matter when operating a client: how many business calls ended in failure, and how
//! often the API rejected the cached token (each rejection costs a token fetch and a replay).
//! Both are visible through the `tracing` feature (span `sendpulse.call` carrying `kind`,
//! `method`, and `path`, plus `warn` events on every `401`) and the `metrics` feature
//! ([`CALL_COUNTER`] labeled by `kind` and `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Which side of the engine issued a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// `POST` to the token endpoint.
	Token,
	/// Resource call made on a caller's behalf.
	Api,
}
impl CallKind {
	/// Label used as the `kind` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Token => "token",
			CallKind::Api => "api",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle points of one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Call entered the dispatcher.
	Attempt,
	/// Decoded value returned.
	Success,
	/// Error or cancellation returned.
	Failure,
	/// `401` on the first pass; the token was dropped and the call replayed.
	Retry,
}
impl CallOutcome {
	/// Terminal outcome for a finished call.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}

	/// Label used as the `outcome` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
			CallOutcome::Retry => "retry",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn terminal_outcome_follows_the_result() {
		assert_eq!(CallOutcome::of(&Ok::<_, ()>(1)), CallOutcome::Success);
		assert_eq!(CallOutcome::of(&Err::<(), _>("401")), CallOutcome::Failure);
		assert_eq!(format!("{}/{}", CallKind::Token, CallOutcome::Retry), "token/retry");
	}
}
