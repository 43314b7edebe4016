//! Caller-supplied cancellation signal bound to every suspension point of a call.
//!
//! A [`Cancellation`] combines an optional [`CancellationToken`] with an optional deadline. The
//! dispatcher races the rate-limiter wait, the token fetch, and the network round-trip against
//! it; whichever side loses is dropped, which releases nothing and mutates no shared state.

// crates.io
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, error::Cancelled};

/// Cancellation token plus deadline.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
	token: Option<CancellationToken>,
	deadline: Option<Instant>,
}
impl Cancellation {
	/// A signal that never fires.
	pub fn none() -> Self {
		Self::default()
	}

	/// Fires when `token` is cancelled.
	pub fn from_token(token: CancellationToken) -> Self {
		Self { token: Some(token), deadline: None }
	}

	/// Fires once `timeout` has elapsed from now.
	pub fn timeout(timeout: Duration) -> Self {
		Self::none().with_timeout(timeout)
	}

	/// Adds (or tightens) a deadline `timeout` from now.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	/// Adds (or tightens) an absolute deadline.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(current) => current.min(deadline),
			None => deadline,
		});

		self
	}

	/// Attaches a cancellation token, replacing any previous one.
	pub fn with_token(mut self, token: CancellationToken) -> Self {
		self.token = Some(token);

		self
	}

	/// The deadline, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Returns the reason if the signal has already fired.
	pub fn check(&self) -> Result<(), Cancelled> {
		if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
			return Err(Cancelled::Cancelled);
		}
		if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
			return Err(Cancelled::DeadlineExceeded);
		}

		Ok(())
	}

	/// Resolves when the signal fires; pends forever when neither source is set.
	pub async fn cancelled(&self) -> Cancelled {
		match (&self.token, self.deadline) {
			(Some(token), Some(deadline)) => tokio::select! {
				biased;
				_ = token.cancelled() => Cancelled::Cancelled,
				_ = sleep_until(deadline) => Cancelled::DeadlineExceeded,
			},
			(Some(token), None) => {
				token.cancelled().await;

				Cancelled::Cancelled
			},
			(None, Some(deadline)) => {
				sleep_until(deadline).await;

				Cancelled::DeadlineExceeded
			},
			(None, None) => std::future::pending().await,
		}
	}

	/// Runs `fut` unless the signal fires first.
	///
	/// A signal that has already fired wins without polling `fut`.
	pub async fn guard<F>(&self, fut: F) -> Result<F::Output, Cancelled>
	where
		F: Future,
	{
		self.check()?;

		tokio::select! {
			biased;
			reason = self.cancelled() => Err(reason),
			output = fut => Ok(output),
		}
	}
}
impl From<CancellationToken> for Cancellation {
	fn from(token: CancellationToken) -> Self {
		Self::from_token(token)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn none_never_interrupts() {
		let output = Cancellation::none().guard(async { 7 }).await;

		assert_eq!(output, Ok(7));
	}

	#[tokio::test]
	async fn fired_token_short_circuits_without_polling() {
		let token = CancellationToken::new();

		token.cancel();

		let output = Cancellation::from_token(token).guard(async { 1 }).await;

		assert_eq!(output, Err(Cancelled::Cancelled));
	}

	#[tokio::test]
	async fn deadline_interrupts_pending_future() {
		let cancel = Cancellation::timeout(Duration::from_millis(20));
		let output = cancel.guard(std::future::pending::<()>()).await;

		assert_eq!(output, Err(Cancelled::DeadlineExceeded));
		assert_eq!(cancel.check(), Err(Cancelled::DeadlineExceeded));
	}

	#[tokio::test]
	async fn token_cancelled_mid_wait() {
		let token = CancellationToken::new();
		let cancel = Cancellation::from_token(token.clone()).with_timeout(Duration::from_secs(30));
		let trigger = async {
			tokio::time::sleep(Duration::from_millis(10)).await;
			token.cancel();
		};
		let (output, _) = tokio::join!(cancel.guard(std::future::pending::<()>()), trigger);

		assert_eq!(output, Err(Cancelled::Cancelled));
	}

	#[test]
	fn deadlines_only_tighten() {
		let now = Instant::now();
		let cancel = Cancellation::none()
			.with_deadline(now + Duration::from_secs(5))
			.with_deadline(now + Duration::from_secs(10));

		assert_eq!(cancel.deadline(), Some(now + Duration::from_secs(5)));
	}
}
