//! Token-bucket gate applied to every outbound call, token fetches included.
//!
//! The bucket holds `rps` units and refills at `rps` units per second, implemented with
//! [`governor`]'s GCRA limiter. A unit is only consumed once it is granted, so abandoning a wait
//! (cancellation, deadline, dropped future) leaves the bucket untouched.

// crates.io
use governor::{
	Quota, RateLimiter as GovernorRateLimiter,
	clock::DefaultClock,
	state::{InMemoryState, NotKeyed},
};
// self
use crate::{_prelude::*, cancel::Cancellation, error::Cancelled};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared token bucket bounding the aggregate call rate of one client.
pub struct RateLimiter {
	inner: DirectRateLimiter,
	per_second: NonZeroU32,
}
impl RateLimiter {
	/// Creates a bucket with capacity and refill rate both equal to `rps`.
	pub fn per_second(rps: NonZeroU32) -> Self {
		Self { inner: GovernorRateLimiter::direct(Quota::per_second(rps)), per_second: rps }
	}

	/// Configured requests per second.
	pub fn requests_per_second(&self) -> NonZeroU32 {
		self.per_second
	}

	/// Waits for one unit of capacity, or returns the cancellation reason.
	pub async fn acquire(&self, cancel: &Cancellation) -> Result<(), Cancelled> {
		cancel.guard(self.inner.until_ready()).await
	}

	/// Takes one unit if available without waiting.
	pub fn try_acquire(&self) -> bool {
		self.inner.check().is_ok()
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter").field("per_second", &self.per_second).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Instant;
	// crates.io
	use tokio_util::sync::CancellationToken;
	// self
	use super::*;

	fn rps(value: u32) -> NonZeroU32 {
		NonZeroU32::new(value).expect("Test rate must be non-zero.")
	}

	#[tokio::test]
	async fn burst_equals_capacity() {
		let limiter = RateLimiter::per_second(rps(3));

		assert!(limiter.try_acquire());
		assert!(limiter.try_acquire());
		assert!(limiter.try_acquire());
		assert!(!limiter.try_acquire(), "Fourth unit must wait for a refill.");
	}

	#[tokio::test]
	async fn acquire_waits_for_refill() {
		let limiter = RateLimiter::per_second(rps(5));
		let started = Instant::now();

		for _ in 0..6 {
			limiter.acquire(&Cancellation::none()).await.expect("Acquire should succeed.");
		}

		// Five units are granted at once; the sixth waits one refill interval (200ms).
		assert!(started.elapsed() >= Duration::from_millis(150));
	}

	#[tokio::test]
	async fn deadline_aborts_wait_without_consuming() {
		let limiter = RateLimiter::per_second(rps(1));

		limiter.acquire(&Cancellation::none()).await.expect("First unit is free.");

		let err = limiter
			.acquire(&Cancellation::timeout(Duration::from_millis(50)))
			.await
			.expect_err("Second unit is a second away.");

		assert_eq!(err, Cancelled::DeadlineExceeded);

		tokio::time::sleep(Duration::from_millis(1_000)).await;

		assert!(limiter.try_acquire(), "Abandoned wait must not have consumed the refill.");
	}

	#[tokio::test]
	async fn cancelled_token_aborts_immediately() {
		let limiter = RateLimiter::per_second(rps(1));
		let token = CancellationToken::new();

		token.cancel();

		let err = limiter
			.acquire(&Cancellation::from_token(token))
			.await
			.expect_err("A fired token must win.");

		assert_eq!(err, Cancelled::Cancelled);
		assert!(limiter.try_acquire(), "Cancelled acquire must not consume capacity.");
	}
}
