//! Shared bearer-token cache owned by one client instance.
//!
//! The cache starts empty (or seeded with a pre-supplied token), is filled lazily by the first
//! authenticated call, and is cleared whenever the API answers `401`. Expiry is never tracked
//! locally; the server's rejection is the only invalidation trigger.
//!
//! Cold-start fetches are not coalesced. Callers that observe an empty cache at the same time
//! each run their own fetch and the last write wins; every written token is equally valid.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, auth::Secret, config::Credentials};

/// Grant type sent to the token endpoint.
pub const GRANT_TYPE: &str = "client_credentials";

/// JSON body posted to the token endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct TokenRequest<'a> {
	/// Always [`GRANT_TYPE`].
	pub grant_type: &'static str,
	/// Client identifier.
	pub client_id: &'a str,
	/// Client secret.
	pub client_secret: &'a Secret,
}
impl<'a> TokenRequest<'a> {
	/// Builds the client-credentials body for `credentials`.
	pub fn new(credentials: &'a Credentials) -> Self {
		Self {
			grant_type: GRANT_TYPE,
			client_id: &credentials.client_id,
			client_secret: &credentials.client_secret,
		}
	}
}

/// Token endpoint response. Only `access_token` is required.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Bearer token to attach to authenticated calls.
	pub access_token: Secret,
	/// Token type reported by the API (normally `Bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Advertised lifetime in seconds; informational only.
	#[serde(default)]
	pub expires_in: Option<u64>,
}

/// Token currently held by a [`TokenManager`].
#[derive(Clone, Debug)]
pub struct CachedToken {
	/// Bearer token value.
	pub token: Secret,
	/// When the token entered the cache.
	pub obtained_at: OffsetDateTime,
}

/// Reader/writer-locked bearer-token cache.
///
/// The lock is never held across an `.await`, so a cancelled fetch cannot leave the cache
/// half-written or locked.
#[derive(Debug, Default)]
pub struct TokenManager {
	slot: RwLock<Option<CachedToken>>,
	fetches: AtomicU64,
}
impl TokenManager {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a cache seeded with a pre-supplied token.
	pub fn seeded(token: Secret) -> Self {
		let manager = Self::new();

		manager.store(token);

		manager
	}

	/// Returns the current token, if any.
	pub fn current(&self) -> Option<Secret> {
		self.slot.read().as_ref().map(|cached| cached.token.clone())
	}

	/// Returns the current token together with its cache timestamp.
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.slot.read().clone()
	}

	/// Whether a token is cached.
	pub fn is_cached(&self) -> bool {
		self.slot.read().is_some()
	}

	/// Replaces the cached token.
	pub fn store(&self, token: Secret) -> Secret {
		*self.slot.write() =
			Some(CachedToken { token: token.clone(), obtained_at: OffsetDateTime::now_utc() });

		token
	}

	/// Clears the cached token, returning whether one was present.
	pub fn invalidate(&self) -> bool {
		self.slot.write().take().is_some()
	}

	/// Number of fetches started through [`TokenManager::get_or_fetch`].
	pub fn fetch_count(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the cached token, or runs `fetch` and caches its result.
	///
	/// A failed fetch leaves the cache untouched.
	pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Secret>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Secret>>,
	{
		if let Some(token) = self.current() {
			return Ok(token);
		}

		self.fetches.fetch_add(1, Ordering::Relaxed);

		let token = fetch().await?;

		Ok(self.store(token))
	}
}
