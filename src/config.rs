//! Client configuration: credentials, endpoint, and request budget.
//!
//! [`ClientConfig`] is assembled with [`ClientConfigBuilder`], which validates the base URL and
//! credentials before a [`Client`](crate::Client) is ever constructed.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Production API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.sendpulse.com";
/// Path of the client-credentials token endpoint.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/access_token";
/// Requests per second applied when the configured value is zero or unset.
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::MIN.saturating_add(9);

/// API credentials plus the outbound request budget.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// Maximum requests per second; zero or `None` selects [`DEFAULT_REQUESTS_PER_SECOND`].
	#[serde(default)]
	pub max_requests_per_second: Option<u32>,
}
impl Credentials {
	/// Creates credentials with the default request budget.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			max_requests_per_second: None,
		}
	}

	/// Overrides the request budget.
	pub fn with_max_requests_per_second(mut self, rps: u32) -> Self {
		self.max_requests_per_second = Some(rps);

		self
	}

	/// Effective requests-per-second after applying the default.
	pub fn requests_per_second(&self) -> NonZeroU32 {
		self.max_requests_per_second
			.and_then(NonZeroU32::new)
			.unwrap_or(DEFAULT_REQUESTS_PER_SECOND)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_blank() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(())
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("max_requests_per_second", &self.max_requests_per_second)
			.finish()
	}
}

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// API credentials.
	pub credentials: Credentials,
	/// Origin every relative path is appended to (no trailing slash).
	pub base_url: Url,
	/// Path of the token endpoint.
	pub token_path: String,
	/// Token to seed the cache with, skipping the first fetch.
	pub token: Option<Secret>,
	/// Per-request timeout applied to the default HTTP client.
	pub timeout: Option<Duration>,
	/// `User-Agent` applied to the default HTTP client.
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Creates a new builder for the provided credentials.
	pub fn builder(credentials: Credentials) -> ClientConfigBuilder {
		ClientConfigBuilder::new(credentials)
	}

	/// Effective requests-per-second budget.
	pub fn requests_per_second(&self) -> NonZeroU32 {
		self.credentials.requests_per_second()
	}

	/// Absolute URL for `path`.
	pub fn endpoint(&self, path: &str) -> String {
		let base = self.base_url.as_str().trim_end_matches('/');

		if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API credentials.
	pub credentials: Credentials,
	/// Optional base URL override.
	pub base_url: Option<String>,
	/// Token endpoint path.
	pub token_path: String,
	/// Optional pre-supplied token.
	pub token: Option<Secret>,
	/// Optional per-request timeout.
	pub timeout: Option<Duration>,
	/// Optional user agent.
	pub user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a builder targeting the production API.
	pub fn new(credentials: Credentials) -> Self {
		Self {
			credentials,
			base_url: None,
			token_path: DEFAULT_TOKEN_PATH.into(),
			token: None,
			timeout: None,
			user_agent: None,
		}
	}

	/// Overrides the API origin.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Overrides the token endpoint path.
	pub fn token_path(mut self, path: impl Into<String>) -> Self {
		self.token_path = path.into();

		self
	}

	/// Seeds the token cache.
	pub fn token(mut self, token: impl Into<Secret>) -> Self {
		self.token = Some(token.into());

		self
	}

	/// Sets the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the user agent.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.credentials.validate()?;

		let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
		let base_url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		validate_base_url(&base_url)?;

		if !self.token_path.starts_with('/') {
			return Err(ConfigError::InvalidTokenPath { path: self.token_path });
		}

		Ok(ClientConfig {
			credentials: self.credentials,
			base_url,
			token_path: self.token_path,
			token: self.token.filter(|token| !token.is_blank()),
			timeout: self.timeout,
			user_agent: self.user_agent,
		})
	}
}

fn validate_base_url(url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(ConfigError::BaseUrlHasQuery { url: url.to_string() });
	}

	Ok(())
}
