//! Transport primitives for API calls.
//!
//! [`ReqwestHttpClient`] is the engine's only dependency on an HTTP stack. Callers that need
//! custom TLS roots, proxies, or connection pooling build their own [`ReqwestClient`] and wrap
//! it with [`ReqwestHttpClient::with_client`]; everything else (rate limiting, bearer auth,
//! retries, error classification) stays in the dispatcher.

// std
use std::ops::Deref;
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, config::ClientConfig, error::ConfigError};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client does not follow redirects: the API answers directly, and a redirect
/// would otherwise forward the bearer token to another origin.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout and user agent from `config`.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().redirect(Policy::none());

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}
		if let Some(user_agent) = config.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		Ok(Self(builder.build()?))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Fully read HTTP response handed from the transport step to classification.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// Response status.
	pub status: StatusCode,
	/// Request URL the response belongs to.
	pub url: String,
	/// Complete response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
