//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::{Mock, prelude::*};
// self
use sendpulse_client::{Client, ClientConfig, Credentials, config::DEFAULT_TOKEN_PATH};

pub const CLIENT_ID: &str = "integration-client";
pub const CLIENT_SECRET: &str = "integration-secret";

/// Credentials used by every test client.
pub fn credentials(rps: u32) -> Credentials {
	Credentials::new(CLIENT_ID, CLIENT_SECRET).with_max_requests_per_second(rps)
}

/// Builds a client pointed at `server` with an empty token cache.
pub fn build_client(server: &MockServer, rps: u32) -> Client {
	let config = ClientConfig::builder(credentials(rps))
		.base_url(server.base_url())
		.build()
		.expect("Test client config should build.");

	Client::new(config).expect("Test client should build.")
}

/// Builds a client pointed at `server` whose cache is seeded with `token`.
pub fn build_seeded_client(server: &MockServer, rps: u32, token: &str) -> Client {
	let config = ClientConfig::builder(credentials(rps))
		.base_url(server.base_url())
		.token(token)
		.build()
		.expect("Seeded test client config should build.");

	Client::new(config).expect("Seeded test client should build.")
}

/// Token endpoint that checks the client-credentials body and returns `token`.
pub async fn mock_token_endpoint<'a>(server: &'a MockServer, token: &str) -> Mock<'a> {
	let body = serde_json::json!({
		"access_token": token,
		"token_type": "Bearer",
		"expires_in": 3600,
	})
	.to_string();

	server
		.mock_async(|when, then| {
			when.method(POST).path(DEFAULT_TOKEN_PATH).json_body(serde_json::json!({
				"grant_type": "client_credentials",
				"client_id": CLIENT_ID,
				"client_secret": CLIENT_SECRET,
			}));
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Current cached token as an owned string.
pub fn cached_token(client: &Client) -> Option<String> {
	client.tokens.current().map(|token| token.expose().to_owned())
}
