//! Demonstrates the request engine against a local mock API: the first authenticated call
//! fetches a bearer token and later calls reuse it.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use sendpulse_client::{Call, Cancellation, Client, ClientConfig, Credentials};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let books_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/addressbooks").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"name\":\"Newsletter\"}]");
		})
		.await;
	let delete_mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/addressbooks/1");
			then.status(200).body("{\"result\":true}");
		})
		.await;
	let credentials =
		Credentials::new("demo-client", "demo-secret").with_max_requests_per_second(5);
	let config = ClientConfig::builder(credentials)
		.base_url(server.base_url())
		.user_agent("sendpulse-client-demo")
		.build()?;
	let client = Client::new(config)?;
	let cancel = Cancellation::timeout(Duration::from_secs(5));
	let books: serde_json::Value = client.get("/addressbooks", &cancel).await?;

	println!("Address books: {books}.");

	let removed = client.execute_result(Call::delete("/addressbooks/1"), &cancel).await?;

	println!("Address book removed: {removed}.");

	token_mock.assert_calls_async(1).await;
	books_mock.assert_async().await;
	delete_mock.assert_async().await;

	Ok(())
}
