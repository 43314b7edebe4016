//! Request dispatcher shared by every resource call.
//!
//! [`Client::execute`] is the single funnel: it takes one rate-limiter unit, attaches the cached
//! bearer token (fetching one through the token endpoint when the cache is empty), sends the
//! request with the caller's [`Cancellation`] bound to it, replays the call exactly once when the
//! API answers `401`, and decodes the JSON response into the caller's type.
//!
//! Every failure is classified into [`Error`]: cancellation passes through untouched, everything
//! else becomes a structured [`ApiError`] carrying status, URL, raw body, and message.

// crates.io
use reqwest::Response;
// self
use crate::{
	_prelude::*,
	auth::{Secret, TokenManager, TokenRequest, TokenResponse},
	body::RequestBody,
	cancel::Cancellation,
	config::ClientConfig,
	error::ApiError,
	http::{RawResponse, ReqwestHttpClient},
	obs::{self, CallKind, CallOutcome, CallSpan},
	rate_limit::RateLimiter,
};

/// Transient description of one API call.
#[derive(Clone, Debug)]
pub struct Call<'a> {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL.
	pub path: &'a str,
	/// Request payload.
	pub body: RequestBody,
	/// Whether the cached bearer token must be attached.
	pub requires_auth: bool,
}
impl<'a> Call<'a> {
	/// Creates an authenticated, bodiless call.
	pub fn new(method: Method, path: &'a str) -> Self {
		Self { method, path, body: RequestBody::Empty, requires_auth: true }
	}

	/// `GET path`.
	pub fn get(path: &'a str) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST path`.
	pub fn post(path: &'a str) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT path`.
	pub fn put(path: &'a str) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH path`.
	pub fn patch(path: &'a str) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE path`.
	pub fn delete(path: &'a str) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Replaces the payload.
	pub fn body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Encodes `value` as the JSON payload.
	pub fn json<T>(self, value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.body(RequestBody::json(value)?))
	}

	/// Sends the call without a bearer token.
	pub fn unauthenticated(self) -> Self {
		self.with_auth(false)
	}

	/// Overrides the authentication flag.
	pub fn with_auth(mut self, requires_auth: bool) -> Self {
		self.requires_auth = requires_auth;

		self
	}
}

/// `{ "result": bool }` envelope returned by delete/update-style endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
	/// Whether the API applied the change.
	pub result: bool,
}

/// Authenticated, rate-limited request engine.
///
/// Clones share the HTTP connection pool, the rate limiter, and the token cache, so one client
/// can be handed to any number of concurrent tasks. Independent clients never share state.
#[derive(Clone, Debug)]
pub struct Client {
	/// HTTP client used for every outbound request.
	pub http_client: ReqwestHttpClient,
	/// Validated configuration.
	pub config: Arc<ClientConfig>,
	/// Token bucket shared by API calls and token fetches.
	pub limiter: Arc<RateLimiter>,
	/// Bearer-token cache.
	pub tokens: Arc<TokenManager>,
}
impl Client {
	/// Creates a client with its own reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, http_client))
	}

	/// Creates a client that reuses the caller-provided transport.
	///
	/// The configured timeout and user agent only apply to transports built by [`Client::new`].
	pub fn with_http_client(config: ClientConfig, http_client: ReqwestHttpClient) -> Self {
		let limiter = RateLimiter::per_second(config.requests_per_second());
		let tokens = match config.token.clone() {
			Some(token) => TokenManager::seeded(token),
			None => TokenManager::new(),
		};

		Self {
			http_client,
			config: Arc::new(config),
			limiter: Arc::new(limiter),
			tokens: Arc::new(tokens),
		}
	}

	/// Executes `call` and decodes the JSON response into `T`.
	pub async fn execute<T>(&self, call: Call<'_>, cancel: &Cancellation) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Api;

		let span = CallSpan::new(KIND, &call.method, call.path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let raw = self.dispatch(&call, cancel).await?;

				decode(raw, &call.body)
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Executes a call with an optional JSON body.
	pub async fn execute_json<B, T>(
		&self,
		method: Method,
		path: &str,
		body: Option<&B>,
		requires_auth: bool,
		cancel: &Cancellation,
	) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let mut call = Call::new(method, path).with_auth(requires_auth);

		if let Some(body) = body {
			call = call.json(body)?;
		}

		self.execute(call, cancel).await
	}

	/// Executes `call` and returns the `result` flag of its envelope.
	pub async fn execute_result(&self, call: Call<'_>, cancel: &Cancellation) -> Result<bool> {
		self.execute::<ResultEnvelope>(call, cancel).await.map(|envelope| envelope.result)
	}

	/// Authenticated `GET`.
	pub async fn get<T>(&self, path: &str, cancel: &Cancellation) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.execute(Call::get(path), cancel).await
	}

	/// Authenticated `POST` with a JSON body.
	pub async fn post<B, T>(&self, path: &str, body: &B, cancel: &Cancellation) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.execute(Call::post(path).json(body)?, cancel).await
	}

	/// Authenticated `PUT` with a JSON body.
	pub async fn put<B, T>(&self, path: &str, body: &B, cancel: &Cancellation) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.execute(Call::put(path).json(body)?, cancel).await
	}

	/// Authenticated `PATCH` with a JSON body.
	pub async fn patch<B, T>(&self, path: &str, body: &B, cancel: &Cancellation) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.execute(Call::patch(path).json(body)?, cancel).await
	}

	/// Authenticated `DELETE`.
	pub async fn delete<T>(&self, path: &str, cancel: &Cancellation) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.execute(Call::delete(path), cancel).await
	}

	/// Returns the cached bearer token, fetching one when the cache is empty.
	pub async fn token(&self, cancel: &Cancellation) -> Result<Secret> {
		self.tokens.get_or_fetch(|| self.fetch_token(cancel)).await
	}

	/// Drops the cached bearer token so the next authenticated call fetches a new one.
	pub fn invalidate_token(&self) -> bool {
		self.tokens.invalidate()
	}

	/// Runs the call until it yields a response that is not a retryable `401`.
	///
	/// The loop body runs at most twice. Every `401` on an authenticated call invalidates the
	/// token; the first one also replays the call, the second is returned to the caller.
	async fn dispatch(&self, call: &Call<'_>, cancel: &Cancellation) -> Result<RawResponse> {
		let url = self.config.endpoint(call.path);
		let mut replayed = false;

		loop {
			self.limiter.acquire(cancel).await?;

			let bearer = if call.requires_auth { Some(self.token(cancel).await?) } else { None };
			let response = self.send(call, &url, bearer.as_ref(), cancel).await?;

			if call.requires_auth && response.status() == StatusCode::UNAUTHORIZED {
				obs::note_token_rejected(&url, replayed);

				self.tokens.invalidate();

				if !replayed {
					obs::record_call_outcome(CallKind::Api, CallOutcome::Retry);

					replayed = true;

					continue;
				}
			}

			return read_body(response, url, cancel).await;
		}
	}

	/// Exchanges the client credentials for a bearer token.
	///
	/// The exchange is an ordinary unauthenticated call: it takes its own rate-limiter unit and
	/// is never replayed.
	async fn fetch_token(&self, cancel: &Cancellation) -> Result<Secret> {
		const KIND: CallKind = CallKind::Token;

		let call = Call::post(&self.config.token_path)
			.json(&TokenRequest::new(&self.config.credentials))?
			.unauthenticated();
		let span = CallSpan::new(KIND, &call.method, call.path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let url = self.config.endpoint(call.path);

				self.limiter.acquire(cancel).await?;

				let response = self.send(&call, &url, None, cancel).await?;
				let raw = read_body(response, url, cancel).await?;
				let token = decode::<TokenResponse>(raw, &call.body)?;

				obs::note_token_fetched();

				Ok(token.access_token)
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	async fn send(
		&self,
		call: &Call<'_>,
		url: &str,
		bearer: Option<&Secret>,
		cancel: &Cancellation,
	) -> Result<Response> {
		let mut request = call.body.apply(self.http_client.request(call.method.clone(), url))?;

		if let Some(token) = bearer {
			request = request.bearer_auth(token.expose());
		}

		cancel.guard(request.send()).await?.map_err(|e| ApiError::transport(url, e).into())
	}
}

async fn read_body(response: Response, url: String, cancel: &Cancellation) -> Result<RawResponse> {
	let status = response.status();

	match cancel.guard(response.bytes()).await? {
		Ok(bytes) => Ok(RawResponse { status, url, body: bytes.to_vec() }),
		Err(e) => Err(ApiError::body_read(status.as_u16(), url, e).into()),
	}
}

fn decode<T>(raw: RawResponse, body: &RequestBody) -> Result<T>
where
	T: DeserializeOwned,
{
	if !body.accepts(raw.status) {
		let text = raw.body_text();

		return Err(ApiError::status(raw.status.as_u16(), raw.url, text).into());
	}

	let mut de = serde_json::Deserializer::from_slice(&raw.body);
	let value = serde_path_to_error::deserialize::<_, T>(&mut de)
		.map_err(|e| ApiError::decode(raw.status.as_u16(), &raw.url, raw.body_text(), e))?;

	de.end()
		.map_err(|e| ApiError::decode(raw.status.as_u16(), &raw.url, raw.body_text(), e))?;

	Ok(value)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ApiErrorKind;

	fn raw(status: StatusCode, body: &str) -> RawResponse {
		RawResponse { status, url: "https://api.example.com/x".into(), body: body.into() }
	}

	#[test]
	fn result_envelope_decodes() {
		let envelope: ResultEnvelope =
			decode(raw(StatusCode::OK, "{\"result\":true}"), &RequestBody::Empty)
				.expect("Envelope should decode.");

		assert!(envelope.result);
	}

	#[test]
	fn empty_body_is_a_decode_failure() {
		let err = decode::<ResultEnvelope>(raw(StatusCode::OK, ""), &RequestBody::Empty)
			.expect_err("Empty body cannot decode.");
		let api = err.as_api().expect("Decode failure should be structured.");

		assert_eq!(api.kind, ApiErrorKind::Decode);
		assert_eq!(api.status, 200);
		assert_eq!(api.body.as_deref(), Some(""));
		assert!(api.message.is_some());
	}

	#[test]
	fn trailing_garbage_is_a_decode_failure() {
		let err = decode::<ResultEnvelope>(
			raw(StatusCode::OK, "{\"result\":true} x"),
			&RequestBody::Empty,
		)
		.expect_err("Trailing characters must be rejected.");

		assert_eq!(err.as_api().map(|e| e.kind), Some(ApiErrorKind::Decode));
	}

	#[test]
	fn unexpected_status_keeps_raw_body_without_message() {
		let err = decode::<ResultEnvelope>(
			raw(StatusCode::BAD_REQUEST, "{\"error_code\":17}"),
			&RequestBody::Empty,
		)
		.expect_err("400 must not decode.");
		let api = err.as_api().expect("Status failure should be structured.");

		assert_eq!(api.kind, ApiErrorKind::Status);
		assert_eq!(api.status, 400);
		assert_eq!(api.body.as_deref(), Some("{\"error_code\":17}"));
		assert!(api.message.is_none());
	}

	#[test]
	fn created_only_accepted_for_uploads() {
		let form = RequestBody::form([("k", "v")]);

		decode::<ResultEnvelope>(raw(StatusCode::CREATED, "{\"result\":true}"), &form)
			.expect("Form uploads accept 201.");
		decode::<ResultEnvelope>(
			raw(StatusCode::CREATED, "{\"result\":true}"),
			&RequestBody::Empty,
		)
		.expect_err("JSON calls accept 200 only.");
	}

	#[test]
	fn call_builders_default_to_authenticated() {
		let call = Call::delete("/addressbooks/1");

		assert_eq!(call.method, Method::DELETE);
		assert!(call.requires_auth);
		assert!(!call.unauthenticated().requires_auth);
	}

	#[test]
	fn seeded_token_skips_first_fetch() {
		let config = ClientConfig::builder(crate::Credentials::new("id", "secret"))
			.token("pre-supplied")
			.build()
			.expect("Config should build.");
		let client = Client::new(config).expect("Client should build.");

		assert_eq!(
			client.tokens.current().map(|t| t.expose().to_owned()).as_deref(),
			Some("pre-supplied")
		);
		assert_eq!(client.limiter.requests_per_second().get(), 10);
	}
}
