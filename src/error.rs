//! Engine-level error types shared by the dispatcher, token manager, and rate limiter.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Synthetic status reported when no HTTP response was received.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The call failed after (or while) talking to the API.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// The caller's cancellation signal fired before the call completed.
	#[error(transparent)]
	Cancelled(#[from] Cancelled),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request payload could not be encoded; nothing was sent.
	#[error(transparent)]
	Encode(#[from] crate::body::EncodeError),
}
impl Error {
	/// Returns the structured API error, if this is one.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}

	/// HTTP status associated with the failure, when the failure came from the engine.
	pub fn status(&self) -> Option<u16> {
		self.as_api().map(|e| e.status)
	}

	/// Whether the call was abandoned because of the caller's cancellation signal.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled(_))
	}
}

/// Reasons a call can be abandoned before it completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
pub enum Cancelled {
	/// The caller's cancellation token fired.
	#[error("Call was cancelled by the caller.")]
	Cancelled,
	/// The caller's deadline elapsed.
	#[error("Call deadline was exceeded.")]
	DeadlineExceeded,
}

/// Failure point inside the dispatcher that produced an [`ApiError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
	/// No response was received (DNS, connect, TLS, transport timeout).
	Transport,
	/// A response arrived but its body could not be read.
	BodyRead,
	/// The response status was not an accepted success code.
	Status,
	/// The response body was not valid JSON for the destination type.
	Decode,
}
impl ApiErrorKind {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiErrorKind::Transport => "transport",
			ApiErrorKind::BodyRead => "body_read",
			ApiErrorKind::Status => "status",
			ApiErrorKind::Decode => "decode",
		}
	}
}
impl Display for ApiErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Structured error returned for every non-cancellation failure.
///
/// Carries the HTTP status (or [`SERVICE_UNAVAILABLE`] when the transport failed), the request
/// URL, the raw response body when one was read, and a human-readable message when the failure
/// produced one.
#[derive(Debug)]
pub struct ApiError {
	/// Where in the dispatcher the failure happened.
	pub kind: ApiErrorKind,
	/// HTTP status code, or the synthetic unavailable code.
	pub status: u16,
	/// Request URL.
	pub url: String,
	/// Raw response body, lossily decoded as UTF-8.
	pub body: Option<String>,
	/// Diagnostic message.
	pub message: Option<String>,
	source: Option<BoxError>,
}
impl ApiError {
	/// No response was received.
	pub fn transport(url: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self {
			kind: ApiErrorKind::Transport,
			status: SERVICE_UNAVAILABLE,
			url: url.into(),
			body: None,
			message: Some(src.to_string()),
			source: Some(Box::new(src)),
		}
	}

	/// The response body could not be read.
	pub fn body_read(
		status: u16,
		url: impl Into<String>,
		src: impl 'static + Send + Sync + StdError,
	) -> Self {
		Self {
			kind: ApiErrorKind::BodyRead,
			status,
			url: url.into(),
			body: None,
			message: Some(src.to_string()),
			source: Some(Box::new(src)),
		}
	}

	/// The response carried an unexpected status.
	pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			kind: ApiErrorKind::Status,
			status,
			url: url.into(),
			body: Some(body.into()),
			message: None,
			source: None,
		}
	}

	/// The response body did not decode into the destination type.
	pub fn decode(
		status: u16,
		url: impl Into<String>,
		body: impl Into<String>,
		src: impl 'static + Send + Sync + StdError,
	) -> Self {
		Self {
			kind: ApiErrorKind::Decode,
			status,
			url: url.into(),
			body: Some(body.into()),
			message: Some(src.to_string()),
			source: Some(Box::new(src)),
		}
	}

	/// Whether the API rejected the bearer token.
	pub fn is_unauthorized(&self) -> bool {
		self.kind == ApiErrorKind::Status && self.status == StatusCode::UNAUTHORIZED.as_u16()
	}
}
impl Display for ApiError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "API call to {} failed with status {} ({})", self.url, self.status, self.kind)?;

		match (&self.message, &self.body) {
			(Some(message), _) => write!(f, ": {message}."),
			(None, Some(body)) if !body.is_empty() => write!(f, ": {body}."),
			_ => f.write_str("."),
		}
	}
}
impl StdError for ApiError {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// Base URL carries a query string or fragment that relative paths would clobber.
	#[error("Base URL must not carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Offending URL.
		url: String,
	},
	/// Client identifier is empty.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// Client secret is empty.
	#[error("Client secret must not be empty.")]
	MissingClientSecret,
	/// Token path does not start with `/`.
	#[error("Token path must start with '/': {path}.")]
	InvalidTokenPath {
		/// Offending path.
		path: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
